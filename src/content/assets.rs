//! Static asset and illustration copying.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::config::SiteConfig;
use crate::debug;
use crate::utils::mime;

/// Copy the static directory verbatim into the output root.
pub fn copy_static(config: &SiteConfig) -> Result<usize> {
    let copied = copy_tree(&config.build.static_dir, &config.build.output, |_| true)?;
    debug!("assets"; "{copied} static files copied");
    Ok(copied)
}

/// Copy image files from `content/images/` into `output/images/`.
///
/// A missing images directory is fine; posts without illustrations are
/// common.
pub fn copy_images(config: &SiteConfig) -> Result<usize> {
    let src = config.build.images_dir();
    if !src.is_dir() {
        return Ok(0);
    }
    let copied = copy_tree(&src, &config.build.output.join("images"), |path| {
        mime::is_image_extension(path.extension().and_then(|e| e.to_str()))
    })?;
    debug!("assets"; "{copied} images copied");
    Ok(copied)
}

/// Mirror `src` into `dest`, copying files that pass `keep`.
fn copy_tree(src: &Path, dest: &Path, keep: impl Fn(&Path) -> bool) -> Result<usize> {
    if !src.is_dir() {
        bail!("directory not found: {}", src.display());
    }

    let mut copied = 0;
    for entry in jwalk::WalkDir::new(src).skip_hidden(false) {
        let entry = entry?;
        let path = entry.path();
        let relative = path
            .strip_prefix(src)
            .context("walk escaped the source directory")?;
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else if keep(&path) {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(&path, &target)
                .with_context(|| format!("copying {}", path.display()))?;
            copied += 1;
        }
    }
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_copy_tree_preserves_structure() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        let dest = temp.path().join("dest");
        fs::create_dir_all(src.join("css")).unwrap();
        fs::write(src.join("css/style.css"), "body{}").unwrap();
        fs::write(src.join(".nojekyll"), "").unwrap();

        let copied = copy_tree(&src, &dest, |_| true).unwrap();
        assert_eq!(copied, 2);
        assert!(dest.join("css/style.css").is_file());
        assert!(dest.join(".nojekyll").is_file());
    }

    #[test]
    fn test_copy_tree_filters() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("images");
        let dest = temp.path().join("out");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("photo.png"), b"png").unwrap();
        fs::write(src.join("notes.txt"), b"txt").unwrap();

        let copied = copy_tree(&src, &dest, |p| {
            mime::is_image_extension(p.extension().and_then(|e| e.to_str()))
        })
        .unwrap();
        assert_eq!(copied, 1);
        assert!(dest.join("photo.png").is_file());
        assert!(!dest.join("notes.txt").exists());
    }

    #[test]
    fn test_missing_source_is_error() {
        let temp = TempDir::new().unwrap();
        assert!(copy_tree(&temp.path().join("nope"), temp.path(), |_| true).is_err());
    }
}
