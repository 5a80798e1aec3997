//! The full site-generation pipeline.
//!
//! `build_site` is the single entry point the dev loop treats as an opaque
//! rebuild: scan posts, render markdown, write pages, feed and assets.
//! Everything in here is deterministic and single-threaded in structure
//! (rayon only parallelizes independent post compilation).

mod assets;
mod feed;
mod front_matter;
mod markdown;
mod post;
mod render;

pub use post::{Post, YearGroup};

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Result, bail};
use rayon::prelude::*;

use crate::{config::SiteConfig, debug};

/// Result of one full build.
#[derive(Debug, Clone, Copy)]
pub struct BuildStats {
    /// Number of published posts written.
    pub posts: usize,
    /// Wall-clock build duration.
    pub duration: Duration,
}

/// Run the full site generation pipeline.
pub fn build_site(config: &SiteConfig) -> Result<BuildStats> {
    let start = Instant::now();

    validate_directories(config)?;
    std::fs::create_dir_all(&config.build.output)?;

    let tera = render::load_templates(&config.build.templates)?;

    let mut posts = collect_posts(config)?;
    // Newest first
    posts.sort_by(|a, b| b.date.cmp(&a.date));

    let published: Vec<Post> = posts
        .into_iter()
        .filter(|p| !p.is_draft || config.build.drafts)
        .collect();
    let groups = post::group_by_year(&published);

    render::render_site(&tera, config, &published, &groups, start)?;

    if config.build.feed {
        feed::build_feed(config, &published)?;
    }

    assets::copy_static(config)?;
    if let Err(e) = assets::copy_images(config) {
        // Illustrations are non-critical; the build stays valid without them
        debug!("assets"; "image copy skipped: {e:#}");
    }

    Ok(BuildStats {
        posts: published.len(),
        duration: start.elapsed(),
    })
}

/// Templates and static dirs are required inputs for every build.
fn validate_directories(config: &SiteConfig) -> Result<()> {
    if !config.build.templates.is_dir() {
        bail!(
            "templates directory not found: {}",
            config.build.templates.display()
        );
    }
    if !config.build.static_dir.is_dir() {
        bail!(
            "static directory not found: {}",
            config.build.static_dir.display()
        );
    }
    Ok(())
}

/// Scan `content/posts/` and compile every valid markdown post.
///
/// Invalid posts (missing title, broken front matter) are skipped with a
/// debug log; they never fail the build.
fn collect_posts(config: &SiteConfig) -> Result<Vec<Post>> {
    let posts_dir = config.build.posts_dir();
    if !posts_dir.is_dir() {
        return Ok(Vec::new());
    }

    let files: Vec<PathBuf> = jwalk::WalkDir::new(&posts_dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.path())
        .filter(|path| is_post_source(path))
        .collect();

    let posts: Vec<Post> = files
        .par_iter()
        .filter_map(|path| match Post::from_file(path, config) {
            Ok(post) => Some(post),
            Err(e) => {
                debug!("build"; "skipping {}: {e:#}", path.display());
                None
            }
        })
        .collect();

    Ok(posts)
}

/// Markdown files minus READMEs.
fn is_post_source(path: &std::path::Path) -> bool {
    let is_md = path.extension().is_some_and(|ext| ext == "md");
    let is_readme = path
        .file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|s| s.eq_ignore_ascii_case("README"));
    is_md && !is_readme
}
