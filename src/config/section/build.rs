//! `[build]` section configuration.
//!
//! Build paths and pipeline toggles.
//!
//! # Example
//!
//! ```toml
//! [build]
//! content = "content"       # posts in content/posts, images in content/images
//! templates = "templates"
//! static = "static"
//! output = "public"
//! drafts = false            # include draft posts
//! feed = true               # generate rss.xml
//! feed_limit = 20
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Build settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSectionConfig {
    /// Content directory (posts and images live under it).
    pub content: PathBuf,

    /// Template directory (tera `*.html` templates).
    pub templates: PathBuf,

    /// Static asset directory, copied verbatim into the output.
    #[serde(rename = "static")]
    pub static_dir: PathBuf,

    /// Generated output directory.
    pub output: PathBuf,

    /// Include draft posts in the build.
    pub drafts: bool,

    /// Generate an RSS feed at `rss.xml`.
    pub feed: bool,

    /// Maximum number of feed items.
    pub feed_limit: usize,
}

impl Default for BuildSectionConfig {
    fn default() -> Self {
        Self {
            content: PathBuf::from("content"),
            templates: PathBuf::from("templates"),
            static_dir: PathBuf::from("static"),
            output: PathBuf::from("public"),
            drafts: false,
            feed: true,
            feed_limit: 20,
        }
    }
}

impl BuildSectionConfig {
    /// Resolve all directories relative to the project root.
    pub fn resolve_paths(&mut self, root: &Path) {
        for dir in [
            &mut self.content,
            &mut self.templates,
            &mut self.static_dir,
            &mut self.output,
        ] {
            if dir.is_relative() {
                *dir = root.join(&dir);
            }
        }
    }

    /// Directory holding markdown posts.
    pub fn posts_dir(&self) -> PathBuf {
        self.content.join("posts")
    }

    /// Directory holding post images.
    pub fn images_dir(&self) -> PathBuf {
        self.content.join("images")
    }

    /// Directories the dev loop watches for changes.
    pub fn watch_roots(&self) -> Vec<PathBuf> {
        vec![
            self.content.clone(),
            self.templates.clone(),
            self.static_dir.clone(),
        ]
    }
}
