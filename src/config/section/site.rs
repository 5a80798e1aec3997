//! `[site]` section configuration.
//!
//! Site metadata used by templates and the RSS feed.
//!
//! # Example
//!
//! ```toml
//! [site]
//! title = "The Book of Odds and Ends"
//! description = "Writings and observations"
//! author = "..."
//! url = "https://example.com"   # required for absolute feed links
//! base_path = "/"               # "/repo-name/" for GitHub Pages project sites
//! language = "en-us"
//! ```

use serde::{Deserialize, Serialize};

/// Site metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSectionConfig {
    /// Site title (feed channel title, template variable).
    pub title: String,

    /// Site description (feed channel description).
    pub description: String,

    /// Author name.
    pub author: String,

    /// Absolute site URL. Feed generation is skipped when unset.
    pub url: Option<String>,

    /// Base path prefix for links and assets.
    /// Normalized to start and end with `/` at load time.
    pub base_path: String,

    /// Feed language code.
    pub language: String,
}

impl Default for SiteSectionConfig {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            author: String::new(),
            url: None,
            base_path: "/".to_string(),
            language: "en-us".to_string(),
        }
    }
}

impl SiteSectionConfig {
    /// Ensure `base_path` starts and ends with a slash.
    pub fn normalize_base_path(&mut self) {
        if !self.base_path.starts_with('/') {
            self.base_path.insert(0, '/');
        }
        if !self.base_path.ends_with('/') {
            self.base_path.push('/');
        }
    }

    /// Site URL without a trailing slash, if configured and non-empty.
    pub fn url_trimmed(&self) -> Option<&str> {
        self.url
            .as_deref()
            .map(|u| u.trim_end_matches('/'))
            .filter(|u| !u.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;

    #[test]
    fn test_site_config_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.site.base_path, "/");
        assert_eq!(config.site.language, "en-us");
        assert!(config.site.url.is_none());
    }

    #[test]
    fn test_base_path_normalized() {
        let config = test_parse_config("[site]\nbase_path = \"blog\"");
        assert_eq!(config.site.base_path, "/blog/");
    }

    #[test]
    fn test_url_trimmed() {
        let config = test_parse_config("[site]\nurl = \"https://example.com/\"");
        assert_eq!(config.site.url_trimmed(), Some("https://example.com"));

        let config = test_parse_config("[site]\nurl = \"\"");
        assert_eq!(config.site.url_trimmed(), None);
    }
}
