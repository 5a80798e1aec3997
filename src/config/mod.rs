//! Site configuration management for `folio.toml`.
//!
//! # Sections
//!
//! | Section    | Purpose                                      |
//! |------------|----------------------------------------------|
//! | `[site]`   | Site metadata (title, author, url, base path)|
//! | `[build]`  | Build paths, drafts, feed                    |
//! | `[serve]`  | Development server (port, interface, watch)  |

pub mod section;

pub use section::{BuildSectionConfig, ServeConfig, SiteSectionConfig};

use crate::{
    cli::{Cli, Commands},
    log,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Root configuration structure representing folio.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// CLI arguments reference (internal use only)
    #[serde(skip)]
    pub cli: Option<&'static Cli>,

    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Site metadata
    pub site: SiteSectionConfig,

    /// Build settings
    pub build: BuildSectionConfig,

    /// Development server settings
    pub serve: ServeConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            cli: None,
            config_path: PathBuf::new(),
            root: PathBuf::new(),
            site: SiteSectionConfig::default(),
            build: BuildSectionConfig::default(),
            serve: ServeConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from CLI arguments.
    ///
    /// Searches upward from cwd to find the config file; the project root is
    /// the config file's parent directory.
    pub fn load(cli: &'static Cli) -> Result<Self> {
        let Some(config_path) = find_config_file(&cli.config) else {
            log!(
                "error";
                "Config file '{}' not found in this directory or any parent.",
                cli.config.display()
            );
            std::process::exit(1);
        };

        let raw = fs::read_to_string(&config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        let mut config: Self = toml::from_str(&raw)
            .with_context(|| format!("failed to parse {}", config_path.display()))?;

        config.cli = Some(cli);
        config.root = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        config.config_path = config_path;

        config.apply_cli_overrides(cli);
        config.apply_env_overrides();
        config.normalize();

        Ok(config)
    }

    /// Apply CLI flag overrides on top of the file values.
    fn apply_cli_overrides(&mut self, cli: &Cli) {
        let build_args = cli.build_args();
        if let Some(output) = &build_args.output {
            self.build.output = output.clone();
        }
        if build_args.drafts {
            self.build.drafts = true;
        }
        if let Some(rss) = build_args.rss {
            self.build.feed = rss;
        }

        if let Commands::Serve {
            interface,
            port,
            watch,
            ..
        } = &cli.command
        {
            if let Some(interface) = interface {
                self.serve.interface = *interface;
            }
            if let Some(port) = port {
                self.serve.port = *port;
            }
            if let Some(watch) = watch {
                self.serve.watch = *watch;
            }
        }
    }

    /// `BASE_PATH` / `SITE_URL` environment overrides (CI deployments).
    fn apply_env_overrides(&mut self) {
        if let Ok(base_path) = std::env::var("BASE_PATH")
            && !base_path.is_empty()
        {
            self.site.base_path = base_path;
        }
        if let Ok(url) = std::env::var("SITE_URL")
            && !url.is_empty()
        {
            self.site.url = Some(url);
        }
    }

    /// Normalize paths and the base path after all overrides are applied.
    fn normalize(&mut self) {
        let root = self.root.clone();
        self.build.resolve_paths(&root);
        self.site.normalize_base_path();
    }

    /// Whether verbose output was requested.
    pub fn verbose(&self) -> bool {
        self.cli.is_some_and(|cli| cli.build_args().verbose)
    }
}

/// Search for the config file upward from the current directory.
///
/// An absolute path is used as-is (if it exists).
fn find_config_file(name: &Path) -> Option<PathBuf> {
    if name.is_absolute() {
        return name.exists().then(|| name.to_path_buf());
    }

    let mut dir = std::env::current_dir().ok()?;
    loop {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !dir.pop() {
            return None;
        }
    }
}

/// Parse a config from a TOML string with normalization applied (tests only).
#[cfg(test)]
pub fn test_parse_config(toml_str: &str) -> SiteConfig {
    let mut config: SiteConfig = toml::from_str(toml_str).expect("invalid test config");
    config.normalize();
    config
}
