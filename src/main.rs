//! Folio - a static site generator for markdown blogs.

mod cli;
mod config;
mod content;
mod core;
mod logger;
mod serve;
mod utils;

use std::sync::Arc;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::SiteConfig;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    crate::core::setup_shutdown_handler()?;

    let cli: &'static Cli = Box::leak(Box::new(Cli::parse()));

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = Arc::new(SiteConfig::load(cli)?);
    logger::set_verbose(config.verbose());

    match &cli.command {
        Commands::Build { .. } => build_once(&config),
        Commands::Serve { .. } => serve::serve(config),
    }
}

/// One-shot production build.
fn build_once(config: &SiteConfig) -> Result<()> {
    let stats = content::build_site(config)?;
    crate::log!(
        "build";
        "{} -> {}/ in {} ms",
        crate::utils::plural::plural_count(stats.posts, "post"),
        config.build.output.display(),
        stats.duration.as_millis()
    );
    Ok(())
}
