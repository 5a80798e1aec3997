//! Tera template loading and page rendering.

use std::fs;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context as _, Result, bail};
use tera::{Context, Tera};

use crate::config::SiteConfig;
use crate::content::{Post, YearGroup};
use crate::debug;
use crate::utils::date::DateTimeUtc;

/// Load every `*.html` template from the templates directory.
pub fn load_templates(dir: &Path) -> Result<Tera> {
    let pattern = dir.join("*.html");
    let pattern = pattern
        .to_str()
        .with_context(|| format!("non-utf8 template path: {}", dir.display()))?;

    let tera = Tera::new(pattern).context("parsing templates")?;
    if tera.get_template_names().next().is_none() {
        bail!("no templates found in {}", dir.display());
    }
    Ok(tera)
}

/// Render all pages of the site into the output directory.
///
/// `home.html`, `writings.html` and `post.html` are required; `about.html`,
/// `forai.html` and `meta.html` are rendered only when present.
pub fn render_site(
    tera: &Tera,
    config: &SiteConfig,
    posts: &[Post],
    groups: &[YearGroup],
    build_start: Instant,
) -> Result<()> {
    let output = &config.build.output;

    let mut home = page_context(config, "home", &config.site.title);
    home.insert("writings", posts);
    home.insert("grouped_writings", groups);
    write_page(tera, "home.html", &home, &output.join("index.html"))?;

    let mut writings = page_context(config, "writings", "Writings");
    writings.insert("writings", posts);
    writings.insert("grouped_writings", groups);
    write_page(
        tera,
        "writings.html",
        &writings,
        &output.join("writings/index.html"),
    )?;

    for post in posts {
        let mut ctx = page_context(config, "post", &post.title);
        ctx.insert("post", post);
        write_page(
            tera,
            "post.html",
            &ctx,
            &output.join("writings").join(&post.slug).join("index.html"),
        )?;
    }

    if tera.get_template_names().any(|n| n == "about.html") {
        let ctx = page_context(config, "about", "About");
        write_page(tera, "about.html", &ctx, &output.join("about/index.html"))?;
    } else {
        debug!("build"; "about.html not present, skipping");
    }

    if tera.get_template_names().any(|n| n == "forai.html") {
        let ctx = page_context(config, "forai", "For AI");
        write_page(tera, "forai.html", &ctx, &output.join("forai/index.html"))?;
    }

    if tera.get_template_names().any(|n| n == "meta.html") {
        let mut ctx = page_context(config, "meta", "Meta");
        ctx.insert("build_year", &current_year());
        ctx.insert("build_time_ms", &build_start.elapsed().as_millis());
        ctx.insert("post_count", &posts.len());
        write_page(tera, "meta.html", &ctx, &output.join("meta/index.html"))?;
    }

    Ok(())
}

/// Base context shared by every page.
fn page_context(config: &SiteConfig, page_type: &str, title: &str) -> Context {
    let mut ctx = Context::new();
    ctx.insert("page_type", page_type);
    ctx.insert("title", title);
    ctx.insert("base_path", &config.site.base_path);
    ctx.insert("site", &config.site);
    ctx
}

fn write_page(tera: &Tera, template: &str, ctx: &Context, dest: &Path) -> Result<()> {
    let html = tera
        .render(template, ctx)
        .with_context(|| format!("rendering {template}"))?;
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(dest, html).with_context(|| format!("writing {}", dest.display()))?;
    Ok(())
}

fn current_year() -> u16 {
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);
    DateTimeUtc::from_unix_timestamp(secs).map_or(1970, |dt| dt.year)
}
