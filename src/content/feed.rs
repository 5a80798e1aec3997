//! RSS feed generation.

use std::fs;

use anyhow::{Context, Result};
use rss::validation::Validate;
use rss::{ChannelBuilder, GuidBuilder, Item, ItemBuilder};

use crate::config::SiteConfig;
use crate::content::Post;
use crate::utils::html;
use crate::{debug, log};

/// Maximum plain-text summary length per feed item.
const SUMMARY_CHARS: usize = 500;

/// Write `rss.xml` into the output directory.
///
/// Skipped silently when there are no posts or no absolute `site.url` to
/// build item links from.
pub fn build_feed(config: &SiteConfig, posts: &[Post]) -> Result<()> {
    if posts.is_empty() {
        debug!("feed"; "no posts, skipping rss.xml");
        return Ok(());
    }
    let Some(site_url) = config.site.url_trimmed() else {
        debug!("feed"; "site.url not set, skipping rss.xml");
        return Ok(());
    };

    // base_path is normalized with both slashes, so this joins cleanly
    let base = format!("{site_url}{}", config.site.base_path);

    let items: Vec<Item> = posts
        .iter()
        .take(config.build.feed_limit)
        .map(|post| {
            let link = format!("{base}writings/{}", post.slug);
            ItemBuilder::default()
                .title(post.title.clone())
                .link(link.clone())
                .guid(GuidBuilder::default().value(link).permalink(true).build())
                .pub_date(post.date.to_rfc2822())
                .description(summarize(&post.content))
                .build()
        })
        .collect();

    let channel = ChannelBuilder::default()
        .title(&config.site.title)
        .link(base.trim_end_matches('/'))
        .description(&config.site.description)
        .language(Some(config.site.language.clone()))
        .generator(Some(concat!("folio ", env!("CARGO_PKG_VERSION")).to_string()))
        .items(items)
        .build();

    channel.validate().context("rss validation failed")?;

    let dest = config.build.output.join("rss.xml");
    fs::write(&dest, channel.to_string())
        .with_context(|| format!("writing {}", dest.display()))?;

    log!("feed"; "rss.xml ({} items)", channel.items().len());
    Ok(())
}

/// Plain-text summary of rendered HTML, truncated on a char boundary.
fn summarize(content: &str) -> String {
    let text = html::strip_tags(content);
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");

    if text.chars().count() <= SUMMARY_CHARS {
        return text;
    }
    let truncated: String = text.chars().take(SUMMARY_CHARS).collect();
    format!("{}...", truncated.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_short_text() {
        assert_eq!(summarize("<p>hello world</p>"), "hello world");
    }

    #[test]
    fn test_summarize_truncates() {
        let long = format!("<p>{}</p>", "word ".repeat(200));
        let summary = summarize(&long);
        assert!(summary.ends_with("..."));
        assert!(summary.chars().count() <= SUMMARY_CHARS + 3);
    }

    #[test]
    fn test_summarize_collapses_whitespace() {
        assert_eq!(summarize("<p>a</p>\n\n<p>b</p>"), "a b");
    }
}
