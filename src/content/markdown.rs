//! Markdown to HTML rendering.

use std::sync::LazyLock;

use pulldown_cmark::{Options, Parser, html};
use regex::Regex;

/// Matches absolute `/images/...` sources so they can be re-rooted when the
/// site is served under a sub-path.
static IMG_SRC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"src="(/images/[^"]+)""#).unwrap());

/// Render a markdown body to HTML.
pub fn render(markdown: &str, base_path: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(markdown, options);
    let mut output = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut output, parser);

    postprocess(output, base_path)
}

/// Lazy-load images and re-root absolute image paths under `base_path`.
fn postprocess(html: String, base_path: &str) -> String {
    let html = html.replace("<img ", "<img loading=\"lazy\" decoding=\"async\" ");

    if base_path == "/" {
        return html;
    }
    IMG_SRC_RE
        .replace_all(&html, |caps: &regex::Captures| {
            format!(
                "src=\"{}{}\"",
                base_path,
                caps[1].trim_start_matches('/')
            )
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_markdown() {
        let out = render("# Title\n\nSome *prose*.", "/");
        assert!(out.contains("<h1>Title</h1>"));
        assert!(out.contains("<em>prose</em>"));
    }

    #[test]
    fn test_tables_enabled() {
        let out = render("| a | b |\n|---|---|\n| 1 | 2 |", "/");
        assert!(out.contains("<table>"));
    }

    #[test]
    fn test_images_lazy_loaded() {
        let out = render("![alt](/images/pic.png)", "/");
        assert!(out.contains("loading=\"lazy\""));
        assert!(out.contains("decoding=\"async\""));
        assert!(out.contains("src=\"/images/pic.png\""));
    }

    #[test]
    fn test_image_paths_rerooted_under_base_path() {
        let out = render("![alt](/images/pic.png)", "/blog/");
        assert!(out.contains("src=\"/blog/images/pic.png\""));
    }

    #[test]
    fn test_relative_image_paths_untouched() {
        let out = render("![alt](pic.png)", "/blog/");
        assert!(out.contains("src=\"pic.png\""));
    }
}
