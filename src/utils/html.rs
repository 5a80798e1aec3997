//! Small HTML helpers for text extraction.

/// Strip HTML tags, replacing each with a single space.
///
/// Good enough for word counts and feed summaries; not a sanitizer.
pub fn strip_tags(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => {
                in_tag = true;
                text.push(' ');
            }
            '>' => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    decode_basic_entities(&text)
}

/// Decode the handful of entities that matter for plain-text summaries.
fn decode_basic_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

/// Count whitespace-separated words in rendered HTML.
pub fn word_count(html: &str) -> usize {
    strip_tags(html).split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_tags() {
        assert_eq!(
            strip_tags("<p>hello <b>world</b></p>").split_whitespace().collect::<Vec<_>>(),
            vec!["hello", "world"]
        );
    }

    #[test]
    fn test_entities_decoded() {
        assert_eq!(strip_tags("a&amp;b").trim(), "a&b");
        assert_eq!(strip_tags("1 &lt; 2").trim(), "1 < 2");
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count("<p>one two three</p>"), 3);
        assert_eq!(word_count(""), 0);
    }
}
