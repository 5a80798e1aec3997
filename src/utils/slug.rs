//! URL slug generation.

use deunicode::deunicode;

/// Slugify a post title into a URL-safe path segment.
///
/// Unicode is transliterated to ASCII, lowercased, and anything outside
/// `[a-z0-9-]` collapses into single dashes.
///
/// # Examples
///
/// - `"Hello, World!"` -> `"hello-world"`
/// - `"Über Café"` -> `"uber-cafe"`
pub fn slugify(title: &str) -> String {
    let ascii = deunicode(title).to_lowercase();

    let mut slug = String::with_capacity(ascii.len());
    let mut prev_dash = true; // suppress leading dash
    for c in ascii.chars() {
        match c {
            'a'..='z' | '0'..='9' => {
                slug.push(c);
                prev_dash = false;
            }
            _ => {
                if !prev_dash {
                    slug.push('-');
                    prev_dash = true;
                }
            }
        }
    }

    slug.trim_end_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("My First Post"), "my-first-post");
    }

    #[test]
    fn test_collapses_separators() {
        assert_eq!(slugify("a  --  b"), "a-b");
        assert_eq!(slugify("a___b"), "a-b");
    }

    #[test]
    fn test_trims_dashes() {
        assert_eq!(slugify("  spaced  "), "spaced");
        assert_eq!(slugify("-leading-"), "leading");
    }

    #[test]
    fn test_unicode_transliterated() {
        assert_eq!(slugify("Über Café"), "uber-cafe");
    }

    #[test]
    fn test_all_symbols_yields_empty() {
        assert_eq!(slugify("!!!"), "");
    }
}
