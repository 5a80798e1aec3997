//! Count formatting for console messages.

/// Format a count with its pluralized noun.
///
/// # Examples
///
/// - `plural_count(1, "post")` -> `"1 post"`
/// - `plural_count(0, "client")` -> `"0 clients"`
/// - `plural_count(3, "directory")` -> `"3 directories"`
pub fn plural_count(count: usize, noun: &str) -> String {
    format!("{count} {}", pluralize(noun, count))
}

/// Naive English pluralization, enough for the nouns in our log lines.
fn pluralize(noun: &str, count: usize) -> String {
    if count == 1 {
        return noun.to_string();
    }
    let mut rev = noun.chars().rev();
    let consonant_y = rev.next() == Some('y')
        && rev
            .next()
            .is_some_and(|c| !matches!(c, 'a' | 'e' | 'i' | 'o' | 'u'));
    if consonant_y {
        format!("{}ies", &noun[..noun.len() - 1])
    } else {
        format!("{noun}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regular_nouns() {
        assert_eq!(plural_count(0, "post"), "0 posts");
        assert_eq!(plural_count(1, "post"), "1 post");
        assert_eq!(plural_count(2, "client"), "2 clients");
    }

    #[test]
    fn test_consonant_y_nouns() {
        assert_eq!(plural_count(1, "directory"), "1 directory");
        assert_eq!(plural_count(3, "directory"), "3 directories");
    }

    #[test]
    fn test_vowel_y_nouns() {
        assert_eq!(plural_count(2, "day"), "2 days");
    }
}
