/// Normalize `raw` into slug form.
///
/// Alphanumeric characters and underscores are kept and lowercased, runs of
/// whitespace and hyphens collapse into a single hyphen, and every other
/// character is dropped. The result never starts or ends with a hyphen.
///
/// Slugifying an already-slugified string returns it unchanged, so keys can
/// be normalized at any boundary without drifting.
#[must_use]
pub fn slugify(raw: &str) -> String {
    let mut slug = String::with_capacity(raw.len());
    let mut pending_hyphen = false;

    for ch in raw.chars() {
        if ch.is_alphanumeric() || ch == '_' {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            // Lowercase mappings can expand to chars outside the slug
            // alphabet (U+0130 gains a combining dot), so filter again.
            slug.extend(
                ch.to_lowercase()
                    .filter(|lowered| lowered.is_alphanumeric() || *lowered == '_'),
            );
        } else if ch.is_whitespace() || ch == '-' {
            pending_hyphen = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercases_and_hyphenates() {
        assert_eq!(slugify("Welcome Text"), "welcome-text");
    }

    #[test]
    fn test_collapses_separator_runs() {
        assert_eq!(slugify("a  lot -- of   space"), "a-lot-of-space");
    }

    #[test]
    fn test_drops_punctuation() {
        assert_eq!(slugify("don't panic!"), "dont-panic");
    }

    #[test]
    fn test_keeps_underscores_and_digits() {
        assert_eq!(slugify("footer_2024"), "footer_2024");
    }

    #[test]
    fn test_trims_leading_and_trailing_separators() {
        assert_eq!(slugify("  --about--  "), "about");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_multi_char_lowercase_expansion() {
        // U+0130 lowercases to "i" followed by a combining dot.
        assert_eq!(slugify("İstanbul"), "istanbul");
    }

    #[test]
    fn test_idempotent() {
        for raw in ["Welcome Text", "a  b", "--x--", "already-a-slug", "İstanbul"] {
            let once = slugify(raw);
            assert_eq!(slugify(&once), once);
        }
    }
}
