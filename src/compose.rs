//! Post text assembly and length enforcement.
//!
//! The generation backend cannot be trusted to respect the platform's
//! character budget, so the final post is always assembled here:
//!
//! ```text
//! body + separator + link [+ separator + "#" + tag]
//! ```
//!
//! When that exceeds the limit, the body is cut to
//! `limit - reserved_suffix - ellipsis` characters and the ellipsis marker is
//! appended, so the link and tag survive intact. If even the suffix does not
//! fit, the whole assembled string is cut instead. Lengths are counted in
//! `char`s.

use serde::{Deserialize, Serialize};

/// Separator, ellipsis and limit used to assemble a post.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PostFormat {
    /// Maximum post length in characters.
    pub max_chars: usize,
    /// Placed between the body, the link and the tag.
    pub separator: String,
    /// Appended to a truncated body.
    pub ellipsis: String,
}

impl Default for PostFormat {
    fn default() -> Self {
        Self {
            max_chars: 280,
            separator: " ".to_string(),
            ellipsis: "...".to_string(),
        }
    }
}

/// Number of characters in `s`.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// The first `n` characters of `s`, never splitting a code point.
pub fn take_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Cut `text` so that the result, ellipsis included, is at most `max` characters.
pub fn truncate_with_ellipsis(text: &str, max: usize, ellipsis: &str) -> String {
    if char_len(text) <= max {
        return text.to_string();
    }
    let marker = char_len(ellipsis);
    if marker >= max {
        return take_chars(text, max).to_string();
    }
    format!("{}{}", take_chars(text, max - marker), ellipsis)
}

/// The text appended after the body: separator, link, and the optional tag.
pub fn suffix(link: &str, tag: Option<&str>, format: &PostFormat) -> String {
    match tag {
        Some(tag) => format!("{sep}{link}{sep}#{tag}", sep = format.separator),
        None => format!("{}{}", format.separator, link),
    }
}

/// Assemble the final post text, truncating the body when needed.
///
/// The result never exceeds `format.max_chars` characters.
pub fn assemble(body: &str, link: &str, tag: Option<&str>, format: &PostFormat) -> String {
    let suffix = suffix(link, tag, format);
    let full = format!("{}{}", body, suffix);
    if char_len(&full) <= format.max_chars {
        return full;
    }

    let reserved = char_len(&suffix);
    if reserved < format.max_chars {
        let body = truncate_with_ellipsis(body, format.max_chars - reserved, &format.ellipsis);
        return enforce_limit(&format!("{}{}", body, suffix), format);
    }

    enforce_limit(&full, format)
}

/// Last-resort check applied to an already assembled post.
pub fn enforce_limit(text: &str, format: &PostFormat) -> String {
    truncate_with_ellipsis(text, format.max_chars, &format.ellipsis)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(max_chars: usize) -> PostFormat {
        PostFormat {
            max_chars,
            ..PostFormat::default()
        }
    }

    const LINK: &str = "https://bbc.co.uk/n/abc"; // 23 chars

    #[test]
    fn test_short_post_is_unchanged() {
        let text = assemble("Rates are on hold.", LINK, None, &format(280));
        assert_eq!(text, format!("Rates are on hold. {}", LINK));
    }

    #[test]
    fn test_tag_is_appended_after_link() {
        let text = assemble("Rates are on hold.", LINK, Some("K3Q9Z"), &format(280));
        assert_eq!(text, format!("Rates are on hold. {} #K3Q9Z", LINK));
    }

    #[test]
    fn test_long_body_fills_limit_exactly() {
        assert_eq!(char_len(LINK), 23);
        let body = "a".repeat(300);
        let text = assemble(&body, LINK, None, &format(140));

        assert_eq!(char_len(&text), 140);
        assert!(text.ends_with(&format!("... {}", LINK)));
        assert!(text.starts_with(&"a".repeat(113)));
    }

    #[test]
    fn test_long_body_keeps_tag() {
        let body = "b".repeat(500);
        let text = assemble(&body, LINK, Some("AB12C"), &format(140));
        assert_eq!(char_len(&text), 140);
        assert!(text.ends_with(&format!("... {} #AB12C", LINK)));
    }

    #[test]
    fn test_multibyte_body_is_cut_on_char_boundary() {
        let body = "日本銀行は政策金利を据え置いた。".repeat(20);
        let text = assemble(&body, LINK, None, &format(140));
        assert_eq!(char_len(&text), 140);
        assert!(text.ends_with(LINK));
    }

    #[test]
    fn test_link_longer_than_limit_is_cut_as_a_whole() {
        let link = format!("https://example.com/{}", "x".repeat(200));
        let text = assemble("body", &link, Some("TAG01"), &format(140));
        assert_eq!(char_len(&text), 140);
        assert!(text.starts_with("body https://example.com/"));
        assert!(text.ends_with("..."));
    }

    #[test]
    fn test_limit_smaller_than_ellipsis() {
        let text = assemble("body", LINK, None, &format(2));
        assert_eq!(text, "bo");
    }

    #[test]
    fn test_assembled_length_never_exceeds_limit() {
        for limit in [1usize, 3, 10, 24, 25, 30, 140, 280] {
            for body_len in [0usize, 1, 50, 116, 117, 139, 140, 141, 300, 1000] {
                for tag in [None, Some("Z9Z9Z")] {
                    let body = "c".repeat(body_len);
                    let text = assemble(&body, LINK, tag, &format(limit));
                    assert!(
                        char_len(&text) <= limit,
                        "limit={} body_len={} tag={:?} len={}",
                        limit,
                        body_len,
                        tag,
                        char_len(&text)
                    );
                }
            }
        }
    }

    #[test]
    fn test_enforce_limit() {
        let f = format(10);
        assert_eq!(enforce_limit("short", &f), "short");
        assert_eq!(enforce_limit("0123456789abc", &f), "0123456...");
    }

    #[test]
    fn test_take_chars() {
        assert_eq!(take_chars("héllo", 2), "hé");
        assert_eq!(take_chars("abc", 10), "abc");
        assert_eq!(take_chars("abc", 0), "");
    }
}
