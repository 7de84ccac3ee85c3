use chrono::{DateTime, Utc};
use serde::Serialize;

/// A single feed entry that passed the cutoff filter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsItem {
    pub title: String,
    pub link: String,
    /// Body text with HTML markup removed
    pub content: String,
    pub published_on: DateTime<Utc>,
    /// Lead image found in media elements or the body, if any
    pub image_url: Option<String>,
}

impl NewsItem {
    /// Get a preview of the content (first N characters)
    pub fn content_preview(&self, max_len: usize) -> String {
        truncate_with_ellipsis(&self.content, max_len)
    }
}

/// Cut `text` to at most `max_chars` characters, marking the cut with `...`.
///
/// The marker counts toward the limit, so the result never exceeds it.
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars <= 3 {
        return ".".repeat(max_chars);
    }
    let kept: String = text.chars().take(max_chars - 3).collect();
    format!("{}...", kept)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_counts_chars_not_bytes() {
        assert_eq!(truncate_with_ellipsis("короткий", 8), "короткий");
        assert_eq!(truncate_with_ellipsis("длинный текст", 8), "длинн...");
        assert_eq!(truncate_with_ellipsis("длинный текст", 8).chars().count(), 8);
    }

    #[test]
    fn test_truncate_tiny_limits() {
        assert_eq!(truncate_with_ellipsis("abcdef", 3), "...");
        assert_eq!(truncate_with_ellipsis("abcdef", 0), "");
    }

    #[test]
    fn test_content_preview() {
        let item = NewsItem {
            title: "t".into(),
            link: "https://example.com".into(),
            content: "a".repeat(20),
            published_on: Utc::now(),
            image_url: None,
        };
        assert_eq!(item.content_preview(10), format!("{}...", "a".repeat(7)));
        assert_eq!(item.content_preview(100), "a".repeat(20));
    }
}
