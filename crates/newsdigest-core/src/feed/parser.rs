use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use feed_rs::model::Entry;
use feed_rs::parser::Builder;
use regex::Regex;

use super::dates::{parse_timestamp, DateLocale};
use super::models::NewsItem;
use crate::{Error, Result};

const TEXT_WIDTH: usize = 1000;

fn whitespace_pattern() -> &'static Regex {
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("whitespace pattern is valid"))
}

fn img_src_pattern() -> &'static Regex {
    static IMG_SRC: OnceLock<Regex> = OnceLock::new();
    IMG_SRC.get_or_init(|| {
        Regex::new(r#"(?i)<img\b[^>]*?\bsrc\s*=\s*["']([^"']+)["']"#)
            .expect("img src pattern is valid")
    })
}

/// Convert HTML to a single line of plain text.
///
/// Entities are decoded by the HTML renderer; line wrapping and block
/// breaks are collapsed into single spaces.
pub fn strip_html(html: &str) -> String {
    let text = html2text::from_read(html.as_bytes(), TEXT_WIDTH)
        .unwrap_or_else(|_| html.to_string());
    whitespace_pattern().replace_all(&text, " ").trim().to_string()
}

/// First `<img src>` in the body, skipping tracking pixels
fn extract_first_image_url(html: &str) -> Option<String> {
    let url = img_src_pattern().captures(html)?.get(1)?.as_str().trim();

    if url.contains("1x1") || url.contains("pixel") || url.contains("tracking") {
        return None;
    }
    Some(url.to_string())
}

/// Parsed feed: its title plus the entries newer than the cutoff
#[derive(Debug)]
pub struct ParsedFeed {
    pub title: Option<String>,
    pub items: Vec<NewsItem>,
}

/// Parse RSS/Atom content and keep the items published strictly after `cutoff`.
///
/// Entries without a usable timestamp are dropped with a warning.
pub fn parse_feed(
    content: &[u8],
    cutoff: DateTime<Utc>,
    locale: Option<DateLocale>,
) -> Result<ParsedFeed> {
    let parser = Builder::new()
        .timestamp_parser(move |raw: &str| parse_timestamp(raw, locale))
        .build();

    let feed = parser
        .parse(content)
        .map_err(|e| Error::FeedParse(e.to_string()))?;

    let title = feed.title.map(|t| t.content);

    let items = feed
        .entries
        .into_iter()
        .filter_map(|entry| entry_to_item(entry, cutoff))
        .collect();

    Ok(ParsedFeed { title, items })
}

fn entry_to_item(entry: Entry, cutoff: DateTime<Utc>) -> Option<NewsItem> {
    let title = entry
        .title
        .map(|t| t.content.trim().to_string())
        .unwrap_or_else(|| "Untitled".to_string());

    let Some(published_on) = entry.published.or(entry.updated) else {
        tracing::warn!(title = %title, "Could not determine publication date, skipping item");
        return None;
    };

    if published_on <= cutoff {
        return None;
    }

    let link = entry
        .links
        .first()
        .map(|l| l.href.clone())
        .unwrap_or_default();

    let raw_content = entry
        .content
        .and_then(|c| c.body)
        .or_else(|| entry.summary.map(|s| s.content))
        .unwrap_or_default();

    let image_url = entry
        .media
        .first()
        .and_then(|m| m.thumbnails.first())
        .map(|t| t.image.uri.clone())
        .or_else(|| {
            entry
                .media
                .iter()
                .flat_map(|m| m.content.iter())
                .find_map(|c| c.url.as_ref().map(|u| u.to_string()))
        })
        .or_else(|| extract_first_image_url(&raw_content));

    Some(NewsItem {
        title,
        link,
        content: strip_html(&raw_content),
        published_on,
        image_url,
    })
}
