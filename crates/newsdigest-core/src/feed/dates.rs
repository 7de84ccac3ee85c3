//! Publication timestamp parsing for feed entries.
//!
//! Most feeds emit RFC 2822 (`pubDate`) or RFC 3339 (Atom) timestamps. Some
//! localized feeds write month and weekday abbreviations in their own script,
//! which has to be mapped to English before the standard parsers accept it.

use chrono::{DateTime, Utc};
use serde::Serialize;

const RUSSIAN_TOKENS: &[(&str, &str)] = &[
    ("Янв", "Jan"),
    ("Фев", "Feb"),
    ("Мар", "Mar"),
    ("Апр", "Apr"),
    ("Май", "May"),
    ("Июн", "Jun"),
    ("Июл", "Jul"),
    ("Авг", "Aug"),
    ("Сен", "Sep"),
    ("Окт", "Oct"),
    ("Ноя", "Nov"),
    ("Дек", "Dec"),
    ("Пн", "Mon"),
    ("Вт", "Tue"),
    ("Ср", "Wed"),
    ("Чт", "Thu"),
    ("Пт", "Fri"),
    ("Сб", "Sat"),
    ("Вс", "Sun"),
];

/// Locale whose date tokens a feed may use instead of English ones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DateLocale {
    Russian,
}

impl DateLocale {
    fn tokens(self) -> &'static [(&'static str, &'static str)] {
        match self {
            DateLocale::Russian => RUSSIAN_TOKENS,
        }
    }

    /// Replace localized month/weekday abbreviations with English ones
    pub fn normalize(self, raw: &str) -> String {
        self.tokens()
            .iter()
            .fold(raw.to_string(), |acc, (local, english)| acc.replace(local, english))
    }
}

/// Parse an RFC 2822 or RFC 3339 timestamp into UTC
pub fn parse_standard(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parse a feed timestamp, falling back to locale token substitution.
///
/// Returns `None` (after logging a warning) when no interpretation works.
pub fn parse_timestamp(raw: &str, locale: Option<DateLocale>) -> Option<DateTime<Utc>> {
    if let Some(parsed) = parse_standard(raw) {
        return Some(parsed);
    }

    let parsed = locale.and_then(|locale| parse_standard(&locale.normalize(raw)));
    if parsed.is_none() {
        tracing::warn!(raw = raw, ?locale, "Could not parse feed timestamp");
    }
    parsed
}
