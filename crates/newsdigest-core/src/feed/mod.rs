mod dates;
mod fetcher;
mod models;
mod parser;

pub use dates::{parse_standard, parse_timestamp, DateLocale};
pub use fetcher::{FeedFetcher, NewsSource};
pub use models::{truncate_with_ellipsis, NewsItem};
pub use parser::{parse_feed, strip_html, ParsedFeed};
