use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::{Client, Proxy, StatusCode};

use super::models::NewsItem;
use super::parser::parse_feed;
use crate::config::{AppConfig, Source};
use crate::{Error, Result};

const MAX_FEED_BYTES: usize = 5 * 1024 * 1024;

// Rotating User-Agent pool, some feeds reject non-browser clients
static USER_AGENT_INDEX: AtomicUsize = AtomicUsize::new(0);
const USER_AGENTS: &[&str] = &[
    // Chrome on Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    // Chrome on macOS
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    // Firefox on Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
];

/// Get the next User-Agent in rotation
fn next_user_agent() -> &'static str {
    let index = USER_AGENT_INDEX.fetch_add(1, Ordering::Relaxed) % USER_AGENTS.len();
    USER_AGENTS[index]
}

/// Anything that can produce the recent items of a configured source
#[async_trait::async_trait]
pub trait NewsSource: Send + Sync {
    /// Items of `source` published strictly after `cutoff`
    async fn fetch(&self, source: &Source, cutoff: DateTime<Utc>) -> Result<Vec<NewsItem>>;
}

/// Feed fetcher backed by an HTTP client
pub struct FeedFetcher {
    client: Client,
}

impl FeedFetcher {
    /// Create a new feed fetcher with configuration
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = Self::build_client(config.sync.request_timeout_secs, &config.sync.proxy_url)?;
        Ok(Self { client })
    }

    /// Build HTTP client with optional proxy
    fn build_client(timeout_secs: u64, proxy_url: &Option<String>) -> Result<Client> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(10));

        if let Some(ref proxy) = proxy_url {
            let proxy = Proxy::all(proxy)
                .map_err(|e| Error::Config(format!("Invalid proxy URL: {}", e)))?;
            builder = builder.proxy(proxy);
            tracing::info!("Using HTTP proxy for feed fetching");
        }

        builder.build().map_err(Error::Http)
    }

    /// Build browser-like headers for a request
    fn build_headers(user_agent: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,application/rss+xml,application/atom+xml,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        if let Ok(ua) = HeaderValue::from_str(user_agent) {
            headers.insert(USER_AGENT, ua);
        }
        headers
    }

    /// Download the raw feed document
    pub async fn fetch_raw(&self, url: &str) -> Result<Bytes> {
        let user_agent = next_user_agent();
        tracing::debug!(url = url, user_agent = user_agent, "Requesting feed");

        let response = self
            .client
            .get(url)
            .headers(Self::build_headers(user_agent))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::FORBIDDEN {
            return Err(Error::FeedParse(format!(
                "HTTP 403 Forbidden for URL: {}. Try configuring HTTP_PROXY_URL.",
                url
            )));
        }
        if !status.is_success() {
            return Err(Error::FeedParse(format!("HTTP {} for URL: {}", status, url)));
        }

        let bytes = response.bytes().await?;
        ensure_content_size(bytes.len(), url)?;

        if is_cloudflare_challenge(&bytes) {
            return Err(Error::FeedParse(format!(
                "Cloudflare JavaScript challenge detected for URL: {}",
                url
            )));
        }

        Ok(bytes)
    }
}

#[async_trait::async_trait]
impl NewsSource for FeedFetcher {
    async fn fetch(&self, source: &Source, cutoff: DateTime<Utc>) -> Result<Vec<NewsItem>> {
        tracing::info!(source = %source.name, url = %source.url, "Fetching feed");

        let content = self.fetch_raw(&source.url).await?;
        let parsed = parse_feed(&content, cutoff, source.locale)?;

        tracing::info!(
            source = %source.name,
            feed_title = parsed.title.as_deref().unwrap_or("untitled"),
            items = parsed.items.len(),
            "Feed parsed"
        );

        Ok(parsed.items)
    }
}

/// Check if content is a Cloudflare challenge page
fn is_cloudflare_challenge(content: &[u8]) -> bool {
    // Markers appear near the top of the page
    let check_len = content.len().min(2048);
    let preview = String::from_utf8_lossy(&content[..check_len]);

    preview.contains("Just a moment...")
        || preview.contains("cf-browser-verification")
        || preview.contains("_cf_chl_opt")
        || preview.contains("challenge-platform")
}

fn ensure_content_size(size: usize, url: &str) -> Result<()> {
    if size > MAX_FEED_BYTES {
        return Err(Error::FeedParse(format!(
            "Feed too large ({} bytes) for URL: {}",
            size, url
        )));
    }
    Ok(())
}
