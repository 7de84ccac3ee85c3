use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Serialize, Serializer};
use url::Url;

use crate::feed::DateLocale;
use crate::telegram::ParseMode;
use crate::{Error, Result};

/// Placeholder in the prompt template that receives the serialized news items
pub const NEWS_PLACEHOLDER: &str = "{news}";

#[derive(Debug, Clone, Serialize)]
pub struct AppConfig {
    pub ai: AiConfig,
    pub telegram: TelegramConfig,
    pub sync: SyncConfig,
    /// Feeds in the order they were configured
    pub sources: Vec<Source>,
    /// Source name to the channels its summaries are posted to
    pub routing: BTreeMap<String, Vec<String>>,
}

/// A named RSS/Atom feed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Source {
    pub name: String,
    pub url: String,
    /// Locale used when the feed's timestamps are not plain RFC 2822/3339
    pub locale: Option<DateLocale>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AiConfig {
    #[serde(serialize_with = "redact")]
    pub gemini_api_key: String,
    pub gemini_model: String,
    /// File the prompt template was read from (built-in template when unset)
    pub prompt_file: Option<PathBuf>,
    #[serde(skip)]
    pub prompt_template: Option<String>,
    /// Per-attempt inference timeout in seconds
    pub api_timeout_secs: u64,
    pub retry_attempts: u32,
    pub retry_delay_secs: u64,
    /// Summaries shorter than this (chars) count as "nothing significant"
    pub min_summary_length: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TelegramConfig {
    #[serde(serialize_with = "redact")]
    pub api_key: String,
    /// Admin channel for operational notifications
    pub admin_chat_id: String,
    /// Parse mode for channel posts; `None` sends plain text
    pub parse_mode: Option<ParseMode>,
    pub max_message_length: usize,
    pub max_caption_length: usize,
    pub max_photo_retries: u32,
    pub photo_retry_delay_secs: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncConfig {
    /// Feed and Telegram request timeout in seconds
    pub request_timeout_secs: u64,
    /// Items older than now minus this window are ignored
    pub lookback_hours: u32,
    /// Characters of item content shown in preview logs
    pub content_preview_limit: usize,
    /// HTTP proxy URL for feed fetching (e.g. "socks5://127.0.0.1:1080")
    pub proxy_url: Option<String>,
}

fn redact<S: Serializer>(value: &str, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    if value.is_empty() {
        serializer.serialize_str("")
    } else {
        serializer.serialize_str("***redacted***")
    }
}

fn default_gemini_model() -> String {
    "gemini-2.5-pro".to_string()
}

fn default_localized_sources() -> String {
    "SVTV".to_string()
}

const DEFAULT_API_TIMEOUT_SECS: u64 = 60;
const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_DELAY_SECS: u64 = 2;
const DEFAULT_MIN_SUMMARY_LENGTH: usize = 34;
const DEFAULT_MAX_MESSAGE_LENGTH: usize = 4000;
const DEFAULT_MAX_CAPTION_LENGTH: usize = 1024;
const DEFAULT_MAX_PHOTO_RETRIES: u32 = 3;
const DEFAULT_PHOTO_RETRY_DELAY_SECS: u64 = 3;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_LOOKBACK_HOURS: u32 = 24;
const DEFAULT_CONTENT_PREVIEW_LIMIT: usize = 1000;

/// Typed access to a key/value lookup (the process environment in production)
struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Trimmed value, `None` when unset or blank
    fn get(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, key: &str) -> Result<String> {
        self.get(key)
            .ok_or_else(|| Error::Config(format!("{} is not set", key)))
    }

    /// Positive number with a default when unset
    fn positive<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr + PartialEq + Default,
    {
        let Some(raw) = self.get(key) else {
            return Ok(default);
        };
        let value: T = raw
            .parse()
            .map_err(|_| Error::Config(format!("Invalid value for {}: {}", key, raw)))?;
        if value == T::default() {
            return Err(Error::Config(format!("{} must be greater than zero", key)));
        }
        Ok(value)
    }
}

/// Parse a `name:value,name2:value2` list.
///
/// Entries are split on the first `:` only, so values may be URLs. Entries
/// missing either half are skipped.
pub fn parse_pairs(raw: &str) -> Vec<(String, String)> {
    raw.split(',')
        .filter_map(|pair| {
            let (name, value) = pair.split_once(':')?;
            let (name, value) = (name.trim(), value.trim());
            if name.is_empty() || value.is_empty() {
                return None;
            }
            Some((name.to_string(), value.to_string()))
        })
        .collect()
}

fn parse_sources(raw: &str, localized: &[String]) -> Result<Vec<Source>> {
    let mut sources: Vec<Source> = Vec::new();

    for (name, url) in parse_pairs(raw) {
        Url::parse(&url)
            .map_err(|e| Error::Config(format!("Invalid URL for source '{}': {}", name, e)))?;

        let locale = localized
            .iter()
            .any(|l| l.eq_ignore_ascii_case(&name))
            .then_some(DateLocale::Russian);

        if let Some(existing) = sources.iter_mut().find(|s| s.name == name) {
            tracing::warn!(source = %name, "Source configured twice, keeping the last URL");
            existing.url = url;
            existing.locale = locale;
        } else {
            sources.push(Source { name, url, locale });
        }
    }

    if sources.is_empty() {
        return Err(Error::Config(
            "No valid news sources found in NEWS_SOURCES".to_string(),
        ));
    }
    Ok(sources)
}

fn parse_routing(raw: &str) -> Result<BTreeMap<String, Vec<String>>> {
    let mut routing: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for (source, channels) in parse_pairs(raw) {
        let entry = routing.entry(source).or_default();
        for channel in channels.split('|').map(str::trim).filter(|c| !c.is_empty()) {
            if !entry.iter().any(|c| c == channel) {
                entry.push(channel.to_string());
            }
        }
    }

    if routing.is_empty() {
        return Err(Error::Config(
            "No valid target channels found in TARGET_CHANNELS".to_string(),
        ));
    }
    Ok(routing)
}

impl AppConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key/value lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };

        let gemini_api_key = env.required("GEMINI_API_KEY")?;
        let telegram_api_key = env.required("TELEGRAM_API_KEY")?;
        let admin_chat_id = env.required("TELEGRAM_CHAT_ID")?;

        let localized: Vec<String> = env
            .get("LOCALIZED_DATE_SOURCES")
            .unwrap_or_else(default_localized_sources)
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let sources = parse_sources(&env.required("NEWS_SOURCES")?, &localized)?;
        let routing = parse_routing(&env.required("TARGET_CHANNELS")?)?;

        for name in routing.keys() {
            if !sources.iter().any(|s| &s.name == name) {
                tracing::warn!(source = %name, "TARGET_CHANNELS names a source missing from NEWS_SOURCES");
            }
        }

        let prompt_file = env.get("GEMINI_PROMPT_FILE").map(PathBuf::from);
        let prompt_template = match &prompt_file {
            Some(path) => {
                let template = std::fs::read_to_string(path)?;
                if !template.contains(NEWS_PLACEHOLDER) {
                    return Err(Error::Config(format!(
                        "Prompt template {} has no {} placeholder",
                        path.display(),
                        NEWS_PLACEHOLDER
                    )));
                }
                Some(template)
            }
            None => None,
        };

        // An explicitly blank TELEGRAM_PARSE_MODE means plain text.
        let parse_mode = match (env.lookup)("TELEGRAM_PARSE_MODE") {
            Some(mode) if mode.trim().is_empty() => None,
            Some(mode) => Some(mode.trim().parse::<ParseMode>()?),
            None => Some(ParseMode::Markdown),
        };

        Ok(Self {
            ai: AiConfig {
                gemini_api_key,
                gemini_model: env.get("GEMINI_MODEL").unwrap_or_else(default_gemini_model),
                prompt_file,
                prompt_template,
                api_timeout_secs: env.positive("API_TIMEOUT", DEFAULT_API_TIMEOUT_SECS)?,
                retry_attempts: env.positive("RETRY_ATTEMPTS", DEFAULT_RETRY_ATTEMPTS)?,
                retry_delay_secs: env.positive("RETRY_DELAY_SECS", DEFAULT_RETRY_DELAY_SECS)?,
                min_summary_length: env
                    .positive("MIN_SUMMARY_LENGTH", DEFAULT_MIN_SUMMARY_LENGTH)?,
            },
            telegram: TelegramConfig {
                api_key: telegram_api_key,
                admin_chat_id,
                parse_mode,
                max_message_length: env
                    .positive("MAX_MESSAGE_LENGTH", DEFAULT_MAX_MESSAGE_LENGTH)?,
                max_caption_length: env
                    .positive("MAX_CAPTION_LENGTH", DEFAULT_MAX_CAPTION_LENGTH)?,
                max_photo_retries: env
                    .positive("MAX_PHOTO_RETRIES", DEFAULT_MAX_PHOTO_RETRIES)?,
                photo_retry_delay_secs: env
                    .positive("PHOTO_RETRY_DELAY_SECS", DEFAULT_PHOTO_RETRY_DELAY_SECS)?,
            },
            sync: SyncConfig {
                request_timeout_secs: env
                    .positive("FETCH_TIMEOUT", DEFAULT_REQUEST_TIMEOUT_SECS)?,
                lookback_hours: env.positive("LOOKBACK_HOURS", DEFAULT_LOOKBACK_HOURS)?,
                content_preview_limit: env
                    .positive("CONTENT_PREVIEW_LIMIT", DEFAULT_CONTENT_PREVIEW_LIMIT)?,
                proxy_url: env.get("HTTP_PROXY_URL"),
            },
            sources,
            routing,
        })
    }

    /// Channels that receive summaries for the given source
    pub fn channels_for(&self, source: &str) -> &[String] {
        self.routing
            .get(source)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Items published at or before this instant are ignored
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::hours(i64::from(self.sync.lookback_hours))
    }
}
