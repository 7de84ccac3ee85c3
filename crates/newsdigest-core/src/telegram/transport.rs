use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::{Error, Result};

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Low-level Bot API call: POST a JSON payload to a method
#[async_trait::async_trait]
pub trait BotTransport: Send + Sync {
    /// Call `method` (e.g. `sendMessage`) with `payload`.
    ///
    /// Non-2xx replies become [`Error::Telegram`] carrying the status code.
    async fn call(&self, method: &str, payload: &Value) -> Result<()>;
}

#[derive(Deserialize)]
struct ApiErrorBody {
    description: Option<String>,
}

/// Bot API transport over HTTPS
pub struct HttpTransport {
    client: Client,
    bot_token: String,
}

impl HttpTransport {
    pub fn new(bot_token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            bot_token: bot_token.into(),
        })
    }
}

#[async_trait::async_trait]
impl BotTransport for HttpTransport {
    async fn call(&self, method: &str, payload: &Value) -> Result<()> {
        let url = format!("{}/bot{}/{}", TELEGRAM_API_BASE, self.bot_token, method);

        // Strip the URL from transport errors, it embeds the bot token
        let resp = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| Error::Http(e.without_url()))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        let body = resp.text().await.unwrap_or_default();
        Err(Error::Telegram {
            status: status.as_u16(),
            description: describe_error(&body),
        })
    }
}

/// Prefer the API's `description` field over the raw body
fn describe_error(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.description)
        .unwrap_or_else(|| body.to_string())
}
