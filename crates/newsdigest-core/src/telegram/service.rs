use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use super::markup::ParseMode;
use super::transport::{BotTransport, HttpTransport};
use crate::ai::Analysis;
use crate::config::{AppConfig, TelegramConfig};
use crate::feed::truncate_with_ellipsis;
use crate::retry::{retry, RetryPolicy};
use crate::{Error, Result};

/// How a summary ended up in a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Text,
    Photo,
    /// Photo failed, caption and image link were sent as text
    TextFallback,
}

/// Posts summaries to target channels and notices to the admin channel
pub struct TelegramService {
    transport: Arc<dyn BotTransport>,
    admin_chat_id: String,
    parse_mode: Option<ParseMode>,
    max_message_length: usize,
    max_caption_length: usize,
    photo_policy: RetryPolicy,
}

impl TelegramService {
    /// Create a service talking to the Bot API over HTTPS
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let transport = HttpTransport::new(
            config.telegram.api_key.clone(),
            Duration::from_secs(config.sync.request_timeout_secs),
        )?;
        Ok(Self::new(&config.telegram, Arc::new(transport)))
    }

    pub fn new(config: &TelegramConfig, transport: Arc<dyn BotTransport>) -> Self {
        Self {
            transport,
            admin_chat_id: config.admin_chat_id.clone(),
            parse_mode: config.parse_mode,
            max_message_length: config.max_message_length,
            max_caption_length: config.max_caption_length,
            photo_policy: RetryPolicy::new(
                config.max_photo_retries,
                Duration::from_secs(config.photo_retry_delay_secs),
            ),
        }
    }

    /// Text that must show up verbatim in a channel post
    fn literal(&self, text: &str) -> String {
        match self.parse_mode {
            Some(mode) => mode.escape_literal(text),
            None => text.to_string(),
        }
    }

    /// Append the channel identifier to a post
    fn sign(&self, chat_id: &str, body: &str) -> String {
        format!("{}\n\n{}", body, self.literal(chat_id))
    }

    fn payload(&self, chat_id: &str, field: &str, text: String) -> Value {
        let mut payload = json!({ "chat_id": chat_id, field: text });
        if let Some(mode) = self.parse_mode {
            payload["parse_mode"] = Value::from(mode.as_api_str());
        }
        payload
    }

    /// Send an operational notice to the admin channel as plain text
    pub async fn notify_admin(&self, text: &str) -> Result<()> {
        let payload = json!({
            "chat_id": self.admin_chat_id,
            "text": truncate_with_ellipsis(text, self.max_message_length),
        });
        self.transport.call("sendMessage", &payload).await
    }

    /// Post a text message to a target channel
    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<()> {
        let text = truncate_with_ellipsis(&self.sign(chat_id, text), self.max_message_length);
        self.transport
            .call("sendMessage", &self.payload(chat_id, "text", text))
            .await?;

        tracing::info!(chat_id = chat_id, "Message sent to Telegram");
        Ok(())
    }

    /// Post a photo with caption, retrying transient failures.
    ///
    /// When every attempt fails (or the API rejects the request outright),
    /// the caption and a plain-text image link are sent as a text message.
    pub async fn send_photo(&self, chat_id: &str, photo_url: &str, caption: &str) -> Result<Delivery> {
        let full_caption = truncate_with_ellipsis(&self.sign(chat_id, caption), self.max_caption_length);
        let mut payload = self.payload(chat_id, "caption", full_caption);
        payload["photo"] = Value::from(photo_url);

        let transport = &self.transport;
        let payload = &payload;
        let sent = retry(
            self.photo_policy,
            "Sending photo",
            Error::is_retryable,
            |_attempt| async move { transport.call("sendPhoto", payload).await },
        )
        .await;

        match sent {
            Ok(()) => {
                tracing::info!(chat_id = chat_id, "Photo sent successfully by URL");
                Ok(Delivery::Photo)
            }
            Err(e) => {
                tracing::error!(
                    chat_id = chat_id,
                    error = %e,
                    "Sending photo failed, falling back to text message"
                );
                let fallback = format!("{}\n\n(Image: {})", caption, self.literal(photo_url));
                self.send_message(chat_id, &fallback).await?;
                Ok(Delivery::TextFallback)
            }
        }
    }

    /// Post an analysis to a channel, as a photo when it has a lead image
    pub async fn deliver(&self, chat_id: &str, analysis: &Analysis) -> Result<Delivery> {
        let body = match self.parse_mode {
            Some(mode) => mode.prepare_body(&analysis.summary),
            None => analysis.summary.clone(),
        };

        match &analysis.image_url {
            Some(image_url) => self.send_photo(chat_id, image_url, &body).await,
            None => {
                self.send_message(chat_id, &body).await?;
                Ok(Delivery::Text)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// Transport that records calls and replays scripted replies per method.
    /// Unscripted calls succeed.
    #[derive(Default)]
    pub(crate) struct RecordingTransport {
        calls: Mutex<Vec<(String, Value)>>,
        replies: Mutex<Vec<(String, Result<()>)>>,
    }

    impl RecordingTransport {
        pub(crate) fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        pub(crate) fn script(&self, method: &str, reply: Result<()>) {
            self.replies.lock().unwrap().push((method.to_string(), reply));
        }

        pub(crate) fn calls(&self) -> Vec<(String, Value)> {
            self.calls.lock().unwrap().clone()
        }

        pub(crate) fn texts_to(&self, chat_id: &str) -> Vec<String> {
            self.calls()
                .into_iter()
                .filter(|(_, p)| p["chat_id"] == chat_id)
                .filter_map(|(_, p)| {
                    p.get("text")
                        .or_else(|| p.get("caption"))
                        .and_then(Value::as_str)
                        .map(str::to_string)
                })
                .collect()
        }
    }

    #[async_trait::async_trait]
    impl BotTransport for RecordingTransport {
        async fn call(&self, method: &str, payload: &Value) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push((method.to_string(), payload.clone()));

            let mut replies = self.replies.lock().unwrap();
            match replies.iter().position(|(m, _)| m == method) {
                Some(index) => replies.remove(index).1,
                None => Ok(()),
            }
        }
    }

    pub(crate) fn server_error() -> Error {
        Error::Telegram {
            status: 502,
            description: "Bad Gateway".into(),
        }
    }

    pub(crate) fn telegram_config() -> TelegramConfig {
        TelegramConfig {
            api_key: "token".into(),
            admin_chat_id: "-100admin".into(),
            parse_mode: Some(ParseMode::Markdown),
            max_message_length: 4000,
            max_caption_length: 1024,
            max_photo_retries: 3,
            photo_retry_delay_secs: 3,
        }
    }

    fn service(transport: Arc<RecordingTransport>) -> TelegramService {
        TelegramService::new(&telegram_config(), transport)
    }

    #[tokio::test]
    async fn test_text_post_is_signed_and_escaped() {
        let transport = RecordingTransport::new();
        let analysis = Analysis {
            image_url: None,
            summary: "***Alert*** something big".into(),
        };

        let delivery = service(transport.clone()).deliver("@world_news", &analysis).await.unwrap();

        assert_eq!(delivery, Delivery::Text);
        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "sendMessage");
        assert_eq!(calls[0].1["parse_mode"], "Markdown");
        assert_eq!(
            calls[0].1["text"],
            "\\*\\*\\*Alert\\*\\*\\* something big\n\n@world\\_news"
        );
    }

    #[tokio::test]
    async fn test_photo_post_succeeds_first_try() {
        let transport = RecordingTransport::new();
        let analysis = Analysis {
            image_url: Some("https://img.example/a.jpg".into()),
            summary: "Summary".into(),
        };

        let delivery = service(transport.clone()).deliver("@chan", &analysis).await.unwrap();

        assert_eq!(delivery, Delivery::Photo);
        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "sendPhoto");
        assert_eq!(calls[0].1["photo"], "https://img.example/a.jpg");
        assert_eq!(calls[0].1["caption"], "Summary\n\n@chan");
    }

    #[tokio::test(start_paused = true)]
    async fn test_photo_falls_back_to_text_after_server_errors() {
        let transport = RecordingTransport::new();
        for _ in 0..3 {
            transport.script("sendPhoto", Err(server_error()));
        }
        let started = Instant::now();

        let delivery = service(transport.clone())
            .send_photo("@chan", "https://img.example/a.jpg", "Original caption")
            .await
            .unwrap();

        assert_eq!(delivery, Delivery::TextFallback);
        let methods: Vec<_> = transport.calls().into_iter().map(|(m, _)| m).collect();
        assert_eq!(methods, ["sendPhoto", "sendPhoto", "sendPhoto", "sendMessage"]);
        assert_eq!(
            transport.calls()[3].1["text"],
            "Original caption\n\n(Image: https://img.example/a.jpg)\n\n@chan"
        );
        assert_eq!(started.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_image_link_is_escaped() {
        let transport = RecordingTransport::new();
        for _ in 0..3 {
            transport.script("sendPhoto", Err(server_error()));
        }

        service(transport.clone())
            .send_photo("@chan", "https://img.example/lead_image.jpg", "Caption")
            .await
            .unwrap();

        let (method, payload) = transport.calls().pop().unwrap();
        assert_eq!(method, "sendMessage");
        assert_eq!(payload["parse_mode"], "Markdown");
        assert_eq!(
            payload["text"],
            "Caption\n\n(Image: https://img.example/lead\\_image.jpg)\n\n@chan"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_plain_text_fallback_keeps_link_verbatim() {
        let transport = RecordingTransport::new();
        for _ in 0..3 {
            transport.script("sendPhoto", Err(server_error()));
        }
        let config = TelegramConfig {
            parse_mode: None,
            ..telegram_config()
        };

        TelegramService::new(&config, transport.clone())
            .send_photo("@chan", "https://img.example/lead_image.jpg", "Caption")
            .await
            .unwrap();

        let (_, payload) = transport.calls().pop().unwrap();
        assert!(payload.get("parse_mode").is_none());
        assert_eq!(
            payload["text"],
            "Caption\n\n(Image: https://img.example/lead_image.jpg)\n\n@chan"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_client_error_aborts_photo_retries() {
        let transport = RecordingTransport::new();
        transport.script(
            "sendPhoto",
            Err(Error::Telegram {
                status: 400,
                description: "Bad Request: wrong file identifier".into(),
            }),
        );

        let delivery = service(transport.clone())
            .send_photo("@chan", "https://img.example/a.jpg", "Caption")
            .await
            .unwrap();

        assert_eq!(delivery, Delivery::TextFallback);
        let methods: Vec<_> = transport.calls().into_iter().map(|(m, _)| m).collect();
        assert_eq!(methods, ["sendPhoto", "sendMessage"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_is_retried() {
        let transport = RecordingTransport::new();
        transport.script(
            "sendPhoto",
            Err(Error::Telegram {
                status: 429,
                description: "Too Many Requests".into(),
            }),
        );

        let delivery = service(transport.clone())
            .send_photo("@chan", "https://img.example/a.jpg", "Caption")
            .await
            .unwrap();

        assert_eq!(delivery, Delivery::Photo);
        assert_eq!(transport.calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_fallback_is_an_error() {
        let transport = RecordingTransport::new();
        for _ in 0..3 {
            transport.script("sendPhoto", Err(server_error()));
        }
        transport.script("sendMessage", Err(server_error()));

        let result = service(transport)
            .send_photo("@chan", "https://img.example/a.jpg", "Caption")
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_caption_is_truncated() {
        let transport = RecordingTransport::new();
        let long = "x".repeat(2000);

        service(transport.clone())
            .send_photo("@chan", "https://img.example/a.jpg", &long)
            .await
            .unwrap();

        let caption = transport.calls()[0].1["caption"].as_str().unwrap().to_string();
        assert_eq!(caption.chars().count(), 1024);
        assert!(caption.ends_with("..."));
    }

    #[tokio::test]
    async fn test_admin_notice_is_plain_and_unsigned() {
        let transport = RecordingTransport::new();
        service(transport.clone())
            .notify_admin("[SVTV] fetch failed: *oops*_")
            .await
            .unwrap();

        let calls = transport.calls();
        assert_eq!(calls[0].1["chat_id"], "-100admin");
        assert_eq!(calls[0].1["text"], "[SVTV] fetch failed: *oops*_");
        assert!(calls[0].1.get("parse_mode").is_none());
    }
}
