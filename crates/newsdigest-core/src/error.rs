use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed parsing error: {0}")]
    FeedParse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("AI provider error: {0}")]
    AiProvider(String),

    #[error("Telegram API error (status {status}): {description}")]
    Telegram { status: u16, description: String },
}

impl Error {
    /// Whether a failed Telegram call is worth repeating.
    ///
    /// Transport failures, rate limiting and server errors are transient;
    /// any other client error means the request itself is wrong.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(_) => true,
            Error::Telegram { status, .. } => {
                *status == 429 || !(400..500).contains(status)
            }
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    fn telegram(status: u16) -> Error {
        Error::Telegram {
            status,
            description: String::new(),
        }
    }

    #[test]
    fn test_client_errors_are_final_except_rate_limit() {
        assert!(!telegram(400).is_retryable());
        assert!(!telegram(403).is_retryable());
        assert!(telegram(429).is_retryable());
    }

    #[test]
    fn test_server_errors_are_retryable() {
        assert!(telegram(500).is_retryable());
        assert!(telegram(502).is_retryable());
        assert!(!Error::Config("x".into()).is_retryable());
    }
}
