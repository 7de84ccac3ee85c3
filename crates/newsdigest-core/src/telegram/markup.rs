use std::str::FromStr;

use serde::Serialize;

use crate::Error;

/// Telegram `parse_mode` for channel posts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParseMode {
    /// Legacy Markdown: `*bold*`, `_italic_`, `` `code` ``, `[link](url)`
    Markdown,
    #[serde(rename = "HTML")]
    Html,
}

impl FromStr for ParseMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "markdown" => Ok(ParseMode::Markdown),
            "html" => Ok(ParseMode::Html),
            other => Err(Error::Config(format!(
                "Unsupported TELEGRAM_PARSE_MODE '{}' (expected Markdown or HTML)",
                other
            ))),
        }
    }
}

impl ParseMode {
    /// Value of the Bot API `parse_mode` field
    pub fn as_api_str(self) -> &'static str {
        match self {
            ParseMode::Markdown => "Markdown",
            ParseMode::Html => "HTML",
        }
    }

    /// Make model output safe for this parse mode while keeping its formatting
    pub fn prepare_body(self, text: &str) -> String {
        match self {
            ParseMode::Markdown => escape_triple_asterisks(text),
            ParseMode::Html => escape_html(text),
        }
    }

    /// Escape text that must appear literally (e.g. a `@channel_name`)
    pub fn escape_literal(self, text: &str) -> String {
        match self {
            ParseMode::Markdown => {
                let mut out = String::with_capacity(text.len());
                for ch in text.chars() {
                    if matches!(ch, '_' | '*' | '`' | '[') {
                        out.push('\\');
                    }
                    out.push(ch);
                }
                out
            }
            ParseMode::Html => escape_html(text),
        }
    }
}

/// `***` has no meaning in Telegram Markdown and breaks the entity parser
pub fn escape_triple_asterisks(text: &str) -> String {
    text.replace("***", r"\*\*\*")
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
