//! Telegram Bot API delivery.
//!
//! `TelegramService` formats and posts summaries and admin notices;
//! `BotTransport` is the HTTP seam underneath it.

mod markup;
mod service;
mod transport;

pub use markup::{escape_triple_asterisks, ParseMode};
pub use service::{Delivery, TelegramService};
pub use transport::{BotTransport, HttpTransport};

#[cfg(test)]
pub(crate) use service::tests as test_support;
