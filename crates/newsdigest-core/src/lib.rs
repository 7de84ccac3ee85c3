pub mod ai;
pub mod config;
pub mod error;
pub mod feed;
pub mod pipeline;
pub mod retry;
pub mod telegram;

pub use config::{AppConfig, Source};
pub use error::{Error, Result};
