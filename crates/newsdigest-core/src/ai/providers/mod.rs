mod gemini_api;

pub use gemini_api::GeminiApiProvider;

use crate::Result;

/// Trait for generative text providers
#[async_trait::async_trait]
pub trait AiProvider: Send + Sync {
    /// Human-readable provider/model name for logs
    fn name(&self) -> &str;

    /// Run one completion for `prompt`.
    ///
    /// An empty string is a valid answer: the model produced no text.
    async fn generate(&self, prompt: &str) -> Result<String>;
}
