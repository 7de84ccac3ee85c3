use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use super::prompt::DEFAULT_PROMPT;
use super::providers::{AiProvider, GeminiApiProvider};
use crate::config::{AppConfig, NEWS_PLACEHOLDER};
use crate::feed::NewsItem;
use crate::retry::{retry, RetryPolicy};
use crate::Result;

/// Parsed model answer: an optional lead image and the summary text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Analysis {
    pub image_url: Option<String>,
    pub summary: String,
}

fn is_bare_url(line: &str) -> bool {
    (line.starts_with("http://") || line.starts_with("https://"))
        && !line.contains(char::is_whitespace)
}

impl Analysis {
    /// Split a raw answer into image URL and summary.
    ///
    /// The first line is an image reference only if it is a bare http(s) URL;
    /// otherwise the whole answer is the summary.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let (first, rest) = raw.split_once('\n').unwrap_or((raw, ""));
        let first = first.trim();

        if is_bare_url(first) {
            Self {
                image_url: Some(first.to_string()),
                summary: rest.trim().to_string(),
            }
        } else {
            Self {
                image_url: None,
                summary: raw.to_string(),
            }
        }
    }

    /// Length of the summary in characters
    pub fn summary_len(&self) -> usize {
        self.summary.chars().count()
    }

    /// Whether the summary is long enough to be worth posting
    pub fn is_significant(&self, min_len: usize) -> bool {
        self.summary_len() >= min_len
    }
}

/// Turns a batch of news items into a single analysed summary
pub struct Analyzer {
    provider: Arc<dyn AiProvider>,
    template: String,
    policy: RetryPolicy,
}

impl Analyzer {
    /// Create the Gemini-backed analyzer described by the configuration
    pub fn new(config: &AppConfig) -> Result<Self> {
        let provider = GeminiApiProvider::new(
            &config.ai.gemini_api_key,
            &config.ai.gemini_model,
            Duration::from_secs(config.ai.api_timeout_secs),
        )?;

        let template = config
            .ai
            .prompt_template
            .clone()
            .unwrap_or_else(|| DEFAULT_PROMPT.to_string());

        Ok(Self::with_provider(
            Arc::new(provider),
            template,
            RetryPolicy::new(
                config.ai.retry_attempts,
                Duration::from_secs(config.ai.retry_delay_secs),
            ),
        ))
    }

    pub fn with_provider(provider: Arc<dyn AiProvider>, template: String, policy: RetryPolicy) -> Self {
        Self {
            provider,
            template,
            policy,
        }
    }

    /// Embed every item's title, image and content into the prompt template
    pub fn build_prompt(&self, items: &[NewsItem]) -> String {
        let mut news = String::new();
        for item in items {
            news.push_str(&format!("Title: {}\n", item.title));
            if let Some(image) = &item.image_url {
                news.push_str(&format!("Image: {}\n", image));
            }
            news.push_str(&format!("Content: {}\n\n", item.content));
        }
        self.template.replace(NEWS_PLACEHOLDER, &news)
    }

    /// Ask the provider to pick and summarize the most significant item.
    ///
    /// An empty summary means the model found nothing significant.
    pub async fn analyze(&self, items: &[NewsItem]) -> Result<Analysis> {
        let prompt = self.build_prompt(items);
        tracing::debug!(
            provider = self.provider.name(),
            items = items.len(),
            prompt_chars = prompt.chars().count(),
            "Requesting analysis"
        );

        let provider = &self.provider;
        let prompt = prompt.as_str();
        let raw = retry(self.policy, "Analysis request", |_| true, |_attempt| async move {
            provider.generate(prompt).await
        })
        .await?;

        let analysis = Analysis::parse(&raw);
        tracing::info!(
            provider = self.provider.name(),
            summary_chars = analysis.summary_len(),
            has_image = analysis.image_url.is_some(),
            "Analysis complete"
        );
        Ok(analysis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use chrono::Utc;
    use std::sync::Mutex;

    /// Provider that replays scripted answers and records prompts
    struct ScriptedProvider {
        answers: Mutex<Vec<Result<String>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn new(answers: Vec<Result<String>>) -> Arc<Self> {
            Arc::new(Self {
                answers: Mutex::new(answers.into_iter().rev().collect()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait::async_trait]
    impl AiProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.answers
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(Error::AiProvider("no scripted answer".into())))
        }
    }

    fn item(title: &str, image: Option<&str>) -> NewsItem {
        NewsItem {
            title: title.to_string(),
            link: format!("https://example.com/{}", title),
            content: format!("{} content", title),
            published_on: Utc::now(),
            image_url: image.map(str::to_string),
        }
    }

    fn analyzer(provider: Arc<ScriptedProvider>) -> Analyzer {
        Analyzer::with_provider(
            provider,
            "Pick one:\n{news}".to_string(),
            RetryPolicy::new(3, Duration::from_secs(2)),
        )
    }

    #[test]
    fn test_parse_leading_image_url() {
        let analysis = Analysis::parse("https://cdn.example/a.jpg\nSomething major happened.\nMore.");
        assert_eq!(analysis.image_url.as_deref(), Some("https://cdn.example/a.jpg"));
        assert_eq!(analysis.summary, "Something major happened.\nMore.");

        let analysis = Analysis::parse("http://cdn.example/a.jpg");
        assert_eq!(analysis.image_url.as_deref(), Some("http://cdn.example/a.jpg"));
        assert_eq!(analysis.summary, "");
    }

    #[test]
    fn test_parse_without_image() {
        let analysis = Analysis::parse("A summary mentioning https://example.com inline.\nSecond line.");
        assert_eq!(analysis.image_url, None);
        assert_eq!(analysis.summary, "A summary mentioning https://example.com inline.\nSecond line.");

        let analysis = Analysis::parse("ftp://example.com/x.jpg\ntext");
        assert_eq!(analysis.image_url, None);
    }

    #[test]
    fn test_parse_empty_answer() {
        let analysis = Analysis::parse("  \n ");
        assert_eq!(analysis, Analysis { image_url: None, summary: String::new() });
        assert!(!analysis.is_significant(34));
    }

    #[test]
    fn test_significance_counts_chars() {
        let analysis = Analysis::parse(&"ж".repeat(34));
        assert!(analysis.is_significant(34));
        assert!(!analysis.is_significant(35));
    }

    #[test]
    fn test_build_prompt_embeds_items() {
        let analyzer = analyzer(ScriptedProvider::new(vec![]));
        let prompt = analyzer.build_prompt(&[
            item("first", Some("https://img.example/1.jpg")),
            item("second", None),
        ]);

        assert!(prompt.starts_with("Pick one:\n"));
        assert!(prompt.contains(
            "Title: first\nImage: https://img.example/1.jpg\nContent: first content\n\n"
        ));
        assert!(prompt.contains("Title: second\nContent: second content\n\n"));
        assert!(!prompt.contains("{news}"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_analyze_retries_then_parses() {
        let provider = ScriptedProvider::new(vec![
            Err(Error::AiProvider("timeout".into())),
            Ok("https://img.example/1.jpg\nA significant event happened somewhere.".into()),
        ]);
        let analysis = analyzer(provider.clone())
            .analyze(&[item("first", None)])
            .await
            .unwrap();

        assert_eq!(provider.calls(), 2);
        assert_eq!(analysis.image_url.as_deref(), Some("https://img.example/1.jpg"));
        assert_eq!(analysis.summary, "A significant event happened somewhere.");
    }

    #[tokio::test(start_paused = true)]
    async fn test_analyze_gives_up_after_fixed_attempts() {
        let provider = ScriptedProvider::new(vec![
            Err(Error::AiProvider("one".into())),
            Err(Error::AiProvider("two".into())),
            Err(Error::AiProvider("three".into())),
        ]);
        let err = analyzer(provider.clone())
            .analyze(&[item("first", None)])
            .await
            .unwrap_err();

        assert_eq!(provider.calls(), 3);
        assert!(err.to_string().contains("three"));
    }

    #[tokio::test]
    async fn test_empty_answer_is_not_an_error() {
        let provider = ScriptedProvider::new(vec![Ok(String::new())]);
        let analysis = analyzer(provider).analyze(&[item("first", None)]).await.unwrap();
        assert!(analysis.summary.is_empty());
        assert!(analysis.image_url.is_none());
    }
}
