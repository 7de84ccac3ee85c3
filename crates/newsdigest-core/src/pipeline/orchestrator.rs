use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::report::{RunReport, SourceOutcome, SourceReport};
use crate::ai::Analyzer;
use crate::config::{AppConfig, Source};
use crate::feed::{FeedFetcher, NewsItem, NewsSource};
use crate::telegram::TelegramService;
use crate::Result;

/// Fetch → analyze → deliver, one source at a time
pub struct Pipeline {
    config: Arc<AppConfig>,
    news: Arc<dyn NewsSource>,
    analyzer: Analyzer,
    telegram: TelegramService,
}

impl Pipeline {
    /// Wire the production fetcher, Gemini analyzer and Telegram service
    pub fn from_config(config: Arc<AppConfig>) -> Result<Self> {
        let news = Arc::new(FeedFetcher::new(&config)?);
        let analyzer = Analyzer::new(&config)?;
        let telegram = TelegramService::from_config(&config)?;
        Ok(Self::new(config, news, analyzer, telegram))
    }

    pub fn new(
        config: Arc<AppConfig>,
        news: Arc<dyn NewsSource>,
        analyzer: Analyzer,
        telegram: TelegramService,
    ) -> Self {
        Self {
            config,
            news,
            analyzer,
            telegram,
        }
    }

    /// Process every configured source once.
    ///
    /// Failures are contained per source and reported to the admin channel;
    /// this never fails as a whole.
    pub async fn run(&self, cutoff: DateTime<Utc>) -> RunReport {
        tracing::info!(
            sources = self.config.sources.len(),
            cutoff = %cutoff,
            "Starting news pass"
        );

        let mut reports = Vec::with_capacity(self.config.sources.len());
        for source in &self.config.sources {
            let outcome = self.process_source(source, cutoff).await;
            tracing::info!(source = %source.name, outcome = %outcome, "Source processed");
            reports.push(SourceReport {
                source: source.name.clone(),
                outcome,
            });
        }

        let report = RunReport {
            cutoff,
            sources: reports,
        };
        tracing::info!(failures = report.failures(), "News pass finished");
        report
    }

    /// Run the fetch → analyze → deliver stages for a single source
    pub async fn process_source(&self, source: &Source, cutoff: DateTime<Utc>) -> SourceOutcome {
        let name = source.name.as_str();

        let items = match self.news.fetch(source, cutoff).await {
            Ok(items) => items,
            Err(e) => {
                tracing::error!(source = name, error = %e, "Failed to fetch news");
                self.notify(&format!("❌ [{}] Failed to fetch news: {}", name, e))
                    .await;
                return SourceOutcome::FetchFailed(e.to_string());
            }
        };

        if items.is_empty() {
            tracing::info!(source = name, "No new items since cutoff");
            self.notify(&format!(
                "ℹ️ [{}] No new items since {}",
                name,
                cutoff.format("%Y-%m-%d %H:%M UTC")
            ))
            .await;
            return SourceOutcome::NoNews;
        }

        self.log_preview(name, &items);

        let channels = self.config.channels_for(name);
        if channels.is_empty() {
            tracing::warn!(source = name, "No target channel configured, skipping analysis");
            self.notify(&format!(
                "⚠️ [{}] {} new items but no target channel is configured",
                name,
                items.len()
            ))
            .await;
            return SourceOutcome::NoChannels;
        }

        let analysis = match self.analyzer.analyze(&items).await {
            Ok(analysis) => analysis,
            Err(e) => {
                tracing::error!(source = name, error = %e, "Failed to analyze news");
                self.notify(&format!("❌ [{}] Failed to analyze news: {}", name, e))
                    .await;
                return SourceOutcome::AnalysisFailed(e.to_string());
            }
        };

        let min_len = self.config.ai.min_summary_length;
        if !analysis.is_significant(min_len) {
            let summary_chars = analysis.summary_len();
            tracing::info!(
                source = name,
                summary_chars,
                min_len,
                "Nothing of global significance"
            );
            self.notify(&format!(
                "ℹ️ [{}] Nothing of global significance among {} items",
                name,
                items.len()
            ))
            .await;
            return SourceOutcome::NothingSignificant { summary_chars };
        }

        let mut delivered = Vec::new();
        let mut failed = Vec::new();
        for channel in channels {
            match self.telegram.deliver(channel, &analysis).await {
                Ok(delivery) => {
                    tracing::info!(source = name, channel = %channel, ?delivery, "Summary delivered");
                    self.notify(&format!("✅ [{}] Summary posted to {}", name, channel))
                        .await;
                    delivered.push((channel.clone(), delivery));
                }
                Err(e) => {
                    tracing::error!(source = name, channel = %channel, error = %e, "Failed to deliver summary");
                    self.notify(&format!(
                        "❌ [{}] Failed to post summary to {}: {}",
                        name, channel, e
                    ))
                    .await;
                    failed.push((channel.clone(), e.to_string()));
                }
            }
        }

        SourceOutcome::Delivered { delivered, failed }
    }

    fn log_preview(&self, source: &str, items: &[NewsItem]) {
        let limit = self.config.sync.content_preview_limit;
        tracing::info!(source = source, items = items.len(), "Fetched new items");
        for item in items {
            tracing::info!(
                source = source,
                title = %item.title,
                link = %item.link,
                published = %item.published_on,
                preview = %item.content_preview(limit),
                "News item"
            );
        }
    }

    /// Admin notices are best effort, a failure is only logged
    async fn notify(&self, text: &str) {
        if let Err(e) = self.telegram.notify_admin(text).await {
            tracing::error!(error = %e, "Failed to notify admin channel");
        }
    }
}
