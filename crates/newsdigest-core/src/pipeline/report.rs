use std::fmt;

use chrono::{DateTime, Utc};

use crate::telegram::Delivery;

/// Where processing of a single source stopped
#[derive(Debug, Clone, PartialEq)]
pub enum SourceOutcome {
    FetchFailed(String),
    /// Nothing newer than the cutoff
    NoNews,
    /// No target channel is routed to this source
    NoChannels,
    AnalysisFailed(String),
    /// Summary shorter than the configured minimum
    NothingSignificant { summary_chars: usize },
    Delivered {
        delivered: Vec<(String, Delivery)>,
        failed: Vec<(String, String)>,
    },
}

impl SourceOutcome {
    pub fn is_failure(&self) -> bool {
        match self {
            SourceOutcome::FetchFailed(_) | SourceOutcome::AnalysisFailed(_) => true,
            SourceOutcome::Delivered { failed, .. } => !failed.is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for SourceOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceOutcome::FetchFailed(e) => write!(f, "fetch failed: {}", e),
            SourceOutcome::NoNews => write!(f, "no new items"),
            SourceOutcome::NoChannels => write!(f, "no target channel configured"),
            SourceOutcome::AnalysisFailed(e) => write!(f, "analysis failed: {}", e),
            SourceOutcome::NothingSignificant { summary_chars } => {
                write!(f, "nothing significant ({} chars)", summary_chars)
            }
            SourceOutcome::Delivered { delivered, failed } => {
                write!(f, "posted to {} channel(s)", delivered.len())?;
                if !failed.is_empty() {
                    write!(f, ", {} failed", failed.len())?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct SourceReport {
    pub source: String,
    pub outcome: SourceOutcome,
}

/// Result of one pass over every configured source
#[derive(Debug, Clone)]
pub struct RunReport {
    pub cutoff: DateTime<Utc>,
    pub sources: Vec<SourceReport>,
}

impl RunReport {
    pub fn failures(&self) -> usize {
        self.sources.iter().filter(|s| s.outcome.is_failure()).count()
    }
}
