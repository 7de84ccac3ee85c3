//! One pass over the configured sources: fetch, analyze, deliver, report.

mod orchestrator;
mod report;

pub use orchestrator::Pipeline;
pub use report::{RunReport, SourceOutcome, SourceReport};
