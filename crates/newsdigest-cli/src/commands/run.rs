use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};

use newsdigest_core::{pipeline::Pipeline, AppConfig};

pub async fn run(config: Arc<AppConfig>, cutoff: DateTime<Utc>) -> Result<()> {
    println!(
        "Processing {} sources (items after {})...\n",
        config.sources.len(),
        cutoff.format("%Y-%m-%d %H:%M UTC")
    );

    let pipeline = Pipeline::from_config(config)?;
    let report = pipeline.run(cutoff).await;

    for entry in &report.sources {
        let marker = if entry.outcome.is_failure() { "!" } else { "-" };
        println!("  {} {}: {}", marker, entry.source, entry.outcome);
    }

    // Failures were already reported to the admin channel
    println!(
        "\nDone. {} of {} sources had failures.",
        report.failures(),
        report.sources.len()
    );

    Ok(())
}
