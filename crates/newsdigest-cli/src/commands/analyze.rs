use anyhow::Result;
use chrono::{DateTime, Utc};

use newsdigest_core::{
    ai::Analyzer,
    feed::{FeedFetcher, NewsSource},
    AppConfig,
};

/// Dry run: print what would be posted, without touching Telegram
pub async fn run(config: &AppConfig, cutoff: DateTime<Utc>) -> Result<()> {
    let fetcher = FeedFetcher::new(config)?;
    let analyzer = Analyzer::new(config)?;
    let min_len = config.ai.min_summary_length;

    for source in &config.sources {
        println!("== {}", source.name);

        let items = match fetcher.fetch(source, cutoff).await {
            Ok(items) if items.is_empty() => {
                println!("  No new items.\n");
                continue;
            }
            Ok(items) => items,
            Err(e) => {
                println!("  [ERROR: {}]\n", e);
                continue;
            }
        };

        let analysis = match analyzer.analyze(&items).await {
            Ok(analysis) => analysis,
            Err(e) => {
                println!("  [ERROR: {}]\n", e);
                continue;
            }
        };

        if !analysis.is_significant(min_len) {
            println!(
                "  Nothing significant among {} items ({} chars).\n",
                items.len(),
                analysis.summary_len()
            );
            continue;
        }

        let channels = config.channels_for(&source.name);
        if channels.is_empty() {
            println!("  Would post to: (no target channel)");
        } else {
            println!("  Would post to: {}", channels.join(", "));
        }
        if let Some(image) = &analysis.image_url {
            println!("  Image: {}", image);
        }
        println!("\n{}\n", analysis.summary);
    }

    Ok(())
}
