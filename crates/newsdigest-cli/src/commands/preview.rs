use anyhow::Result;
use chrono::{DateTime, Utc};

use newsdigest_core::{
    feed::{FeedFetcher, NewsSource},
    AppConfig,
};

pub async fn run(config: &AppConfig, cutoff: DateTime<Utc>) -> Result<()> {
    let fetcher = FeedFetcher::new(config)?;
    let limit = config.sync.content_preview_limit;

    for source in &config.sources {
        println!("== {} ({})", source.name, source.url);

        let items = match fetcher.fetch(source, cutoff).await {
            Ok(items) => items,
            Err(e) => {
                println!("  [ERROR: {}]\n", e);
                continue;
            }
        };

        if items.is_empty() {
            println!("  No new items.\n");
            continue;
        }

        for item in &items {
            println!("  {}", item.title);
            println!("    Link: {}", item.link);
            println!("    Published: {}", item.published_on.format("%Y-%m-%d %H:%M UTC"));
            if let Some(image) = &item.image_url {
                println!("    Image: {}", image);
            }
            println!("    {}", item.content_preview(limit));
            println!();
        }
    }

    Ok(())
}
