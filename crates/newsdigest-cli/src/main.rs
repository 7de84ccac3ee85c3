use std::sync::Arc;

use anyhow::Result;
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use newsdigest_core::AppConfig;

mod commands;

#[derive(Parser)]
#[command(name = "newsdigest")]
#[command(author, version, about = "Posts LLM-selected global news from RSS feeds to Telegram")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Look back this many hours instead of LOOKBACK_HOURS
    #[arg(long, global = true, value_parser = clap::value_parser!(u32).range(1..))]
    since_hours: Option<u32>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, analyze and post to every target channel
    Run,
    /// Fetch and print new items per source
    Preview,
    /// Fetch and analyze without posting anything
    Analyze,
    /// Print the effective configuration (secrets redacted)
    Config,
}

fn init_logging(json: bool) {
    let filter = EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(false))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .init();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // A missing .env is fine, the process environment may already be set
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.json_logs);

    let config = Arc::new(AppConfig::from_env()?);

    let now = Utc::now();
    let cutoff = match cli.since_hours {
        Some(hours) => now - Duration::hours(i64::from(hours)),
        None => config.cutoff(now),
    };
    tracing::debug!(cutoff = %cutoff, "Resolved cutoff");

    match cli.command {
        Some(Commands::Run) | None => commands::run::run(config, cutoff).await,
        Some(Commands::Preview) => commands::preview::run(&config, cutoff).await,
        Some(Commands::Analyze) => commands::analyze::run(&config, cutoff).await,
        Some(Commands::Config) => commands::config::run(&config),
    }
}
