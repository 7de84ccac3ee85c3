use anyhow::Result;

use newsdigest_core::AppConfig;

pub fn run(config: &AppConfig) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}
