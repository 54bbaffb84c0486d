use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use tracing::info;

use super::create_cache;
use crate::Cli;

#[derive(Args, Debug)]
pub struct Cache {
    #[command(subcommand)]
    action: CacheAction,
}

#[derive(Subcommand, Debug)]
enum CacheAction {
    /// Print file counts and size of the cache directory as JSON
    Stats,
    /// Delete every cached response
    Clear,
    /// Delete cached responses older than the TTL
    #[command(name = "clear-expired")]
    ClearExpired,
}

impl Cache {
    pub async fn execute(&self, cli: &Cli) -> Result<()> {
        let cache = create_cache(cli);
        if !cache.is_enabled() {
            bail!("The response cache is disabled (CACHE_ENABLED=false)");
        }

        match self.action {
            CacheAction::Stats => {
                let stats = cache.stats().await;
                println!("{}", serde_json::to_string_pretty(&stats)?);
            }
            CacheAction::Clear => {
                let removed = cache.clear().await;
                info!(removed, directory = %cache.directory().display(), "Cache cleared");
            }
            CacheAction::ClearExpired => {
                let removed = cache.clear_expired().await;
                info!(removed, directory = %cache.directory().display(), "Expired entries cleared");
            }
        }

        Ok(())
    }
}
