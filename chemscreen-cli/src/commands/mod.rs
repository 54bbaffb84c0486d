pub mod cache;
pub mod check_config;
pub mod search;

use std::time::Duration;

use anyhow::Result;
use chemscreen::{CacheConfig, ClientConfig, PubMedClient, ResponseCache};

use crate::Cli;

pub fn client_config(cli: &Cli) -> ClientConfig {
    let mut config = ClientConfig::new()
        .with_tool(&cli.tool)
        .with_timeout_seconds(cli.timeout)
        .with_concurrent_requests(cli.concurrent_requests);

    if let Some(key) = &cli.api_key {
        config = config.with_api_key(key);
    }

    if let Some(email) = &cli.email {
        config = config.with_email(email);
    }

    config
}

pub fn cache_config(cli: &Cli) -> CacheConfig {
    CacheConfig {
        enabled: cli.cache_enabled,
        ..CacheConfig::new(&cli.cache_dir)
    }
    .with_time_to_live(Duration::from_secs(cli.cache_ttl))
}

pub fn create_pubmed_client(cli: &Cli) -> Result<PubMedClient> {
    Ok(PubMedClient::with_config(client_config(cli))?)
}

pub fn create_cache(cli: &Cli) -> ResponseCache {
    ResponseCache::new(cache_config(cli))
}
