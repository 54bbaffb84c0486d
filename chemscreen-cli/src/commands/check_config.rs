use anyhow::Result;
use tracing::warn;

use super::{cache_config, client_config};
use crate::Cli;

pub fn execute(cli: &Cli) -> Result<()> {
    let client = client_config(cli);
    let cache = cache_config(cli);

    println!("Base URL:            {}", client.effective_base_url());
    println!("Tool:                {}", client.effective_tool());
    println!("Email:               {}", client.email.as_deref().unwrap_or("(not set)"));
    println!(
        "API key:             {}",
        if client.api_key.is_some() { "set" } else { "(not set)" }
    );
    println!("Rate limit:          {} requests/second", client.effective_rate_limit());
    println!("Request timeout:     {}s", client.timeout.as_secs());
    println!("Concurrent requests: {}", client.concurrent_requests);
    println!("Cache enabled:       {}", cache.enabled);
    println!("Cache directory:     {}", cache.directory.display());
    println!("Cache TTL:           {}s", cache.time_to_live.as_secs());

    let advisories = client.advisories();
    if advisories.is_empty() {
        println!("\nConfiguration OK");
    }
    for advisory in advisories {
        warn!("{advisory}");
    }

    Ok(())
}
