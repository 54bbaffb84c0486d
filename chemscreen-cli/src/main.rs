use std::path::PathBuf;

use anyhow::Result;
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser, Subcommand};
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;

#[derive(Parser)]
#[command(
    name = "chemscreen",
    about = "Batch literature screening of chemicals against PubMed",
    long_about = "Searches PubMed for a list of chemicals under NCBI rate limits, caches the \
                  responses and scores each chemical's literature base"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// API key for NCBI E-utilities (raises the rate limit to 10 requests/second)
    #[arg(long, env = "PUBMED_API_KEY", global = true)]
    api_key: Option<String>,

    /// Email for NCBI requests (recommended)
    #[arg(long, env = "PUBMED_EMAIL", global = true)]
    email: Option<String>,

    /// Tool name for NCBI requests
    #[arg(long, env = "PUBMED_TOOL_NAME", default_value = "ChemScreen", global = true)]
    tool: String,

    /// HTTP request timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT", default_value_t = 30, global = true)]
    timeout: u64,

    /// Maximum chemicals searched at once
    #[arg(long, env = "CONCURRENT_REQUESTS", default_value_t = 1, global = true)]
    concurrent_requests: usize,

    /// Read and write the response cache (true/false, yes/no, 1/0; any case)
    #[arg(
        long,
        env = "CACHE_ENABLED",
        default_value_t = true,
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    cache_enabled: bool,

    /// Directory holding cached responses
    #[arg(long, env = "CACHE_DIR", default_value = "./data/cache", global = true)]
    cache_dir: PathBuf,

    /// Seconds before a cached response expires
    #[arg(long, env = "CACHE_TTL", default_value_t = 3600, global = true)]
    cache_ttl: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Search PubMed for a list of chemicals and score the results
    Search(commands::search::Search),
    /// Inspect or clean the response cache
    Cache(commands::cache::Cache),
    /// Show the effective configuration and any advisories
    #[command(name = "check-config")]
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Initialize tracing with indicatif layer for progress bars
    let filter = if cli.verbose { "debug" } else { "info" };

    let indicatif_layer = IndicatifLayer::new();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(indicatif_layer.get_stderr_writer()),
        )
        .with(indicatif_layer)
        .with(tracing_subscriber::EnvFilter::new(filter))
        .init();

    match &cli.command {
        Commands::Search(cmd) => cmd.execute(&cli).await,
        Commands::Cache(cmd) => cmd.execute(&cli).await,
        Commands::CheckConfig => commands::check_config::execute(&cli),
    }
}
