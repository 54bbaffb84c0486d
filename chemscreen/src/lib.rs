//! # ChemScreen
//!
//! Batch literature screening of chemicals against PubMed.
//! Given a list of chemicals, this crate searches PubMed for each one under a
//! shared rate limit, caches the responses on disk, and scores every
//! publication set so chemicals can be compared and triaged.
//!
//! ## Features
//!
//! - **Rate-limited client**: NCBI-compliant request spacing shared across a batch
//! - **Bounded concurrency**: a semaphore caps searches in flight
//! - **Response cache**: one JSON file per search fingerprint with TTL expiry
//! - **Quality scoring**: 0 to 100 score and publication trend per chemical
//! - **Batch summaries**: statistics, priority list and quality tiers
//!
//! ## Quick Start
//!
//! ```no_run
//! use chemscreen::{
//!     BatchCoordinator, CacheConfig, Chemical, ClientConfig, PubMedClient, ResponseCache,
//!     SearchParameters,
//! };
//! use chemscreen::summary::{generate_summary_statistics, score_results};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::new()
//!         .with_email("librarian@agency.gov")
//!         .with_concurrent_requests(2);
//!     let coordinator = BatchCoordinator::for_client(PubMedClient::with_config(config)?)
//!         .with_cache(ResponseCache::new(CacheConfig::default()));
//!
//!     let chemicals = vec![
//!         Chemical::new("Benzene", Some("71-43-2"))?,
//!         Chemical::new("Dichloromethane", Some("75-09-2"))?,
//!     ];
//!
//!     let results = coordinator
//!         .run(&chemicals, &SearchParameters::default(), None)
//!         .await;
//!     let scored = score_results(results);
//!
//!     for (result, metrics) in &scored {
//!         println!(
//!             "{}: {} publications, score {}",
//!             result.chemical().name(),
//!             metrics.total_publications,
//!             metrics.quality_score
//!         );
//!     }
//!     println!("{:?}", generate_summary_statistics(&scored));
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod cache;
pub mod chemical;
pub mod config;
pub mod error;
pub mod models;
pub mod pubmed;
pub mod rate_limit;
pub mod scoring;
pub mod summary;

// Re-export main types for convenience
pub use batch::{
    BatchCoordinator, LiteratureSource, ProgressReporter, batch_search, batch_search_with_config,
};
pub use cache::{CacheStats, ResponseCache};
pub use chemical::Chemical;
pub use config::{CacheConfig, ClientConfig};
pub use error::{ChemScreenError, Result};
pub use models::{Publication, PublicationTrend, QualityMetrics, SearchParameters, SearchResult};
pub use pubmed::PubMedClient;
pub use rate_limit::RateLimiter;
pub use scoring::{calculate_quality_metrics, calculate_quality_metrics_at};
pub use summary::{
    QualityTiers, ScoredResult, SummaryStatistics, generate_summary_statistics,
    group_by_quality_tier, identify_high_priority, score_results,
};
