//! Batch search coordination
//!
//! [`BatchCoordinator`] runs one search per chemical under a concurrency
//! bound. Each search is its own task, so a slow progress callback never holds
//! back searches already in flight, and a panicking search only fails its own
//! chemical.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures_util::FutureExt;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use crate::cache::ResponseCache;
use crate::chemical::Chemical;
use crate::config::ClientConfig;
use crate::error::{ChemScreenError, Result};
use crate::models::{SearchParameters, SearchResult};
use crate::pubmed::PubMedClient;

/// Anything that can search the literature for one chemical
///
/// Implementations report failures inside the returned [`SearchResult`]
/// rather than as errors.
#[async_trait]
pub trait LiteratureSource: Send + Sync {
    async fn search(&self, chemical: &Chemical, params: &SearchParameters) -> SearchResult;
}

#[async_trait]
impl LiteratureSource for PubMedClient {
    async fn search(&self, chemical: &Chemical, params: &SearchParameters) -> SearchResult {
        PubMedClient::search(self, chemical, params).await
    }
}

/// Receives batch progress after each chemical completes
///
/// `fraction` is `completed / total`: non-decreasing, and exactly `1.0` on
/// the last call. Any `Fn(f64, &Chemical)` closure is a reporter.
#[async_trait]
pub trait ProgressReporter: Send + Sync {
    async fn report(&self, fraction: f64, chemical: &Chemical);
}

#[async_trait]
impl<F> ProgressReporter for F
where
    F: Fn(f64, &Chemical) + Send + Sync,
{
    async fn report(&self, fraction: f64, chemical: &Chemical) {
        self(fraction, chemical)
    }
}

/// Runs a [`LiteratureSource`] over many chemicals
pub struct BatchCoordinator<S> {
    source: Arc<S>,
    cache: Option<Arc<ResponseCache>>,
    max_concurrent: usize,
}

impl<S> BatchCoordinator<S>
where
    S: LiteratureSource + 'static,
{
    /// Create a coordinator that searches one chemical at a time
    pub fn new(source: S) -> Self {
        Self::from_shared(Arc::new(source))
    }

    pub fn from_shared(source: Arc<S>) -> Self {
        Self {
            source,
            cache: None,
            max_concurrent: 1,
        }
    }

    /// Consult and fill this cache for searches whose parameters allow it
    pub fn with_cache(mut self, cache: ResponseCache) -> Self {
        self.cache = Some(Arc::new(cache));
        self
    }

    /// Maximum searches in flight at once; values below 1 are raised to 1
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Search every chemical and return one result per chemical
    ///
    /// Results arrive in completion order; match them to inputs through
    /// [`SearchResult::chemical`]. Per-chemical failures are carried in the
    /// results, never returned as errors.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use chemscreen::{BatchCoordinator, CacheConfig, Chemical, ClientConfig, PubMedClient,
    ///     ResponseCache, SearchParameters};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let config = ClientConfig::new().with_concurrent_requests(3);
    ///     let coordinator = BatchCoordinator::for_client(PubMedClient::with_config(config)?)
    ///         .with_cache(ResponseCache::new(CacheConfig::default()));
    ///
    ///     let chemicals = vec![
    ///         Chemical::new("Benzene", Some("71-43-2"))?,
    ///         Chemical::new("Toluene", Some("108-88-3"))?,
    ///     ];
    ///     let progress = |fraction: f64, chemical: &Chemical| {
    ///         println!("{:>3.0}% {}", fraction * 100.0, chemical.name());
    ///     };
    ///
    ///     let results = coordinator
    ///         .run(&chemicals, &SearchParameters::default(), Some(&progress))
    ///         .await;
    ///     assert_eq!(results.len(), 2);
    ///     Ok(())
    /// }
    /// ```
    #[instrument(skip_all, fields(chemicals = chemicals.len(), max_concurrent = self.max_concurrent))]
    pub async fn run(
        &self,
        chemicals: &[Chemical],
        params: &SearchParameters,
        progress: Option<&dyn ProgressReporter>,
    ) -> Vec<SearchResult> {
        let total = chemicals.len();
        if total == 0 {
            return Vec::new();
        }

        let started = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks = JoinSet::new();

        for (index, chemical) in chemicals.iter().cloned().enumerate() {
            let source = Arc::clone(&self.source);
            let cache = self.cache.clone();
            let semaphore = Arc::clone(&semaphore);
            let params = *params;

            tasks.spawn(async move {
                let task_started = Instant::now();
                let outcome =
                    AssertUnwindSafe(search_one(source, cache, semaphore, &chemical, &params))
                        .catch_unwind()
                        .await;

                let result = outcome.unwrap_or_else(|panic| {
                    let message = panic_message(panic.as_ref());
                    warn!(chemical = %chemical.name(), panic = %message, "Search task panicked");
                    SearchResult::failure(
                        chemical.clone(),
                        ChemScreenError::TaskFailed(message).failure_message(),
                        task_started.elapsed().as_secs_f64(),
                    )
                });

                (index, result)
            });
        }

        let mut results = Vec::with_capacity(total);
        let mut finished = vec![false; total];
        let mut completed = 0usize;

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => {
                    finished[index] = true;
                    completed += 1;
                    if let Some(progress) = progress {
                        progress
                            .report(completed as f64 / total as f64, result.chemical())
                            .await;
                    }
                    results.push(result);
                }
                Err(e) => warn!(error = %e, "Search task ended without a result"),
            }
        }

        // A task can only vanish if the runtime cancelled it
        for (index, chemical) in chemicals.iter().enumerate() {
            if finished[index] {
                continue;
            }
            completed += 1;
            let result = SearchResult::failure(
                chemical.clone(),
                ChemScreenError::TaskFailed("search task ended without a result".to_string())
                    .failure_message(),
                0.0,
            );
            if let Some(progress) = progress {
                progress
                    .report(completed as f64 / total as f64, result.chemical())
                    .await;
            }
            results.push(result);
        }

        let failed = results.iter().filter(|r| r.is_failed()).count();
        let cached = results.iter().filter(|r| r.from_cache()).count();
        info!(
            total,
            failed,
            cached,
            elapsed_seconds = started.elapsed().as_secs_f64(),
            "Batch search completed"
        );

        results
    }
}

impl BatchCoordinator<PubMedClient> {
    /// Create a coordinator using the client's configured concurrency
    pub fn for_client(client: PubMedClient) -> Self {
        let max_concurrent = client.config().concurrent_requests;
        Self::new(client).with_max_concurrent(max_concurrent)
    }
}

async fn search_one<S>(
    source: Arc<S>,
    cache: Option<Arc<ResponseCache>>,
    semaphore: Arc<Semaphore>,
    chemical: &Chemical,
    params: &SearchParameters,
) -> SearchResult
where
    S: LiteratureSource + ?Sized,
{
    let cache = cache.filter(|_| params.use_cache());

    if let Some(cache) = &cache {
        if let Some(hit) = cache.get(chemical, params).await {
            debug!(chemical = %chemical.name(), "Using cached result");
            return hit;
        }
    }

    // The semaphore is never closed, so acquisition only fails on shutdown
    let _permit = semaphore.acquire().await.ok();
    let result = source.search(chemical, params).await;

    if let Some(cache) = &cache {
        if result.is_successful() {
            cache.save(&result, params).await;
        }
    }

    result
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "search task panicked".to_string()
    }
}

/// Search a list of chemicals against PubMed with default client settings
///
/// The cache is not used and searches run one at a time.
///
/// # Errors
///
/// Returns an error only for out-of-range parameters or when the HTTP client
/// cannot be built; failures of individual searches are carried in the
/// results.
pub async fn batch_search(
    chemicals: &[Chemical],
    max_results_per_chemical: u32,
    date_range_years: u32,
    include_reviews: bool,
    api_key: Option<&str>,
    progress: Option<&dyn ProgressReporter>,
) -> Result<Vec<SearchResult>> {
    let mut config = ClientConfig::new();
    if let Some(api_key) = api_key {
        config = config.with_api_key(api_key);
    }

    let params =
        SearchParameters::new(date_range_years, max_results_per_chemical, include_reviews, false)?;

    batch_search_with_config(config, chemicals, &params, progress).await
}

/// [`batch_search`] with an explicit client configuration
pub async fn batch_search_with_config(
    config: ClientConfig,
    chemicals: &[Chemical],
    params: &SearchParameters,
    progress: Option<&dyn ProgressReporter>,
) -> Result<Vec<SearchResult>> {
    let client = PubMedClient::with_config(config)?;
    Ok(BatchCoordinator::for_client(client)
        .run(chemicals, params, progress)
        .await)
}
