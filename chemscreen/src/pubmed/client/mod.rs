mod efetch;

use std::time::Instant;

use reqwest::{Client, Response};
use tracing::{debug, info, instrument, warn};

use crate::chemical::Chemical;
use crate::config::ClientConfig;
use crate::error::{ChemScreenError, Result};
use crate::models::{Publication, SearchParameters, SearchResult};
use crate::pubmed::query::ChemicalQuery;
use crate::pubmed::responses::ESearchResult;
use crate::rate_limit::RateLimiter;

/// Client for the PubMed E-utilities
///
/// Every request waits on one shared [`RateLimiter`], and clones share it too,
/// so any number of tasks using clones of one client stay within the NCBI
/// limit together.
#[derive(Clone)]
pub struct PubMedClient {
    client: Client,
    pub(crate) base_url: String,
    rate_limiter: RateLimiter,
    config: ClientConfig,
}

impl PubMedClient {
    /// Create a client with default configuration
    ///
    /// Uses default NCBI rate limiting (3 requests/second) and no API key.
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::new())
    }

    /// Create a client with custom configuration
    ///
    /// # Errors
    ///
    /// Returns `ChemScreenError::ClientBuild` if the HTTP client cannot be
    /// constructed (for example when no TLS backend is available).
    ///
    /// # Example
    ///
    /// ```
    /// use chemscreen::{ClientConfig, PubMedClient};
    ///
    /// let config = ClientConfig::new()
    ///     .with_api_key("your_api_key_here")
    ///     .with_email("librarian@agency.gov")
    ///     .with_timeout_seconds(15);
    ///
    /// let client = PubMedClient::with_config(config)?;
    /// # Ok::<(), chemscreen::ChemScreenError>(())
    /// ```
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.effective_user_agent())
            .timeout(config.timeout)
            .build()
            .map_err(|e| ChemScreenError::ClientBuild(e.to_string()))?;

        Ok(Self::with_client(client, config))
    }

    /// Create a client around an existing reqwest client
    pub fn with_client(client: Client, config: ClientConfig) -> Self {
        let rate_limiter = config.create_rate_limiter();
        let base_url = config.effective_base_url().to_string();

        Self {
            client,
            base_url,
            rate_limiter,
            config,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    /// Search PubMed for one chemical
    ///
    /// Runs ESearch for matching PMIDs, then a single EFetch for their
    /// details. This never returns an error: failures are recorded in
    /// [`SearchResult::error`] with a `Connection failed:`, `Request timeout:`,
    /// `HTTP error {status}:` or `Search failed:` prefix.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use chemscreen::{Chemical, PubMedClient, SearchParameters};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let client = PubMedClient::new()?;
    ///     let benzene = Chemical::new("Benzene", Some("71-43-2"))?;
    ///
    ///     let result = client.search(&benzene, &SearchParameters::default()).await;
    ///     match result.error() {
    ///         Some(error) => eprintln!("{error}"),
    ///         None => println!("{} publications", result.publications().len()),
    ///     }
    ///     Ok(())
    /// }
    /// ```
    #[instrument(skip(self, chemical, params), fields(chemical = %chemical.name()))]
    pub async fn search(&self, chemical: &Chemical, params: &SearchParameters) -> SearchResult {
        let started = Instant::now();

        let outcome = self.search_and_fetch(chemical, params).await;
        let elapsed = started.elapsed().as_secs_f64();

        match outcome {
            Ok((total_count, publications)) => {
                info!(
                    total_count,
                    fetched = publications.len(),
                    elapsed_seconds = elapsed,
                    "Search completed"
                );
                SearchResult::success(chemical.clone(), total_count, publications, elapsed)
            }
            Err(e) => {
                let message = e.failure_message();
                warn!(error = %message, "Search failed");
                SearchResult::failure(chemical.clone(), message, elapsed)
            }
        }
    }

    async fn search_and_fetch(
        &self,
        chemical: &Chemical,
        params: &SearchParameters,
    ) -> Result<(u64, Vec<Publication>)> {
        let query = ChemicalQuery::new(chemical, params).build();
        let (total_count, pmids) = self.search_ids(&query, params.max_results()).await?;

        if pmids.is_empty() {
            return Ok((total_count, Vec::new()));
        }

        let publications = self.fetch_publications(&pmids).await?;
        Ok((total_count, publications))
    }

    /// Run ESearch and return the server-reported count with up to
    /// `max_results` PMIDs sorted by relevance
    ///
    /// # Errors
    ///
    /// * `ChemScreenError::RequestError` - If the HTTP request fails or the
    ///   JSON body cannot be decoded
    /// * `ChemScreenError::ApiError` - On a non-2xx status or an `ERROR` field
    ///   in the response body
    #[instrument(skip(self), fields(query = %query))]
    pub async fn search_ids(&self, query: &str, max_results: u32) -> Result<(u64, Vec<String>)> {
        let url = format!(
            "{}/esearch.fcgi?db=pubmed&term={}&retmax={}&retmode=json&sort=relevance",
            self.base_url,
            urlencoding::encode(query),
            max_results
        );

        debug!("Making ESearch API request");
        let response = self.make_request(&url).await?;
        let search_result: ESearchResult = response.json().await.map_err(without_url)?;

        // NCBI sometimes returns 200 OK with an ERROR field
        if let Some(error_msg) = &search_result.esearchresult.error {
            return Err(ChemScreenError::ApiError {
                status: 200,
                message: format!("NCBI ESearch API error: {error_msg}"),
            });
        }

        let total_count = search_result.esearchresult.total_count();
        debug!(
            total_count,
            returned = search_result.esearchresult.idlist.len(),
            "ESearch completed"
        );

        Ok((total_count, search_result.esearchresult.idlist))
    }

    /// GET a URL after waiting on the rate limiter.
    /// Automatically appends API parameters (api_key, email, tool) to the URL.
    /// Neither the log line nor a returned error contains those parameters.
    pub(crate) async fn make_request(&self, url: &str) -> Result<Response> {
        let mut final_url = url.to_string();
        let api_params = self.config.build_api_params();

        if !api_params.is_empty() {
            let separator = if url.contains('?') { '&' } else { '?' };
            final_url.push(separator);

            let param_strings: Vec<String> = api_params
                .into_iter()
                .map(|(key, value)| format!("{}={}", key, urlencoding::encode(&value)))
                .collect();
            final_url.push_str(&param_strings.join("&"));
        }

        self.rate_limiter.wait().await;
        debug!(url = %url, "Making API request");
        let response = self
            .client
            .get(&final_url)
            .send()
            .await
            .map_err(without_url)?;

        check_status(response)
    }

    /// POST a form body after waiting on the rate limiter.
    /// API parameters are appended to the form.
    pub(crate) async fn make_form_request(
        &self,
        url: &str,
        mut form: Vec<(String, String)>,
    ) -> Result<Response> {
        form.extend(self.config.build_api_params());

        self.rate_limiter.wait().await;
        debug!("Making POST request to: {}", url);
        let response = self
            .client
            .post(url)
            .form(&form)
            .send()
            .await
            .map_err(without_url)?;

        check_status(response)
    }
}

/// Drop the request URL from a reqwest error; it carries the API key
fn without_url(error: reqwest::Error) -> ChemScreenError {
    ChemScreenError::RequestError(error.without_url())
}

fn check_status(response: Response) -> Result<Response> {
    if !response.status().is_success() {
        warn!("API request failed with status: {}", response.status());
        return Err(ChemScreenError::ApiError {
            status: response.status().as_u16(),
            message: response
                .status()
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string(),
        });
    }

    Ok(response)
}
