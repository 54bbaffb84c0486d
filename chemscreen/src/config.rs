//! Client and cache configuration
//!
//! Configuration is plain data passed into the components that need it. Nothing
//! here reads the environment; binaries decide where values come from.

use std::path::PathBuf;
use std::time::Duration;

use crate::rate_limit::RateLimiter;

/// Default NCBI E-utilities endpoint
pub const DEFAULT_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

/// Tool name reported to NCBI when none is configured
pub const DEFAULT_TOOL: &str = "ChemScreen";

/// Configuration for the PubMed client and batch coordinator
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// NCBI API key (raises the rate limit from 3 to 10 requests/second)
    pub api_key: Option<String>,
    /// Contact email sent with every request
    pub email: Option<String>,
    /// Tool identification string sent with every request
    pub tool: Option<String>,
    /// Explicit rate limit overriding the API-key based default
    pub rate_limit: Option<f64>,
    /// Override for the E-utilities base URL (used by tests)
    pub base_url: Option<String>,
    /// Per-request HTTP timeout
    pub timeout: Duration,
    /// Maximum number of chemicals searched at the same time
    pub concurrent_requests: usize,
    /// Custom user agent
    pub user_agent: Option<String>,
}

impl ClientConfig {
    /// Create a configuration with NCBI defaults
    ///
    /// # Example
    ///
    /// ```
    /// use chemscreen::ClientConfig;
    ///
    /// let config = ClientConfig::new()
    ///     .with_api_key("your_api_key_here")
    ///     .with_email("librarian@agency.gov");
    /// assert_eq!(config.effective_rate_limit(), 10.0);
    /// ```
    pub fn new() -> Self {
        Self {
            api_key: None,
            email: None,
            tool: None,
            rate_limit: None,
            base_url: None,
            timeout: Duration::from_secs(30),
            concurrent_requests: 1,
            user_agent: None,
        }
    }

    pub fn with_api_key<S: Into<String>>(mut self, api_key: S) -> Self {
        let key = api_key.into();
        self.api_key = if key.trim().is_empty() { None } else { Some(key) };
        self
    }

    pub fn with_email<S: Into<String>>(mut self, email: S) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_tool<S: Into<String>>(mut self, tool: S) -> Self {
        self.tool = Some(tool.into());
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: f64) -> Self {
        self.rate_limit = Some(rate_limit);
        self
    }

    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_timeout_seconds(mut self, seconds: u64) -> Self {
        self.timeout = Duration::from_secs(seconds);
        self
    }

    /// Concurrency bound for batch searches; values below 1 are raised to 1
    pub fn with_concurrent_requests(mut self, concurrent_requests: usize) -> Self {
        self.concurrent_requests = concurrent_requests.max(1);
        self
    }

    pub fn with_user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Requests per second: explicit override, else 10 with an API key, else 3
    pub fn effective_rate_limit(&self) -> f64 {
        match (self.rate_limit, &self.api_key) {
            (Some(rate), _) => rate,
            (None, Some(_)) => 10.0,
            (None, None) => 3.0,
        }
    }

    pub fn effective_base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
            .unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn effective_tool(&self) -> &str {
        self.tool.as_deref().unwrap_or(DEFAULT_TOOL)
    }

    pub fn effective_user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(|| format!("chemscreen/{}", env!("CARGO_PKG_VERSION")))
    }

    /// Identification parameters appended to every E-utilities request
    pub fn build_api_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();

        if let Some(api_key) = &self.api_key {
            params.push(("api_key".to_string(), api_key.clone()));
        }
        if let Some(email) = &self.email {
            params.push(("email".to_string(), email.clone()));
        }
        params.push(("tool".to_string(), self.effective_tool().to_string()));

        params
    }

    pub fn create_rate_limiter(&self) -> RateLimiter {
        RateLimiter::new(self.effective_rate_limit())
    }

    /// Non-fatal configuration problems worth telling the user about
    pub fn advisories(&self) -> Vec<String> {
        let mut advisories = Vec::new();

        if self.api_key.is_none() {
            advisories.push(format!(
                "PUBMED_API_KEY not set - searches will be rate limited to {} requests/second",
                self.effective_rate_limit()
            ));
        }
        if self.email.is_none() {
            advisories
                .push("PUBMED_EMAIL not set - recommended for API usage identification".to_string());
        }

        advisories
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for the on-disk response cache
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// When false the cache never reads or writes
    pub enabled: bool,
    /// Directory holding one JSON file per search fingerprint
    pub directory: PathBuf,
    /// Entries older than this are treated as misses
    pub time_to_live: Duration,
}

impl CacheConfig {
    pub fn new<P: Into<PathBuf>>(directory: P) -> Self {
        Self {
            directory: directory.into(),
            ..Self::default()
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn with_time_to_live(mut self, time_to_live: Duration) -> Self {
        self.time_to_live = time_to_live;
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: PathBuf::from("./data/cache"),
            time_to_live: Duration::from_secs(3600),
        }
    }
}
