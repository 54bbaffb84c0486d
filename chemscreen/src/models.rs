use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chemical::Chemical;
use crate::error::{ChemScreenError, Result};

/// Options controlling one literature search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SearchParameters {
    date_range_years: u32,
    max_results: u32,
    include_reviews: bool,
    use_cache: bool,
}

impl SearchParameters {
    pub const MIN_DATE_RANGE_YEARS: u32 = 1;
    pub const MAX_DATE_RANGE_YEARS: u32 = 50;
    pub const MIN_RESULTS: u32 = 10;
    pub const MAX_RESULTS: u32 = 10_000;

    /// Build validated search parameters
    ///
    /// # Errors
    ///
    /// Returns `ChemScreenError::InvalidParameter` if `date_range_years` is
    /// outside 1..=50 or `max_results` is outside 10..=10000.
    ///
    /// # Example
    ///
    /// ```
    /// use chemscreen::SearchParameters;
    ///
    /// let params = SearchParameters::new(5, 200, false, true)?;
    /// assert_eq!(params.max_results(), 200);
    /// assert!(SearchParameters::new(0, 200, false, true).is_err());
    /// # Ok::<(), chemscreen::ChemScreenError>(())
    /// ```
    pub fn new(
        date_range_years: u32,
        max_results: u32,
        include_reviews: bool,
        use_cache: bool,
    ) -> Result<Self> {
        if !(Self::MIN_DATE_RANGE_YEARS..=Self::MAX_DATE_RANGE_YEARS).contains(&date_range_years) {
            return Err(ChemScreenError::InvalidParameter {
                name: "date_range_years",
                message: format!(
                    "{date_range_years} is outside {}..={}",
                    Self::MIN_DATE_RANGE_YEARS,
                    Self::MAX_DATE_RANGE_YEARS
                ),
            });
        }
        if !(Self::MIN_RESULTS..=Self::MAX_RESULTS).contains(&max_results) {
            return Err(ChemScreenError::InvalidParameter {
                name: "max_results",
                message: format!(
                    "{max_results} is outside {}..={}",
                    Self::MIN_RESULTS,
                    Self::MAX_RESULTS
                ),
            });
        }

        Ok(Self {
            date_range_years,
            max_results,
            include_reviews,
            use_cache,
        })
    }

    pub fn date_range_years(&self) -> u32 {
        self.date_range_years
    }

    pub fn max_results(&self) -> u32 {
        self.max_results
    }

    pub fn include_reviews(&self) -> bool {
        self.include_reviews
    }

    pub fn use_cache(&self) -> bool {
        self.use_cache
    }
}

impl Default for SearchParameters {
    fn default() -> Self {
        Self {
            date_range_years: 10,
            max_results: 100,
            include_reviews: true,
            use_cache: true,
        }
    }
}

/// One publication returned by a search
///
/// The field names double as the on-disk cache format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Publication {
    /// PubMed ID
    pub pmid: String,
    pub title: String,
    /// Authors in order, formatted "LastName ForeName"
    #[serde(default)]
    pub authors: Vec<String>,
    pub journal: Option<String>,
    pub year: Option<i32>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub doi: Option<String>,
    #[serde(default)]
    pub is_review: bool,
}

/// Outcome of searching one chemical
///
/// A failed search never carries publications: the only way to build one is
/// [`SearchResult::failure`], which leaves the list empty and the count at 0.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    chemical: Chemical,
    search_timestamp: DateTime<Utc>,
    total_count: u64,
    publications: Vec<Publication>,
    error: Option<String>,
    search_time_seconds: f64,
    from_cache: bool,
}

impl SearchResult {
    /// A completed search
    pub fn success(
        chemical: Chemical,
        total_count: u64,
        publications: Vec<Publication>,
        search_time_seconds: f64,
    ) -> Self {
        Self {
            chemical,
            search_timestamp: Utc::now(),
            total_count,
            publications,
            error: None,
            search_time_seconds,
            from_cache: false,
        }
    }

    /// A search that could not be completed
    pub fn failure<S: Into<String>>(
        chemical: Chemical,
        error: S,
        search_time_seconds: f64,
    ) -> Self {
        Self {
            chemical,
            search_timestamp: Utc::now(),
            total_count: 0,
            publications: Vec::new(),
            error: Some(error.into()),
            search_time_seconds,
            from_cache: false,
        }
    }

    /// Rebuild a successful result read back from the cache
    pub(crate) fn cached(
        chemical: Chemical,
        search_timestamp: DateTime<Utc>,
        total_count: u64,
        publications: Vec<Publication>,
        search_time_seconds: f64,
    ) -> Self {
        Self {
            chemical,
            search_timestamp,
            total_count,
            publications,
            error: None,
            search_time_seconds,
            from_cache: true,
        }
    }

    pub fn chemical(&self) -> &Chemical {
        &self.chemical
    }

    pub fn search_timestamp(&self) -> DateTime<Utc> {
        self.search_timestamp
    }

    /// Number of matches reported by the server, which may exceed the
    /// number of publications fetched
    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn publications(&self) -> &[Publication] {
        &self.publications
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn search_time_seconds(&self) -> f64 {
        self.search_time_seconds
    }

    pub fn from_cache(&self) -> bool {
        self.from_cache
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    pub fn is_successful(&self) -> bool {
        self.error.is_none()
    }
}

/// Direction of publication volume over the last five years
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublicationTrend {
    Increasing,
    Decreasing,
    #[default]
    Stable,
}

impl fmt::Display for PublicationTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PublicationTrend::Increasing => "increasing",
            PublicationTrend::Decreasing => "decreasing",
            PublicationTrend::Stable => "stable",
        };
        f.write_str(label)
    }
}

/// Quality indicators computed from one search result
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct QualityMetrics {
    pub total_publications: usize,
    pub review_count: usize,
    pub recent_publications: usize,
    pub publication_trend: PublicationTrend,
    /// 0.0 to 100.0, rounded to one decimal
    pub quality_score: f64,
    pub has_recent_review: bool,
}
