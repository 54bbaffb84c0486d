use std::result;

use thiserror::Error;

/// Error types for ChemScreen operations
#[derive(Error, Debug)]
pub enum ChemScreenError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),

    /// XML parsing failed
    #[error("XML parsing failed: {0}")]
    XmlError(String),

    /// Non-success HTTP status, or an error reported inside a 200 response
    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    /// IO error for cache file operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Chemical record rejected at construction
    #[error("Invalid chemical: {0}")]
    InvalidChemical(String),

    /// Registry number does not match `\d{2,7}-\d{2}-\d`
    #[error("Invalid CAS number format: {cas}. Expected format: XXXXXX-XX-X")]
    InvalidRegistryNumber { cas: String },

    /// Search parameter out of its allowed range
    #[error("Invalid search parameter {name}: {message}")]
    InvalidParameter { name: &'static str, message: String },

    /// HTTP client could not be built from the configuration
    #[error("Failed to create HTTP client: {0}")]
    ClientBuild(String),

    /// A search task panicked or was cancelled before producing a result
    #[error("{0}")]
    TaskFailed(String),
}

pub type Result<T> = result::Result<T, ChemScreenError>;

impl ChemScreenError {
    /// True when the underlying transport could not reach the server
    pub fn is_connection_failure(&self) -> bool {
        match self {
            ChemScreenError::RequestError(err) => err.is_connect(),
            _ => false,
        }
    }

    /// True when the request timed out
    pub fn is_timeout(&self) -> bool {
        match self {
            ChemScreenError::RequestError(err) => err.is_timeout(),
            _ => false,
        }
    }

    /// HTTP status of a non-2xx response, if this error carries one
    pub fn http_status(&self) -> Option<u16> {
        match self {
            ChemScreenError::ApiError { status, .. } if *status != 200 => Some(*status),
            ChemScreenError::RequestError(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Message stored in `SearchResult::error` for a failed search.
    ///
    /// The prefixes are stable: `Connection failed:`, `Request timeout:`,
    /// `HTTP error {status}:` and `Search failed:`.
    pub fn failure_message(&self) -> String {
        if self.is_timeout() {
            format!("Request timeout: {self}")
        } else if self.is_connection_failure() {
            format!("Connection failed: {self}")
        } else if let Some(status) = self.http_status() {
            format!("HTTP error {status}: {self}")
        } else {
            format!("Search failed: {self}")
        }
    }
}
