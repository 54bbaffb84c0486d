//! File-backed cache of successful search results
//!
//! Each entry is a pretty-printed JSON file named after the SHA-256
//! fingerprint of the search (chemical identity plus parameters). The file's
//! modification time is the TTL clock.

use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;
use tracing::{debug, info, instrument, warn};

use crate::chemical::Chemical;
use crate::config::CacheConfig;
use crate::models::{Publication, SearchParameters, SearchResult};

/// On-disk layout of one cache file
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    search_timestamp: DateTime<Utc>,
    total_count: u64,
    search_time_seconds: f64,
    publications: Vec<Publication>,
}

/// Snapshot of the cache directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub total_files: usize,
    pub total_size_bytes: u64,
    pub expired_files: usize,
    pub valid_files: usize,
    pub cache_directory: PathBuf,
}

/// Compute the cache fingerprint of a search
///
/// Only the lower-cased name, the registry number and the parameters that
/// change the result set take part; synonyms, notes and `use_cache` do not.
///
/// ```
/// use chemscreen::{Chemical, SearchParameters};
/// use chemscreen::cache::fingerprint;
///
/// let params = SearchParameters::default();
/// let a = Chemical::new("Benzene", Some("71-43-2"))?;
/// let b = Chemical::new("BENZENE", Some("71-43-2"))?.with_synonyms(["Benzol"]);
/// assert_eq!(fingerprint(&a, &params), fingerprint(&b, &params));
/// assert_eq!(fingerprint(&a, &params).len(), 64);
/// # Ok::<(), chemscreen::ChemScreenError>(())
/// ```
pub fn fingerprint(chemical: &Chemical, params: &SearchParameters) -> String {
    let key = format!(
        "{}|{}|{}|{}|{}",
        chemical.name().to_lowercase(),
        chemical.registry_number().unwrap_or("no_cas"),
        params.date_range_years(),
        params.max_results(),
        params.include_reviews()
    );

    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Response cache rooted at a directory
///
/// The directory is created on the first write; a disabled cache never
/// touches the filesystem.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    config: CacheConfig,
}

impl ResponseCache {
    pub fn new(config: CacheConfig) -> Self {
        Self { config }
    }

    pub fn disabled() -> Self {
        Self::new(CacheConfig::disabled())
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn directory(&self) -> &Path {
        &self.config.directory
    }

    pub fn time_to_live(&self) -> Duration {
        self.config.time_to_live
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.config.directory.join(format!("{key}.json"))
    }

    /// True while the file is younger than the TTL
    fn is_fresh(&self, modified: SystemTime) -> bool {
        // A modification time in the future counts as age zero
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO);
        age < self.config.time_to_live
    }

    /// Look up a previous result for this chemical and parameter set
    ///
    /// Returns `None` when the cache is disabled, no entry exists or the entry
    /// has expired. An entry that cannot be read or decoded is deleted.
    #[instrument(skip(self, chemical, params), fields(chemical = %chemical.name()))]
    pub async fn get(&self, chemical: &Chemical, params: &SearchParameters) -> Option<SearchResult> {
        if !self.config.enabled {
            return None;
        }

        let path = self.entry_path(&fingerprint(chemical, params));

        let modified = match fs::metadata(&path).await.and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Cache miss");
                return None;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not stat cache file");
                return None;
            }
        };

        if !self.is_fresh(modified) {
            debug!("Cache entry expired");
            return None;
        }

        let entry = match read_entry(&path).await {
            Ok(entry) => entry,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Removing unreadable cache file");
                if let Err(e) = fs::remove_file(&path).await {
                    warn!(path = %path.display(), error = %e, "Could not remove cache file");
                }
                return None;
            }
        };

        debug!(publications = entry.publications.len(), "Cache hit");
        Some(SearchResult::cached(
            chemical.clone(),
            entry.search_timestamp,
            entry.total_count,
            entry.publications,
            entry.search_time_seconds,
        ))
    }

    /// Store a successful result, returning whether it was written
    ///
    /// Failed results are never cached. The entry is written to a temporary
    /// sibling file and renamed into place, so readers see either the old or
    /// the new entry. Concurrent writers of the same key: last one wins.
    #[instrument(skip(self, result, params), fields(chemical = %result.chemical().name()))]
    pub async fn save(&self, result: &SearchResult, params: &SearchParameters) -> bool {
        if !self.config.enabled || result.is_failed() {
            return false;
        }

        let path = self.entry_path(&fingerprint(result.chemical(), params));
        let entry = CacheEntry {
            search_timestamp: result.search_timestamp(),
            total_count: result.total_count(),
            search_time_seconds: result.search_time_seconds(),
            publications: result.publications().to_vec(),
        };

        match self.write_entry(&path, &entry).await {
            Ok(()) => {
                info!(path = %path.display(), "Cached search result");
                true
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to write cache file");
                false
            }
        }
    }

    async fn write_entry(&self, path: &Path, entry: &CacheEntry) -> io::Result<()> {
        let json = serde_json::to_string_pretty(entry)?;

        fs::create_dir_all(&self.config.directory).await?;

        let temp_path = path.with_extension(format!("json.{:016x}.tmp", rand::random::<u64>()));
        if let Err(e) = fs::write(&temp_path, json).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e);
        }
        if let Err(e) = fs::rename(&temp_path, path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e);
        }

        Ok(())
    }

    /// Paths and metadata of every `*.json` entry in the cache directory
    async fn entries(&self) -> Vec<(PathBuf, std::fs::Metadata)> {
        let mut read_dir = match fs::read_dir(&self.config.directory).await {
            Ok(read_dir) => read_dir,
            Err(e) => {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!(error = %e, "Could not list cache directory");
                }
                return Vec::new();
            }
        };

        let mut entries = Vec::new();
        loop {
            match read_dir.next_entry().await {
                Ok(Some(dir_entry)) => {
                    let path = dir_entry.path();
                    if path.extension().is_none_or(|ext| ext != "json") {
                        continue;
                    }
                    match dir_entry.metadata().await {
                        Ok(metadata) if metadata.is_file() => entries.push((path, metadata)),
                        Ok(_) => {}
                        Err(e) => warn!(path = %path.display(), error = %e, "Could not stat cache file"),
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "Error while listing cache directory");
                    break;
                }
            }
        }

        entries
    }

    /// Delete every entry, returning how many were removed
    pub async fn clear(&self) -> usize {
        if !self.config.enabled {
            return 0;
        }

        let mut removed = 0;
        for (path, _) in self.entries().await {
            match fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) => warn!(path = %path.display(), error = %e, "Error deleting cache file"),
            }
        }

        info!(removed, "Cleared cache");
        removed
    }

    /// Delete entries older than the TTL, returning how many were removed
    pub async fn clear_expired(&self) -> usize {
        if !self.config.enabled {
            return 0;
        }

        let mut removed = 0;
        for (path, metadata) in self.entries().await {
            let fresh = metadata.modified().is_ok_and(|m| self.is_fresh(m));
            if fresh {
                continue;
            }
            match fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Error deleting expired cache file")
                }
            }
        }

        info!(removed, "Cleared expired cache entries");
        removed
    }

    pub async fn stats(&self) -> CacheStats {
        let mut stats = CacheStats {
            total_files: 0,
            total_size_bytes: 0,
            expired_files: 0,
            valid_files: 0,
            cache_directory: self.config.directory.clone(),
        };

        if !self.config.enabled {
            return stats;
        }

        for (_, metadata) in self.entries().await {
            stats.total_files += 1;
            stats.total_size_bytes += metadata.len();
            if metadata.modified().is_ok_and(|m| self.is_fresh(m)) {
                stats.valid_files += 1;
            } else {
                stats.expired_files += 1;
            }
        }

        stats
    }
}

async fn read_entry(path: &Path) -> io::Result<CacheEntry> {
    let contents = fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&contents)?)
}
