//! Integration tests for the file-backed response cache
//!
//! Every test works in its own temporary directory. Expiry is exercised by
//! back-dating cache files rather than sleeping.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chemscreen::cache::fingerprint;
use chemscreen::{
    CacheConfig, Chemical, Publication, ResponseCache, SearchParameters, SearchResult,
};

const HOUR: Duration = Duration::from_secs(3600);

fn cache_in(dir: &Path) -> ResponseCache {
    ResponseCache::new(CacheConfig::new(dir.join("cache")).with_time_to_live(HOUR))
}

fn publication(pmid: &str, year: i32, is_review: bool) -> Publication {
    Publication {
        pmid: pmid.to_string(),
        title: format!("Occupational exposure study {pmid}"),
        authors: vec!["Garcia Maria".to_string(), "Chen Wei".to_string()],
        journal: Some("Occupational and Environmental Medicine".to_string()),
        year: Some(year),
        abstract_text: Some("Workers exposed to solvent vapours were followed.".to_string()),
        doi: Some(format!("10.1136/oem.{pmid}")),
        is_review,
    }
}

fn successful_result(chemical: &Chemical) -> SearchResult {
    let publications = vec![
        publication("31111111", 2022, false),
        publication("32222222", 2019, true),
    ];
    SearchResult::success(chemical.clone(), 1523, publications, 1.25)
}

fn entry_path(cache: &ResponseCache, chemical: &Chemical, params: &SearchParameters) -> PathBuf {
    cache
        .directory()
        .join(format!("{}.json", fingerprint(chemical, params)))
}

fn backdate(path: &Path, by: Duration) {
    let file = std::fs::OpenOptions::new().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() - by).unwrap();
}

#[tokio::test]
async fn test_saved_result_comes_back_from_cache() {
    let dir = tempfile::tempdir().unwrap();
    let cache = cache_in(dir.path());
    let chemical = Chemical::new("Trichloroethylene", Some("79-01-6")).unwrap();
    let params = SearchParameters::default();
    let original = successful_result(&chemical);

    assert!(cache.save(&original, &params).await);
    let cached = cache.get(&chemical, &params).await.unwrap();

    assert!(cached.from_cache());
    assert!(cached.error().is_none());
    assert_eq!(cached.total_count(), 1523);
    assert_eq!(cached.publications(), original.publications());
    assert_eq!(cached.search_timestamp(), original.search_timestamp());
    assert_eq!(cached.search_time_seconds(), 1.25);
    assert_eq!(cached.chemical().name(), "Trichloroethylene");
}

#[tokio::test]
async fn test_lookup_uses_callers_chemical_record() {
    let dir = tempfile::tempdir().unwrap();
    let cache = cache_in(dir.path());
    let params = SearchParameters::default();
    let stored = Chemical::new("Toluene", Some("108-88-3")).unwrap();
    cache.save(&successful_result(&stored), &params).await;

    let caller = Chemical::new("TOLUENE", Some("108-88-3"))
        .unwrap()
        .with_synonyms(["Methylbenzene"]);
    let cached = cache.get(&caller, &params).await.unwrap();

    assert_eq!(cached.chemical().name(), "TOLUENE");
    assert_eq!(cached.chemical().synonyms(), ["Methylbenzene"]);
}

#[tokio::test]
async fn test_different_parameters_miss() {
    let dir = tempfile::tempdir().unwrap();
    let cache = cache_in(dir.path());
    let chemical = Chemical::new("Styrene", Some("100-42-5")).unwrap();
    cache
        .save(&successful_result(&chemical), &SearchParameters::default())
        .await;

    let narrower = SearchParameters::new(5, 100, true, true).unwrap();
    assert!(cache.get(&chemical, &narrower).await.is_none());
}

#[tokio::test]
async fn test_failed_results_are_not_cached() {
    let dir = tempfile::tempdir().unwrap();
    let cache = cache_in(dir.path());
    let chemical = Chemical::new("Benzene", Some("71-43-2")).unwrap();
    let params = SearchParameters::default();
    let failed = SearchResult::failure(chemical.clone(), "HTTP error 503: unavailable", 0.4);

    assert!(!cache.save(&failed, &params).await);
    assert!(cache.get(&chemical, &params).await.is_none());
    assert_eq!(cache.stats().await.total_files, 0);
}

#[tokio::test]
async fn test_corrupt_entry_is_removed() {
    let dir = tempfile::tempdir().unwrap();
    let cache = cache_in(dir.path());
    let chemical = Chemical::new("Benzene", Some("71-43-2")).unwrap();
    let params = SearchParameters::default();
    let path = entry_path(&cache, &chemical, &params);

    std::fs::create_dir_all(cache.directory()).unwrap();
    std::fs::write(&path, "{\"search_timestamp\": ").unwrap();

    assert!(cache.get(&chemical, &params).await.is_none());
    assert!(!path.exists());
}

#[tokio::test]
async fn test_expired_entry_is_a_miss() {
    let dir = tempfile::tempdir().unwrap();
    let cache = cache_in(dir.path());
    let chemical = Chemical::new("Xylene", Some("1330-20-7")).unwrap();
    let params = SearchParameters::default();

    cache.save(&successful_result(&chemical), &params).await;
    backdate(&entry_path(&cache, &chemical, &params), 2 * HOUR);

    assert!(cache.get(&chemical, &params).await.is_none());
}

#[tokio::test]
async fn test_zero_time_to_live_never_hits() {
    let dir = tempfile::tempdir().unwrap();
    let cache = ResponseCache::new(
        CacheConfig::new(dir.path().join("cache")).with_time_to_live(Duration::ZERO),
    );
    let chemical = Chemical::new("Xylene", None).unwrap();
    let params = SearchParameters::default();

    assert!(cache.save(&successful_result(&chemical), &params).await);
    assert!(cache.get(&chemical, &params).await.is_none());
}

#[tokio::test]
async fn test_stats_and_clear_expired() {
    let dir = tempfile::tempdir().unwrap();
    let cache = cache_in(dir.path());
    let params = SearchParameters::default();

    let fresh = Chemical::new("Acetone", Some("67-64-1")).unwrap();
    let stale = Chemical::new("Phenol", Some("108-95-2")).unwrap();
    cache.save(&successful_result(&fresh), &params).await;
    cache.save(&successful_result(&stale), &params).await;
    backdate(&entry_path(&cache, &stale, &params), 2 * HOUR);

    // Files that are not entries are left alone
    std::fs::write(cache.directory().join("notes.txt"), "keep me").unwrap();

    let stats = cache.stats().await;
    assert_eq!(stats.total_files, 2);
    assert_eq!(stats.valid_files, 1);
    assert_eq!(stats.expired_files, 1);
    assert!(stats.total_size_bytes > 0);
    assert_eq!(stats.cache_directory, cache.directory());

    assert_eq!(cache.clear_expired().await, 1);
    assert!(cache.get(&fresh, &params).await.is_some());

    let stats = cache.stats().await;
    assert_eq!(stats.total_files, 1);
    assert_eq!(stats.expired_files, 0);
    assert!(cache.directory().join("notes.txt").exists());
}

#[tokio::test]
async fn test_clear_removes_every_entry() {
    let dir = tempfile::tempdir().unwrap();
    let cache = cache_in(dir.path());
    let params = SearchParameters::default();

    for name in ["Acetone", "Phenol", "Hexane"] {
        let chemical = Chemical::new(name, None).unwrap();
        assert!(cache.save(&successful_result(&chemical), &params).await);
    }

    assert_eq!(cache.clear().await, 3);
    assert_eq!(cache.stats().await.total_files, 0);
    assert_eq!(cache.clear().await, 0);
}

#[tokio::test]
async fn test_missing_directory_reports_empty_stats() {
    let dir = tempfile::tempdir().unwrap();
    let cache = cache_in(dir.path());

    let stats = cache.stats().await;
    assert_eq!(stats.total_files, 0);
    assert_eq!(stats.total_size_bytes, 0);
    assert_eq!(cache.clear_expired().await, 0);
    assert!(!cache.directory().exists());
}

#[tokio::test]
async fn test_entry_file_layout() {
    let dir = tempfile::tempdir().unwrap();
    let cache = cache_in(dir.path());
    let chemical = Chemical::new("Benzene", Some("71-43-2")).unwrap();
    let params = SearchParameters::default();
    cache.save(&successful_result(&chemical), &params).await;

    let contents = std::fs::read_to_string(entry_path(&cache, &chemical, &params)).unwrap();
    let json: serde_json::Value = serde_json::from_str(&contents).unwrap();

    assert_eq!(json["total_count"], 1523);
    assert!(json["search_timestamp"].is_string());
    assert_eq!(json["publications"][0]["pmid"], "31111111");
    assert_eq!(
        json["publications"][0]["abstract"],
        "Workers exposed to solvent vapours were followed."
    );
    assert_eq!(json["publications"][1]["is_review"], true);
}

#[tokio::test]
async fn test_concurrent_saves_leave_a_readable_entry() {
    let dir = tempfile::tempdir().unwrap();
    let cache = cache_in(dir.path());
    let chemical = Chemical::new("Benzene", Some("71-43-2")).unwrap();
    let params = SearchParameters::default();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let cache = cache.clone();
        let result = successful_result(&chemical);
        handles.push(tokio::spawn(async move { cache.save(&result, &params).await }));
    }
    for handle in handles {
        assert!(handle.await.unwrap());
    }

    let cached = cache.get(&chemical, &params).await.unwrap();
    assert_eq!(cached.publications().len(), 2);

    let leftovers: Vec<_> = std::fs::read_dir(cache.directory())
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "tmp"))
        .collect();
    assert!(leftovers.is_empty());
}
