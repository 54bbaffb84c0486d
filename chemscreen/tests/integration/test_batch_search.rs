//! Integration tests for batch search coordination
//!
//! Most tests use an in-memory `LiteratureSource` so they can count calls,
//! observe concurrency and inject failures; the last ones run small batches
//! against a mocked E-utilities server.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chemscreen::{
    BatchCoordinator, CacheConfig, Chemical, ClientConfig, LiteratureSource, ProgressReporter,
    Publication, ResponseCache, SearchParameters, SearchResult, batch_search_with_config,
};
use tokio::sync::Mutex;
use tracing_test::traced_test;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// Source that answers from memory after a short delay
#[derive(Default)]
struct FakeSource {
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    delay: Duration,
}

impl FakeSource {
    fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LiteratureSource for FakeSource {
    async fn search(&self, chemical: &Chemical, _params: &SearchParameters) -> SearchResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match chemical.name() {
            "Unobtainium" => SearchResult::failure(
                chemical.clone(),
                "Connection failed: connection refused",
                0.01,
            ),
            "Explodium" => panic!("parser blew up"),
            _ => {
                let publication = Publication {
                    pmid: format!("{}", chemical.name().len()),
                    title: format!("{} toxicity", chemical.name()),
                    authors: vec!["Doe John".to_string()],
                    journal: Some("Toxicology".to_string()),
                    year: Some(2023),
                    abstract_text: None,
                    doi: None,
                    is_review: false,
                };
                SearchResult::success(chemical.clone(), 1, vec![publication], 0.01)
            }
        }
    }
}

/// Progress reporter that records every fraction and yields while doing so
#[derive(Default)]
struct RecordingReporter {
    fractions: Mutex<Vec<f64>>,
}

#[async_trait]
impl ProgressReporter for RecordingReporter {
    async fn report(&self, fraction: f64, _chemical: &Chemical) {
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.fractions.lock().await.push(fraction);
    }
}

fn chemicals(names: &[&str]) -> Vec<Chemical> {
    names
        .iter()
        .map(|name| Chemical::new(*name, None).unwrap())
        .collect()
}

fn names_of(results: &[SearchResult]) -> HashSet<String> {
    results
        .iter()
        .map(|r| r.chemical().name().to_string())
        .collect()
}

fn temp_cache(dir: &tempfile::TempDir) -> ResponseCache {
    ResponseCache::new(CacheConfig::new(dir.path().join("cache")))
}

#[tokio::test]
async fn test_every_chemical_gets_one_result() {
    let input = chemicals(&["Benzene", "Toluene", "Unobtainium", "Xylene"]);
    let coordinator = BatchCoordinator::new(FakeSource::with_delay(Duration::from_millis(5)))
        .with_max_concurrent(2);

    let results = coordinator
        .run(&input, &SearchParameters::default(), None)
        .await;

    assert_eq!(results.len(), 4);
    assert_eq!(names_of(&results), names_of_input(&input));

    let failed: Vec<_> = results.iter().filter(|r| r.is_failed()).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].chemical().name(), "Unobtainium");
    assert!(
        failed[0]
            .error()
            .unwrap()
            .starts_with("Connection failed:")
    );
}

fn names_of_input(input: &[Chemical]) -> HashSet<String> {
    input.iter().map(|c| c.name().to_string()).collect()
}

#[tokio::test]
async fn test_empty_batch() {
    let reporter = RecordingReporter::default();
    let coordinator = BatchCoordinator::new(FakeSource::default());

    let results = coordinator
        .run(&[], &SearchParameters::default(), Some(&reporter))
        .await;

    assert!(results.is_empty());
    assert!(reporter.fractions.lock().await.is_empty());
}

#[tokio::test]
async fn test_concurrency_is_bounded() {
    let source = Arc::new(FakeSource::with_delay(Duration::from_millis(30)));
    let coordinator = BatchCoordinator::from_shared(Arc::clone(&source)).with_max_concurrent(2);
    let input = chemicals(&["A", "B", "C", "D", "E", "F"]);

    let results = coordinator
        .run(&input, &SearchParameters::default(), None)
        .await;

    assert_eq!(results.len(), 6);
    assert_eq!(source.calls(), 6);
    let max_in_flight = source.max_in_flight.load(Ordering::SeqCst);
    assert!(max_in_flight <= 2, "saw {max_in_flight} searches in flight");
    assert!(max_in_flight >= 1);
}

#[tokio::test]
async fn test_zero_concurrency_still_runs() {
    let coordinator = BatchCoordinator::new(FakeSource::default()).with_max_concurrent(0);
    assert_eq!(coordinator.max_concurrent(), 1);

    let results = coordinator
        .run(&chemicals(&["A", "B"]), &SearchParameters::default(), None)
        .await;
    assert_eq!(results.len(), 2);
}

#[tokio::test]
async fn test_progress_is_monotonic_and_ends_at_one() {
    let reporter = RecordingReporter::default();
    let coordinator = BatchCoordinator::new(FakeSource::with_delay(Duration::from_millis(2)))
        .with_max_concurrent(3);
    let input = chemicals(&["A", "B", "C", "D", "E"]);

    coordinator
        .run(&input, &SearchParameters::default(), Some(&reporter))
        .await;

    let fractions = reporter.fractions.lock().await.clone();
    assert_eq!(fractions.len(), 5);
    assert!(fractions.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(fractions.last().copied(), Some(1.0));
    assert_eq!(fractions[0], 0.2);
}

#[tokio::test]
async fn test_closure_progress_reporter() {
    let calls = AtomicUsize::new(0);
    let progress = |fraction: f64, _chemical: &Chemical| {
        assert!(fraction > 0.0 && fraction <= 1.0);
        calls.fetch_add(1, Ordering::SeqCst);
    };
    let coordinator = BatchCoordinator::new(FakeSource::default());

    coordinator
        .run(
            &chemicals(&["A", "B", "C"]),
            &SearchParameters::default(),
            Some(&progress),
        )
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
#[traced_test]
async fn test_panicking_search_fails_only_its_chemical() {
    let reporter = RecordingReporter::default();
    let coordinator = BatchCoordinator::new(FakeSource::default()).with_max_concurrent(2);
    let input = chemicals(&["Benzene", "Explodium", "Toluene"]);

    let results = coordinator
        .run(&input, &SearchParameters::default(), Some(&reporter))
        .await;

    assert_eq!(results.len(), 3);
    let exploded = results
        .iter()
        .find(|r| r.chemical().name() == "Explodium")
        .unwrap();
    assert_eq!(exploded.error(), Some("Search failed: parser blew up"));
    assert!(exploded.publications().is_empty());

    assert_eq!(results.iter().filter(|r| r.is_successful()).count(), 2);
    assert_eq!(reporter.fractions.lock().await.last().copied(), Some(1.0));
}

#[tokio::test]
async fn test_second_run_is_served_from_cache() {
    let dir = tempfile::tempdir().unwrap();
    let source = Arc::new(FakeSource::default());
    let coordinator = BatchCoordinator::from_shared(Arc::clone(&source))
        .with_cache(temp_cache(&dir))
        .with_max_concurrent(2);
    let input = chemicals(&["Benzene", "Toluene", "Unobtainium"]);
    let params = SearchParameters::default();

    let first = coordinator.run(&input, &params, None).await;
    assert_eq!(source.calls(), 3);
    assert!(first.iter().all(|r| !r.from_cache()));

    let second = coordinator.run(&input, &params, None).await;
    // Only the failed search runs again
    assert_eq!(source.calls(), 4);
    assert_eq!(second.iter().filter(|r| r.from_cache()).count(), 2);

    let benzene = second
        .iter()
        .find(|r| r.chemical().name() == "Benzene")
        .unwrap();
    assert!(benzene.from_cache());
    assert_eq!(benzene.publications()[0].title, "Benzene toxicity");
}

#[tokio::test]
async fn test_cache_is_skipped_when_parameters_say_so() {
    let dir = tempfile::tempdir().unwrap();
    let source = Arc::new(FakeSource::default());
    let coordinator =
        BatchCoordinator::from_shared(Arc::clone(&source)).with_cache(temp_cache(&dir));
    let input = chemicals(&["Benzene"]);
    let params = SearchParameters::new(10, 100, true, false).unwrap();

    coordinator.run(&input, &params, None).await;
    let second = coordinator.run(&input, &params, None).await;

    assert_eq!(source.calls(), 2);
    assert!(!second[0].from_cache());
    assert!(!dir.path().join("cache").exists());
}

#[tokio::test]
#[traced_test]
async fn test_batch_search_with_config_against_mock_server() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "esearchresult": {"count": "0", "idlist": []}
        })))
        .expect(2)
        .mount(&mock_server)
        .await;

    let config = ClientConfig::new()
        .with_base_url(mock_server.uri())
        .with_rate_limit(100.0)
        .with_concurrent_requests(2);
    let input = chemicals(&["Benzene", "Toluene"]);
    let params = SearchParameters::new(10, 100, true, false).unwrap();

    let results = batch_search_with_config(config, &input, &params, None)
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.is_successful()));
    assert!(results.iter().all(|r| r.total_count() == 0));
}

#[tokio::test]
#[traced_test]
async fn test_concurrent_batch_respects_rate_limit() {
    let mock_server = MockServer::start().await;
    let arrivals = Arc::new(std::sync::Mutex::new(Vec::<Instant>::new()));

    let recording = |template: ResponseTemplate| {
        let arrivals = Arc::clone(&arrivals);
        move |_: &Request| {
            arrivals.lock().unwrap().push(Instant::now());
            template.clone()
        }
    };

    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .respond_with(recording(ResponseTemplate::new(200).set_body_json(
            serde_json::json!({"esearchresult": {"count": "1", "idlist": ["31000001"]}}),
        )))
        .expect(5)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/efetch.fcgi"))
        .respond_with(recording(ResponseTemplate::new(200).set_body_string(
            "<PubmedArticleSet><PubmedArticle><MedlineCitation><PMID>31000001</PMID>\
             <Article><ArticleTitle>Solvent exposure</ArticleTitle></Article>\
             </MedlineCitation></PubmedArticle></PubmedArticleSet>",
        )))
        .expect(5)
        .mount(&mock_server)
        .await;

    let config = ClientConfig::new()
        .with_base_url(mock_server.uri())
        .with_rate_limit(10.0)
        .with_concurrent_requests(3);
    let input = chemicals(&["Benzene", "Toluene", "Xylene", "Styrene", "Phenol"]);
    let params = SearchParameters::new(10, 100, true, false).unwrap();

    let results = batch_search_with_config(config, &input, &params, None)
        .await
        .unwrap();
    assert_eq!(results.len(), 5);
    assert!(results.iter().all(|r| r.publications().len() == 1));

    let mut arrivals = arrivals.lock().unwrap().clone();
    arrivals.sort();
    assert_eq!(arrivals.len(), 10);
    for pair in arrivals.windows(2) {
        let gap = pair[1] - pair[0];
        // 100ms minimum interval, less a little scheduler jitter
        assert!(gap >= Duration::from_millis(90), "requests only {gap:?} apart");
    }
}
