//! Integration tests for the pipeline
//!
//! These tests run the whole pipeline against wiremock servers, with either
//! the built-in analysis stages or counting mocks in their place.

use link_digest::analysis::{
    ClusterError, ClusterLabel, Clusterer, DensityClusterer, Embedder, EmbeddingError,
    HashingEmbedder, HierarchicalClusterer,
};
use link_digest::config::Config;
use link_digest::extraction::{ClientConfig, Dispatcher, RetryPolicy, WorkerSettings};
use link_digest::links::LinkRules;
use link_digest::pipeline::ClusteringStrategy;
use link_digest::{DigestError, OutcomeTracker, Pipeline, RunOutcome};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Embedder that counts calls and returns fixed vectors
struct CountingEmbedder {
    calls: Arc<AtomicUsize>,
    fail: bool,
}

impl Embedder for CountingEmbedder {
    fn name(&self) -> &str {
        "counting"
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(EmbeddingError::ModelError("model unavailable".to_string()));
        }
        Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
    }
}

/// Clusterer that counts calls and puts everything in one cluster
struct CountingClusterer {
    calls: Arc<AtomicUsize>,
}

impl Clusterer for CountingClusterer {
    fn name(&self) -> &str {
        "counting"
    }

    fn cluster(&self, vectors: &[Vec<f32>]) -> Result<Vec<ClusterLabel>, ClusterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![ClusterLabel::Cluster(0); vectors.len()])
    }
}

/// Creates a config whose files all live in `dir`
fn create_test_config(dir: &TempDir, links: &[String]) -> Config {
    let links_path = dir.path().join("links.txt");
    std::fs::write(&links_path, links.join("\n")).expect("Failed to write links file");

    let mut config = Config::default();
    config.links_file = links_path.display().to_string();
    config.embedding.model = "hashing".to_string();
    config.embedding.dimensions = 64;
    config.output.hdbscan_report = dir.path().join("hdbscan.txt").display().to_string();
    config.output.hierarchical_report =
        dir.path().join("hierarchical.txt").display().to_string();
    config.output.log_dir = dir.path().display().to_string();
    config.output.stats_json = Some(dir.path().join("stats.json").display().to_string());
    config
}

/// Dispatcher with a short retry backoff
fn fast_dispatcher(config: &Config) -> Dispatcher {
    let client = ClientConfig {
        retry: RetryPolicy {
            backoff_factor: Duration::from_millis(10),
            ..RetryPolicy::default()
        },
        ..ClientConfig::default()
    };
    Dispatcher::new(
        config.extraction.max_workers,
        client,
        WorkerSettings::new(LinkRules::from_config(config)),
        Arc::new(OutcomeTracker::new()),
    )
}

fn read_stats(path: &Path) -> serde_json::Value {
    let content = std::fs::read_to_string(path).expect("Failed to read stats file");
    serde_json::from_str(&content).expect("Stats file is not JSON")
}

#[tokio::test]
async fn test_empty_links_file_invokes_nothing() {
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&dir, &[]);
    std::fs::write(&config.links_file, "# no links here\njust text\n").unwrap();
    config.output.stats_json = Some(dir.path().join("stats.json").display().to_string());

    let embed_calls = Arc::new(AtomicUsize::new(0));
    let cluster_calls = Arc::new(AtomicUsize::new(0));
    let report_path = dir.path().join("report.txt");
    let pipeline = Pipeline::new(
        config,
        Box::new(CountingEmbedder {
            calls: Arc::clone(&embed_calls),
            fail: false,
        }),
    )
    .with_strategy(ClusteringStrategy::new(
        Box::new(CountingClusterer {
            calls: Arc::clone(&cluster_calls),
        }),
        &report_path,
    ));

    let outcome = pipeline.run().await.unwrap();

    assert!(matches!(outcome, RunOutcome::NoInput));
    assert_eq!(embed_calls.load(Ordering::SeqCst), 0);
    assert_eq!(cluster_calls.load(Ordering::SeqCst), 0);
    assert!(!report_path.exists());
    assert!(!dir.path().join("stats.json").exists());
    assert_eq!(pipeline.tracker().summarize().total, 0);
}

#[tokio::test]
async fn test_full_pipeline_writes_reports() {
    let mock_server = MockServer::start().await;
    let pages = [
        ("/rust-1", "<p>Rust ownership and borrowing make memory safety checkable at compile time without a garbage collector.</p>"),
        ("/rust-2", "<p>The borrow checker enforces ownership rules so Rust programs avoid data races and dangling references.</p>"),
        ("/bread-1", "<p>Sourdough bread needs a lively starter, flour, water and salt, plus a long slow fermentation overnight.</p>"),
        ("/bread-2", "<p>Bake the sourdough loaf in a hot dutch oven so the bread develops a crisp crust and open crumb.</p>"),
    ];
    for (route, body) in pages {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(body)
                    .insert_header("content-type", "text/html"),
            )
            .mount(&mock_server)
            .await;
    }

    let dir = TempDir::new().unwrap();
    let links: Vec<String> = pages
        .iter()
        .map(|(route, _)| format!("{}{}", mock_server.uri(), route))
        .chain(std::iter::once("https://ignored.example/x".to_string()))
        .collect();
    let mut config = create_test_config(&dir, &links);
    config.ignore_domains = vec!["ignored.example".to_string()];
    let dispatcher = fast_dispatcher(&config);

    let pipeline = Pipeline::from_config(config.clone())
        .unwrap()
        .with_dispatcher(dispatcher);
    let outcome = pipeline.run().await.unwrap();

    let RunOutcome::Completed(report) = outcome else {
        panic!("expected a completed run");
    };
    assert_eq!(report.links, 5);
    assert_eq!(report.statistics.total, 5);
    assert_eq!(report.statistics.success, 4);
    assert_eq!(report.statistics.cause_histogram.get("ignored"), Some(&1));
    assert_eq!(report.reports.len(), 2);

    for report_path in [&config.output.hdbscan_report, &config.output.hierarchical_report] {
        let content = std::fs::read_to_string(report_path).unwrap();
        assert!(content.starts_with("Cluster "), "report: {}", content);
        for link in &links {
            assert!(content.contains(&format!("  - {}\n", link)), "missing {}", link);
        }
    }

    let stats = read_stats(&dir.path().join("stats.json"));
    assert_eq!(stats["total"], 5);
    assert_eq!(stats["success"], 4);
}

#[tokio::test]
async fn test_embedding_failure_propagates_after_statistics() {
    let dir = TempDir::new().unwrap();
    let links = vec!["https://ignored.example/a".to_string()];
    let mut config = create_test_config(&dir, &links);
    config.ignore_domains = vec!["ignored.example".to_string()];

    let embed_calls = Arc::new(AtomicUsize::new(0));
    let cluster_calls = Arc::new(AtomicUsize::new(0));
    let pipeline = Pipeline::new(
        config,
        Box::new(CountingEmbedder {
            calls: Arc::clone(&embed_calls),
            fail: true,
        }),
    )
    .with_strategy(ClusteringStrategy::new(
        Box::new(CountingClusterer {
            calls: Arc::clone(&cluster_calls),
        }),
        dir.path().join("report.txt"),
    ));

    let err = pipeline.run().await.unwrap_err();

    assert!(matches!(err, DigestError::Embedding(_)));
    assert_eq!(embed_calls.load(Ordering::SeqCst), 1);
    assert_eq!(cluster_calls.load(Ordering::SeqCst), 0);
    assert!(!dir.path().join("report.txt").exists());

    // Extraction statistics are still reported
    let stats = read_stats(&dir.path().join("stats.json"));
    assert_eq!(stats["total"], 1);
    assert_eq!(stats["cause_histogram"]["ignored"], 1);
}

#[tokio::test]
async fn test_each_strategy_sees_same_vectors() {
    let dir = TempDir::new().unwrap();
    let links = vec![
        "https://ignored.example/a".to_string(),
        "https://ignored.example/b".to_string(),
    ];
    let mut config = create_test_config(&dir, &links);
    config.ignore_domains = vec!["ignored.example".to_string()];

    let first_calls = Arc::new(AtomicUsize::new(0));
    let second_calls = Arc::new(AtomicUsize::new(0));
    let pipeline = Pipeline::new(config, Box::new(HashingEmbedder::new(16)))
        .with_strategy(ClusteringStrategy::new(
            Box::new(CountingClusterer {
                calls: Arc::clone(&first_calls),
            }),
            dir.path().join("first.txt"),
        ))
        .with_strategy(ClusteringStrategy::new(
            Box::new(CountingClusterer {
                calls: Arc::clone(&second_calls),
            }),
            dir.path().join("second.txt"),
        ));

    pipeline.run_links(&links).await.unwrap();

    assert_eq!(first_calls.load(Ordering::SeqCst), 1);
    assert_eq!(second_calls.load(Ordering::SeqCst), 1);
    let first = std::fs::read_to_string(dir.path().join("first.txt")).unwrap();
    let second = std::fs::read_to_string(dir.path().join("second.txt")).unwrap();
    assert_eq!(first, second);
    assert!(first.starts_with("Cluster 0 (2 items) - Keywords: "));
}

#[test]
fn test_clusterers_accept_empty_input() {
    let strategies: Vec<Box<dyn Clusterer>> = vec![
        Box::new(DensityClusterer::new(1, 1)),
        Box::new(HierarchicalClusterer::new(1.5)),
    ];
    for strategy in strategies {
        let labels = strategy.cluster(&[]).expect("empty input must not fail");
        assert!(labels.is_empty(), "{} returned labels", strategy.name());
    }
}
