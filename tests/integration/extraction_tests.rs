//! Integration tests for link extraction
//!
//! These tests use wiremock to create mock HTTP servers and run the
//! dispatcher end-to-end: fetching, retrying, classifying, extracting and
//! outcome accounting.

use link_digest::extraction::{
    pdf_placeholder, ClientConfig, Dispatcher, ExtractionStatus, RetryPolicy, WorkerSettings,
};
use link_digest::links::{DomainRules, LinkRules};
use link_digest::OutcomeTracker;
use std::sync::Arc;
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Client settings with a short backoff so retry tests stay fast
fn fast_client() -> ClientConfig {
    ClientConfig {
        retry: RetryPolicy {
            backoff_factor: Duration::from_millis(10),
            ..RetryPolicy::default()
        },
        ..ClientConfig::default()
    }
}

fn create_dispatcher(workers: usize, rules: LinkRules) -> (Dispatcher, Arc<OutcomeTracker>) {
    let tracker = Arc::new(OutcomeTracker::new());
    let dispatcher = Dispatcher::new(
        workers,
        fast_client(),
        WorkerSettings::new(rules),
        Arc::clone(&tracker),
    );
    (dispatcher, tracker)
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "text/html; charset=utf-8")
}

#[tokio::test]
async fn test_ignored_link_uses_link_as_text() {
    let rules = LinkRules {
        ignore: DomainRules::new(["example.com"]),
        rate_limited: DomainRules::default(),
    };
    let (dispatcher, tracker) = create_dispatcher(2, rules);
    let links = vec!["http://example.com/ignored".to_string()];

    let texts = dispatcher.run(&links).await;

    assert_eq!(texts, links);
    let summary = tracker.summarize();
    assert_eq!(summary.total, 1);
    assert_eq!(summary.fail, 1);
    assert_eq!(summary.cause_histogram.get("ignored"), Some(&1));
}

#[tokio::test]
async fn test_html_paragraphs_extracted() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/hello"))
        .respond_with(html("<p>Hello</p><p>World</p>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (dispatcher, tracker) = create_dispatcher(2, LinkRules::default());
    let links = vec![format!("{}/hello", mock_server.uri())];

    let results = dispatcher.extract_all(&links).await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].text, "Hello World");
    assert_eq!(results[0].status, ExtractionStatus::Extracted);
    let summary = tracker.summarize();
    assert_eq!(summary.total, 1);
    assert_eq!(summary.success, 1);
    assert!(summary.cause_histogram.is_empty());
}

#[tokio::test]
async fn test_retries_exhausted_on_503() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/unavailable"))
        .respond_with(ResponseTemplate::new(503))
        .expect(4)
        .mount(&mock_server)
        .await;

    let (dispatcher, tracker) = create_dispatcher(1, LinkRules::default());
    let links = vec![format!("{}/unavailable", mock_server.uri())];

    let results = dispatcher.extract_all(&links).await;

    assert_eq!(results[0].text, "");
    match &results[0].status {
        ExtractionStatus::FetchFailed { cause } => {
            assert!(cause.contains("Max retries (3) exceeded"), "cause: {}", cause);
            assert!(cause.contains("503"), "cause: {}", cause);
        }
        other => panic!("expected fetch failure, got {:?}", other),
    }

    let summary = tracker.summarize();
    assert_eq!(summary.fail, 1);
    assert_eq!(summary.cause_histogram.len(), 1);

    // After the fallback the slot holds the link itself
    let texts = link_digest::extraction::texts_for_embedding(&results);
    assert_eq!(texts, links);
}

#[tokio::test]
async fn test_non_retryable_status_fails_once() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/private"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (dispatcher, tracker) = create_dispatcher(1, LinkRules::default());
    let link = format!("{}/private", mock_server.uri());

    let results = dispatcher.extract_all(&[link.clone()]).await;

    assert_eq!(
        results[0].status,
        ExtractionStatus::FetchFailed {
            cause: format!("HTTP 401 for {}", link)
        }
    );
    assert_eq!(tracker.summarize().fail, 1);
}

#[tokio::test]
async fn test_retry_recovers_after_transient_failure() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(html("<p>Recovered after two failures</p>"))
        .mount(&mock_server)
        .await;

    let (dispatcher, tracker) = create_dispatcher(1, LinkRules::default());
    let links = vec![format!("{}/flaky", mock_server.uri())];

    let results = dispatcher.extract_all(&links).await;

    assert_eq!(results[0].text, "Recovered after two failures");
    assert_eq!(tracker.summarize().success, 1);
}

#[tokio::test]
async fn test_retry_after_header_is_honoured() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(503).insert_header("retry-after", "1"))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(html("<p>Served once the server had time</p>"))
        .mount(&mock_server)
        .await;

    let (dispatcher, tracker) = create_dispatcher(1, LinkRules::default());
    let links = vec![format!("{}/busy", mock_server.uri())];

    let started = Instant::now();
    let results = dispatcher.extract_all(&links).await;
    let elapsed = started.elapsed();

    assert_eq!(results[0].text, "Served once the server had time");
    assert_eq!(tracker.summarize().success, 1);
    // The 10 ms backoff is stretched to the requested second
    assert!(elapsed >= Duration::from_millis(950), "elapsed {:?}", elapsed);
}

#[tokio::test]
async fn test_latin1_page_is_decoded() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/menu"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(
                    b"<p>Caf\xe9 cr\xe8me br\xfbl\xe9e and other desserts from the old menu</p>"
                        .to_vec(),
                )
                .insert_header("content-type", "text/html; charset=ISO-8859-1"),
        )
        .mount(&mock_server)
        .await;

    let (dispatcher, _tracker) = create_dispatcher(1, LinkRules::default());
    let links = vec![format!("{}/menu", mock_server.uri())];

    let results = dispatcher.extract_all(&links).await;

    assert_eq!(
        results[0].text,
        "Café crème brûlée and other desserts from the old menu"
    );
}

#[tokio::test]
async fn test_rate_limited_links_are_delayed() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html("<p>Slow site</p>"))
        .expect(2)
        .mount(&mock_server)
        .await;

    let rules = LinkRules {
        ignore: DomainRules::default(),
        rate_limited: DomainRules::new(["127.0.0.1"]),
    };
    let (dispatcher, tracker) = create_dispatcher(1, rules);
    let links = vec![
        format!("{}/a", mock_server.uri()),
        format!("{}/b", mock_server.uri()),
    ];

    let started = Instant::now();
    let results = dispatcher.extract_all(&links).await;
    let elapsed = started.elapsed();

    assert!(
        elapsed >= Duration::from_millis(3900),
        "two delayed fetches took only {:?}",
        elapsed
    );
    assert!(results.iter().all(|r| r.status.is_success()));
    assert_eq!(tracker.summarize().success, 2);
}

#[tokio::test]
async fn test_order_preserved_under_skewed_latency() {
    let mock_server = MockServer::start().await;
    let delays = [400u64, 0, 250, 0, 100, 0];
    for (i, delay) in delays.iter().enumerate() {
        Mock::given(method("GET"))
            .and(path(format!("/page{}", i)))
            .respond_with(
                html(&format!("<p>Body of page number {}</p>", i))
                    .set_delay(Duration::from_millis(*delay)),
            )
            .mount(&mock_server)
            .await;
    }

    let (dispatcher, tracker) = create_dispatcher(4, LinkRules::default());
    let links: Vec<String> = (0..delays.len())
        .map(|i| format!("{}/page{}", mock_server.uri(), i))
        .collect();

    let results = dispatcher.extract_all(&links).await;

    assert_eq!(results.len(), links.len());
    for (i, result) in results.iter().enumerate() {
        assert_eq!(result.link, links[i]);
        assert_eq!(result.text, format!("Body of page number {}", i));
    }
    let summary = tracker.summarize();
    assert_eq!(summary.total, links.len() as u64);
    assert_eq!(summary.success + summary.fail, summary.total);
}

#[tokio::test]
async fn test_duplicate_links_processed_independently() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/same"))
        .respond_with(html("<p>Same page</p>"))
        .expect(2)
        .mount(&mock_server)
        .await;

    let (dispatcher, tracker) = create_dispatcher(2, LinkRules::default());
    let link = format!("{}/same", mock_server.uri());

    let results = dispatcher.extract_all(&[link.clone(), link.clone()]).await;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0], results[1]);
    assert_eq!(tracker.summarize().total, 2);
}

#[tokio::test]
async fn test_bad_pdf_is_soft_failure() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/paper.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"not really a pdf".to_vec())
                .insert_header("content-type", "application/pdf"),
        )
        .mount(&mock_server)
        .await;

    let (dispatcher, tracker) = create_dispatcher(1, LinkRules::default());
    let link = format!("{}/paper.pdf", mock_server.uri());

    let texts = dispatcher.run(&[link.clone()]).await;

    // The placeholder is long enough to survive the fallback
    assert_eq!(texts, vec![pdf_placeholder(&link)]);
    let summary = tracker.summarize();
    assert_eq!(summary.fail, 1);
    let (cause, count) = summary.causes_by_count()[0];
    assert!(cause.starts_with("PDF extraction error: "));
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_unclassified_content_counts_as_success() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/image.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(vec![0x89, 0x50, 0x4e, 0x47])
                .insert_header("content-type", "image/png"),
        )
        .mount(&mock_server)
        .await;

    let (dispatcher, tracker) = create_dispatcher(1, LinkRules::default());
    let link = format!("{}/image.png", mock_server.uri());

    let results = dispatcher.extract_all(&[link.clone()]).await;

    assert_eq!(results[0].text, link);
    assert_eq!(results[0].status, ExtractionStatus::Unclassified);
    assert_eq!(tracker.summarize().success, 1);
}

#[tokio::test]
async fn test_fallback_threshold_in_output() {
    let mock_server = MockServer::start().await;
    let exactly_fifty = "a".repeat(50);
    let forty_nine = "b".repeat(49);
    Mock::given(method("GET"))
        .and(path("/fifty"))
        .respond_with(html(&format!("<p>{}</p>", exactly_fifty)))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/forty-nine"))
        .respond_with(html(&format!("<p>{}</p>", forty_nine)))
        .mount(&mock_server)
        .await;

    let (dispatcher, _tracker) = create_dispatcher(2, LinkRules::default());
    let links = vec![
        format!("{}/fifty", mock_server.uri()),
        format!("{}/forty-nine", mock_server.uri()),
    ];

    let texts = dispatcher.run(&links).await;

    assert_eq!(texts[0], exactly_fifty);
    assert_eq!(texts[1], links[1]);
}

#[tokio::test]
async fn test_mixed_batch_accounting() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(html("<p>A perfectly ordinary page with plenty of text in it.</p>"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&mock_server)
        .await;

    let rules = LinkRules {
        ignore: DomainRules::new(["skip.example"]),
        rate_limited: DomainRules::default(),
    };
    let (dispatcher, tracker) = create_dispatcher(3, rules);
    let links = vec![
        format!("{}/ok", mock_server.uri()),
        "https://skip.example/page".to_string(),
        format!("{}/gone", mock_server.uri()),
        "not a url at all".to_string(),
    ];

    let texts = dispatcher.run(&links).await;

    assert_eq!(texts.len(), 4);
    assert_eq!(
        texts[0],
        "A perfectly ordinary page with plenty of text in it."
    );
    assert_eq!(&texts[1..], &links[1..]);

    let summary = tracker.summarize();
    assert_eq!(summary.total, 4);
    assert_eq!(summary.success, 1);
    assert_eq!(summary.fail, 3);
    assert_eq!(summary.cause_histogram.values().sum::<u64>(), 3);
}
