//! Parallel dispatcher for extraction workers
//!
//! This module runs the per-link procedure for a whole batch of links on a
//! bounded pool of tokio tasks. Workers take the next unclaimed index from a
//! shared counter, so a slow link only holds up its own worker. Results come
//! back in completion order and are put back into input order before they are
//! returned.

use crate::config::Config;
use crate::extraction::fetcher::{build_http_client, ClientConfig};
use crate::extraction::worker::{
    extract_link, record_outcome, ExtractionStatus, LinkExtraction, WorkerSettings,
};
use crate::links::LinkRules;
use crate::output::OutcomeTracker;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::instrument::WithSubscriber;

/// Texts shorter than this many characters are replaced by their link
pub const MIN_TEXT_CHARS: usize = 50;

/// A progress line is logged every this many completed links
const PROGRESS_INTERVAL: usize = 10;

/// Cause recorded for a link whose worker died before reporting it
pub const WORKER_LOST_CAUSE: &str = "worker terminated before completing link";

/// Runs extraction workers over a batch of links
pub struct Dispatcher {
    max_workers: usize,
    client_config: ClientConfig,
    settings: Arc<WorkerSettings>,
    tracker: Arc<OutcomeTracker>,
}

impl Dispatcher {
    /// Creates a dispatcher
    ///
    /// # Arguments
    ///
    /// * `max_workers` - Upper bound on concurrent workers (at least 1 is used)
    /// * `client_config` - Settings for the client each link is fetched with
    /// * `settings` - Ignore and rate-limit rules shared by all workers
    /// * `tracker` - Outcome tracker every worker records into
    pub fn new(
        max_workers: usize,
        client_config: ClientConfig,
        settings: WorkerSettings,
        tracker: Arc<OutcomeTracker>,
    ) -> Self {
        Self {
            max_workers: max_workers.max(1),
            client_config,
            settings: Arc::new(settings),
            tracker,
        }
    }

    /// Creates a dispatcher from the run configuration
    pub fn from_config(config: &Config, tracker: Arc<OutcomeTracker>) -> Self {
        Self::new(
            config.extraction.max_workers,
            ClientConfig::default(),
            WorkerSettings::new(LinkRules::from_config(config)),
            tracker,
        )
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    pub fn tracker(&self) -> &Arc<OutcomeTracker> {
        &self.tracker
    }

    /// Extracts every link and returns texts ready for embedding
    ///
    /// The result has one entry per input link, in input order. Texts shorter
    /// than [`MIN_TEXT_CHARS`] are replaced by the link itself.
    pub async fn run(&self, links: &[String]) -> Vec<String> {
        let results = self.extract_all(links).await;
        texts_for_embedding(&results)
    }

    /// Extracts every link and returns the raw per-link results in input order
    ///
    /// An empty batch returns immediately without starting any worker.
    pub async fn extract_all(&self, links: &[String]) -> Vec<LinkExtraction> {
        if links.is_empty() {
            return Vec::new();
        }

        let total = links.len();
        let workers = self.max_workers.min(total);
        let links: Arc<[String]> = Arc::from(links);
        let next_index = Arc::new(AtomicUsize::new(0));
        let (tx, mut rx) = mpsc::unbounded_channel::<(usize, LinkExtraction)>();

        tracing::info!("Extracting {} links with {} workers", total, workers);

        let mut handles = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let task = run_worker(
                worker_id,
                Arc::clone(&links),
                Arc::clone(&next_index),
                self.client_config.clone(),
                Arc::clone(&self.settings),
                Arc::clone(&self.tracker),
                tx.clone(),
            );
            handles.push(tokio::spawn(task.with_current_subscriber()));
        }
        drop(tx);

        let mut slots: Vec<Option<LinkExtraction>> = (0..total).map(|_| None).collect();
        let mut done = 0;
        while let Some((index, extraction)) = rx.recv().await {
            slots[index] = Some(extraction);
            done += 1;
            if done % PROGRESS_INTERVAL == 0 || done == total {
                tracing::info!("Progress: {}/{} links extracted", done, total);
            }
        }

        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!("Extraction worker terminated abnormally: {}", e);
            }
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.unwrap_or_else(|| {
                    let lost = LinkExtraction::new(
                        &links[index],
                        String::new(),
                        ExtractionStatus::FetchFailed {
                            cause: WORKER_LOST_CAUSE.to_string(),
                        },
                    );
                    record_outcome(&lost, &self.tracker);
                    lost
                })
            })
            .collect()
    }
}

/// Worker loop: claim an index, extract it, send it back, repeat
async fn run_worker(
    worker_id: usize,
    links: Arc<[String]>,
    next_index: Arc<AtomicUsize>,
    client_config: ClientConfig,
    settings: Arc<WorkerSettings>,
    tracker: Arc<OutcomeTracker>,
    tx: mpsc::UnboundedSender<(usize, LinkExtraction)>,
) {
    tracing::trace!("Worker {} started", worker_id);
    loop {
        let index = next_index.fetch_add(1, Ordering::SeqCst);
        let Some(link) = links.get(index) else {
            break;
        };

        let extraction = match build_http_client(&client_config) {
            Ok(client) => extract_link(&client, link, &settings, &tracker).await,
            Err(e) => {
                let failed = LinkExtraction::new(
                    link,
                    String::new(),
                    ExtractionStatus::FetchFailed {
                        cause: e.to_string(),
                    },
                );
                record_outcome(&failed, &tracker);
                failed
            }
        };

        if tx.send((index, extraction)).is_err() {
            break;
        }
    }
    tracing::trace!("Worker {} finished", worker_id);
}

/// Returns `text`, or `link` when the text is too short to embed meaningfully
///
/// # Examples
///
/// ```
/// use link_digest::extraction::substitute_degenerate;
///
/// assert_eq!(substitute_degenerate("https://a.example/", ""), "https://a.example/");
/// let long = "x".repeat(50);
/// assert_eq!(substitute_degenerate("https://a.example/", &long), long);
/// ```
pub fn substitute_degenerate(link: &str, text: &str) -> String {
    if text.chars().count() < MIN_TEXT_CHARS {
        link.to_string()
    } else {
        text.to_string()
    }
}

/// Applies [`substitute_degenerate`] to every result, keeping order
pub fn texts_for_embedding(results: &[LinkExtraction]) -> Vec<String> {
    results
        .iter()
        .map(|r| substitute_degenerate(&r.link, &r.text))
        .collect()
}
