//! Pipeline orchestration - sequencing extraction, analysis and reports
//!
//! This module contains the run loop that coordinates:
//! - Loading the link list
//! - Extracting every link through the dispatcher
//! - Reporting extraction statistics
//! - Embedding the texts and running each clustering strategy
//! - Writing one report per strategy
//!
//! The pipeline has no retry logic of its own. A failing analysis or report
//! stage ends the run with an error after the statistics have been emitted.

use crate::analysis::{build_embedder, Clusterer, DensityClusterer, Embedder, HierarchicalClusterer};
use crate::config::Config;
use crate::extraction::Dispatcher;
use crate::links::load_links;
use crate::output::{
    generate_cluster_report, log_statistics, print_statistics, write_statistics_json,
    OutcomeSummary, OutcomeTracker,
};
use crate::{DigestError, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A clustering strategy and the report it writes
pub struct ClusteringStrategy {
    clusterer: Box<dyn Clusterer>,
    report_path: PathBuf,
}

impl ClusteringStrategy {
    pub fn new(clusterer: Box<dyn Clusterer>, report_path: impl Into<PathBuf>) -> Self {
        Self {
            clusterer,
            report_path: report_path.into(),
        }
    }

    pub fn name(&self) -> &str {
        self.clusterer.name()
    }

    pub fn report_path(&self) -> &Path {
        &self.report_path
    }
}

/// What a run produced
#[derive(Debug)]
pub enum RunOutcome {
    /// The link list was empty; nothing downstream ran
    NoInput,

    /// Every stage ran
    Completed(RunReport),
}

/// Summary of a completed run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Number of links processed
    pub links: usize,

    /// Extraction statistics at the end of dispatch
    pub statistics: OutcomeSummary,

    /// Reports written, in strategy order
    pub reports: Vec<PathBuf>,
}

/// Main pipeline structure
pub struct Pipeline {
    config: Config,
    dispatcher: Dispatcher,
    embedder: Box<dyn Embedder>,
    strategies: Vec<ClusteringStrategy>,
}

impl Pipeline {
    /// Creates a pipeline with the embedder and both strategies from `config`
    ///
    /// # Returns
    ///
    /// * `Ok(Pipeline)` - Ready to run
    /// * `Err(DigestError)` - The embedding model could not be loaded
    pub fn from_config(config: Config) -> Result<Self> {
        let embedder = build_embedder(&config.embedding)?;
        let density = DensityClusterer::new(
            config.clustering.min_cluster_size,
            config.clustering.min_samples,
        );
        let hierarchical = HierarchicalClusterer::new(config.clustering.distance_threshold);
        let hdbscan_report = config.output.hdbscan_report.clone();
        let hierarchical_report = config.output.hierarchical_report.clone();

        Ok(Self::new(config, embedder)
            .with_strategy(ClusteringStrategy::new(Box::new(density), hdbscan_report))
            .with_strategy(ClusteringStrategy::new(
                Box::new(hierarchical),
                hierarchical_report,
            )))
    }

    /// Creates a pipeline with no clustering strategies
    ///
    /// The dispatcher is built from `config` with a fresh tracker.
    pub fn new(config: Config, embedder: Box<dyn Embedder>) -> Self {
        let dispatcher = Dispatcher::from_config(&config, Arc::new(OutcomeTracker::new()));
        Self {
            config,
            dispatcher,
            embedder,
            strategies: Vec::new(),
        }
    }

    /// Replaces the dispatcher (and with it the tracker)
    pub fn with_dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    /// Adds a clustering strategy; strategies run in the order added
    pub fn with_strategy(mut self, strategy: ClusteringStrategy) -> Self {
        self.strategies.push(strategy);
        self
    }

    pub fn strategies(&self) -> &[ClusteringStrategy] {
        &self.strategies
    }

    pub fn tracker(&self) -> &Arc<OutcomeTracker> {
        self.dispatcher.tracker()
    }

    /// Runs the pipeline on the configured links file
    pub async fn run(&self) -> Result<RunOutcome> {
        let links = load_links(Path::new(&self.config.links_file))?;
        self.run_links(&links).await
    }

    /// Runs the pipeline on the given links
    ///
    /// An empty list returns [`RunOutcome::NoInput`] without touching the
    /// dispatcher, the embedder or any strategy.
    pub async fn run_links(&self, links: &[String]) -> Result<RunOutcome> {
        if links.is_empty() {
            tracing::warn!("No URLs found");
            return Ok(RunOutcome::NoInput);
        }

        tracing::info!("Starting extraction of {} links", links.len());
        let texts = self.dispatcher.run(links).await;
        ensure_len("extraction", links.len(), texts.len())?;

        let statistics = self.tracker().summarize();
        self.emit_statistics(&statistics);

        tracing::info!(
            "Embedding {} texts with {}",
            texts.len(),
            self.embedder.name()
        );
        let text_refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let vectors = self.embedder.embed_batch(&text_refs)?;
        ensure_len("embedding", texts.len(), vectors.len())?;

        let mut reports = Vec::with_capacity(self.strategies.len());
        for strategy in &self.strategies {
            tracing::info!("Clustering with {}", strategy.name());
            let labels = strategy.clusterer.cluster(&vectors)?;
            ensure_len("clustering", vectors.len(), labels.len())?;

            generate_cluster_report(links, &texts, &labels, strategy.report_path())?;
            reports.push(strategy.report_path().to_path_buf());
        }

        tracing::info!("Run completed: {} reports written", reports.len());
        Ok(RunOutcome::Completed(RunReport {
            links: links.len(),
            statistics,
            reports,
        }))
    }

    /// Prints and logs the summary, and writes the JSON file if configured
    ///
    /// A failed JSON write is logged; the run goes on.
    fn emit_statistics(&self, summary: &OutcomeSummary) {
        print_statistics(summary);
        log_statistics(summary);

        if let Some(path) = &self.config.output.stats_json {
            match write_statistics_json(summary, Path::new(path)) {
                Ok(()) => tracing::debug!("Wrote extraction statistics to {}", path),
                Err(e) => tracing::error!("Failed to write extraction statistics to {}: {}", path, e),
            }
        }
    }
}

fn ensure_len(stage: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(DigestError::LengthMismatch {
            stage,
            expected,
            actual,
        })
    }
}
