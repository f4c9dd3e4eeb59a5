//! Extraction outcome tracking
//!
//! This module provides the shared success/failure counters updated by every
//! extraction worker, and the ways a summary of them is reported.

use crate::output::traits::OutputResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

/// Target of the events that make up the statistics log
pub const STATS_TARGET: &str = "link_digest::stats";

/// Raw counters behind the tracker
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutcomeRecord {
    pub total: u64,
    pub success: u64,
    pub fail: u64,
    pub fail_types: BTreeMap<String, u64>,
}

/// Thread-safe aggregate of extraction outcomes for one run
///
/// All mutation goes through [`OutcomeTracker::record`]; there is no reset.
/// A tracker lives as long as the run that owns it.
#[derive(Debug, Default)]
pub struct OutcomeTracker {
    record: Mutex<OutcomeRecord>,
}

impl OutcomeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one outcome
    ///
    /// `cause` is counted only for failures. Causes are free-form and counted
    /// verbatim, so distinct messages land in distinct buckets.
    pub fn record(&self, success: bool, cause: Option<&str>) {
        let mut record = self.record.lock().unwrap_or_else(PoisonError::into_inner);
        record.total += 1;
        if success {
            record.success += 1;
        } else {
            record.fail += 1;
            if let Some(cause) = cause {
                *record.fail_types.entry(cause.to_string()).or_insert(0) += 1;
            }
        }
    }

    /// Takes a consistent snapshot of the counters
    pub fn summarize(&self) -> OutcomeSummary {
        let record = self
            .record
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        OutcomeSummary::from_record(record)
    }
}

/// Point-in-time view of the tracker
#[derive(Debug, Clone, Serialize)]
pub struct OutcomeSummary {
    pub total: u64,
    pub success: u64,
    pub fail: u64,
    /// Percentage of successes, 0 when nothing was recorded
    pub success_rate: f64,
    /// Percentage of failures, 0 when nothing was recorded
    pub fail_rate: f64,
    pub cause_histogram: BTreeMap<String, u64>,
    pub generated_at: DateTime<Utc>,
}

impl OutcomeSummary {
    fn from_record(record: OutcomeRecord) -> Self {
        let rate = |count: u64| {
            if record.total > 0 {
                (count as f64 / record.total as f64) * 100.0
            } else {
                0.0
            }
        };

        Self {
            total: record.total,
            success: record.success,
            fail: record.fail,
            success_rate: rate(record.success),
            fail_rate: rate(record.fail),
            cause_histogram: record.fail_types,
            generated_at: Utc::now(),
        }
    }

    /// Failure causes sorted by count (descending), then by label
    pub fn causes_by_count(&self) -> Vec<(&str, u64)> {
        let mut causes: Vec<_> = self
            .cause_histogram
            .iter()
            .map(|(cause, count)| (cause.as_str(), *count))
            .collect();
        causes.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        causes
    }
}

/// Formats the human-readable summary
pub fn format_statistics(summary: &OutcomeSummary) -> String {
    let mut out = String::new();
    out.push_str("Extraction Stats Summary:\n");
    out.push_str(&format!("Total URLs processed: {}\n", summary.total));
    out.push_str(&format!(
        "Success: {} ({:.2}%)\n",
        summary.success, summary.success_rate
    ));
    out.push_str(&format!(
        "Failures: {} ({:.2}%)\n",
        summary.fail, summary.fail_rate
    ));
    out.push_str("Failures by type:\n");
    for (cause, count) in summary.causes_by_count() {
        out.push_str(&format!("  {}: {}\n", cause, count));
    }
    out
}

/// Prints statistics to stdout
pub fn print_statistics(summary: &OutcomeSummary) {
    print!("{}", format_statistics(summary));
}

/// Emits the summary to the statistics log, one event per line
pub fn log_statistics(summary: &OutcomeSummary) {
    tracing::info!(target: STATS_TARGET, "Extraction Stats Summary:");
    tracing::info!(target: STATS_TARGET, "Total URLs processed: {}", summary.total);
    tracing::info!(
        target: STATS_TARGET,
        "Success: {} ({:.2}%)",
        summary.success,
        summary.success_rate
    );
    tracing::info!(
        target: STATS_TARGET,
        "Failures: {} ({:.2}%)",
        summary.fail,
        summary.fail_rate
    );
    for (cause, count) in summary.causes_by_count() {
        tracing::info!(target: STATS_TARGET, "  {}: {}", cause, count);
    }
    match serde_json::to_string(summary) {
        Ok(json) => tracing::info!(target: STATS_TARGET, "{}", json),
        Err(e) => tracing::warn!("Failed to serialize extraction stats: {}", e),
    }
}

/// Writes the machine-readable summary as pretty JSON, replacing the file
pub fn write_statistics_json(summary: &OutcomeSummary, path: &Path) -> OutputResult<()> {
    let json = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, json)?;
    Ok(())
}
