//! Output error and report types
//!
//! This module defines the error type shared by output writers and the data
//! structures a cluster report is built from.

use crate::analysis::ClusterLabel;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Report inputs disagree: {links} links, {texts} texts, {labels} labels")]
    Mismatch {
        links: usize,
        texts: usize,
        labels: usize,
    },

    #[error("Failed to serialize output: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// One link and its text inside a report group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportItem<'a> {
    pub link: &'a str,
    pub text: &'a str,
}

/// All items sharing a cluster label
#[derive(Debug, Clone)]
pub struct ReportGroup<'a> {
    pub label: ClusterLabel,
    pub items: Vec<ReportItem<'a>>,
    /// Comma-separated top terms, or `N/A`
    pub keywords: String,
}

impl ReportGroup<'_> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
