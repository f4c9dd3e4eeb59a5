//! Link-Digest: turn a list of links into a clustered, summarized report
//!
//! This crate fetches every link concurrently, extracts cleaned text from each
//! response, embeds the texts, groups them with interchangeable clustering
//! strategies and writes a keyword-annotated report per strategy.

pub mod analysis;
pub mod config;
pub mod extraction;
pub mod links;
pub mod output;
pub mod pipeline;
pub mod telemetry;

use thiserror::Error;

/// Main error type for Link-Digest operations
#[derive(Debug, Error)]
pub enum DigestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to read links file {path}: {source}")]
    LinksFile {
        path: String,
        source: std::io::Error,
    },

    #[error("Embedding error: {0}")]
    Embedding(#[from] analysis::EmbeddingError),

    #[error("Clustering error: {0}")]
    Clustering(#[from] analysis::ClusterError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("{stage} produced {actual} results for {expected} inputs")]
    LengthMismatch {
        stage: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Errors raised while fetching a single link
///
/// These never escape a worker: the worker turns them into a tracked failure
/// whose cause is the error's display string.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(reqwest::Error),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Max retries ({retries}) exceeded for {url}: {reason}")]
    RetriesExhausted {
        url: String,
        retries: u32,
        reason: String,
    },
}

/// Result type alias for Link-Digest operations
pub type Result<T> = std::result::Result<T, DigestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for fetch operations
pub type FetchResult<T> = std::result::Result<T, FetchError>;

// Re-export commonly used types
pub use config::Config;
pub use extraction::{Dispatcher, ExtractionStatus, LinkExtraction};
pub use output::{OutcomeSummary, OutcomeTracker};
pub use pipeline::{Pipeline, RunOutcome};
