//! Per-link extraction procedure
//!
//! A worker takes one link from ignore check to recorded outcome. Every path
//! ends in exactly one tracker update and a text (possibly empty); nothing
//! is propagated as an error.

use crate::extraction::fetcher::{FetchedPage, HttpClient};
use crate::extraction::parser::{
    decode_html, extract_html_text, extract_pdf_text, pdf_placeholder, ContentKind,
    MAX_PDF_PAGES,
};
use crate::links::{LinkClassification, LinkRules};
use crate::output::OutcomeTracker;
use crate::FetchError;
use std::time::Duration;
use url::Url;

/// Failure cause recorded for links matching an ignore rule
pub const IGNORED_CAUSE: &str = "ignored";

/// Fixed delay before fetching a rate-limited link
pub const RATE_LIMIT_DELAY: Duration = Duration::from_secs(2);

/// How a link's text came to be
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionStatus {
    /// Text came out of an HTML or PDF body
    Extracted,

    /// The content type has no extractable text; the link stands in
    Unclassified,

    /// PDF parsing failed; the text is a placeholder
    SoftFailure { cause: String },

    /// The link matched an ignore rule and was never fetched
    Ignored,

    /// The fetch failed after the client's retries
    FetchFailed { cause: String },
}

impl ExtractionStatus {
    /// Returns true for outcomes counted as successes
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Extracted | Self::Unclassified)
    }

    /// The histogram label for failures
    pub fn failure_cause(&self) -> Option<&str> {
        match self {
            Self::Extracted | Self::Unclassified => None,
            Self::Ignored => Some(IGNORED_CAUSE),
            Self::SoftFailure { cause } | Self::FetchFailed { cause } => Some(cause.as_str()),
        }
    }
}

/// Result of running the worker on one link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkExtraction {
    /// The input link, untouched
    pub link: String,

    /// Cleaned text; empty when nothing could be fetched
    pub text: String,

    pub status: ExtractionStatus,
}

impl LinkExtraction {
    pub(crate) fn new(link: &str, text: String, status: ExtractionStatus) -> Self {
        Self {
            link: link.to_string(),
            text,
            status,
        }
    }
}

/// Settings shared by all workers of one run
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub rules: LinkRules,
    pub rate_limit_delay: Duration,
}

impl WorkerSettings {
    pub fn new(rules: LinkRules) -> Self {
        Self {
            rules,
            rate_limit_delay: RATE_LIMIT_DELAY,
        }
    }
}

/// Runs the full extraction procedure for one link
///
/// 1. Ignored links are recorded as failures with cause `ignored`, no request
/// 2. Rate-limited links wait a fixed delay
/// 3. The link is fetched; non-2xx after retries is a failure
/// 4. The body is classified and turned into text
/// 5. The outcome is recorded in the tracker exactly once
pub async fn extract_link(
    client: &HttpClient,
    link: &str,
    settings: &WorkerSettings,
    tracker: &OutcomeTracker,
) -> LinkExtraction {
    let extraction = run_procedure(client, link, settings).await;
    record_outcome(&extraction, tracker);
    extraction
}

/// Records an extraction in the tracker and the activity/failure logs
pub fn record_outcome(extraction: &LinkExtraction, tracker: &OutcomeTracker) {
    let link = &extraction.link;
    match &extraction.status {
        ExtractionStatus::Extracted => {
            tracing::info!("Successfully extracted text for URL: {}", link);
        }
        ExtractionStatus::Unclassified => {
            tracing::info!("Non-HTML/PDF content for URL: {}. Using URL as fallback.", link);
        }
        ExtractionStatus::Ignored => {
            tracing::info!("Ignoring URL (in ignore list): {}", link);
        }
        ExtractionStatus::SoftFailure { cause } => {
            tracing::error!("Error extracting PDF text from {}: {}", link, cause);
        }
        ExtractionStatus::FetchFailed { cause } => {
            tracing::error!("Error fetching {}: {}", link, cause);
        }
    }

    tracker.record(
        extraction.status.is_success(),
        extraction.status.failure_cause(),
    );
}

async fn run_procedure(client: &HttpClient, link: &str, settings: &WorkerSettings) -> LinkExtraction {
    match settings.rules.classify(link) {
        LinkClassification::Ignored => {
            return LinkExtraction::new(link, String::new(), ExtractionStatus::Ignored);
        }
        LinkClassification::RateLimited => {
            tracing::debug!(
                "Delaying {:?} before rate-limited URL: {}",
                settings.rate_limit_delay,
                link
            );
            tokio::time::sleep(settings.rate_limit_delay).await;
        }
        LinkClassification::Normal => {}
    }

    tracing::info!("Fetching URL: {}", link);
    match fetch_link(client, link).await {
        Ok(page) => extract_page(link, page),
        Err(err) => LinkExtraction::new(
            link,
            String::new(),
            ExtractionStatus::FetchFailed {
                cause: err.to_string(),
            },
        ),
    }
}

async fn fetch_link(client: &HttpClient, link: &str) -> Result<FetchedPage, FetchError> {
    Url::parse(link).map_err(|e| FetchError::InvalidUrl {
        url: link.to_string(),
        message: e.to_string(),
    })?;
    client.fetch(link).await
}

/// Turns a fetched page into text according to its content type
pub fn extract_page(link: &str, page: FetchedPage) -> LinkExtraction {
    match ContentKind::classify(&page.content_type) {
        ContentKind::Html => {
            let html = decode_html(&page.body, &page.content_type);
            LinkExtraction::new(link, extract_html_text(&html), ExtractionStatus::Extracted)
        }
        ContentKind::Pdf => match extract_pdf_text(&page.body, MAX_PDF_PAGES) {
            Ok(text) => LinkExtraction::new(link, text, ExtractionStatus::Extracted),
            Err(e) => LinkExtraction::new(
                link,
                pdf_placeholder(link),
                ExtractionStatus::SoftFailure {
                    cause: format!("PDF extraction error: {}", e),
                },
            ),
        },
        ContentKind::Other => {
            LinkExtraction::new(link, link.to_string(), ExtractionStatus::Unclassified)
        }
    }
}
