//! Extraction module for turning links into cleaned text
//!
//! This module contains the per-link extraction logic, including:
//! - HTTP fetching with retry and backoff
//! - Content classification and HTML/PDF text extraction
//! - Boilerplate cleaning
//! - The worker procedure and the parallel dispatcher that runs it

mod clean;
mod dispatcher;
mod fetcher;
mod parser;
mod worker;

pub use clean::{clean_text, BOILERPLATE};
pub use dispatcher::{
    substitute_degenerate, texts_for_embedding, Dispatcher, MIN_TEXT_CHARS, WORKER_LOST_CAUSE,
};
pub use fetcher::{
    build_http_client, ClientConfig, FetchedPage, HttpClient, RetryPolicy, REQUEST_TIMEOUT,
    USER_AGENT,
};
pub use parser::{
    decode_html, extract_html_text, extract_pdf_text, pdf_placeholder, ContentKind,
    MAX_PDF_PAGES,
};
pub use worker::{
    extract_link, extract_page, record_outcome, ExtractionStatus, LinkExtraction,
    WorkerSettings, IGNORED_CAUSE, RATE_LIMIT_DELAY,
};
