//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for extraction, including:
//! - Building HTTP clients with a fixed browser-like user agent
//! - GET requests with a per-request timeout
//! - Bounded retry with exponential backoff for transient failures,
//!   stretched by `Retry-After` where the server sends one
//! - Error classification

use crate::{FetchError, FetchResult};
use reqwest::header::{CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Client, Method, Response, StatusCode};
use std::time::Duration;

/// User agent sent with every request; a bare client string gets blocked often
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/115.0 Safari/537.36";

/// Per-request timeout
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Retry policy applied by every client
///
/// The defaults are fixed policy, not configuration: 3 retries, backoff
/// factor of one second, and the status list below. Tests construct their
/// own policy with a smaller factor.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub total: u32,

    /// Base of the exponential backoff
    pub backoff_factor: Duration,

    /// Statuses that trigger a retry
    pub status_forcelist: Vec<u16>,

    /// Methods that may be retried
    pub allowed_methods: Vec<Method>,

    /// Statuses whose `Retry-After` header lengthens the backoff
    pub retry_after_statuses: Vec<u16>,

    /// Upper bound on a server-requested delay
    pub max_retry_after: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            total: 3,
            backoff_factor: Duration::from_secs(1),
            status_forcelist: vec![403, 404, 406, 429, 500, 502, 503, 504],
            allowed_methods: vec![Method::GET, Method::HEAD, Method::OPTIONS],
            retry_after_statuses: vec![413, 429, 503],
            max_retry_after: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Delay before the given retry (1-based): factor, 2×factor, 4×factor, ...
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        self.backoff_factor.saturating_mul(1u32 << exponent)
    }

    /// Returns true if the method may be retried at all
    pub fn allows_method(&self, method: &Method) -> bool {
        self.allowed_methods.contains(method)
    }

    /// Returns true if a response with this status should be retried
    pub fn should_retry_status(&self, method: &Method, status: StatusCode) -> bool {
        self.allows_method(method) && self.status_forcelist.contains(&status.as_u16())
    }

    /// Returns true if a transport error should be retried
    ///
    /// Body errors count: the body is read inside the retried section.
    pub fn should_retry_error(&self, method: &Method, err: &reqwest::Error) -> bool {
        self.allows_method(method)
            && (err.is_timeout() || err.is_connect() || err.is_request() || err.is_body())
    }

    /// Delay before the given retry of a response with `status`
    ///
    /// A `Retry-After` value in seconds replaces the backoff when it is
    /// longer, capped at `max_retry_after`. HTTP-date values are ignored.
    pub fn delay_for_status(
        &self,
        retry: u32,
        status: StatusCode,
        retry_after: Option<&str>,
    ) -> Duration {
        let backoff = self.backoff(retry);
        if !self.retry_after_statuses.contains(&status.as_u16()) {
            return backoff;
        }
        retry_after
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(|secs| Duration::from_secs(secs).min(self.max_retry_after))
            .map_or(backoff, |requested| requested.max(backoff))
    }
}

/// Settings for building per-worker HTTP clients
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub user_agent: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: USER_AGENT.to_string(),
            timeout: REQUEST_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }
}

/// A successfully fetched response body
///
/// Owned by the worker that fetched it and dropped after extraction.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Content-Type header value (empty if absent)
    pub content_type: String,
    /// Raw response body
    pub body: Vec<u8>,
}

/// HTTP client with retry state private to one worker
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    retry: RetryPolicy,
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - User agent, timeout and retry policy
///
/// # Returns
///
/// * `Ok(HttpClient)` - Successfully built HTTP client
/// * `Err(FetchError::Client)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use link_digest::extraction::{build_http_client, ClientConfig};
///
/// let client = build_http_client(&ClientConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &ClientConfig) -> FetchResult<HttpClient> {
    let client = Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(config.timeout)
        .gzip(true)
        .brotli(true)
        .build()
        .map_err(FetchError::Client)?;

    Ok(HttpClient {
        client,
        retry: config.retry.clone(),
    })
}

impl HttpClient {
    /// The retry policy this client applies
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Fetches a URL with GET and reads the whole body
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | 2xx and body read | Return page |
    /// | Status in forcelist | Retry with backoff (or `Retry-After`), then `RetriesExhausted` |
    /// | Other non-2xx | Immediate `Status` error |
    /// | Timeout / connect / request / body error | Retry with backoff, then `RetriesExhausted` |
    /// | Other transport error | Immediate `Http` error |
    pub async fn fetch(&self, url: &str) -> FetchResult<FetchedPage> {
        let method = Method::GET;
        let mut retries = 0u32;
        loop {
            let delay = match self.attempt(method.clone(), url).await {
                Ok(page) => return Ok(page),
                Err(Attempt::Status {
                    status,
                    retry_after,
                }) => {
                    if !self.retry.should_retry_status(&method, status) {
                        return Err(FetchError::Status {
                            url: url.to_string(),
                            status: status.as_u16(),
                        });
                    }
                    if retries >= self.retry.total {
                        return Err(FetchError::RetriesExhausted {
                            url: url.to_string(),
                            retries,
                            reason: format!("too many {} error responses", status.as_u16()),
                        });
                    }
                    tracing::debug!("HTTP {} for {}, retrying", status.as_u16(), url);
                    self.retry
                        .delay_for_status(retries + 1, status, retry_after.as_deref())
                }
                Err(Attempt::Transport(err)) => {
                    if !self.retry.should_retry_error(&method, &err) {
                        return Err(classify_error(url, err));
                    }
                    if retries >= self.retry.total {
                        return Err(FetchError::RetriesExhausted {
                            url: url.to_string(),
                            retries,
                            reason: classify_error(url, err).to_string(),
                        });
                    }
                    tracing::debug!("Transient error for {}: {}, retrying", url, err);
                    self.retry.backoff(retries + 1)
                }
            };

            retries += 1;
            tokio::time::sleep(delay).await;
        }
    }

    /// One request, body included
    async fn attempt(&self, method: Method, url: &str) -> Result<FetchedPage, Attempt> {
        let response = self
            .client
            .request(method, url)
            .send()
            .await
            .map_err(Attempt::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Attempt::Status {
                status,
                retry_after: header_value(&response, RETRY_AFTER),
            });
        }

        let content_type = header_value(&response, CONTENT_TYPE).unwrap_or_default();
        let body = response.bytes().await.map_err(Attempt::Transport)?.to_vec();
        Ok(FetchedPage { content_type, body })
    }
}

/// Why a single attempt did not produce a page
enum Attempt {
    Status {
        status: StatusCode,
        retry_after: Option<String>,
    },
    Transport(reqwest::Error),
}

fn header_value(response: &Response, name: reqwest::header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Maps a reqwest error onto the fetch error taxonomy
fn classify_error(url: &str, err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Http {
            url: url.to_string(),
            source: err,
        }
    }
}
