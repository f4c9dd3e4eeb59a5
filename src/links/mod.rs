//! Link handling module for Link-Digest
//!
//! This module reads link lists from disk and classifies links against the
//! configured ignore and rate-limiting rules.

mod matcher;

use crate::config::Config;
use crate::DigestError;
use std::path::Path;

pub use matcher::DomainRules;

/// How a link is treated before any network traffic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkClassification {
    /// Matches an ignore rule - never fetched
    Ignored,
    /// Matches a rate-limiting rule - fetched after a fixed delay
    RateLimited,
    /// Fetched immediately
    Normal,
}

impl LinkClassification {
    /// Returns true if the link will be fetched
    pub fn should_fetch(&self) -> bool {
        !matches!(self, Self::Ignored)
    }
}

/// Ignore and rate-limiting rules taken from the configuration
#[derive(Debug, Clone, Default)]
pub struct LinkRules {
    pub ignore: DomainRules,
    pub rate_limited: DomainRules,
}

impl LinkRules {
    /// Builds both rule sets from `IGNORE_DOMAINS` and `RATE_LIMITING_DOMAINS`
    pub fn from_config(config: &Config) -> Self {
        Self {
            ignore: DomainRules::new(&config.ignore_domains),
            rate_limited: DomainRules::new(&config.rate_limiting_domains),
        }
    }

    /// Classifies a link; ignore rules take priority over rate limiting
    ///
    /// # Examples
    ///
    /// ```
    /// use link_digest::links::{DomainRules, LinkClassification, LinkRules};
    ///
    /// let rules = LinkRules {
    ///     ignore: DomainRules::new(["youtube.com"]),
    ///     rate_limited: DomainRules::new(["medium.com", "youtube.com"]),
    /// };
    /// assert_eq!(rules.classify("https://youtube.com/x"), LinkClassification::Ignored);
    /// assert_eq!(rules.classify("https://medium.com/x"), LinkClassification::RateLimited);
    /// assert_eq!(rules.classify("https://example.com/"), LinkClassification::Normal);
    /// ```
    pub fn classify(&self, link: &str) -> LinkClassification {
        if self.ignore.matches(link) {
            LinkClassification::Ignored
        } else if self.rate_limited.matches(link) {
            LinkClassification::RateLimited
        } else {
            LinkClassification::Normal
        }
    }
}

/// Extracts the link from one line of a links file
///
/// A line is a candidate if it contains `http`; the link is the rest of the
/// line starting at the first occurrence, trimmed. This accepts plain URL
/// lists as well as markdown bullets such as `- [title](https://...)` (the
/// trailing `)` is kept, as no normalization beyond trimming is performed).
///
/// # Examples
///
/// ```
/// use link_digest::links::extract_link;
///
/// assert_eq!(extract_link("https://example.com/a\n"), Some("https://example.com/a"));
/// assert_eq!(extract_link("- see http://x.org "), Some("http://x.org"));
/// assert_eq!(extract_link("no link here"), None);
/// ```
pub fn extract_link(line: &str) -> Option<&str> {
    line.find("http").map(|start| line[start..].trim())
}

/// Parses link-list content, preserving order and duplicates
pub fn parse_links(content: &str) -> Vec<String> {
    content
        .lines()
        .filter_map(extract_link)
        .map(str::to_string)
        .collect()
}

/// Reads a links file and returns its links in file order
///
/// Lines without `http` are silently skipped.
///
/// # Returns
///
/// * `Ok(Vec<String>)` - Links in file order (possibly empty)
/// * `Err(DigestError::LinksFile)` - The file could not be read
pub fn load_links(path: &Path) -> Result<Vec<String>, DigestError> {
    tracing::info!("Reading links from {}", path.display());
    let content = std::fs::read_to_string(path).map_err(|source| DigestError::LinksFile {
        path: path.display().to_string(),
        source,
    })?;
    let links = parse_links(&content);
    tracing::debug!("Found {} links in {}", links.len(), path.display());
    Ok(links)
}
