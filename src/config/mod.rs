//! Configuration module for Link-Digest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use link_digest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Extracting with {} workers", config.extraction.max_workers);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{ClusteringConfig, Config, EmbeddingConfig, ExtractionConfig, OutputConfig};

// Re-export parser functions
pub use parser::{hash_content, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
