use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Reads a configuration file and returns the parsed config
///
/// # Errors
///
/// `ConfigError::Io` if the file cannot be read, otherwise whatever
/// [`parse_config`] reports.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use link_digest::config::load_config;
///
/// let config = load_config(Path::new("config.toml")).unwrap();
/// println!("Links file: {}", config.links_file);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    load_config_with_hash(path).map(|(config, _)| config)
}

/// Reads a configuration file once, returning the config and the SHA-256
/// of the text that was parsed
///
/// The hash is logged at startup so a report can be traced back to its
/// configuration.
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    Ok((config, hash_content(&content)))
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Hex-encoded SHA-256 of configuration text
pub fn hash_content(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}
