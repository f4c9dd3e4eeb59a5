use crate::config::types::{ClusteringConfig, Config, EmbeddingConfig, ExtractionConfig, OutputConfig};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.links_file.trim().is_empty() {
        return Err(ConfigError::Validation(
            "LINKS_FILE cannot be empty".to_string(),
        ));
    }

    validate_domain_list("RATE_LIMITING_DOMAINS", &config.rate_limiting_domains)?;
    validate_domain_list("IGNORE_DOMAINS", &config.ignore_domains)?;
    validate_extraction_config(&config.extraction)?;
    validate_embedding_config(&config.embedding)?;
    validate_clustering_config(&config.clustering)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Rejects blank entries, which would match every link
fn validate_domain_list(key: &str, domains: &[String]) -> Result<(), ConfigError> {
    if domains.iter().any(|d| d.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "{} cannot contain empty entries",
            key
        )));
    }
    Ok(())
}

fn validate_extraction_config(config: &ExtractionConfig) -> Result<(), ConfigError> {
    if config.max_workers < 1 || config.max_workers > 100 {
        return Err(ConfigError::Validation(format!(
            "max-workers must be between 1 and 100, got {}",
            config.max_workers
        )));
    }
    Ok(())
}

fn validate_embedding_config(config: &EmbeddingConfig) -> Result<(), ConfigError> {
    if config.model.trim().is_empty() {
        return Err(ConfigError::Validation(
            "embedding model cannot be empty".to_string(),
        ));
    }

    if config.dimensions < 1 {
        return Err(ConfigError::Validation(format!(
            "embedding dimensions must be >= 1, got {}",
            config.dimensions
        )));
    }
    Ok(())
}

/// Validates clustering parameters
///
/// A min-cluster-size below 2 is accepted here; the density clusterer clamps it.
fn validate_clustering_config(config: &ClusteringConfig) -> Result<(), ConfigError> {
    if config.min_samples < 1 {
        return Err(ConfigError::Validation(format!(
            "min-samples must be >= 1, got {}",
            config.min_samples
        )));
    }

    if !config.distance_threshold.is_finite() || config.distance_threshold <= 0.0 {
        return Err(ConfigError::Validation(format!(
            "distance-threshold must be a positive number, got {}",
            config.distance_threshold
        )));
    }
    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.hdbscan_report.is_empty() {
        return Err(ConfigError::Validation(
            "hdbscan-report cannot be empty".to_string(),
        ));
    }

    if config.hierarchical_report.is_empty() {
        return Err(ConfigError::Validation(
            "hierarchical-report cannot be empty".to_string(),
        ));
    }

    if config.log_dir.is_empty() {
        return Err(ConfigError::Validation(
            "log-dir cannot be empty".to_string(),
        ));
    }

    if matches!(&config.stats_json, Some(path) if path.is_empty()) {
        return Err(ConfigError::Validation(
            "stats-json cannot be empty when set".to_string(),
        ));
    }
    Ok(())
}
