use serde::Deserialize;

/// Main configuration structure for Link-Digest
///
/// Every key is optional; missing keys take the defaults below and unknown
/// keys are ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the file listing the links to process
    #[serde(rename = "LINKS_FILE")]
    pub links_file: String,

    /// Substrings marking links that get a fixed delay before fetching
    #[serde(rename = "RATE_LIMITING_DOMAINS")]
    pub rate_limiting_domains: Vec<String>,

    /// Substrings marking links that are never fetched
    #[serde(rename = "IGNORE_DOMAINS")]
    pub ignore_domains: Vec<String>,

    pub extraction: ExtractionConfig,
    pub embedding: EmbeddingConfig,
    pub clustering: ClusteringConfig,
    pub output: OutputConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            links_file: "links.txt".to_string(),
            rate_limiting_domains: Vec::new(),
            ignore_domains: Vec::new(),
            extraction: ExtractionConfig::default(),
            embedding: EmbeddingConfig::default(),
            clustering: ClusteringConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

/// Extraction pool configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Number of links extracted concurrently
    #[serde(rename = "max-workers")]
    pub max_workers: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self { max_workers: 10 }
    }
}

/// Embedding model configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Model identity; `hashing` selects the built-in embedder
    pub model: String,

    /// Vector width of the hashing embedder
    pub dimensions: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "all-MiniLM-L6-v2".to_string(),
            dimensions: 384,
        }
    }
}

/// Clustering strategy parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Smallest group the density strategy reports (clamped up to 2)
    #[serde(rename = "min-cluster-size")]
    pub min_cluster_size: usize,

    /// Neighbourhood size used for density estimates
    #[serde(rename = "min-samples")]
    pub min_samples: usize,

    /// Linkage distance at which the hierarchical strategy stops merging
    #[serde(rename = "distance-threshold")]
    pub distance_threshold: f64,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            min_cluster_size: 2,
            min_samples: 1,
            distance_threshold: 1.5,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Report written for the density-based strategy
    #[serde(rename = "hdbscan-report")]
    pub hdbscan_report: String,

    /// Report written for the hierarchical strategy
    #[serde(rename = "hierarchical-report")]
    pub hierarchical_report: String,

    /// Directory holding the activity, failure and statistics logs
    #[serde(rename = "log-dir")]
    pub log_dir: String,

    /// Optional machine-readable extraction summary
    #[serde(rename = "stats-json")]
    pub stats_json: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            hdbscan_report: "hdbscan_cluster_report.txt".to_string(),
            hierarchical_report: "hierarchical_cluster_report.txt".to_string(),
            log_dir: ".".to_string(),
            stats_json: Some("extraction_stats.json".to_string()),
        }
    }
}
