//! Analysis module for embedding texts and clustering the vectors
//!
//! This module handles:
//! - Turning texts into fixed-length vectors
//! - Grouping vectors with interchangeable clustering strategies

pub mod cluster;
pub mod embedding;

pub use cluster::{
    ClusterError, ClusterLabel, Clusterer, DensityClusterer, HierarchicalClusterer,
};
#[cfg(feature = "embeddings")]
pub use embedding::FastEmbedEmbedder;
pub use embedding::{build_embedder, Embedder, EmbeddingError, HashingEmbedder, HASHING_MODEL};
