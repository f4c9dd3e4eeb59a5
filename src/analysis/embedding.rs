//! Text embedding backends
//!
//! Uses a trait-based embedding backend (`Embedder`) so the pipeline can run
//! a sentence-transformer model through fastembed when the `embeddings`
//! feature is enabled, and a deterministic hashing embedder otherwise.

use crate::config::EmbeddingConfig;
use thiserror::Error;

/// Model name selecting [`HashingEmbedder`]
pub const HASHING_MODEL: &str = "hashing";

/// Errors raised while embedding texts
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding returned no results")]
    EmptyResult,

    #[error("embedding model error: {0}")]
    ModelError(String),

    #[error("unknown embedding model: {0}")]
    UnknownModel(String),
}

/// Trait for embedding text into vectors.
pub trait Embedder: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Embed a batch of texts, returning one vector per text in input order.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}

/// Feature-hashing embedder
///
/// Each lowercase alphanumeric token is hashed (FNV-1a) into one of
/// `dimensions` buckets with a hash-derived sign, and the resulting vector is
/// L2-normalised. Texts without tokens map to the zero vector. Texts that
/// share vocabulary end up close in Euclidean distance, which is all the
/// clustering stage needs.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let hash = fnv1a(&token.to_lowercase());
            let bucket = (hash % self.dimensions as u64) as usize;
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }
        vector
    }
}

impl Embedder for HashingEmbedder {
    fn name(&self) -> &str {
        HASHING_MODEL
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|text| self.embed_one(text)).collect())
    }
}

fn fnv1a(token: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    token
        .bytes()
        .fold(OFFSET, |hash, byte| (hash ^ byte as u64).wrapping_mul(PRIME))
}

#[cfg(feature = "embeddings")]
mod fastembed_impl {
    use super::{Embedder, EmbeddingError};
    use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
    use std::sync::{Mutex, PoisonError};

    /// Embedder backed by fastembed (ONNX Runtime).
    ///
    /// Wraps `fastembed::TextEmbedding` in a `Mutex` because its `embed`
    /// method requires `&mut self`, while the `Embedder` trait uses `&self`.
    pub struct FastEmbedEmbedder {
        name: String,
        model: Mutex<TextEmbedding>,
    }

    /// Maps a sentence-transformers model name to a fastembed model
    pub fn resolve_model(name: &str) -> Option<EmbeddingModel> {
        let short = name.rsplit('/').next().unwrap_or(name).to_ascii_lowercase();
        match short.as_str() {
            "all-minilm-l6-v2" => Some(EmbeddingModel::AllMiniLML6V2),
            "all-minilm-l12-v2" => Some(EmbeddingModel::AllMiniLML12V2),
            "bge-small-en-v1.5" => Some(EmbeddingModel::BGESmallENV15),
            "bge-base-en-v1.5" => Some(EmbeddingModel::BGEBaseENV15),
            "nomic-embed-text-v1.5" => Some(EmbeddingModel::NomicEmbedTextV15),
            "paraphrase-multilingual-minilm-l12-v2" => Some(EmbeddingModel::ParaphraseMLMiniLML12V2),
            _ => None,
        }
    }

    impl FastEmbedEmbedder {
        /// Create a new FastEmbedEmbedder for a named model.
        pub fn new(name: &str) -> Result<Self, EmbeddingError> {
            let model =
                resolve_model(name).ok_or_else(|| EmbeddingError::UnknownModel(name.to_string()))?;
            let options = InitOptions::new(model).with_show_download_progress(false);
            let embedding = TextEmbedding::try_new(options)
                .map_err(|e| EmbeddingError::ModelError(e.to_string()))?;
            Ok(Self {
                name: name.to_string(),
                model: Mutex::new(embedding),
            })
        }
    }

    impl Embedder for FastEmbedEmbedder {
        fn name(&self) -> &str {
            &self.name
        }

        fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            if texts.is_empty() {
                return Ok(Vec::new());
            }
            let mut model = self.model.lock().unwrap_or_else(PoisonError::into_inner);
            let embeddings = model
                .embed(texts.to_vec(), None)
                .map_err(|e| EmbeddingError::ModelError(e.to_string()))?;
            if embeddings.is_empty() {
                return Err(EmbeddingError::EmptyResult);
            }
            Ok(embeddings)
        }
    }
}

#[cfg(feature = "embeddings")]
pub use fastembed_impl::FastEmbedEmbedder;

/// Builds the embedder named by the configuration
///
/// `hashing` always selects [`HashingEmbedder`]. Any other name loads the
/// fastembed model when the `embeddings` feature is enabled; without it the
/// hashing embedder is used and a warning is logged.
pub fn build_embedder(config: &EmbeddingConfig) -> Result<Box<dyn Embedder>, EmbeddingError> {
    if config.model.eq_ignore_ascii_case(HASHING_MODEL) {
        return Ok(Box::new(HashingEmbedder::new(config.dimensions)));
    }

    build_model_embedder(config)
}

#[cfg(feature = "embeddings")]
fn build_model_embedder(config: &EmbeddingConfig) -> Result<Box<dyn Embedder>, EmbeddingError> {
    tracing::info!("Loading embedding model {}", config.model);
    Ok(Box::new(FastEmbedEmbedder::new(&config.model)?))
}

#[cfg(not(feature = "embeddings"))]
fn build_model_embedder(config: &EmbeddingConfig) -> Result<Box<dyn Embedder>, EmbeddingError> {
    tracing::warn!(
        "Embedding model {} needs the `embeddings` feature; using the hashing embedder",
        config.model
    );
    Ok(Box::new(HashingEmbedder::new(config.dimensions)))
}
