//! Text embedding strategies.
//!
//! The default [`PseudoEmbedder`] is a deterministic, model-free
//! bag-of-initials embedding: it needs no download and always yields the same
//! vector for the same text. With the `fastembed` feature, [`FastEmbedder`]
//! wraps a real fastembed model behind the same [`Embedder`] trait.

use std::collections::HashSet;

use crate::semantic::preprocess::terms;

/// Dimensions of the pseudo-embedding.
pub const PSEUDO_DIMENSIONS: usize = 128;

/// Error type for embedding operations
#[derive(Debug, thiserror::Error)]
#[allow(dead_code)]
pub enum EmbeddingError {
    #[error("Model initialization failed: {0}")]
    InitFailed(String),

    #[error("Embedding generation failed: {0}")]
    EmbeddingFailed(String),

    #[error("Invalid model name: {0}")]
    InvalidModel(String),
}

/// Converts text into a fixed-dimension, unit-normalized vector.
pub trait Embedder: Send + Sync {
    fn name(&self) -> &str;

    /// Length of every vector this embedder produces.
    fn dimensions(&self) -> usize;

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

/// Deterministic pseudo-embedding.
///
/// For each dimension `i`, every unique token `w` (length > 2) contributes
/// `((first_char(w) * 11 + i * 7) mod 100) / 100`; the sum is averaged over the
/// unique tokens and the vector is then L2-normalized. Text without usable
/// tokens embeds to the zero vector.
#[derive(Debug, Clone)]
pub struct PseudoEmbedder {
    dimensions: usize,
}

impl PseudoEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    /// Infallible form of [`Embedder::embed`].
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut seen = HashSet::new();
        let initials: Vec<u32> = terms(text)
            .into_iter()
            .filter(|t| seen.insert(t.clone()))
            .filter_map(|t| t.chars().next().map(|c| c as u32))
            .collect();

        let count = initials.len().max(1) as f32;

        let vector: Vec<f32> = (0..self.dimensions)
            .map(|i| {
                let sum: f32 = initials
                    .iter()
                    .map(|&code| ((code as usize * 11 + i * 7) % 100) as f32 / 100.0)
                    .sum();
                sum / count
            })
            .collect();

        normalize(vector)
    }
}

impl Default for PseudoEmbedder {
    fn default() -> Self {
        Self::new(PSEUDO_DIMENSIONS)
    }
}

impl Embedder for PseudoEmbedder {
    fn name(&self) -> &str {
        "pseudo"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(self.embed_text(text))
    }
}

/// L2 norm of a vector.
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Scale to unit length; a zero vector is returned unchanged.
pub fn normalize(mut v: Vec<f32>) -> Vec<f32> {
    let norm = l2_norm(&v);
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
    v
}

#[cfg(feature = "fastembed")]
pub use self::model::FastEmbedder;

#[cfg(feature = "fastembed")]
mod model {
    use std::path::PathBuf;
    use std::sync::Mutex;

    use fastembed::{InitOptions, TextEmbedding};

    use super::{normalize, Embedder, EmbeddingError};

    /// Wrapper around fastembed's TextEmbedding model.
    /// Uses a Mutex because fastembed's embed() requires &mut self.
    pub struct FastEmbedder {
        model: Mutex<TextEmbedding>,
        model_name: String,
        dimensions: usize,
    }

    impl FastEmbedder {
        /// Load (downloading on first use) the named model into `cache_dir/models`.
        pub fn new(model_name: &str, cache_dir: PathBuf) -> Result<Self, EmbeddingError> {
            let model_enum = parse_model_name(model_name)?;

            let models_dir = cache_dir.join("models");
            std::fs::create_dir_all(&models_dir).map_err(|e| {
                EmbeddingError::InitFailed(format!("Failed to create models directory: {}", e))
            })?;

            let options = InitOptions::new(model_enum)
                .with_cache_dir(models_dir)
                .with_show_download_progress(true);

            let mut model = TextEmbedding::try_new(options)
                .map_err(|e| EmbeddingError::InitFailed(e.to_string()))?;

            let dimensions = model
                .embed(vec!["test"], None)
                .map_err(|e| EmbeddingError::InitFailed(format!("Failed to read model dimensions: {}", e)))?
                .first()
                .map(|v| v.len())
                .ok_or_else(|| EmbeddingError::InitFailed("Model returned no embedding".to_string()))?;

            log::info!("loaded embedding model '{}' ({} dims)", model_name, dimensions);

            Ok(Self {
                model: Mutex::new(model),
                model_name: model_name.to_string(),
                dimensions,
            })
        }
    }

    impl Embedder for FastEmbedder {
        fn name(&self) -> &str {
            &self.model_name
        }

        fn dimensions(&self) -> usize {
            self.dimensions
        }

        fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            let mut model = self.model.lock().map_err(|e| {
                EmbeddingError::EmbeddingFailed(format!("Failed to acquire model lock: {}", e))
            })?;

            let embedding = model
                .embed(vec![text], None)
                .map_err(|e| EmbeddingError::EmbeddingFailed(e.to_string()))?
                .into_iter()
                .next()
                .ok_or_else(|| EmbeddingError::EmbeddingFailed("No embedding returned".to_string()))?;

            Ok(normalize(embedding))
        }
    }

    fn parse_model_name(name: &str) -> Result<fastembed::EmbeddingModel, EmbeddingError> {
        match name.to_lowercase().as_str() {
            "all-minilm-l6-v2" | "allminiml6v2" => Ok(fastembed::EmbeddingModel::AllMiniLML6V2),
            "bge-small-en-v1.5" | "bgesmallenv15" => Ok(fastembed::EmbeddingModel::BGESmallENV15),
            "bge-base-en-v1.5" | "bgebaseenv15" => Ok(fastembed::EmbeddingModel::BGEBaseENV15),
            _ => Err(EmbeddingError::InvalidModel(format!(
                "Unknown model: {}. Supported models: all-MiniLM-L6-v2, bge-small-en-v1.5, bge-base-en-v1.5",
                name
            ))),
        }
    }
}
