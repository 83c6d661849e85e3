//! In-memory document embedding cache with cosine similarity.
//!
//! Stores one embedding per corpus document, keyed by document ID.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::corpus::{Corpus, Document};
use crate::semantic::embeddings::{Embedder, EmbeddingError};

/// Cosine similarity of two unit vectors (their dot product).
///
/// Callers must pass normalized vectors; nothing is re-normalized here.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, IndexError> {
    if a.len() != b.len() {
        return Err(IndexError::DimensionMismatch {
            expected: a.len(),
            got: b.len(),
        });
    }

    Ok(a.iter().zip(b.iter()).map(|(x, y)| x * y).sum())
}

/// Document ID -> embedding cache.
///
/// Empty until [`DocumentIndex::ensure_initialized`] runs, then kept for the
/// lifetime of the index. Concurrent first use is safe: embeddings are computed
/// outside the lock and only inserted where absent, so a race costs duplicate
/// work but never leaves inconsistent entries.
pub struct DocumentIndex {
    entries: RwLock<HashMap<String, Vec<f32>>>,
    embedder: Arc<dyn Embedder>,
}

impl DocumentIndex {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            embedder,
        }
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// Expected embedding dimensions.
    pub fn dimensions(&self) -> usize {
        self.embedder.dimensions()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    pub fn contains(&self, id: &str) -> bool {
        self.entries
            .read()
            .map(|entries| entries.contains_key(id))
            .unwrap_or(false)
    }

    /// Embed every corpus document if the cache is empty.
    ///
    /// Returns the number of cached entries afterwards.
    pub fn ensure_initialized(&self, corpus: &Corpus) -> Result<usize, IndexError> {
        {
            let entries = self.entries.read().map_err(|e| IndexError::Poisoned(e.to_string()))?;
            if !entries.is_empty() {
                return Ok(entries.len());
            }
        }

        log::info!(
            "initializing document index with '{}' embedder",
            self.embedder.name()
        );

        let computed = corpus
            .documents()
            .iter()
            .map(|doc| -> Result<(String, Vec<f32>), EmbeddingError> {
                Ok((doc.id.clone(), self.embedder.embed(&doc.embedding_text())?))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut entries = self
            .entries
            .write()
            .map_err(|e| IndexError::Poisoned(e.to_string()))?;

        for (id, embedding) in computed {
            entries.entry(id).or_insert(embedding);
        }

        log::info!("document index initialized with {} documents", entries.len());

        Ok(entries.len())
    }

    /// Cached embedding for a document, computed on the fly (and not cached) when absent.
    pub fn get(&self, document: &Document) -> Result<Vec<f32>, IndexError> {
        let cached = match self.entries.read() {
            Ok(entries) => entries.get(&document.id).cloned(),
            Err(e) => {
                log::warn!("document index lock poisoned, recomputing: {}", e);
                None
            }
        };

        match cached {
            Some(embedding) => Ok(embedding),
            None => Ok(self.embedder.embed(&document.embedding_text())?),
        }
    }

    /// Drop every cached entry; the next search rebuilds the cache.
    pub fn reset(&self) {
        match self.entries.write() {
            Ok(mut entries) => entries.clear(),
            Err(e) => {
                log::warn!("document index lock poisoned, clearing anyway");
                e.into_inner().clear();
                self.entries.clear_poison();
            }
        }
    }
}

/// Errors that can occur during index operations.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Document index lock poisoned: {0}")]
    Poisoned(String),
}
