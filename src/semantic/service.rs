//! Search engine facade over the knowledge base.
//!
//! Owns the corpus, the document index and the engine tuning, and exposes
//! the whole query flow:
//! - ranking (semantic + lexical)
//! - key concept extraction and highlighting
//! - extractive answer synthesis

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::config::{Config, ConfigError, EmbedderConfig, EmbedderKind, EngineConfig};
use crate::corpus::{Corpus, CorpusError, Document};
use crate::semantic::concepts::{self, QueryContext};
use crate::semantic::embeddings::{Embedder, EmbeddingError, PseudoEmbedder};
use crate::semantic::hybrid::{self, SearchResult};
use crate::semantic::index::{DocumentIndex, IndexError};
use crate::semantic::synthesis;

/// Errors that can occur during search engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Corpus error: {0}")]
    Corpus(#[from] CorpusError),

    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Document not found: {0}")]
    DocumentNotFound(String),
}

/// Result of the full ask flow.
#[derive(Debug, Serialize)]
pub struct QueryResponse<'a> {
    #[serde(flatten)]
    pub context: QueryContext,
    pub results: Vec<SearchResult<'a>>,
    pub answer: String,
}

/// Hybrid search over one corpus.
///
/// Thread-safe: the index initializes itself on first search, so one engine
/// can be shared behind an `Arc`.
pub struct SearchEngine {
    corpus: Corpus,
    index: DocumentIndex,
    config: EngineConfig,
}

impl SearchEngine {
    pub fn new(corpus: Corpus, embedder: Arc<dyn Embedder>, config: EngineConfig) -> Self {
        Self {
            corpus,
            index: DocumentIndex::new(embedder),
            config,
        }
    }

    /// Engine with the pseudo-embedder and default tuning.
    #[cfg(test)]
    pub fn with_defaults(corpus: Corpus) -> Self {
        Self::new(
            corpus,
            Arc::new(PseudoEmbedder::default()),
            EngineConfig::default(),
        )
    }

    /// Build the engine described by a loaded config.
    ///
    /// Uses the built-in knowledge base unless `corpus_path` is set.
    pub fn from_config(config: &Config) -> Result<Self, EngineError> {
        let corpus = match &config.corpus_path {
            Some(path) => {
                log::info!("loading corpus from {}", path.display());
                Corpus::load(path)?
            }
            None => Corpus::builtin()?,
        };

        let embedder = build_embedder(&config.engine.embedder, config.base_path())?;

        Ok(Self::new(corpus, embedder, config.engine.clone()))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn index(&self) -> &DocumentIndex {
        &self.index
    }

    /// Embed every document up front; returns the number of indexed documents.
    pub fn initialize(&self) -> Result<usize, EngineError> {
        Ok(self.index.ensure_initialized(&self.corpus)?)
    }

    /// Drop cached embeddings and embed every document again.
    pub fn reindex(&self) -> Result<usize, EngineError> {
        self.index.reset();
        self.initialize()
    }

    /// Every relevant document, best first.
    pub fn search(&self, query: &str) -> Result<Vec<SearchResult<'_>>, EngineError> {
        self.search_with_limit(query, None)
    }

    pub fn search_with_limit(
        &self,
        query: &str,
        limit: Option<usize>,
    ) -> Result<Vec<SearchResult<'_>>, EngineError> {
        let options = self.config.rank_options(limit);
        Ok(hybrid::rank(query, &self.corpus, &self.index, &options)?)
    }

    pub fn extract_concepts(&self, query: &str) -> Vec<String> {
        concepts::extract_concepts(query)
    }

    pub fn highlight(&self, text: &str, concepts: &[String]) -> String {
        concepts::highlight(text, concepts)
    }

    /// Answer text for already ranked results.
    pub fn synthesize(&self, query: &str, results: &[SearchResult<'_>]) -> String {
        synthesis::synthesize(query, results, &self.config.answer)
    }

    /// Concepts, ranked results and synthesized answer for one query.
    pub fn ask(&self, query: &str) -> Result<QueryResponse<'_>, EngineError> {
        let context = QueryContext::new(query);
        let results = self.search(query)?;
        let answer = self.synthesize(query, &results);

        log::debug!(
            "answered {:?} from {} results, concepts {:?}",
            query,
            results.len(),
            context.concepts
        );

        Ok(QueryResponse {
            context,
            results,
            answer,
        })
    }

    pub fn document(&self, id: &str) -> Option<&Document> {
        self.corpus.get(id)
    }

    /// Like [`SearchEngine::document`], but an unknown id is an error.
    pub fn require_document(&self, id: &str) -> Result<&Document, EngineError> {
        self.document(id)
            .ok_or_else(|| EngineError::DocumentNotFound(id.to_string()))
    }

    pub fn documents(&self) -> &[Document] {
        self.corpus.documents()
    }

    /// Suggested topics: distinct tags in first-seen order.
    pub fn topics(&self) -> Vec<String> {
        self.corpus.topics()
    }
}

/// Instantiate the configured embedding strategy.
pub fn build_embedder(
    config: &EmbedderConfig,
    base_path: &Path,
) -> Result<Arc<dyn Embedder>, EngineError> {
    match config.kind {
        EmbedderKind::Pseudo => Ok(Arc::new(PseudoEmbedder::new(config.dimensions))),
        EmbedderKind::Fastembed => build_fastembed(config, base_path),
    }
}

#[cfg(feature = "fastembed")]
fn build_fastembed(
    config: &EmbedderConfig,
    base_path: &Path,
) -> Result<Arc<dyn Embedder>, EngineError> {
    use crate::semantic::embeddings::FastEmbedder;

    let model = config.model.as_deref().ok_or_else(|| {
        EmbeddingError::InvalidModel("engine.embedder.model is not set".to_string())
    })?;

    Ok(Arc::new(FastEmbedder::new(model, base_path.to_path_buf())?))
}

#[cfg(not(feature = "fastembed"))]
fn build_fastembed(
    _config: &EmbedderConfig,
    _base_path: &Path,
) -> Result<Arc<dyn Embedder>, EngineError> {
    Err(EmbeddingError::InitFailed(
        "kb was built without the `fastembed` feature".to_string(),
    )
    .into())
}
