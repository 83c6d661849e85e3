//! Hybrid retrieval over the knowledge base.
//!
//! # Architecture
//!
//! - `preprocess`: Tokenization and sentence splitting
//! - `embeddings`: Pseudo-embedding (and optional fastembed) behind the `Embedder` trait
//! - `index`: Per-document embedding cache and cosine similarity
//! - `lexical`: Single-document BM25 with title boost
//! - `hybrid`: Score fusion, filtering and ordering
//! - `concepts`: Key concept extraction and highlighting
//! - `synthesis`: Extractive answer with citations
//! - `service`: `SearchEngine` facade tying it all together

pub mod concepts;
pub mod embeddings;
pub mod hybrid;
pub mod index;
pub mod lexical;
pub mod preprocess;
pub mod service;
pub mod synthesis;

pub use embeddings::PSEUDO_DIMENSIONS;
pub use hybrid::{
    RankOptions, Relevance, SearchResult, DEFAULT_LEXICAL_WEIGHT, DEFAULT_MIN_SCORE,
    DEFAULT_SEMANTIC_WEIGHT,
};
pub use lexical::Bm25Params;
pub use service::{EngineError, SearchEngine};
pub use synthesis::{Answer, AnswerOptions, NOT_FOUND_MESSAGE};
