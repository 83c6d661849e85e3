//! Hybrid ranking combining semantic and lexical scores.
//!
//! Every corpus document is scored twice:
//! - semantic: cosine similarity between query and document embeddings
//! - lexical: single-document BM25 with a title boost
//!
//! and the two are fused linearly:
//!   score(d) = w_sem * semantic(d) + w_lex * lexical(d)
//!
//! Results at or below the minimum score are dropped; the rest are stably
//! sorted so that ties keep corpus order.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::corpus::{Corpus, Document};
use crate::semantic::index::{cosine_similarity, DocumentIndex, IndexError};
use crate::semantic::lexical::{bm25_score, Bm25Params};

/// Default semantic weight for hybrid search.
pub const DEFAULT_SEMANTIC_WEIGHT: f32 = 0.7;

/// Default lexical weight for hybrid search.
pub const DEFAULT_LEXICAL_WEIGHT: f32 = 0.3;

/// Results scoring at or below this are dropped.
pub const DEFAULT_MIN_SCORE: f32 = 0.2;

/// Qualitative relevance of a combined score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Relevance {
    #[serde(rename = "Highly relevant")]
    High,
    #[serde(rename = "Relevant")]
    Relevant,
    #[serde(rename = "Somewhat relevant")]
    Somewhat,
    #[serde(rename = "Marginally relevant")]
    Marginal,
}

impl Relevance {
    pub fn from_score(score: f32) -> Self {
        if score > 0.8 {
            Self::High
        } else if score > 0.6 {
            Self::Relevant
        } else if score > 0.4 {
            Self::Somewhat
        } else {
            Self::Marginal
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::High => "Highly relevant",
            Self::Relevant => "Relevant",
            Self::Somewhat => "Somewhat relevant",
            Self::Marginal => "Marginally relevant",
        }
    }

    /// Longer, user-facing explanation of the label.
    pub fn explanation(&self) -> &'static str {
        match self {
            Self::High => "Strong semantic and keyword match",
            Self::Relevant => "Good semantic similarity to your query",
            Self::Somewhat => "Contains some related concepts",
            Self::Marginal => "Limited connection to your query",
        }
    }
}

impl std::fmt::Display for Relevance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.label(), self.explanation())
    }
}

/// A ranked document.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult<'a> {
    pub document: &'a Document,
    /// Fused score
    pub score: f32,
    pub relevance: Relevance,
}

/// Fusion weights, cut-off and lexical parameters for one ranking pass.
#[derive(Debug, Clone)]
pub struct RankOptions {
    pub semantic_weight: f32,
    pub lexical_weight: f32,
    pub min_score: f32,
    pub bm25: Bm25Params,
    /// Maximum number of results; all passing results when `None`
    pub limit: Option<usize>,
}

impl Default for RankOptions {
    fn default() -> Self {
        Self {
            semantic_weight: DEFAULT_SEMANTIC_WEIGHT,
            lexical_weight: DEFAULT_LEXICAL_WEIGHT,
            min_score: DEFAULT_MIN_SCORE,
            bm25: Bm25Params::default(),
            limit: None,
        }
    }
}

/// Rank every corpus document against `query`.
///
/// A blank query returns no results without touching the index. Otherwise the
/// index is initialized on first use and documents are scored in parallel;
/// the output is non-increasing in score and contains nothing at or below
/// `options.min_score`.
pub fn rank<'a>(
    query: &str,
    corpus: &'a Corpus,
    index: &DocumentIndex,
    options: &RankOptions,
) -> Result<Vec<SearchResult<'a>>, IndexError> {
    if query.trim().is_empty() {
        return Ok(vec![]);
    }

    if index.is_empty() {
        index.ensure_initialized(corpus)?;
    }

    let query_embedding = index.embedder().embed(query)?;

    // indexed collect keeps corpus order, which the stable sort below relies on
    let scored = corpus
        .documents()
        .par_iter()
        .map(|document| -> Result<SearchResult<'a>, IndexError> {
            let doc_embedding = index.get(document)?;
            let semantic = cosine_similarity(&query_embedding, &doc_embedding)?;
            let lexical = bm25_score(query, document, &options.bm25);
            let score = options.semantic_weight * semantic + options.lexical_weight * lexical;

            Ok(SearchResult {
                document,
                score,
                relevance: Relevance::from_score(score),
            })
        })
        .collect::<Result<Vec<_>, IndexError>>()?;

    let mut results: Vec<SearchResult<'a>> = scored
        .into_iter()
        .filter(|result| result.score > options.min_score)
        .collect();

    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    if let Some(limit) = options.limit {
        results.truncate(limit);
    }

    log::debug!("ranked {} of {} documents for {:?}", results.len(), corpus.len(), query);

    Ok(results)
}
