//! Lexical (keyword) scoring for hybrid search.
//!
//! A single-document BM25 variant: there is no inverse document frequency,
//! and the average document length is a fixed estimate rather than a corpus
//! statistic. Title occurrences count towards term frequency and also add a
//! flat boost per occurrence.

use serde::{Deserialize, Serialize};

use crate::corpus::Document;
use crate::semantic::preprocess::terms;

/// Flat score added per title occurrence of a query term.
const TITLE_BOOST: f32 = 2.0;

/// BM25 tuning parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bm25Params {
    /// Term frequency saturation
    #[serde(default = "default_k1")]
    pub k1: f32,

    /// Length normalization strength [0.0, 1.0]
    #[serde(default = "default_b")]
    pub b: f32,

    /// Estimated average document length in terms.
    /// Kept fixed on purpose; computing it from the corpus changes rankings.
    #[serde(default = "default_avg_doc_length")]
    pub avg_doc_length: f32,
}

fn default_k1() -> f32 {
    1.2
}

fn default_b() -> f32 {
    0.75
}

fn default_avg_doc_length() -> f32 {
    300.0
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self {
            k1: default_k1(),
            b: default_b(),
            avg_doc_length: default_avg_doc_length(),
        }
    }
}

/// Document term, remembering whether it came from the title.
#[derive(Debug, PartialEq)]
enum Term {
    Title(String),
    Body(String),
}

impl Term {
    fn text(&self) -> &str {
        match self {
            Term::Title(t) | Term::Body(t) => t,
        }
    }
}

/// Score a document against a query.
///
/// For every query term (repeated terms count again) with `freq > 0`:
///
/// ```text
/// tf     = freq * (k1 + 1) / (freq + k1 * (1 - b + b * doc_len / avg_doc_len))
/// score += tf + title_matches * 2
/// ```
pub fn bm25_score(query: &str, document: &Document, params: &Bm25Params) -> f32 {
    let query_terms = terms(query);
    if query_terms.is_empty() {
        return 0.0;
    }

    let doc_terms: Vec<Term> = terms(&document.title)
        .into_iter()
        .map(Term::Title)
        .chain(terms(&document.content).into_iter().map(Term::Body))
        .collect();

    let doc_len = doc_terms.len() as f32;
    let length_norm = 1.0 - params.b + params.b * doc_len / params.avg_doc_length;

    query_terms
        .iter()
        .map(|term| {
            let (freq, title_matches) = count_matches(term, &doc_terms);
            if freq == 0 {
                return 0.0;
            }

            let freq = freq as f32;
            let tf = (freq * (params.k1 + 1.0)) / (freq + params.k1 * length_norm);
            tf + title_matches as f32 * TITLE_BOOST
        })
        .sum()
}

/// Returns (total occurrences, title occurrences).
fn count_matches(term: &str, doc_terms: &[Term]) -> (usize, usize) {
    doc_terms
        .iter()
        .filter(|t| t.text() == term)
        .fold((0, 0), |(freq, title), t| match t {
            Term::Title(_) => (freq + 1, title + 1),
            Term::Body(_) => (freq + 1, title),
        })
}
