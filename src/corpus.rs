//! Knowledge base documents.
//!
//! The corpus is loaded once (either the built-in relativity knowledge base or a
//! YAML/JSON file named in the config) and never mutated afterwards.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Characters of content shown in a result excerpt.
pub const EXCERPT_CHARS: usize = 200;

/// Built-in knowledge base shipped with the binary.
const BUILTIN_KNOWLEDGE_BASE: &str = include_str!("../data/knowledge_base.yaml");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
}

impl Document {
    /// Text used to build the document embedding.
    pub fn embedding_text(&self) -> String {
        format!("{} {}", self.title, self.content)
    }

    /// First `max_chars` characters of the content followed by "...".
    pub fn excerpt(&self, max_chars: usize) -> String {
        let mut excerpt: String = self.content.chars().take(max_chars).collect();
        excerpt.push_str("...");
        excerpt
    }

    /// First citation, if the document has any.
    pub fn primary_source(&self) -> Option<&str> {
        self.sources
            .as_ref()
            .and_then(|sources| sources.first())
            .map(String::as_str)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed yaml corpus: {0}")]
    Yaml(#[from] serde_yml::Error),

    #[error("malformed json corpus: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported corpus format: {0}")]
    UnsupportedFormat(String),

    #[error("duplicate document id: {0}")]
    DuplicateId(String),

    #[error("corpus has no documents")]
    Empty,
}

/// Ordered, read-only document collection.
#[derive(Debug, Clone)]
pub struct Corpus {
    documents: Vec<Document>,
}

impl Corpus {
    pub fn new(documents: Vec<Document>) -> Result<Self, CorpusError> {
        if documents.is_empty() {
            return Err(CorpusError::Empty);
        }

        let mut seen = HashSet::with_capacity(documents.len());
        for doc in &documents {
            if !seen.insert(doc.id.as_str()) {
                return Err(CorpusError::DuplicateId(doc.id.clone()));
            }
        }

        Ok(Self { documents })
    }

    /// The relativity and light cone knowledge base.
    pub fn builtin() -> Result<Self, CorpusError> {
        Self::from_yaml(BUILTIN_KNOWLEDGE_BASE)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, CorpusError> {
        Self::new(serde_yml::from_str(raw)?)
    }

    pub fn from_json(raw: &str) -> Result<Self, CorpusError> {
        Self::new(serde_json::from_str(raw)?)
    }

    /// Load a corpus file, picking the parser by extension.
    pub fn load(path: &Path) -> Result<Self, CorpusError> {
        let raw = std::fs::read_to_string(path)?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .unwrap_or_default();

        let corpus = match extension.as_str() {
            "yaml" | "yml" => Self::from_yaml(&raw)?,
            "json" => Self::from_json(&raw)?,
            _ => return Err(CorpusError::UnsupportedFormat(path.display().to_string())),
        };

        log::info!(
            "loaded {} documents from {}",
            corpus.len(),
            path.display()
        );

        Ok(corpus)
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn get(&self, id: &str) -> Option<&Document> {
        self.documents.iter().find(|doc| doc.id == id)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Distinct tags in first-seen order.
    pub fn topics(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.documents
            .iter()
            .flat_map(|doc| doc.tags.iter())
            .filter(|tag| seen.insert(tag.to_lowercase()))
            .cloned()
            .collect()
    }
}
