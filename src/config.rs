use std::path::{Path, PathBuf};

use homedir::my_home;
use serde::{Deserialize, Serialize};

use crate::semantic::{
    AnswerOptions, Bm25Params, RankOptions, DEFAULT_LEXICAL_WEIGHT, DEFAULT_MIN_SCORE,
    DEFAULT_SEMANTIC_WEIGHT, PSEUDO_DIMENSIONS,
};

const CONFIG_FILE: &str = "config.yaml";

/// Default HTTP bind address for `kb serve`
const DEFAULT_BIND: &str = "127.0.0.1:8080";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config is malformed: {0}")]
    Yaml(#[from] serde_yml::Error),

    #[error("{field}: {message}")]
    Invalid { field: String, message: String },

    #[error("couldn't find home dir")]
    NoHomeDir,
}

impl ConfigError {
    fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedderKind {
    /// Deterministic built-in pseudo-embedding
    #[default]
    Pseudo,
    /// fastembed model (requires the `fastembed` feature)
    Fastembed,
}

/// Which embedding strategy backs semantic scoring
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmbedderConfig {
    #[serde(default)]
    pub kind: EmbedderKind,

    /// Pseudo-embedding dimensions
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    /// fastembed model name (e.g., "all-MiniLM-L6-v2")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            kind: EmbedderKind::default(),
            dimensions: default_dimensions(),
            model: None,
        }
    }
}

fn default_dimensions() -> usize {
    PSEUDO_DIMENSIONS
}

/// Ranking and answer tuning
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Weight of cosine similarity in the combined score
    #[serde(default = "default_semantic_weight")]
    pub semantic_weight: f32,

    /// Weight of the BM25 score in the combined score
    #[serde(default = "default_lexical_weight")]
    pub lexical_weight: f32,

    /// Results scoring at or below this are dropped
    #[serde(default = "default_min_score")]
    pub min_score: f32,

    #[serde(default)]
    pub bm25: Bm25Params,

    #[serde(default)]
    pub answer: AnswerOptions,

    #[serde(default)]
    pub embedder: EmbedderConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            semantic_weight: default_semantic_weight(),
            lexical_weight: default_lexical_weight(),
            min_score: default_min_score(),
            bm25: Bm25Params::default(),
            answer: AnswerOptions::default(),
            embedder: EmbedderConfig::default(),
        }
    }
}

fn default_semantic_weight() -> f32 {
    DEFAULT_SEMANTIC_WEIGHT
}

fn default_lexical_weight() -> f32 {
    DEFAULT_LEXICAL_WEIGHT
}

fn default_min_score() -> f32 {
    DEFAULT_MIN_SCORE
}

impl EngineConfig {
    pub fn rank_options(&self, limit: Option<usize>) -> RankOptions {
        RankOptions {
            semantic_weight: self.semantic_weight,
            lexical_weight: self.lexical_weight,
            min_score: self.min_score,
            bm25: self.bm25,
            limit,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, weight) in [
            ("engine.semantic_weight", self.semantic_weight),
            ("engine.lexical_weight", self.lexical_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigError::invalid(
                    field,
                    format!("must be a non-negative number, got {weight}"),
                ));
            }
        }

        if !self.min_score.is_finite() {
            return Err(ConfigError::invalid("engine.min_score", "must be finite"));
        }

        let bm25 = &self.bm25;
        if !bm25.k1.is_finite() || bm25.k1 < 0.0 {
            return Err(ConfigError::invalid(
                "engine.bm25.k1",
                format!("must be non-negative, got {}", bm25.k1),
            ));
        }
        if !(0.0..=1.0).contains(&bm25.b) {
            return Err(ConfigError::invalid(
                "engine.bm25.b",
                format!("must be between 0.0 and 1.0, got {}", bm25.b),
            ));
        }
        if !bm25.avg_doc_length.is_finite() || bm25.avg_doc_length <= 0.0 {
            return Err(ConfigError::invalid(
                "engine.bm25.avg_doc_length",
                format!("must be greater than 0, got {}", bm25.avg_doc_length),
            ));
        }

        if self.answer.source_documents == 0 {
            return Err(ConfigError::invalid(
                "engine.answer.source_documents",
                "must be greater than 0",
            ));
        }
        if self.answer.max_sentences == 0 {
            return Err(ConfigError::invalid(
                "engine.answer.max_sentences",
                "must be greater than 0",
            ));
        }

        if self.embedder.dimensions == 0 {
            return Err(ConfigError::invalid(
                "engine.embedder.dimensions",
                "must be greater than 0",
            ));
        }
        if self.embedder.kind == EmbedderKind::Fastembed && self.embedder.model.is_none() {
            return Err(ConfigError::invalid(
                "engine.embedder.model",
                "is required when kind is fastembed",
            ));
        }

        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// YAML or JSON document list; the built-in knowledge base when unset
    #[serde(default)]
    pub corpus_path: Option<PathBuf>,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(skip_serializing, skip_deserializing)]
    base_path: PathBuf,
}

/// `$KB_BASE_PATH`, or `~/.local/share/kb`.
pub fn default_base_path() -> Result<PathBuf, ConfigError> {
    if let Ok(path) = std::env::var("KB_BASE_PATH") {
        return Ok(PathBuf::from(path));
    }

    let home = my_home()
        .ok()
        .flatten()
        .ok_or(ConfigError::NoHomeDir)?;

    Ok(home.join(".local/share/kb"))
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;

        if self.server.bind.trim().is_empty() {
            return Err(ConfigError::invalid("server.bind", "must not be empty"));
        }

        Ok(())
    }

    /// Load `config.yaml` from a data directory, creating it with defaults if missing.
    pub fn load_with(base_path: &Path) -> Result<Self, ConfigError> {
        Self::load_file(&base_path.join(CONFIG_FILE))
    }

    /// Load a specific config file, creating it with defaults if missing.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, serde_yml::to_string(&Self::default())?)?;
            log::info!("wrote default config to {}", path.display());
        }

        let config_str = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yml::from_str(&config_str)?;

        config.base_path = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        config.validate()?;

        // relative corpus paths are relative to the config file
        if let Some(corpus_path) = &config.corpus_path {
            if corpus_path.is_relative() {
                config.corpus_path = Some(config.base_path.join(corpus_path));
            }
        }

        Ok(config)
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}
