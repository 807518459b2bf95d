use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::search::OutputFormat;
use crate::error::ConfigError;

pub const DEFAULT_EMBEDDING_URL: &str = "http://localhost:11411";
pub const DEFAULT_EMBEDDING_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";
pub const DEFAULT_EMBEDDING_DIMENSION: u32 = 384;
pub const DEFAULT_CHUNK_SIZE: u32 = 800;
pub const DEFAULT_CHUNK_OVERLAP: u32 = 120;
pub const DEFAULT_SOURCE_DIR: &str = "data/source";

const APP_DIR: &str = "docqa";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub chunking: ChunkingConfig,

    #[serde(default)]
    pub ingest: IngestConfig,

    #[serde(default)]
    pub search: SearchConfig,
}

impl Config {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join(APP_DIR).join("config.toml"))
    }

    pub fn models_dir() -> Option<PathBuf> {
        dirs::data_dir().map(|p| p.join(APP_DIR).join("models"))
    }

    /// Load the config file if present, then apply `DOCQA_*` environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::config_path() {
            Some(path) if path.exists() => {
                let content = std::fs::read_to_string(&path)?;
                toml::from_str(&content)?
            }
            _ => Self::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("DOCQA_EMBEDDING_URL")
            && !url.trim().is_empty()
        {
            self.embedding.url = url;
        }
        if let Ok(dir) = std::env::var("DOCQA_STORE_DIR")
            && !dir.trim().is_empty()
        {
            self.store.dir = Some(PathBuf::from(dir));
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunking.chunk_size == 0 || self.chunking.chunk_size <= self.chunking.overlap {
            return Err(ConfigError::ValidationError(format!(
                "chunking.chunk_size ({}) must be greater than chunking.overlap ({})",
                self.chunking.chunk_size, self.chunking.overlap
            )));
        }
        if self.embedding.dimension == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.dimension must be positive".to_string(),
            ));
        }
        if self.embedding.batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.batch_size must be positive".to_string(),
            ));
        }
        if self.search.default_k == 0 {
            return Err(ConfigError::ValidationError(
                "search.default_k must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Write the config file, creating its directory. Returns the written path.
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::config_path().ok_or_else(|| {
            ConfigError::PathError("could not determine config directory".to_string())
        })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        Ok(path)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Remote embedding server speaking the `/embed` protocol
    #[default]
    Http,
    /// Local ONNX sentence-transformer export
    Onnx,
}

impl std::fmt::Display for EmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingProvider::Http => write!(f, "http"),
            EmbeddingProvider::Onnx => write!(f, "onnx"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub provider: EmbeddingProvider,

    #[serde(default = "default_embedding_url")]
    pub url: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    #[serde(default = "default_dimension")]
    pub dimension: u32,

    #[serde(default = "default_model_id")]
    pub model_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_path: Option<PathBuf>,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_embedding_url() -> String {
    DEFAULT_EMBEDDING_URL.to_string()
}

fn default_timeout() -> u64 {
    120
}

fn default_batch_size() -> u32 {
    32
}

fn default_dimension() -> u32 {
    DEFAULT_EMBEDDING_DIMENSION
}

fn default_model_id() -> String {
    DEFAULT_EMBEDDING_MODEL.to_string()
}

fn default_max_tokens() -> u32 {
    256
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::default(),
            url: default_embedding_url(),
            timeout_secs: default_timeout(),
            batch_size: default_batch_size(),
            dimension: default_dimension(),
            model_id: default_model_id(),
            model_path: None,
            max_tokens: default_max_tokens(),
        }
    }
}

impl EmbeddingConfig {
    /// Directory holding `model.onnx` and `tokenizer.json` for the ONNX provider.
    pub fn resolved_model_dir(&self) -> Option<PathBuf> {
        self.model_path.clone().or_else(|| {
            Config::models_dir().map(|dir| dir.join(self.model_id.replace('/', "--")))
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl StoreConfig {
    pub fn resolved_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|p| p.join(APP_DIR).join("store"))
                .unwrap_or_else(|| PathBuf::from("data/store"))
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u32,

    #[serde(default = "default_chunk_overlap")]
    pub overlap: u32,
}

fn default_chunk_size() -> u32 {
    DEFAULT_CHUNK_SIZE
}

fn default_chunk_overlap() -> u32 {
    DEFAULT_CHUNK_OVERLAP
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            overlap: default_chunk_overlap(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,

    #[serde(default = "default_exclude_patterns")]
    pub exclude_patterns: Vec<String>,

    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    #[serde(default = "default_min_printable_ratio")]
    pub min_printable_ratio: f32,
}

fn default_source_dir() -> PathBuf {
    PathBuf::from(DEFAULT_SOURCE_DIR)
}

fn default_exclude_patterns() -> Vec<String> {
    vec![
        "**/.*".to_string(),
        "**/*~".to_string(),
        "**/*.swp".to_string(),
    ]
}

fn default_max_file_size() -> u64 {
    20 * 1024 * 1024
}

fn default_min_printable_ratio() -> f32 {
    0.7
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
            exclude_patterns: default_exclude_patterns(),
            max_file_size: default_max_file_size(),
            min_printable_ratio: default_min_printable_ratio(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_k")]
    pub default_k: u32,

    #[serde(default)]
    pub default_format: OutputFormat,
}

fn default_k() -> u32 {
    5
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_k: default_k(),
            default_format: OutputFormat::Text,
        }
    }
}
