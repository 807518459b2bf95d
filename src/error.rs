//! Error types for docqa.

use thiserror::Error;

use crate::utils::retry::Retryable;

/// Errors related to chunking parameters.
#[derive(Debug, Error)]
pub enum ChunkError {
    #[error("invalid chunk parameters: chunk_size={chunk_size}, overlap={overlap} (chunk_size must exceed overlap)")]
    InvalidParameters { chunk_size: usize, overlap: usize },
}

/// Errors related to embedding operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("failed to connect to embedding server: {0}")]
    ConnectionError(String),

    #[error("embedding server error: {0}")]
    ServerError(String),

    #[error("embedding request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("embedding timeout")]
    Timeout,

    #[error("model not found: {0}")]
    ModelNotFound(String),

    #[error("failed to load model: {0}")]
    ModelLoad(String),

    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    #[error("inference error: {0}")]
    Inference(String),
}

impl Retryable for EmbeddingError {
    fn is_retryable(&self) -> bool {
        match self {
            EmbeddingError::ConnectionError(_) | EmbeddingError::Timeout => true,
            // 5xx gateway errors and rate limiting are transient
            EmbeddingError::ServerError(msg) => {
                msg.contains("503")
                    || msg.contains("502")
                    || msg.contains("504")
                    || msg.contains("429")
                    || msg.to_lowercase().contains("unavailable")
                    || msg.to_lowercase().contains("too many requests")
            }
            EmbeddingError::RequestError(e) => e.is_timeout() || e.is_connect(),
            EmbeddingError::InvalidResponse(_)
            | EmbeddingError::ModelNotFound(_)
            | EmbeddingError::ModelLoad(_)
            | EmbeddingError::Tokenizer(_)
            | EmbeddingError::Inference(_) => false,
        }
    }
}

/// Errors related to the vector store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("index encoding error: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("metadata database error: {0}")]
    Metadata(#[from] rusqlite::Error),

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("length mismatch: {vectors} vectors but {records} metadata rows")]
    LengthMismatch { vectors: usize, records: usize },

    #[error("k must be at least 1")]
    InvalidK,

    #[error("store integrity error: {0}")]
    Integrity(String),

    #[error("invalid index file: {0}")]
    InvalidIndex(String),
}

/// Errors that abort an ingestion run.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("chunking error: {0}")]
    Chunk(#[from] ChunkError),

    #[error("vector store error: {0}")]
    Store(#[from] StoreError),

    #[error("directory walk error: {0}")]
    Walk(String),
}

/// Errors related to search operations.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("vector store error: {0}")]
    Store(#[from] StoreError),

    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

/// Errors related to configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    #[error("path error: {0}")]
    PathError(String),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Application-level errors that wrap domain errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("chunk error: {0}")]
    Chunk(#[from] ChunkError),

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("ingest error: {0}")]
    Ingest(#[from] IngestError),

    #[error("search error: {0}")]
    Search(#[from] SearchError),
}
