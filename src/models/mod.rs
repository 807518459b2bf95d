mod chunk;
mod config;
mod search;

pub use chunk::{ChunkRecord, SourceDocument};
pub use config::{
    ChunkingConfig, Config, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, DEFAULT_EMBEDDING_DIMENSION,
    DEFAULT_EMBEDDING_MODEL, DEFAULT_EMBEDDING_URL, EmbeddingConfig, EmbeddingProvider,
    IngestConfig, SearchConfig, StoreConfig,
};
pub use search::{OutputFormat, SearchHit, SearchResults};
