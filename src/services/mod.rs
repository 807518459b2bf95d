mod chunker;
mod embedding;
mod ingest;
mod query;
mod vector_store;

pub use chunker::{TextChunker, normalize_whitespace};
pub use embedding::{
    Embedder, HealthResponse, HttpEmbedder, NORM_TOLERANCE, OnnxEmbedder, check_embeddings,
    create_embedder, l2_norm, normalize,
};
pub use ingest::{DocumentOutcome, IngestPipeline, IngestSummary, SkippedDocument};
pub use query::QueryEngine;
pub use vector_store::{
    DEFAULT_DIMENSION, FlatIndex, INDEX_FILE, METADATA_FILE, MetadataTable, StoreStats,
    VectorStore,
};
