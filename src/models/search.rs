//! Search-related models for ranked results.

use serde::{Deserialize, Serialize};

use super::chunk::ChunkRecord;

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// Machine-parseable JSON format
    Json,
    /// Documentation-friendly Markdown format
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            _ => Err(format!("unknown output format: {}", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

/// A single ranked hit joined back to its metadata row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Inner product with the query (cosine similarity for unit vectors)
    pub score: f32,

    /// Ordinal position of the row in the store
    pub row_index: usize,

    #[serde(flatten)]
    pub chunk: ChunkRecord,
}

/// Ranked hits for one query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults {
    /// Query that was executed
    pub query: String,

    /// Requested number of hits
    pub k: u32,

    pub hits: Vec<SearchHit>,

    /// Rows in the store at query time
    pub store_size: u64,

    /// Query execution time in milliseconds
    pub duration_ms: u64,
}

impl SearchResults {
    pub fn new(query: String, k: u32, hits: Vec<SearchHit>, store_size: u64, duration_ms: u64) -> Self {
        Self {
            query,
            k,
            hits,
            store_size,
            duration_ms,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }
}
