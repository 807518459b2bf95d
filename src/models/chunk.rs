use serde::{Deserialize, Serialize};

/// One metadata row of the vector store, aligned with the vector at the same row index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Position of the source document in the sorted listing of its ingestion run
    pub doc_id: u32,
    /// Position of the chunk within its document, starting at 0
    pub chunk_id: u32,
    /// Original file name, kept for provenance
    pub source: String,
    pub text: String,
}

impl ChunkRecord {
    pub fn new(doc_id: u32, chunk_id: u32, source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            doc_id,
            chunk_id,
            source: source.into(),
            text: text.into(),
        }
    }

    /// Build the records for every chunk of one document, numbering them in order.
    pub fn for_document(doc_id: u32, source: &str, chunks: &[String]) -> Vec<Self> {
        chunks
            .iter()
            .enumerate()
            .map(|(chunk_id, text)| Self::new(doc_id, chunk_id as u32, source, text.clone()))
            .collect()
    }
}

/// Extracted text of one document handed to the ingestion pipeline.
///
/// `text` carries the reader's failure instead of the text when the file could
/// not be turned into usable text; the pipeline records it as a skip.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub source: String,
    pub text: Result<String, String>,
}

impl SourceDocument {
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            text: Ok(text.into()),
        }
    }

    pub fn unreadable(source: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            text: Err(reason.into()),
        }
    }
}
