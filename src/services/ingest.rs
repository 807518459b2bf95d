//! Ingestion: chunk each document, embed its chunks in one batch, append to the store.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;

use crate::error::{IngestError, StoreError};
use crate::models::{ChunkRecord, SourceDocument};
use crate::services::{Embedder, TextChunker, VectorStore, check_embeddings};

/// What happened to one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentOutcome {
    Ingested { chunks: usize },
    Skipped { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedDocument {
    pub source: String,
    pub reason: String,
}

/// Counts reported after an ingestion run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestSummary {
    pub files_found: u64,
    pub files_ingested: u64,
    pub files_skipped: u64,
    pub chunks_indexed: u64,
    /// Metadata rows in the store after the run
    pub total_rows: u64,
    pub skipped: Vec<SkippedDocument>,
    pub store_dir: PathBuf,
    pub duration_ms: u64,
}

pub struct IngestPipeline<'a> {
    chunker: &'a TextChunker,
    embedder: &'a dyn Embedder,
}

impl<'a> IngestPipeline<'a> {
    pub fn new(chunker: &'a TextChunker, embedder: &'a dyn Embedder) -> Self {
        Self { chunker, embedder }
    }

    pub async fn ingest(
        &self,
        store: &mut VectorStore,
        documents: Vec<SourceDocument>,
    ) -> Result<IngestSummary, IngestError> {
        self.ingest_with_progress(store, documents, |_, _| {}).await
    }

    /// Ingest `documents` in filename order and save the store once at the end.
    ///
    /// A document that cannot be read, chunked or embedded is skipped and the
    /// run continues. Store errors abort the run without saving.
    pub async fn ingest_with_progress<F>(
        &self,
        store: &mut VectorStore,
        mut documents: Vec<SourceDocument>,
        mut on_document: F,
    ) -> Result<IngestSummary, IngestError>
    where
        F: FnMut(&str, &DocumentOutcome),
    {
        let start = Instant::now();

        if self.embedder.dimension() != store.dimension() {
            return Err(StoreError::DimensionMismatch {
                expected: store.dimension(),
                actual: self.embedder.dimension(),
            }
            .into());
        }

        documents.sort_by(|a, b| a.source.cmp(&b.source));

        let mut summary = IngestSummary {
            files_found: documents.len() as u64,
            ..Default::default()
        };

        for (doc_id, document) in documents.into_iter().enumerate() {
            let source = document.source.clone();
            let outcome = self.process_document(store, doc_id as u32, document).await?;

            match &outcome {
                DocumentOutcome::Ingested { chunks } => {
                    tracing::info!(source = %source, chunks, "ingested document");
                    summary.files_ingested += 1;
                    summary.chunks_indexed += *chunks as u64;
                }
                DocumentOutcome::Skipped { reason } => {
                    tracing::warn!(source = %source, reason = %reason, "skipping document");
                    summary.files_skipped += 1;
                    summary.skipped.push(SkippedDocument {
                        source: source.clone(),
                        reason: reason.clone(),
                    });
                }
            }
            on_document(&source, &outcome);
        }

        store.save()?;

        summary.total_rows = store.len() as u64;
        summary.store_dir = store.dir().to_path_buf();
        summary.duration_ms = start.elapsed().as_millis() as u64;

        tracing::info!(
            found = summary.files_found,
            ingested = summary.files_ingested,
            skipped = summary.files_skipped,
            chunks = summary.chunks_indexed,
            rows = summary.total_rows,
            "ingestion complete"
        );

        Ok(summary)
    }

    /// Chunk, embed and append one document.
    ///
    /// Per-document failures, including embedder output of the wrong count,
    /// width or norm, come back as [`DocumentOutcome::Skipped`]; only store
    /// errors are returned as `Err`.
    pub async fn process_document(
        &self,
        store: &mut VectorStore,
        doc_id: u32,
        document: SourceDocument,
    ) -> Result<DocumentOutcome, IngestError> {
        let text = match document.text {
            Ok(text) => text,
            Err(reason) => return Ok(DocumentOutcome::Skipped { reason }),
        };

        let chunks = self.chunker.split(&text);
        if chunks.is_empty() {
            return Ok(DocumentOutcome::Skipped {
                reason: "produced 0 chunks".to_string(),
            });
        }

        let vectors = match self.embedder.encode(&chunks).await {
            Ok(vectors) => vectors,
            Err(e) => {
                return Ok(DocumentOutcome::Skipped {
                    reason: format!("embedding failed: {e}"),
                });
            }
        };

        if let Err(e) = check_embeddings(chunks.len(), store.dimension(), &vectors) {
            return Ok(DocumentOutcome::Skipped {
                reason: format!("embedding failed: {e}"),
            });
        }

        let records = ChunkRecord::for_document(doc_id, &document.source, &chunks);
        store.add(&vectors, records)?;

        Ok(DocumentOutcome::Ingested {
            chunks: chunks.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EmbeddingError;
    use async_trait::async_trait;

    /// Maps each chunk to a unit axis chosen by its first letter.
    struct AxisEmbedder {
        dimension: usize,
        fail_on: Option<&'static str>,
        /// Texts containing this marker get one extra component
        widen_on: Option<&'static str>,
        drop_one: bool,
    }

    impl AxisEmbedder {
        fn new(dimension: usize) -> Self {
            Self {
                dimension,
                fail_on: None,
                widen_on: None,
                drop_one: false,
            }
        }
    }

    #[async_trait]
    impl Embedder for AxisEmbedder {
        async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            if let Some(marker) = self.fail_on
                && texts.iter().any(|t| t.contains(marker))
            {
                return Err(EmbeddingError::Timeout);
            }
            let mut vectors: Vec<Vec<f32>> = texts
                .iter()
                .map(|t| {
                    let axis = t.bytes().next().map_or(0, |b| b as usize % self.dimension);
                    let mut v = vec![0.0; self.dimension];
                    v[axis] = 1.0;
                    if self.widen_on.is_some_and(|marker| t.contains(marker)) {
                        v.push(0.0);
                    }
                    v
                })
                .collect();
            if self.drop_one {
                vectors.pop();
            }
            Ok(vectors)
        }

        fn dimension(&self) -> usize {
            self.dimension
        }

        fn describe(&self) -> String {
            "axis".to_string()
        }
    }

    #[tokio::test]
    async fn test_middle_document_without_chunks_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = VectorStore::load(dir.path(), 4).unwrap();
        let chunker = TextChunker::new(3, 1).unwrap();
        let embedder = AxisEmbedder::new(4);
        let pipeline = IngestPipeline::new(&chunker, &embedder);

        let docs = vec![
            SourceDocument::new("c.txt", "a b c d e"),
            SourceDocument::new("b.txt", "   \t  "),
            SourceDocument::new("a.txt", "x y"),
        ];
        let summary = pipeline.ingest(&mut store, docs).await.unwrap();

        assert_eq!(summary.files_found, 3);
        assert_eq!(summary.files_ingested, 2);
        assert_eq!(summary.files_skipped, 1);
        assert_eq!(summary.skipped[0].source, "b.txt");
        assert_eq!(summary.chunks_indexed, 4);
        assert_eq!(summary.total_rows, 4);

        // a.txt sorts first (doc 0), b.txt is doc 1 and contributes nothing
        let records = store.records();
        assert_eq!(records[0], ChunkRecord::new(0, 0, "a.txt", "x y"));
        assert!(records.iter().all(|r| r.source != "b.txt"));
        assert_eq!(records[1], ChunkRecord::new(2, 0, "c.txt", "a b c"));
        assert_eq!(records[3], ChunkRecord::new(2, 2, "c.txt", "e"));

        // saved exactly as held in memory
        let reloaded = VectorStore::load(dir.path(), 4).unwrap();
        assert_eq!(reloaded.records(), store.records());
    }

    #[tokio::test]
    async fn test_embedding_failure_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = VectorStore::load(dir.path(), 4).unwrap();
        let chunker = TextChunker::new(10, 2).unwrap();
        let embedder = AxisEmbedder {
            fail_on: Some("poison"),
            ..AxisEmbedder::new(4)
        };
        let pipeline = IngestPipeline::new(&chunker, &embedder);

        let docs = vec![
            SourceDocument::new("1.txt", "fine text"),
            SourceDocument::new("2.txt", "poison pill"),
            SourceDocument::unreadable("3.bin", "file appears non-text/binary"),
            SourceDocument::new("4.txt", "also fine"),
        ];
        let mut seen = Vec::new();
        let summary = pipeline
            .ingest_with_progress(&mut store, docs, |source, outcome| {
                seen.push((source.to_string(), outcome.clone()));
            })
            .await
            .unwrap();

        assert_eq!(summary.files_ingested, 2);
        assert_eq!(summary.files_skipped, 2);
        assert!(summary.skipped[0].reason.contains("embedding failed"));
        assert_eq!(summary.skipped[1].reason, "file appears non-text/binary");
        assert_eq!(store.len(), 2);
        assert_eq!(seen.len(), 4);
        assert_eq!(seen[0].1, DocumentOutcome::Ingested { chunks: 1 });
    }

    #[tokio::test]
    async fn test_count_mismatch_skips_document() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = VectorStore::load(dir.path(), 4).unwrap();
        let chunker = TextChunker::new(2, 0).unwrap();
        let embedder = AxisEmbedder {
            drop_one: true,
            ..AxisEmbedder::new(4)
        };
        let pipeline = IngestPipeline::new(&chunker, &embedder);

        let outcome = pipeline
            .process_document(&mut store, 0, SourceDocument::new("a.txt", "a b c d"))
            .await
            .unwrap();
        assert!(matches!(outcome, DocumentOutcome::Skipped { .. }));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_wrong_width_vector_skips_only_that_document() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = VectorStore::load(dir.path(), 2).unwrap();
        let chunker = TextChunker::new(10, 2).unwrap();
        let embedder = AxisEmbedder {
            widen_on: Some("bad"),
            ..AxisEmbedder::new(2)
        };
        let pipeline = IngestPipeline::new(&chunker, &embedder);

        let docs = vec![
            SourceDocument::new("a.txt", "good one"),
            SourceDocument::new("b.txt", "bad one"),
            SourceDocument::new("c.txt", "fine too"),
        ];
        let summary = pipeline.ingest(&mut store, docs).await.unwrap();

        assert_eq!(summary.files_ingested, 2);
        assert_eq!(summary.files_skipped, 1);
        assert_eq!(summary.skipped[0].source, "b.txt");
        assert!(summary.skipped[0].reason.contains("dimension"));
        assert_eq!(store.len(), 2);

        let reloaded = VectorStore::load(dir.path(), 2).unwrap();
        let sources: Vec<&str> = reloaded.records().iter().map(|r| r.source.as_str()).collect();
        assert_eq!(sources, vec!["a.txt", "c.txt"]);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = VectorStore::load(dir.path(), 8).unwrap();
        let chunker = TextChunker::new(3, 1).unwrap();
        let embedder = AxisEmbedder::new(4);
        let pipeline = IngestPipeline::new(&chunker, &embedder);

        let result = pipeline
            .ingest(&mut store, vec![SourceDocument::new("a.txt", "a b")])
            .await;
        assert!(matches!(
            result,
            Err(IngestError::Store(StoreError::DimensionMismatch { .. }))
        ));
        assert!(!store.index_path().exists());
    }

    #[tokio::test]
    async fn test_empty_run_still_saves() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = VectorStore::load(dir.path(), 4).unwrap();
        let chunker = TextChunker::new(3, 1).unwrap();
        let embedder = AxisEmbedder::new(4);
        let pipeline = IngestPipeline::new(&chunker, &embedder);

        let summary = pipeline.ingest(&mut store, vec![]).await.unwrap();
        assert_eq!(summary.files_found, 0);
        assert_eq!(summary.total_rows, 0);
        assert!(store.index_path().exists());
        assert!(store.metadata_path().exists());
    }
}
