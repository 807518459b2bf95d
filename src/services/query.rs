//! Query path: embed the query, search the store, return ranked rows as-is.

use crate::error::{EmbeddingError, SearchError};
use crate::models::SearchHit;
use crate::services::{Embedder, VectorStore};

pub struct QueryEngine<'a> {
    embedder: &'a dyn Embedder,
}

impl<'a> QueryEngine<'a> {
    pub fn new(embedder: &'a dyn Embedder) -> Self {
        Self { embedder }
    }

    /// Top-`k` chunks for `query`, best first.
    ///
    /// An empty store answers with no hits without calling the embedder.
    pub async fn search(
        &self,
        store: &VectorStore,
        query: &str,
        k: usize,
    ) -> Result<Vec<SearchHit>, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::InvalidQuery(
                "query cannot be empty".to_string(),
            ));
        }
        if k == 0 {
            return Err(SearchError::InvalidQuery("k must be at least 1".to_string()));
        }
        if store.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = self
            .embedder
            .encode(&[query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::InvalidResponse("empty embedding response".to_string()))?;

        tracing::debug!(k, rows = store.len(), "searching vector store");
        Ok(store.search(&query_vector, k)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChunkRecord;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Always answers with the same vector and counts calls.
    struct FixedEmbedder {
        vector: Vec<f32>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts.iter().map(|_| self.vector.clone()).collect())
        }

        fn dimension(&self) -> usize {
            self.vector.len()
        }

        fn describe(&self) -> String {
            "fixed".to_string()
        }
    }

    fn embedder(vector: Vec<f32>) -> FixedEmbedder {
        FixedEmbedder {
            vector,
            calls: AtomicUsize::new(0),
        }
    }

    #[tokio::test]
    async fn test_returns_ranked_hits_without_filtering() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = VectorStore::load(dir.path(), 2).unwrap();
        store
            .add(
                &[vec![0.0, 1.0], vec![1.0, 0.0], vec![0.0, -1.0]],
                vec![
                    ChunkRecord::new(0, 0, "a.txt", "up"),
                    ChunkRecord::new(0, 1, "a.txt", "right"),
                    ChunkRecord::new(1, 0, "b.txt", "down"),
                ],
            )
            .unwrap();

        let fixed = embedder(vec![1.0, 0.0]);
        let engine = QueryEngine::new(&fixed);
        let hits = engine.search(&store, "which way", 3).await.unwrap();

        let texts: Vec<&str> = hits.iter().map(|h| h.chunk.text.as_str()).collect();
        assert_eq!(texts, vec!["right", "up", "down"]);
        assert_eq!(hits[0].score, 1.0);
        assert_eq!(fixed.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_store_returns_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = VectorStore::load(dir.path(), 2).unwrap();
        let fixed = embedder(vec![1.0, 0.0]);
        let engine = QueryEngine::new(&fixed);

        let hits = engine.search(&store, "anything", 5).await.unwrap();
        assert!(hits.is_empty());
        assert_eq!(fixed.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_rejects_empty_query() {
        let dir = tempfile::tempdir().unwrap();
        let store = VectorStore::load(dir.path(), 2).unwrap();
        let fixed = embedder(vec![1.0, 0.0]);
        let engine = QueryEngine::new(&fixed);

        assert!(matches!(
            engine.search(&store, "   ", 5).await,
            Err(SearchError::InvalidQuery(_))
        ));
        assert!(matches!(
            engine.search(&store, "ok", 0).await,
            Err(SearchError::InvalidQuery(_))
        ));
    }

    #[tokio::test]
    async fn test_query_dimension_mismatch_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = VectorStore::load(dir.path(), 2).unwrap();
        store
            .add(&[vec![1.0, 0.0]], vec![ChunkRecord::new(0, 0, "a.txt", "x")])
            .unwrap();
        let fixed = embedder(vec![1.0, 0.0, 0.0]);
        let engine = QueryEngine::new(&fixed);

        assert!(matches!(
            engine.search(&store, "x", 1).await,
            Err(SearchError::Store(_))
        ));
    }
}
