//! Persistent exact-search vector store.
//!
//! A store is a [`FlatIndex`] and a [`MetadataTable`] grown in lock-step, so
//! vector row `n` and metadata row `n` always describe the same chunk. The
//! pair lives in one directory as `index.bin` and `meta.sqlite` and is only
//! ever loaded, saved or cleared together.
//!
//! Mutation takes `&mut self` and search takes `&self`; share a store across
//! threads behind a `Mutex` (or `RwLock`), never by cloning its files.

mod index;
mod metadata;

pub use index::FlatIndex;
pub use metadata::MetadataTable;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::models::{ChunkRecord, SearchHit};

pub const INDEX_FILE: &str = "index.bin";
pub const METADATA_FILE: &str = "meta.sqlite";

/// Default embedding dimension (all-MiniLM-L6-v2)
pub const DEFAULT_DIMENSION: usize = 384;

/// Summary of a store's contents for status output.
#[derive(Debug, Clone, Default)]
pub struct StoreStats {
    pub rows: u64,
    pub sources: u64,
    pub documents: u64,
    pub dimension: usize,
    pub index_bytes: u64,
    pub metadata_bytes: u64,
}

#[derive(Debug)]
pub struct VectorStore {
    dir: PathBuf,
    index: FlatIndex,
    metadata: MetadataTable,
}

impl VectorStore {
    /// Load the store persisted under `dir`, or start an empty one.
    ///
    /// Both files must be present, or both absent for a fresh store. The
    /// loaded pair must agree on row count and the index must have `dimension`.
    pub fn load(dir: impl Into<PathBuf>, dimension: usize) -> Result<Self, StoreError> {
        let dir = dir.into();
        if dimension == 0 {
            return Err(StoreError::InvalidIndex(
                "dimension must be positive".to_string(),
            ));
        }

        let index_path = dir.join(INDEX_FILE);
        let metadata_path = dir.join(METADATA_FILE);
        if index_path.exists() != metadata_path.exists() {
            let (present, missing) = if index_path.exists() {
                (INDEX_FILE, METADATA_FILE)
            } else {
                (METADATA_FILE, INDEX_FILE)
            };
            return Err(StoreError::Integrity(format!(
                "{present} exists in {} but {missing} does not",
                dir.display()
            )));
        }

        let index = if index_path.exists() {
            let index = FlatIndex::read(&index_path)?;
            if index.dimension() != dimension {
                return Err(StoreError::DimensionMismatch {
                    expected: dimension,
                    actual: index.dimension(),
                });
            }
            index
        } else {
            FlatIndex::new(dimension)?
        };

        let metadata = if metadata_path.exists() {
            MetadataTable::read(&metadata_path)?
        } else {
            MetadataTable::new()
        };

        if index.len() != metadata.len() {
            return Err(StoreError::Integrity(format!(
                "{} holds {} vectors but {} holds {} metadata rows",
                INDEX_FILE,
                index.len(),
                METADATA_FILE,
                metadata.len()
            )));
        }

        tracing::debug!(dir = %dir.display(), rows = index.len(), dimension, "loaded vector store");

        Ok(Self {
            dir,
            index,
            metadata,
        })
    }

    /// Append vectors and their metadata rows in input order.
    ///
    /// Fails without changing the store if the lengths differ or any vector
    /// has the wrong dimension. Identical inputs added twice are stored twice.
    pub fn add(&mut self, vectors: &[Vec<f32>], records: Vec<ChunkRecord>) -> Result<(), StoreError> {
        if vectors.len() != records.len() {
            return Err(StoreError::LengthMismatch {
                vectors: vectors.len(),
                records: records.len(),
            });
        }

        self.index.add(vectors)?;
        self.metadata.extend(records);
        debug_assert_eq!(self.index.len(), self.metadata.len());
        Ok(())
    }

    /// Persist both files, overwriting previous contents.
    ///
    /// Each file is replaced by rename, but the two renames are independent:
    /// an interruption between them leaves a pair that fails to load.
    pub fn save(&self) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir)?;
        self.index.write(&self.index_path())?;
        self.metadata.write(&self.metadata_path())?;
        tracing::info!(dir = %self.dir.display(), rows = self.len(), "saved vector store");
        Ok(())
    }

    /// Exact top-`k` rows by inner product with `query`, best first.
    ///
    /// Returns `min(k, len)` hits; equal scores keep insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>, StoreError> {
        let ranked = self.index.search(query, k)?;

        ranked
            .into_iter()
            .map(|(row_index, score)| {
                let chunk = self.metadata.get(row_index).cloned().ok_or_else(|| {
                    StoreError::Integrity(format!("no metadata for row {}", row_index))
                })?;
                Ok(SearchHit {
                    score,
                    row_index,
                    chunk,
                })
            })
            .collect()
    }

    /// Delete both persisted files and empty the in-memory store.
    pub fn clear(&mut self) -> Result<(), StoreError> {
        for path in [self.index_path(), self.metadata_path()] {
            match std::fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        self.index = FlatIndex::new(self.index.dimension())?;
        self.metadata = MetadataTable::new();
        tracing::info!(dir = %self.dir.display(), "cleared vector store");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.index.dimension()
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn index_path(&self) -> PathBuf {
        self.dir.join(INDEX_FILE)
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.dir.join(METADATA_FILE)
    }

    pub fn records(&self) -> &[ChunkRecord] {
        self.metadata.rows()
    }

    pub fn vector(&self, row: usize) -> Option<&[f32]> {
        self.index.vector(row)
    }

    pub fn stats(&self) -> StoreStats {
        let rows = self.records();
        let sources: BTreeSet<&str> = rows.iter().map(|r| r.source.as_str()).collect();
        let documents: BTreeSet<(u32, &str)> =
            rows.iter().map(|r| (r.doc_id, r.source.as_str())).collect();

        StoreStats {
            rows: self.len() as u64,
            sources: sources.len() as u64,
            documents: documents.len() as u64,
            dimension: self.dimension(),
            index_bytes: file_size(&self.index_path()),
            metadata_bytes: file_size(&self.metadata_path()),
        }
    }
}

fn file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

/// Sibling path used while a file is being rewritten.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(doc_id: u32, chunk_id: u32, text: &str) -> ChunkRecord {
        ChunkRecord::new(doc_id, chunk_id, format!("doc{doc_id}.txt"), text)
    }

    fn unit(dim: usize, axis: usize) -> Vec<f32> {
        let mut v = vec![0.0; dim];
        v[axis] = 1.0;
        v
    }

    #[test]
    fn test_fresh_store_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = VectorStore::load(dir.path().join("store"), 4).unwrap();
        assert!(store.is_empty());
        assert_eq!(store.dimension(), 4);
        assert!(store.search(&unit(4, 0), 3).unwrap().is_empty());
    }

    #[test]
    fn test_two_dimensional_example() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = VectorStore::load(dir.path(), 2).unwrap();
        store
            .add(
                &[vec![1.0, 0.0], vec![0.0, 1.0]],
                vec![record(0, 0, "v1"), record(0, 1, "v2")],
            )
            .unwrap();

        let hits = store.search(&[1.0, 0.0], 2).unwrap();
        let scores: Vec<f32> = hits.iter().map(|h| h.score).collect();
        assert_eq!(scores, vec![1.0, 0.0]);
        assert_eq!(hits[0].chunk.text, "v1");
        assert_eq!(hits[1].chunk.text, "v2");
    }

    #[test]
    fn test_k_larger_than_store() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = VectorStore::load(dir.path(), 3).unwrap();
        store
            .add(
                &[unit(3, 0), unit(3, 1)],
                vec![record(0, 0, "a"), record(0, 1, "b")],
            )
            .unwrap();
        assert_eq!(store.search(&unit(3, 1), 10).unwrap().len(), 2);
    }

    #[test]
    fn test_add_rejects_mismatch_without_mutation() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = VectorStore::load(dir.path(), 2).unwrap();

        let err = store
            .add(&[vec![1.0, 0.0]], vec![record(0, 0, "a"), record(0, 1, "b")])
            .unwrap_err();
        assert!(matches!(err, StoreError::LengthMismatch { .. }));

        let err = store
            .add(
                &[vec![1.0, 0.0], vec![1.0, 0.0, 0.0]],
                vec![record(0, 0, "a"), record(0, 1, "b")],
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::DimensionMismatch { .. }));

        assert_eq!(store.len(), 0);
        assert!(store.records().is_empty());
    }

    #[test]
    fn test_duplicate_add_duplicates_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = VectorStore::load(dir.path(), 2).unwrap();
        for _ in 0..2 {
            store
                .add(&[vec![1.0, 0.0]], vec![record(0, 0, "same")])
                .unwrap();
        }
        assert_eq!(store.len(), 2);
        let hits = store.search(&[1.0, 0.0], 2).unwrap();
        assert_eq!(hits[0].row_index, 0);
        assert_eq!(hits[1].row_index, 1);
    }

    #[test]
    fn test_save_load_roundtrip_search_identical() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = VectorStore::load(dir.path(), 3).unwrap();
        let s = 1.0 / 2f32.sqrt();
        store
            .add(
                &[vec![s, s, 0.0], unit(3, 2), unit(3, 0), vec![0.0, s, s]],
                vec![
                    record(0, 0, "alpha"),
                    record(0, 1, "beta"),
                    record(1, 0, "gamma"),
                    record(2, 0, "delta"),
                ],
            )
            .unwrap();
        store.save().unwrap();

        let reloaded = VectorStore::load(dir.path(), 3).unwrap();
        assert_eq!(reloaded.len(), 4);
        for probe in [unit(3, 0), unit(3, 1), vec![s, 0.0, s]] {
            assert_eq!(
                store.search(&probe, 3).unwrap(),
                reloaded.search(&probe, 3).unwrap()
            );
        }
    }

    #[test]
    fn test_row_count_mismatch_is_integrity_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = VectorStore::load(dir.path(), 2).unwrap();
        store
            .add(&[vec![1.0, 0.0]], vec![record(0, 0, "a")])
            .unwrap();
        store.save().unwrap();

        // Simulate an interrupted save: only the index was rewritten
        let mut index = FlatIndex::new(2).unwrap();
        index.add(&[vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
        index.write(&dir.path().join(INDEX_FILE)).unwrap();

        assert!(matches!(
            VectorStore::load(dir.path(), 2),
            Err(StoreError::Integrity(_))
        ));
    }

    #[test]
    fn test_load_with_zero_dimension_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            VectorStore::load(dir.path(), 0),
            Err(StoreError::InvalidIndex(_))
        ));
    }

    #[test]
    fn test_metadata_without_index_is_integrity_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = VectorStore::load(dir.path(), 2).unwrap();
        store
            .add(&[vec![1.0, 0.0]], vec![record(0, 0, "a")])
            .unwrap();
        store.save().unwrap();
        std::fs::remove_file(dir.path().join(INDEX_FILE)).unwrap();

        assert!(matches!(
            VectorStore::load(dir.path(), 2),
            Err(StoreError::Integrity(_))
        ));
    }

    #[test]
    fn test_index_without_metadata_is_integrity_error() {
        let dir = tempfile::tempdir().unwrap();
        FlatIndex::new(2)
            .unwrap()
            .write(&dir.path().join(INDEX_FILE))
            .unwrap();

        assert!(matches!(
            VectorStore::load(dir.path(), 2),
            Err(StoreError::Integrity(_))
        ));
    }

    #[test]
    fn test_dimension_change_rejected_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = VectorStore::load(dir.path(), 2).unwrap();
        store.save().unwrap();

        assert!(matches!(
            VectorStore::load(dir.path(), 3),
            Err(StoreError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_clear_removes_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = VectorStore::load(dir.path(), 2).unwrap();
        store
            .add(&[vec![1.0, 0.0]], vec![record(0, 0, "a")])
            .unwrap();
        store.save().unwrap();
        assert!(store.index_path().exists());

        store.clear().unwrap();
        assert!(store.is_empty());
        assert!(!store.index_path().exists());
        assert!(!store.metadata_path().exists());
        assert!(VectorStore::load(dir.path(), 2).unwrap().is_empty());
    }

    #[test]
    fn test_stats() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = VectorStore::load(dir.path(), 2).unwrap();
        store
            .add(
                &[vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0]],
                vec![record(0, 0, "a"), record(0, 1, "b"), record(1, 0, "c")],
            )
            .unwrap();
        store.save().unwrap();

        let stats = store.stats();
        assert_eq!(stats.rows, 3);
        assert_eq!(stats.sources, 2);
        assert_eq!(stats.documents, 2);
        assert!(stats.index_bytes > 0);
        assert!(stats.metadata_bytes > 0);
    }

    #[test]
    fn test_temp_path() {
        assert_eq!(
            temp_path(Path::new("/data/store/index.bin")),
            PathBuf::from("/data/store/index.bin.tmp")
        );
    }
}
