//! Metadata table persisted as a single SQLite file, one row per stored vector.

use rusqlite::{Connection, OpenFlags, params};
use std::path::Path;

use super::temp_path;
use crate::error::StoreError;
use crate::models::ChunkRecord;

const SCHEMA: &str = r#"
CREATE TABLE chunks (
    row_index INTEGER PRIMARY KEY,
    doc_id INTEGER NOT NULL,
    chunk_id INTEGER NOT NULL,
    source TEXT NOT NULL,
    text TEXT NOT NULL
);
"#;

#[derive(Debug, Clone, Default)]
pub struct MetadataTable {
    rows: Vec<ChunkRecord>,
}

impl MetadataTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, row: usize) -> Option<&ChunkRecord> {
        self.rows.get(row)
    }

    pub fn rows(&self) -> &[ChunkRecord] {
        &self.rows
    }

    pub fn extend(&mut self, records: Vec<ChunkRecord>) {
        self.rows.extend(records);
    }

    /// Read every row ordered by `row_index`, which must run `0..n` without gaps.
    pub fn read(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        let mut stmt = conn.prepare(
            "SELECT row_index, doc_id, chunk_id, source, text FROM chunks ORDER BY row_index",
        )?;

        let mapped = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                ChunkRecord {
                    doc_id: row.get(1)?,
                    chunk_id: row.get(2)?,
                    source: row.get(3)?,
                    text: row.get(4)?,
                },
            ))
        })?;

        let mut rows = Vec::new();
        for (expected, row) in mapped.enumerate() {
            let (row_index, record) = row?;
            if row_index != expected as i64 {
                return Err(StoreError::Integrity(format!(
                    "metadata row {} found where row {} was expected",
                    row_index, expected
                )));
            }
            rows.push(record);
        }

        Ok(Self { rows })
    }

    /// Write a fresh database next to `path`, then rename it over `path`.
    pub fn write(&self, path: &Path) -> Result<(), StoreError> {
        let tmp = temp_path(path);
        if tmp.exists() {
            std::fs::remove_file(&tmp)?;
        }

        {
            let mut conn = Connection::open(&tmp)?;
            conn.execute_batch(SCHEMA)?;
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO chunks (row_index, doc_id, chunk_id, source, text)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )?;
                for (row_index, record) in self.rows.iter().enumerate() {
                    stmt.execute(params![
                        row_index as i64,
                        record.doc_id,
                        record.chunk_id,
                        record.source,
                        record.text
                    ])?;
                }
            }
            tx.commit()?;
        }

        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}
