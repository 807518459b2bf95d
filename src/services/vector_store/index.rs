//! Flat inner-product index: every vector stored contiguously, searched exactly.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use super::temp_path;
use crate::error::StoreError;

const MAGIC: [u8; 4] = *b"DQIX";
const FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct IndexFileRef<'a> {
    magic: [u8; 4],
    version: u32,
    dimension: u64,
    data: &'a [f32],
}

#[derive(Deserialize)]
struct IndexFile {
    magic: [u8; 4],
    version: u32,
    dimension: u64,
    data: Vec<f32>,
}

/// Append-only matrix of `dimension`-wide rows.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dimension: usize,
    data: Vec<f32>,
}

impl FlatIndex {
    pub fn new(dimension: usize) -> Result<Self, StoreError> {
        if dimension == 0 {
            return Err(StoreError::InvalidIndex(
                "dimension must be positive".to_string(),
            ));
        }
        Ok(Self {
            dimension,
            data: Vec::new(),
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.data.len() / self.dimension
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn vector(&self, row: usize) -> Option<&[f32]> {
        let start = row.checked_mul(self.dimension)?;
        self.data.get(start..start + self.dimension)
    }

    /// Append rows in order. Nothing is appended unless every row has the index dimension.
    pub fn add(&mut self, vectors: &[Vec<f32>]) -> Result<(), StoreError> {
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dimension) {
            return Err(StoreError::DimensionMismatch {
                expected: self.dimension,
                actual: bad.len(),
            });
        }

        self.data.reserve(vectors.len() * self.dimension);
        for vector in vectors {
            self.data.extend_from_slice(vector);
        }
        Ok(())
    }

    /// Exact top-k by inner product as `(row, score)`, best first.
    ///
    /// Equal scores rank the lower row first.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>, StoreError> {
        if k == 0 {
            return Err(StoreError::InvalidK);
        }
        if query.len() != self.dimension {
            return Err(StoreError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .data
            .chunks_exact(self.dimension)
            .map(|row| dot(row, query))
            .enumerate()
            .collect();

        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, rank);
            scored.truncate(k);
        }
        scored.sort_by(rank);

        Ok(scored)
    }

    pub fn read(path: &Path) -> Result<Self, StoreError> {
        let reader = BufReader::new(File::open(path)?);
        let file: IndexFile = bincode::deserialize_from(reader)?;

        if file.magic != MAGIC {
            return Err(StoreError::InvalidIndex(format!(
                "{} is not an index file",
                path.display()
            )));
        }
        if file.version != FORMAT_VERSION {
            return Err(StoreError::InvalidIndex(format!(
                "unsupported index format version {}",
                file.version
            )));
        }

        let dimension = file.dimension as usize;
        if dimension == 0 || file.data.len() % dimension != 0 {
            return Err(StoreError::InvalidIndex(format!(
                "{} values do not form rows of dimension {}",
                file.data.len(),
                dimension
            )));
        }

        Ok(Self {
            dimension,
            data: file.data,
        })
    }

    /// Write to a sibling temporary file, then rename over `path`.
    pub fn write(&self, path: &Path) -> Result<(), StoreError> {
        let tmp = temp_path(path);
        {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            bincode::serialize_into(
                &mut writer,
                &IndexFileRef {
                    magic: MAGIC,
                    version: FORMAT_VERSION,
                    dimension: self.dimension as u64,
                    data: &self.data,
                },
            )?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Descending score, NaN last, then ascending row.
fn rank(a: &(usize, f32), b: &(usize, f32)) -> Ordering {
    b.1.partial_cmp(&a.1)
        .unwrap_or_else(|| a.1.is_nan().cmp(&b.1.is_nan()))
        .then(a.0.cmp(&b.0))
}
