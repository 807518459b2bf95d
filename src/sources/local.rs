//! Local directory document source.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::IngestError;
use crate::models::{IngestConfig, SourceDocument};
use crate::utils::file::{is_text_file, read_text_file};
use crate::utils::text::printable_ratio;

/// Reads the regular files directly inside one directory.
#[derive(Debug)]
pub struct LocalSource {
    root: PathBuf,
    exclude_patterns: Vec<glob::Pattern>,
    max_file_size: u64,
    min_printable_ratio: f32,
}

impl LocalSource {
    /// Create a new local source.
    ///
    /// Exclude patterns that fail to parse are rejected up front.
    pub fn new(
        root: PathBuf,
        exclude_patterns: &[String],
        max_file_size: u64,
        min_printable_ratio: f32,
    ) -> Result<Self, IngestError> {
        let exclude_patterns = exclude_patterns
            .iter()
            .map(|p| {
                glob::Pattern::new(p)
                    .map_err(|e| IngestError::Walk(format!("invalid exclude pattern '{p}': {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            root,
            exclude_patterns,
            max_file_size,
            min_printable_ratio,
        })
    }

    pub fn from_config(root: PathBuf, config: &IngestConfig) -> Result<Self, IngestError> {
        Self::new(
            root,
            &config.exclude_patterns,
            config.max_file_size,
            config.min_printable_ratio,
        )
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Regular files in the root directory, sorted by file name.
    ///
    /// Subdirectories are not descended into.
    pub fn collect_files(&self) -> Result<Vec<PathBuf>, IngestError> {
        if !self.root.is_dir() {
            return Err(IngestError::Walk(format!(
                "source directory not found: {}",
                self.root.display()
            )));
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| IngestError::Walk(e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if self.is_excluded(path) {
                tracing::debug!(path = %path.display(), "excluded by pattern");
                continue;
            }
            files.push(path.to_path_buf());
        }

        Ok(files)
    }

    /// Read one file into a document.
    ///
    /// Problems with the file itself are carried inside the document so the
    /// pipeline can record the skip and move on.
    pub fn read_document(&self, path: &Path) -> SourceDocument {
        let source = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());

        if !is_text_file(path) {
            return SourceDocument::unreadable(source, "file appears non-text/binary");
        }

        let text = match read_text_file(path, self.max_file_size) {
            Ok(text) => text,
            Err(e) => return SourceDocument::unreadable(source, format!("read failed: {e}")),
        };

        if text.trim().is_empty() {
            return SourceDocument::unreadable(source, "file is empty");
        }

        let ratio = printable_ratio(&text);
        if ratio < self.min_printable_ratio {
            return SourceDocument::unreadable(
                source,
                format!("file appears non-text/binary (printable ratio {ratio:.2})"),
            );
        }

        SourceDocument::new(source, text)
    }

    /// Collect and read every file in the root directory.
    pub fn read_all(&self) -> Result<Vec<SourceDocument>, IngestError> {
        Ok(self
            .collect_files()?
            .iter()
            .map(|path| self.read_document(path))
            .collect())
    }

    /// Patterns match against the path relative to the root.
    fn is_excluded(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        self.exclude_patterns
            .iter()
            .any(|p| p.matches_path(relative))
    }
}
