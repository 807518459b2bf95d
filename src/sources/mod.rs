//! Document sources.
//!
//! Sources turn a location on disk into [`SourceDocument`](crate::models::SourceDocument)s
//! that the ingestion pipeline can consume.

mod local;

pub use local::LocalSource;
