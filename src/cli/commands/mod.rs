mod clear;
mod config;
mod ingest;
mod search;
mod status;

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::models::Config;
use crate::services::VectorStore;

pub use clear::ClearArgs;
pub use config::ConfigCommand;
pub use ingest::IngestArgs;
pub use search::SearchArgs;

pub use clear::handle_clear;
pub use config::handle_config;
pub use ingest::handle_ingest;
pub use search::handle_search;
pub use status::handle_status;

/// Store directory from the command line, falling back to configuration.
fn store_dir(config: &Config, cli_dir: Option<PathBuf>) -> PathBuf {
    cli_dir.unwrap_or_else(|| config.store.resolved_dir())
}

fn open_store(config: &Config, cli_dir: Option<PathBuf>) -> Result<VectorStore> {
    let dir = store_dir(config, cli_dir);
    VectorStore::load(&dir, config.embedding.dimension as usize)
        .with_context(|| format!("failed to load vector store from {}", dir.display()))
}
