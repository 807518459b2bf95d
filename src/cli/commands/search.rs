use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::time::Instant;

use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat, SearchResults};
use crate::services::{QueryEngine, create_embedder};

#[derive(Debug, Args)]
pub struct SearchArgs {
    #[arg(required = true, help = "Search query text")]
    pub query: String,

    #[arg(short = 'k', long = "top-k", help = "Number of chunks to return")]
    pub k: Option<u32>,
}

pub async fn handle_search(
    args: SearchArgs,
    store_dir: Option<PathBuf>,
    format: OutputFormat,
    _verbose: bool,
) -> Result<()> {
    let query = args.query.trim();
    if query.is_empty() {
        anyhow::bail!("search query cannot be empty");
    }

    let config = Config::load()?;
    let formatter = get_formatter(format);
    let start_time = Instant::now();

    let k = args.k.unwrap_or(config.search.default_k);
    if k == 0 {
        anyhow::bail!("k must be at least 1");
    }

    let store = super::open_store(&config, store_dir)?;
    if store.is_empty() {
        tracing::warn!(dir = %store.dir().display(), "vector store is empty, run `docqa ingest` first");
    }

    let embedder = create_embedder(&config.embedding).context("failed to create embedder")?;
    let engine = QueryEngine::new(embedder.as_ref());

    let hits = engine
        .search(&store, query, k as usize)
        .await
        .context("search failed")?;

    let duration_ms = start_time.elapsed().as_millis() as u64;
    tracing::debug!(hits = hits.len(), duration_ms, "search finished");

    let results = SearchResults::new(query.to_string(), k, hits, store.len() as u64, duration_ms);
    print!("{}", formatter.format_search_results(&results));

    Ok(())
}
