//! Ingest command implementation.

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};
use crate::services::{DocumentOutcome, IngestPipeline, TextChunker, create_embedder};
use crate::sources::LocalSource;

#[derive(Debug, Args)]
pub struct IngestArgs {
    /// Directory of documents to ingest (defaults to ingest.source_dir)
    pub dir: Option<PathBuf>,

    /// List the files that would be ingested without touching the store
    #[arg(long)]
    pub dry_run: bool,
}

pub async fn handle_ingest(
    args: IngestArgs,
    store_dir: Option<PathBuf>,
    format: OutputFormat,
    verbose: bool,
) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);

    let root = args.dir.unwrap_or_else(|| config.ingest.source_dir.clone());
    let source = LocalSource::from_config(root, &config.ingest)?;
    let files = source
        .collect_files()
        .with_context(|| format!("failed to list {}", source.root().display()))?;

    if args.dry_run {
        print!(
            "{}",
            formatter.format_message(&format!("Dry run: would ingest {} files", files.len()))
        );
        for file in &files {
            println!("  {}", file.display());
        }
        return Ok(());
    }

    let chunker = TextChunker::from_config(&config.chunking)?;
    let embedder = create_embedder(&config.embedding).context("failed to create embedder")?;
    let mut store = super::open_store(&config, store_dir)?;

    tracing::info!(
        dir = %source.root().display(),
        files = files.len(),
        embedder = %embedder.describe(),
        "starting ingestion"
    );

    let documents = files.iter().map(|path| source.read_document(path)).collect();

    let pb = if verbose || format != OutputFormat::Text {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(files.len() as u64)
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            )
            .context("invalid progress template")?
            .progress_chars("#>-"),
    );

    let pipeline = IngestPipeline::new(&chunker, embedder.as_ref());
    let summary = pipeline
        .ingest_with_progress(&mut store, documents, |name, outcome| {
            pb.inc(1);
            if let DocumentOutcome::Skipped { .. } = outcome {
                pb.set_message(format!("skipped {name}"));
            } else {
                pb.set_message(name.to_string());
            }
        })
        .await
        .context("ingestion failed")?;
    pb.finish_and_clear();

    print!("{}", formatter.format_ingest_summary(&summary));

    Ok(())
}
