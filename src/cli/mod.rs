//! Command-line interface for docqa.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::models::OutputFormat;

/// Local document retrieval: ingest a folder, then search it by meaning.
#[derive(Debug, Parser)]
#[command(name = "docqa")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[arg(
        long,
        short = 'f',
        global = true,
        help = "Output format: text, json, or markdown"
    )]
    pub format: Option<OutputFormat>,

    #[arg(long, short = 'v', global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(
        long,
        global = true,
        env = "DOCQA_STORE_DIR",
        help = "Directory holding the persisted vector store"
    )]
    pub store_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Chunk, embed and store every file in a directory
    Ingest(commands::IngestArgs),

    /// Find the chunks closest in meaning to a query
    Search(commands::SearchArgs),

    /// Show store contents and embedder health
    Status,

    /// Delete the persisted store
    Clear(commands::ClearArgs),

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::ConfigCommand),
}
