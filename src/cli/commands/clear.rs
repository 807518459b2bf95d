use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};

#[derive(Debug, Args)]
pub struct ClearArgs {
    /// Skip confirmation prompt
    #[arg(long, short = 'y')]
    pub force: bool,
}

pub async fn handle_clear(
    args: ClearArgs,
    store_dir: Option<PathBuf>,
    format: OutputFormat,
    _verbose: bool,
) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);
    let mut store = super::open_store(&config, store_dir)?;

    if !args.force {
        println!(
            "This will delete the vector store at {} ({} rows). Continue? [y/N]",
            store.dir().display(),
            store.len()
        );
        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        if !input.trim().eq_ignore_ascii_case("y") {
            print!("{}", formatter.format_message("Cancelled."));
            return Ok(());
        }
    }

    store.clear().context("failed to clear vector store")?;

    print!(
        "{}",
        formatter.format_message(&format!(
            "Vector store cleared: {}",
            store.dir().display()
        ))
    );
    Ok(())
}
