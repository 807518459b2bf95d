use anyhow::Result;
use std::path::PathBuf;

use crate::cli::output::{StatusInfo, get_formatter};
use crate::models::{Config, EmbeddingProvider, OutputFormat};
use crate::services::HttpEmbedder;

pub async fn handle_status(
    store_dir: Option<PathBuf>,
    format: OutputFormat,
    _verbose: bool,
) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);
    let store = super::open_store(&config, store_dir)?;

    let (embedder, embedder_ready, embedder_detail) = match config.embedding.provider {
        EmbeddingProvider::Http => {
            let name = format!("http ({})", config.embedding.url);
            match HttpEmbedder::new(&config.embedding)?.health_check().await {
                Ok(health) => (name, true, health.model_id),
                Err(e) => (name, false, Some(e.to_string())),
            }
        }
        EmbeddingProvider::Onnx => {
            let name = format!("onnx ({})", config.embedding.model_id);
            match config.embedding.resolved_model_dir() {
                Some(dir) if dir.join("model.onnx").exists() => {
                    (name, true, Some(dir.display().to_string()))
                }
                Some(dir) => (
                    name,
                    false,
                    Some(format!("model.onnx not found in {}", dir.display())),
                ),
                None => (
                    name,
                    false,
                    Some("could not determine models directory".to_string()),
                ),
            }
        }
    };

    let status = StatusInfo {
        store_dir: store.dir().to_path_buf(),
        store: store.stats(),
        embedder,
        embedder_ready,
        embedder_detail,
    };

    print!("{}", formatter.format_status(&status));

    if !status.embedder_ready {
        eprintln!();
        eprintln!("Hint: the embedder is unavailable; ingest and search will fail until it is.");
    }

    Ok(())
}
