use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use docqa::cli::commands::{
    handle_clear, handle_config, handle_ingest, handle_search, handle_status,
};
use docqa::cli::output::get_formatter;
use docqa::cli::{Cli, Commands};
use docqa::models::{Config, OutputFormat};

/// Detect the ONNX Runtime library and set ORT_DYLIB_PATH if not already set.
/// Must be called before any ort code runs.
fn detect_and_set_ort_path() {
    if std::env::var("ORT_DYLIB_PATH")
        .map(|p| Path::new(&p).exists())
        .unwrap_or(false)
    {
        return;
    }

    let home = std::env::var("HOME").unwrap_or_default();

    let found = if cfg!(target_os = "macos") {
        [
            format!("{home}/.local/lib/docqa/libonnxruntime.dylib"),
            "/opt/homebrew/opt/onnxruntime/lib/libonnxruntime.dylib".into(),
            "/usr/local/opt/onnxruntime/lib/libonnxruntime.dylib".into(),
        ]
        .into_iter()
        .find(|p| Path::new(p).exists())
    } else if cfg!(target_os = "linux") {
        [
            format!("{home}/.local/lib/docqa/libonnxruntime.so"),
            "/usr/lib/libonnxruntime.so".into(),
            "/usr/local/lib/libonnxruntime.so".into(),
            "/usr/lib/x86_64-linux-gnu/libonnxruntime.so".into(),
            "/usr/lib/aarch64-linux-gnu/libonnxruntime.so".into(),
        ]
        .into_iter()
        .find(|p| Path::new(p).exists())
    } else {
        None
    };

    if let Some(path) = found {
        // SAFETY: called at program start before the runtime spawns any threads.
        unsafe {
            std::env::set_var("ORT_DYLIB_PATH", path);
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "docqa=debug" } else { "docqa=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    detect_and_set_ort_path();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let default_format = Config::load()
        .map(|c| c.search.default_format)
        .unwrap_or_default();
    let format = cli.format.unwrap_or(default_format);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let result = runtime.block_on(run_command(cli.command, cli.store_dir, format, cli.verbose));

    if let Err(ref e) = result {
        tracing::debug!(error = ?e, "command failed");
        eprint!("{}", get_formatter(format).format_error(&format!("{e:#}")));
        std::process::exit(1);
    }

    Ok(())
}

async fn run_command(
    command: Commands,
    store_dir: Option<PathBuf>,
    format: OutputFormat,
    verbose: bool,
) -> Result<()> {
    match command {
        Commands::Ingest(args) => handle_ingest(args, store_dir, format, verbose).await,
        Commands::Search(args) => handle_search(args, store_dir, format, verbose).await,
        Commands::Status => handle_status(store_dir, format, verbose).await,
        Commands::Clear(args) => handle_clear(args, store_dir, format, verbose).await,
        Commands::Config(cmd) => handle_config(cmd, format, verbose).await,
    }
}
