use anyhow::{Context, Result};
use clap::Subcommand;

use crate::cli::output::{Formatter, get_formatter};
use crate::models::{Config, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    #[command(about = "Write a default configuration file")]
    Init {
        #[arg(long, help = "Force overwrite existing config")]
        force: bool,
    },
    #[command(about = "Show current configuration")]
    Show,
    #[command(about = "Show configuration file path")]
    Path,
}

pub async fn handle_config(cmd: ConfigCommand, format: OutputFormat, _verbose: bool) -> Result<()> {
    let formatter = get_formatter(format);

    match cmd {
        ConfigCommand::Init { force } => handle_init(force, formatter.as_ref()),
        ConfigCommand::Show => handle_show(format),
        ConfigCommand::Path => handle_path(formatter.as_ref()),
    }
}

fn handle_init(force: bool, formatter: &dyn Formatter) -> Result<()> {
    let config_path =
        Config::config_path().ok_or_else(|| anyhow::anyhow!("could not determine config directory"))?;

    if config_path.exists() && !force {
        anyhow::bail!(
            "Config already exists at: {}\nUse --force to overwrite.",
            config_path.display()
        );
    }

    let path = Config::default()
        .save()
        .context("failed to write config")?;
    print!(
        "{}",
        formatter.format_message(&format!("Created config at: {}", path.display()))
    );
    Ok(())
}

fn handle_show(format: OutputFormat) -> Result<()> {
    let config = Config::load()?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    match Config::config_path() {
        Some(path) if path.exists() => println!("# Config: {}", path.display()),
        _ => println!("# Config: defaults (no config file)"),
    }
    println!("# Store dir: {}", config.store.resolved_dir().display());
    println!();
    print!("{}", toml::to_string_pretty(&config)?);

    Ok(())
}

fn handle_path(formatter: &dyn Formatter) -> Result<()> {
    let path =
        Config::config_path().ok_or_else(|| anyhow::anyhow!("could not determine config directory"))?;
    let state = if path.exists() { "active" } else { "not created" };
    print!(
        "{}",
        formatter.format_message(&format!("{} ({state})", path.display()))
    );
    Ok(())
}
