use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use strongroom::keepass::import_document;

#[derive(Parser)]
#[command(
    name = "keepass-import",
    about = "Convert a KeePass XML export into Strongroom v1 intake JSON (lossy)"
)]
struct Cli {
    /// Path to the KeePass XML export
    input: PathBuf,
}

fn main() -> Result<()> {
    let _ = tracing_log::LogTracer::init();
    // stdout carries the intake document, so logs go to stderr.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("STRONGROOM_LOG").unwrap_or_else(|_| "strongroom=info".into()),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();
    log::info!("import start {}", cli.input.display());

    let raw = fs::read_to_string(&cli.input)
        .with_context(|| format!("read {}", cli.input.display()))?;
    let database = import_document(&raw)?;
    tracing::info!(entries = database.entries.len(), "imported KeePass export");

    println!("{}", serde_json::to_string(&database)?);
    Ok(())
}
