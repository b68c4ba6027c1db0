use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use strongroom::convert::convert_database;

#[derive(Parser)]
#[command(
    name = "migrate",
    about = "Convert a decrypted, decompressed Strongroom v1 JSON file to the v2 schema"
)]
struct Cli {
    /// Path to the decrypted v1 JSON file
    input: PathBuf,

    /// Account username recorded in the v2 sync parameters
    username: String,
}

fn main() -> Result<()> {
    let _ = tracing_log::LogTracer::init();
    // stdout carries the converted document, so logs go to stderr.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("STRONGROOM_LOG").unwrap_or_else(|_| "strongroom=info".into()),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();
    log::info!("migration start {}", cli.input.display());

    let raw = fs::read_to_string(&cli.input)
        .with_context(|| format!("read {}", cli.input.display()))?;
    let input: serde_json::Value =
        serde_json::from_str(&raw).with_context(|| format!("parse {}", cli.input.display()))?;

    let database = convert_database(&input, &cli.username)?;
    tracing::info!(objects = database.objects.len(), "converted v1 database");

    println!("{}", serde_json::to_string(&database)?);
    Ok(())
}
