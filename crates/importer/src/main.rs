//! AM-Vision print importer
//!
//! Uploads the reference data, model files, prints and batches described by
//! a metadata file, then repopulates the batches.

mod output;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use connector_lib::{ApiClient, Importer, Metadata};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// AM-Vision print importer
#[derive(Parser)]
#[command(name = "amv-import")]
#[command(author, version, about = "Print importer for AM-Vision", long_about = None)]
pub struct Cli {
    /// AM-Vision url
    pub url: String,

    /// AM-Vision token
    pub token: String,

    /// Path to yaml file with print metadata
    pub meta_fn: PathBuf,

    /// Only log warnings and errors
    #[arg(long, short)]
    pub quiet: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.quiet { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    if let Err(e) = run(&cli).await {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let start = Utc::now();

    let api = Arc::new(ApiClient::new(&cli.url, &cli.token)?);
    let importer = Importer::new(api);

    output::print_info("Loading metadata");
    let meta = Metadata::load(&cli.meta_fn)
        .await
        .with_context(|| format!("cannot load {}", cli.meta_fn.display()))?;

    output::print_info("Uploading material references, views, print attributes and queries");
    importer.one_time_imports(&meta).await?;

    output::print_info("Uploading designs, prints and batches");
    let report = importer.import_all(&meta).await?;
    for line in output::report_lines(&report) {
        output::print_success(&line);
    }

    let elapsed = Utc::now() - start;
    println!("{}", output::format_elapsed(elapsed.num_seconds()));
    Ok(())
}
