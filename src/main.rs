//! docbundle - bundle customer documents into a single ZIP archive.

use anyhow::{Context, Result};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use clap::Parser;
use std::process;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use docbundle::ArchiveError;
use docbundle::bridge::{ArchiveResult, RequestBridge};
use docbundle::cli::Cli;
use docbundle::config::Config;
use docbundle::io::{ArchiveFile, Base64Source, DirectorySource, InputSource};
use docbundle::pdf::LopdfEngine;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Err(err) = run(cli).await {
        eprintln!("Error: {err:#}");
        process::exit(exit_code(&err));
    }
}

/// Main application logic.
async fn run(cli: Cli) -> Result<()> {
    let config = cli.to_config()?;
    let payload = cli.read_request().await?;

    debug!(
        name = docbundle::NAME,
        version = docbundle::VERSION,
        payload_bytes = payload.len(),
        "starting"
    );

    let outcome = match &cli.documents_dir {
        Some(dir) => build_archive(DirectorySource::new(dir), config, &payload).await,
        None => build_archive(Base64Source::new(), config, &payload).await,
    };

    let Some(path) = &cli.output else {
        let result = match outcome {
            Ok(archive) => ArchiveResult::success(BASE64.encode(archive)),
            Err(err) => ArchiveResult::failure(err.to_string()),
        };
        println!("{}", serde_json::to_string(&result)?);
        return Ok(());
    };

    let archive = outcome?;
    let written = ArchiveFile::new()
        .save(&archive, path)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), bytes = written, "archive written");

    Ok(())
}

async fn build_archive<S>(
    source: S,
    config: Config,
    payload: &str,
) -> std::result::Result<Vec<u8>, ArchiveError>
where
    S: InputSource + 'static,
{
    let engine = LopdfEngine::new(config.engine);
    let bridge = RequestBridge::new(engine, source, config)?;
    bridge.build_archive(payload).await
}

fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<ArchiveError>()
        .map(ArchiveError::exit_code)
        .unwrap_or(1)
}
