//! CLI argument parsing for docbundle.
//!
//! This module defines the command-line interface structure using `clap`
//! and turns it into a validated [`Config`].
//!
//! # Examples
//!
//! ```no_run
//! use docbundle::cli::Cli;
//! use clap::Parser;
//!
//! let cli = Cli::parse();
//! let config = cli.to_config().expect("Invalid configuration");
//! ```

use clap::Parser;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tokio::io::AsyncReadExt;

use crate::config::{CompressionLevel, Config};
use crate::error::{ArchiveError, Result};
use crate::pdf::EngineConfig;

/// Bundle a customer's documents into a single ZIP archive.
///
/// docbundle reads an archive request (customer, documents and the output
/// files to produce), trims and merges PDFs as requested and writes one
/// archive entry per output file.
#[derive(Parser, Debug)]
#[command(name = "docbundle")]
#[command(version)]
#[command(about = "Bundle customer documents into a single ZIP archive", long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Request payload (JSON)
    ///
    /// Use '-' to read the request from stdin.
    ///
    /// Examples:
    ///   docbundle request.json -o bundle.zip
    ///   cat request.json | docbundle - -o bundle.zip
    #[arg(value_name = "REQUEST")]
    pub request: PathBuf,

    /// Output archive path
    ///
    /// The archive is written to a temporary file first and renamed into
    /// place. Without this option the result is printed to stdout as
    /// `{"resultArchive": "<base64>"}` or `{"error": "<message>"}`.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Resolve document handles as paths below this directory
    ///
    /// By default every document's `blob` is decoded as base64 content.
    /// With this option it is treated as a relative file path instead.
    #[arg(short, long, value_name = "DIR")]
    pub documents_dir: Option<PathBuf>,

    /// Compression level for archive entries
    ///
    /// - none: Store entries uncompressed
    /// - standard: Deflate (default)
    /// - maximum: Deflate at the highest level
    #[arg(short, long, value_name = "LEVEL", default_value = "standard")]
    #[arg(value_parser = ["none", "standard", "maximum"])]
    pub compression: String,

    /// Compression level for trimmed and merged PDFs
    ///
    /// Documents copied unchanged are never recompressed.
    #[arg(long, value_name = "LEVEL", default_value = "standard")]
    #[arg(value_parser = ["none", "standard", "maximum"])]
    pub pdf_compression: String,

    /// Fail when a page selector starts past the last page
    ///
    /// By default such selectors match nothing and are ignored.
    #[arg(long)]
    pub strict_ranges: bool,

    /// Abort the request after this many seconds
    #[arg(short, long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Fixed timestamp for filenames and entry dates (e.g. 2024-03-07_09-05-01)
    ///
    /// Makes the output reproducible. Defaults to the current local time.
    #[arg(long, value_name = "TS")]
    pub timestamp: Option<String>,

    /// Verbose output - log every fetched document and written entry
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    /// Convert CLI arguments into a validated Config.
    ///
    /// # Errors
    ///
    /// Returns an error if a compression level or the timestamp is invalid,
    /// or if the resulting configuration fails validation.
    pub fn to_config(&self) -> Result<Config> {
        let compression = CompressionLevel::from_str(&self.compression)?;
        let pdf_compression = CompressionLevel::from_str(&self.pdf_compression)?;

        let timestamp = self
            .timestamp
            .as_deref()
            .map(Config::parse_timestamp)
            .transpose()?;

        let config = Config {
            compression,
            engine: EngineConfig {
                compression: pdf_compression,
                strict_ranges: self.strict_ranges,
            },
            timeout: self.timeout.map(Duration::from_secs),
            timestamp,
        };

        config.validate()?;
        Ok(config)
    }

    /// Default log filter for the chosen verbosity.
    ///
    /// `RUST_LOG` takes precedence when set.
    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            "warn"
        } else if self.verbose {
            "docbundle=debug,info"
        } else {
            "info"
        }
    }

    /// Read the request payload from the file or stdin.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be read.
    pub async fn read_request(&self) -> Result<String> {
        read_payload(&self.request).await
    }
}

async fn read_payload(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut payload = String::new();
        tokio::io::stdin().read_to_string(&mut payload).await?;
        return Ok(payload);
    }

    tokio::fs::read_to_string(path).await.map_err(|e| {
        ArchiveError::invalid_config(format!(
            "Failed to read request '{}': {e}",
            path.display()
        ))
    })
}
