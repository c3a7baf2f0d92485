//! docbundle - assemble customer documents into a single archive.
//!
//! A request names a customer, the input documents and the output files to
//! produce. Each output file is a verbatim copy, a page selection of one PDF
//! or an ordered merge of several PDFs. All output files land in one ZIP
//! archive under collision-free names derived from a timestamp, the
//! customer's name and the file's suffix.
//!
//! # Layout
//!
//! - [`model`]: request payload types
//! - [`naming`]: filename prefix and collision handling
//! - [`io`]: input sources, per-request document lookup, archive file output
//! - [`pdf`]: page selection, trimming and merging on top of lopdf
//! - [`archive`]: strategy selection and archive assembly
//! - [`bridge`]: async request/response boundary for hosts
//!
//! # Examples
//!
//! ```no_run
//! use docbundle::bridge::RequestBridge;
//! use docbundle::config::Config;
//! use docbundle::io::Base64Source;
//! use docbundle::pdf::LopdfEngine;
//!
//! # async fn example(payload: String) -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let bridge = RequestBridge::new(LopdfEngine::new(config.engine), Base64Source::new(), config)?;
//!
//! match bridge.create_archive(payload).await {
//!     Ok(archive) => println!("archive: {} base64 chars", archive.len()),
//!     Err(message) => eprintln!("failed: {message}"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod bridge;
pub mod cli;
pub mod config;
pub mod error;
pub mod io;
pub mod model;
pub mod naming;
pub mod pdf;

pub use error::{ArchiveError, Result};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
