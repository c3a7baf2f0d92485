//! Archive assembly.
//!
//! This module turns a validated [`Request`](crate::model::Request) into a
//! single archive:
//! - [`strategy`] decides per output file between copy, trim and merge
//! - [`assembler`] drives filenames, content and entries in request order
//! - [`ArchiveWriter`] is the container seam, with [`ZipArchiveWriter`] as
//!   the production implementation
//!
//! # Examples
//!
//! ```no_run
//! use docbundle::archive::{Assembler, ZipArchiveWriter};
//! use docbundle::config::CompressionLevel;
//! use docbundle::io::Base64Source;
//! use docbundle::model::Request;
//! use docbundle::pdf::LopdfEngine;
//! use std::sync::Arc;
//!
//! # async fn example(request: Request) -> Result<(), Box<dyn std::error::Error>> {
//! let engine = Arc::new(LopdfEngine::default());
//! let source = Base64Source::new();
//! let timestamp = chrono::Local::now().naive_local();
//!
//! let assembler = Assembler::new(engine, &source, timestamp);
//! let writer = ZipArchiveWriter::new(CompressionLevel::Standard, timestamp);
//! let archive = assembler.assemble(&request, writer).await?;
//! println!("archive is {} bytes", archive.len());
//! # Ok(())
//! # }
//! ```

pub mod assembler;
pub mod strategy;
pub mod zipfile;

pub use assembler::Assembler;
pub use strategy::{FilePlan, Strategy};
pub use zipfile::ZipArchiveWriter;

use std::io::Write;

use crate::error::Result;

/// Container writer that receives one entry per output file.
pub trait ArchiveWriter {
    /// Start a new entry and return the sink its content is written to.
    fn create_entry(&mut self, name: &str) -> Result<&mut dyn Write>;

    /// Finalize the container and return its bytes.
    fn finish(self) -> Result<Vec<u8>>
    where
        Self: Sized;
}
