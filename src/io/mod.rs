//! I/O operations for docbundle.
//!
//! This module handles everything that touches bytes outside the pipeline:
//! - Fetching document content from the host ([`InputSource`])
//! - Caching fetched content for one request ([`DocumentLookup`])
//! - Writing finished archives to disk ([`ArchiveFile`])
//!
//! # Examples
//!
//! ```no_run
//! use docbundle::io::{Base64Source, DocumentLookup};
//! use docbundle::model::Request;
//!
//! # async fn example(request: Request) -> Result<(), Box<dyn std::error::Error>> {
//! let source = Base64Source::new();
//! let mut lookup = DocumentLookup::new(&request.documents, &source);
//! let bytes = lookup.bytes("doc-1").await?;
//! println!("doc-1 has {} bytes", bytes.len());
//! # Ok(())
//! # }
//! ```

pub mod lookup;
pub mod source;
pub mod writer;

pub use lookup::{DocumentLookup, LookupError};
pub use source::{Base64Source, DirectorySource, FetchError, InputSource};
pub use writer::ArchiveFile;
