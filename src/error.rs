//! Error types for docbundle.
//!
//! Every failure that can abort an archive request is represented by
//! [`ArchiveError`]. Errors carry the output file id, the document id and the
//! underlying cause so they can be handed to the caller verbatim.
//!
//! # Error Categories
//!
//! - **Request Errors**: malformed payloads and invalid file specs
//! - **Lookup Errors**: unknown documents and failed byte fetches
//! - **PDF Errors**: trim or merge failures reported by the PDF engine
//! - **Archive Errors**: entry creation or finalization failures

use std::fmt;
use std::io;
use std::time::Duration;

use crate::io::{FetchError, LookupError};
use crate::pdf::PdfEngineError;

/// Result type alias for docbundle operations.
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// PDF engine operation that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdfOperation {
    /// Page extraction from a single document.
    Trim,
    /// Ordered concatenation of several documents.
    Merge,
}

impl fmt::Display for PdfOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trim => write!(f, "trim"),
            Self::Merge => write!(f, "merge"),
        }
    }
}

/// Main error type for archive assembly.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// An output file spec is malformed.
    #[error("Invalid file spec '{file_id}': {reason}")]
    InvalidSpec {
        /// Id of the offending output file spec.
        file_id: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Two documents in the request share an id.
    #[error("Duplicate document id '{document_id}' in request")]
    DuplicateDocument {
        /// The repeated id.
        document_id: String,
    },

    /// A referenced document id is not part of the request.
    #[error("Couldn't find document '{document_id}' referenced by file '{file_id}'")]
    DocumentNotFound {
        /// Id of the output file spec holding the reference.
        file_id: String,
        /// The unknown document id.
        document_id: String,
    },

    /// The input source could not deliver a document's bytes.
    #[error("Failed to fetch document '{document_id}' for file '{file_id}': {source}")]
    FetchFailed {
        /// Id of the output file spec being assembled.
        file_id: String,
        /// Id of the document that failed to load.
        document_id: String,
        /// Underlying fetch error.
        #[source]
        source: FetchError,
    },

    /// The PDF engine rejected a trim or merge.
    #[error(
        "PDF {operation} failed for file '{file_id}'{}: {source}",
        document_context(.document_id)
    )]
    PdfEngine {
        /// Operation that failed.
        operation: PdfOperation,
        /// Id of the output file spec being assembled.
        file_id: String,
        /// Document that caused the failure, when known.
        document_id: Option<String>,
        /// Underlying engine error.
        #[source]
        source: PdfEngineError,
    },

    /// The archive writer failed to create, write or finalize.
    #[error("Failed to write archive{}: {source}", entry_context(.entry))]
    ArchiveWrite {
        /// Entry being written, `None` while finalizing.
        entry: Option<String>,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The inbound payload is not a valid request.
    #[error("Failed to parse request: {source}")]
    Parse {
        /// Underlying JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// The request did not settle before the configured timeout.
    #[error("Request timed out after {:.1}s", .after.as_secs_f64())]
    Timeout {
        /// Configured timeout.
        after: Duration,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of what's wrong with the configuration.
        message: String,
    },

    /// Generic I/O error.
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error.
        #[from]
        source: io::Error,
    },
}

fn document_context(document_id: &Option<String>) -> String {
    document_id
        .as_deref()
        .map(|id| format!(" (document '{id}')"))
        .unwrap_or_default()
}

fn entry_context(entry: &Option<String>) -> String {
    entry
        .as_deref()
        .map(|name| format!(" entry '{name}'"))
        .unwrap_or_default()
}

impl ArchiveError {
    /// Create an InvalidSpec error.
    pub fn invalid_spec(file_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSpec {
            file_id: file_id.into(),
            reason: reason.into(),
        }
    }

    /// Create a DocumentNotFound error.
    pub fn document_not_found(file_id: impl Into<String>, document_id: impl Into<String>) -> Self {
        Self::DocumentNotFound {
            file_id: file_id.into(),
            document_id: document_id.into(),
        }
    }

    /// Create a PdfEngine error for a trim of one document.
    pub fn trim_failed(
        file_id: impl Into<String>,
        document_id: impl Into<String>,
        source: PdfEngineError,
    ) -> Self {
        Self::PdfEngine {
            operation: PdfOperation::Trim,
            file_id: file_id.into(),
            document_id: Some(document_id.into()),
            source,
        }
    }

    /// Create a PdfEngine error for a merge.
    pub fn merge_failed(
        file_id: impl Into<String>,
        document_id: Option<String>,
        source: PdfEngineError,
    ) -> Self {
        Self::PdfEngine {
            operation: PdfOperation::Merge,
            file_id: file_id.into(),
            document_id,
            source,
        }
    }

    /// Create an ArchiveWrite error.
    pub fn archive_write(entry: Option<&str>, source: io::Error) -> Self {
        Self::ArchiveWrite {
            entry: entry.map(str::to_owned),
            source,
        }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Attach output file context to a document lookup failure.
    pub fn from_lookup(file_id: impl Into<String>, err: LookupError) -> Self {
        let file_id = file_id.into();
        match err {
            LookupError::NotFound { document_id } => Self::DocumentNotFound {
                file_id,
                document_id,
            },
            LookupError::FetchFailed {
                document_id,
                source,
            } => Self::FetchFailed {
                file_id,
                document_id,
                source,
            },
        }
    }

    /// Get the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidSpec { .. } => 1,
            Self::DuplicateDocument { .. } => 1,
            Self::Parse { .. } => 1,
            Self::InvalidConfig { .. } => 1,
            Self::DocumentNotFound { .. } => 2,
            Self::FetchFailed { .. } => 2,
            Self::PdfEngine { .. } => 3,
            Self::ArchiveWrite { .. } => 5,
            Self::Io { .. } => 5,
            Self::Timeout { .. } => 124,
        }
    }
}
