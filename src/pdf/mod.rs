//! PDF engine: page trimming and ordered merging.
//!
//! The pipeline only talks to the [`PdfEngine`] trait. [`LopdfEngine`] is the
//! production implementation; tests substitute fakes that record calls.
//!
//! # Examples
//!
//! ```no_run
//! use docbundle::pdf::{EngineConfig, LopdfEngine, PdfEngine};
//!
//! # fn example(a: Vec<u8>, b: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
//! let engine = LopdfEngine::new(EngineConfig::default());
//! let first_pages = engine.trim(&a, &["1-2".to_string()])?;
//! let merged = engine.merge(&[&first_pages, &b])?;
//! # Ok(())
//! # }
//! ```

pub mod engine;
pub mod merger;
pub mod pages;
pub mod selection;

pub use engine::{EngineConfig, LopdfEngine};
pub use selection::PageSelection;

use std::sync::Arc;
use tokio::task;

/// External collaborator that manipulates PDF byte streams.
pub trait PdfEngine: Send + Sync {
    /// Keep only the pages matched by `selectors`, in document order.
    fn trim(&self, source: &[u8], selectors: &[String]) -> Result<Vec<u8>, PdfEngineError>;

    /// Concatenate `sources` into one document, preserving their order.
    fn merge(&self, sources: &[&[u8]]) -> Result<Vec<u8>, PdfEngineError>;
}

/// Errors reported by a PDF engine.
#[derive(Debug, thiserror::Error)]
pub enum PdfEngineError {
    /// A page selector could not be parsed.
    #[error("Invalid page selector '{selector}': {reason}")]
    InvalidSelector {
        /// The offending selector.
        selector: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A page selector refers to pages the document does not have.
    #[error("Page selector '{selector}' is out of range, document has {page_count} page(s)")]
    PageOutOfRange {
        /// The offending selector.
        selector: String,
        /// Pages in the document.
        page_count: usize,
    },

    /// The selection matched no page.
    #[error("No pages selected, document has {page_count} page(s)")]
    NoPagesSelected {
        /// Pages in the document.
        page_count: usize,
    },

    /// Input bytes are not a loadable PDF.
    #[error("Failed to load PDF{}: {reason}", input_context(.input))]
    Load {
        /// Position of the input in a merge, if applicable.
        input: Option<usize>,
        /// Parser message.
        reason: String,
    },

    /// The PDF is encrypted.
    #[error("PDF{} is encrypted and cannot be processed", input_context(.input))]
    Encrypted {
        /// Position of the input in a merge, if applicable.
        input: Option<usize>,
    },

    /// The document structure could not be rewritten.
    #[error("Invalid PDF structure{}: {reason}", input_context(.input))]
    Structure {
        /// Position of the input in a merge, if applicable.
        input: Option<usize>,
        /// What was wrong.
        reason: String,
    },

    /// Serializing the result failed.
    #[error("Failed to save PDF: {reason}")]
    Save {
        /// Writer message.
        reason: String,
    },

    /// Merge called with nothing to merge.
    #[error("No PDF documents to merge")]
    NoInputs,

    /// The engine task panicked or was cancelled.
    #[error("PDF engine task did not complete: {reason}")]
    Aborted {
        /// Join failure reported by the runtime.
        reason: String,
    },
}

/// Run `op` against `engine` on the blocking thread pool.
///
/// A panic inside `op` is reported as [`PdfEngineError::Aborted`].
pub(crate) async fn run_blocking<E, T, F>(engine: &Arc<E>, op: F) -> Result<T, PdfEngineError>
where
    E: PdfEngine + ?Sized + 'static,
    T: Send + 'static,
    F: FnOnce(&E) -> Result<T, PdfEngineError> + Send + 'static,
{
    let engine = Arc::clone(engine);
    task::spawn_blocking(move || op(engine.as_ref()))
        .await
        .map_err(|e| PdfEngineError::Aborted {
            reason: e.to_string(),
        })?
}

fn input_context(input: &Option<usize>) -> String {
    input
        .map(|index| format!(" (input {})", index + 1))
        .unwrap_or_default()
}

impl PdfEngineError {
    /// Position of the failing input in a merge, if the error is tied to one.
    pub fn input(&self) -> Option<usize> {
        match self {
            Self::Load { input, .. }
            | Self::Encrypted { input }
            | Self::Structure { input, .. } => *input,
            _ => None,
        }
    }

    pub(crate) fn structure(reason: impl Into<String>) -> Self {
        Self::Structure {
            input: None,
            reason: reason.into(),
        }
    }

    pub(crate) fn at_input(self, index: usize) -> Self {
        match self {
            Self::Load { reason, .. } => Self::Load {
                input: Some(index),
                reason,
            },
            Self::Encrypted { .. } => Self::Encrypted { input: Some(index) },
            Self::Structure { reason, .. } => Self::Structure {
                input: Some(index),
                reason,
            },
            other => other,
        }
    }
}
