//! Request data model.
//!
//! These types mirror the inbound JSON payload. They are built once at the
//! boundary and treated as read-only afterwards.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{ArchiveError, Result};

/// Customer whose name prefixes every output filename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
}

/// An input document supplied with the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Identifier, unique within one request.
    pub id: String,

    /// Original filename, used for the output extension.
    pub name: String,

    /// Transportable text for the content.
    ///
    /// Base64 content or a host handle, depending on the input source.
    #[serde(alias = "handle", default)]
    pub blob: String,
}

/// Reference from an output file to one input document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRef {
    /// Id of the referenced [`Document`].
    #[serde(rename = "id", alias = "documentId")]
    pub document_id: String,

    /// Page selectors such as `"1"`, `"2-4"` or `"odd"`. Empty means all pages.
    #[serde(default)]
    pub selected_pages: Vec<String>,
}

impl DocumentRef {
    /// Whether this reference asks for a subset of pages.
    pub fn has_selection(&self) -> bool {
        !self.selected_pages.is_empty()
    }
}

/// One requested archive entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputFileSpec {
    /// Identifier of this output file.
    pub id: String,

    /// Appended to the shared filename prefix.
    pub suffix: String,

    /// Backing documents in merge order.
    #[serde(rename = "documents", alias = "documentRefs")]
    pub document_refs: Vec<DocumentRef>,
}

/// A complete archive request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Customer the archive is built for.
    pub customer: Customer,

    /// All documents the output files may reference.
    pub documents: Vec<Document>,

    /// Output files, in processing and archive order.
    pub files: Vec<OutputFileSpec>,
}

impl Request {
    /// Parse a request from its JSON payload.
    pub fn from_json(payload: &str) -> Result<Self> {
        Ok(serde_json::from_str(payload)?)
    }

    /// Check structural invariants before any archive bytes are produced.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::DuplicateDocument`] if two documents share an
    /// id and [`ArchiveError::InvalidSpec`] if a file spec has no document
    /// references.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.documents.len());
        for doc in &self.documents {
            if !seen.insert(doc.id.as_str()) {
                return Err(ArchiveError::DuplicateDocument {
                    document_id: doc.id.clone(),
                });
            }
        }

        for file in &self.files {
            if file.document_refs.is_empty() {
                return Err(ArchiveError::invalid_spec(
                    &file.id,
                    "at least one document must be provided",
                ));
            }
        }

        Ok(())
    }
}

/// A finished archive entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Entry name inside the archive.
    pub filename: String,
    /// Entry content.
    pub content: Vec<u8>,
}
