//! Per-file content strategy.
//!
//! Every output file is produced by exactly one of three strategies, chosen
//! from the first document's extension and the shape of its references:
//!
//! | extension | refs | selection | strategy |
//! |-----------|------|-----------|----------|
//! | not `.pdf` | any | any | [`Strategy::Copy`] of the first document |
//! | `.pdf` | one | none | [`Strategy::Copy`] |
//! | `.pdf` | one | some | [`Strategy::Trim`] |
//! | `.pdf` | several | any | [`Strategy::Merge`] in reference order |

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{ArchiveError, Result};
use crate::io::{DocumentLookup, InputSource};
use crate::model::{Document, DocumentRef, OutputFileSpec};
use crate::naming::extension_of;
use crate::pdf::{self, PdfEngine, PdfEngineError};

const PDF_EXTENSION: &str = ".pdf";

/// How an output file's content is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// First document's bytes, unchanged.
    Copy,
    /// Selected pages of the single referenced PDF.
    Trim,
    /// All referenced PDFs concatenated, each optionally trimmed first.
    Merge,
}

impl Strategy {
    /// Pick the strategy for `refs` given the lower-cased primary extension.
    pub fn select(refs: &[DocumentRef], extension: &str) -> Self {
        if extension != PDF_EXTENSION {
            return Self::Copy;
        }

        match refs {
            [single] if single.has_selection() => Self::Trim,
            [_] => Self::Copy,
            _ => Self::Merge,
        }
    }
}

/// Resolved plan for one output file.
#[derive(Debug, Clone)]
pub struct FilePlan<'a> {
    /// The spec being planned.
    pub spec: &'a OutputFileSpec,
    /// First referenced document, which decides the extension.
    pub primary: &'a Document,
    /// Lower-cased extension with leading dot, or empty.
    pub extension: String,
    /// Chosen strategy.
    pub strategy: Strategy,
}

impl<'a> FilePlan<'a> {
    /// Plan `spec` against the request's documents.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::InvalidSpec`] when the spec has no references
    /// and [`ArchiveError::DocumentNotFound`] when the first one is unknown.
    pub fn new<S>(spec: &'a OutputFileSpec, lookup: &DocumentLookup<'a, S>) -> Result<Self>
    where
        S: InputSource + ?Sized,
    {
        let first = spec.document_refs.first().ok_or_else(|| {
            ArchiveError::invalid_spec(&spec.id, "at least one document must be provided")
        })?;

        let primary = lookup
            .descriptor(&first.document_id)
            .ok_or_else(|| ArchiveError::document_not_found(&spec.id, &first.document_id))?;

        let extension = extension_of(&primary.name);
        let strategy = Strategy::select(&spec.document_refs, &extension);

        Ok(Self {
            spec,
            primary,
            extension,
            strategy,
        })
    }

    /// Produce the content for this file.
    ///
    /// Document bytes come from `lookup`, so a document shared by several
    /// files is fetched once. Engine calls run on the blocking pool.
    pub async fn render<S, E>(
        &self,
        lookup: &mut DocumentLookup<'a, S>,
        engine: &Arc<E>,
    ) -> Result<Vec<u8>>
    where
        S: InputSource + ?Sized,
        E: PdfEngine + ?Sized + 'static,
    {
        let file_id = self.spec.id.as_str();
        debug!(file_id, strategy = ?self.strategy, "rendering file");

        match self.strategy {
            Strategy::Copy => {
                if self.spec.document_refs.len() > 1 {
                    warn!(
                        file_id,
                        ignored = self.spec.document_refs.len() - 1,
                        extension = %self.extension,
                        "only PDFs can be merged, using the first document"
                    );
                }
                let bytes = self.fetch(lookup, &self.primary.id).await?;
                Ok(bytes.to_vec())
            }
            Strategy::Trim => {
                let doc_ref = &self.spec.document_refs[0];
                let bytes = self.fetch(lookup, &doc_ref.document_id).await?;
                trim(engine, bytes, &doc_ref.selected_pages)
                    .await
                    .map_err(|e| ArchiveError::trim_failed(file_id, &doc_ref.document_id, e))
            }
            Strategy::Merge => {
                let mut parts: Vec<Arc<[u8]>> = Vec::with_capacity(self.spec.document_refs.len());

                for doc_ref in &self.spec.document_refs {
                    let bytes = self.fetch(lookup, &doc_ref.document_id).await?;
                    if doc_ref.has_selection() {
                        let trimmed = trim(engine, bytes, &doc_ref.selected_pages)
                            .await
                            .map_err(|e| {
                                ArchiveError::trim_failed(file_id, &doc_ref.document_id, e)
                            })?;
                        parts.push(trimmed.into());
                    } else {
                        parts.push(bytes);
                    }
                }

                pdf::run_blocking(engine, move |engine| {
                    let inputs: Vec<&[u8]> = parts.iter().map(|part| &**part).collect();
                    engine.merge(&inputs)
                })
                .await
                .map_err(|e| {
                    let document_id = e
                        .input()
                        .and_then(|index| self.spec.document_refs.get(index))
                        .map(|doc_ref| doc_ref.document_id.clone());
                    ArchiveError::merge_failed(file_id, document_id, e)
                })
            }
        }
    }

    async fn fetch<S>(
        &self,
        lookup: &mut DocumentLookup<'a, S>,
        document_id: &str,
    ) -> Result<Arc<[u8]>>
    where
        S: InputSource + ?Sized,
    {
        lookup
            .bytes(document_id)
            .await
            .map_err(|e| ArchiveError::from_lookup(&self.spec.id, e))
    }
}

async fn trim<E>(
    engine: &Arc<E>,
    source: Arc<[u8]>,
    selectors: &[String],
) -> std::result::Result<Vec<u8>, PdfEngineError>
where
    E: PdfEngine + ?Sized + 'static,
{
    let selectors = selectors.to_vec();
    pdf::run_blocking(engine, move |engine| engine.trim(&source, &selectors)).await
}
