//! [`PdfEngine`] implementation on top of lopdf.

use lopdf::Document;
use tracing::debug;

use crate::config::CompressionLevel;
use crate::pdf::merger::DocumentMerger;
use crate::pdf::pages::PageExtractor;
use crate::pdf::{PageSelection, PdfEngine, PdfEngineError};

/// Settings fixed when the engine is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngineConfig {
    /// Stream compression applied to produced PDFs.
    pub compression: CompressionLevel,

    /// Reject selectors that start past the last page instead of ignoring them.
    pub strict_ranges: bool,
}

/// PDF engine backed by lopdf.
#[derive(Debug, Clone, Default)]
pub struct LopdfEngine {
    config: EngineConfig,
    extractor: PageExtractor,
    merger: DocumentMerger,
}

impl LopdfEngine {
    /// Create an engine with the given settings.
    pub fn new(config: EngineConfig) -> Self {
        let extractor = if config.strict_ranges {
            PageExtractor::strict()
        } else {
            PageExtractor::new()
        };

        Self {
            config,
            extractor,
            merger: DocumentMerger::new(),
        }
    }

    /// The settings this engine was built with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn load(&self, bytes: &[u8]) -> Result<Document, PdfEngineError> {
        Document::load_mem(bytes).map_err(|e| {
            let reason = e.to_string();
            if reason.contains("encrypt") || reason.contains("password") {
                PdfEngineError::Encrypted { input: None }
            } else {
                PdfEngineError::Load {
                    input: None,
                    reason,
                }
            }
        })
    }

    fn finish(&self, mut doc: Document) -> Result<Vec<u8>, PdfEngineError> {
        // Dropped pages and foreign catalogs are unreachable by now.
        doc.prune_objects();

        match self.config.compression {
            CompressionLevel::None => {}
            CompressionLevel::Standard => doc.compress(),
            CompressionLevel::Maximum => {
                doc.delete_zero_length_streams();
                doc.compress();
            }
        }

        doc.renumber_objects();

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)
            .map_err(|e| PdfEngineError::Save {
                reason: e.to_string(),
            })?;
        Ok(bytes)
    }
}

impl PdfEngine for LopdfEngine {
    fn trim(&self, source: &[u8], selectors: &[String]) -> Result<Vec<u8>, PdfEngineError> {
        let selection = PageSelection::parse(selectors)?;
        let mut doc = self.load(source)?;

        let before = self.extractor.page_count(&doc);
        self.extractor.extract_pages(&mut doc, &selection)?;
        debug!(
            selectors = ?selectors,
            pages_before = before,
            pages_after = self.extractor.page_count(&doc),
            "trimmed document"
        );

        self.finish(doc)
    }

    fn merge(&self, sources: &[&[u8]]) -> Result<Vec<u8>, PdfEngineError> {
        if sources.is_empty() {
            return Err(PdfEngineError::NoInputs);
        }

        let documents = sources
            .iter()
            .enumerate()
            .map(|(index, bytes)| self.load(bytes).map_err(|e| e.at_input(index)))
            .collect::<Result<Vec<_>, _>>()?;

        let merged = self.merger.merge(documents)?;
        debug!(
            inputs = sources.len(),
            pages = merged.get_pages().len(),
            "merged documents"
        );

        self.finish(merged)
    }
}
