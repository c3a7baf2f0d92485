//! Ordered concatenation of loaded documents.
//!
//! The first document is the base. Every following document is renumbered
//! past the current maximum object id, its objects are moved over and its
//! pages are appended to the base's root page node.

use lopdf::{Document, Object, ObjectId};

use crate::pdf::PdfEngineError;
use crate::pdf::pages::{flatten_inherited, pages_root, reparent};

type Result<T> = std::result::Result<T, PdfEngineError>;

/// PDF merger that combines documents in order.
#[derive(Debug, Clone, Default)]
pub struct DocumentMerger;

impl DocumentMerger {
    /// Create a new merger.
    pub fn new() -> Self {
        Self
    }

    /// Merge `documents` into one, preserving their order.
    ///
    /// # Errors
    ///
    /// Returns [`PdfEngineError::NoInputs`] for an empty list. Structural
    /// errors are tagged with the index of the offending input.
    pub fn merge(&self, documents: Vec<Document>) -> Result<Document> {
        let mut documents = documents.into_iter();
        let mut merged = documents.next().ok_or(PdfEngineError::NoInputs)?;

        let pages_id = pages_root(&merged).map_err(|e| e.at_input(0))?;
        let mut max_id = merged.max_id;

        for (idx, mut doc) in documents.enumerate() {
            let index = idx + 1;

            // Avoid object id collisions by renumbering the incoming document
            doc.renumber_objects_with(max_id + 1);
            max_id = doc.max_id;

            let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
            if page_ids.is_empty() {
                return Err(PdfEngineError::structure("document has no pages").at_input(index));
            }

            for &page_id in &page_ids {
                flatten_inherited(&mut doc, page_id).map_err(|e| e.at_input(index))?;
            }

            merged.objects.extend(doc.objects);
            self.add_pages_to_tree(&mut merged, pages_id, &page_ids)
                .map_err(|e| e.at_input(index))?;
        }

        merged.max_id = max_id;
        Ok(merged)
    }

    /// Append page references to the root node and re-parent them.
    fn add_pages_to_tree(
        &self,
        merged: &mut Document,
        pages_id: ObjectId,
        page_ids: &[ObjectId],
    ) -> Result<()> {
        reparent(merged, pages_id, page_ids)?;

        let pages_dict = merged
            .get_object_mut(pages_id)
            .and_then(Object::as_dict_mut)
            .map_err(|e| PdfEngineError::structure(format!("Failed to get pages object: {e}")))?;

        let kids = pages_dict
            .get_mut(b"Kids")
            .and_then(Object::as_array_mut)
            .map_err(|_| PdfEngineError::structure("Pages dictionary missing Kids array"))?;

        for &page_id in page_ids {
            kids.push(Object::Reference(page_id));
        }

        let current_count = pages_dict.get(b"Count").and_then(Object::as_i64).unwrap_or(0);
        pages_dict.set("Count", Object::Integer(current_count + page_ids.len() as i64));

        Ok(())
    }
}
