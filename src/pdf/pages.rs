//! Page extraction and page tree manipulation.

use lopdf::{Document, Object, ObjectId};

use crate::pdf::{PageSelection, PdfEngineError};

type Result<T> = std::result::Result<T, PdfEngineError>;

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against cyclic `Parent` chains in malformed files.
const MAX_TREE_DEPTH: usize = 64;

/// Page extractor for trimming documents to a selection.
#[derive(Debug, Clone, Default)]
pub struct PageExtractor {
    strict: bool,
}

impl PageExtractor {
    /// Create an extractor that ignores selected pages past the end.
    pub fn new() -> Self {
        Self { strict: false }
    }

    /// Create an extractor that rejects selectors past the end.
    pub fn strict() -> Self {
        Self { strict: true }
    }

    /// Keep only the pages of `doc` matched by `selection`.
    ///
    /// Pages keep their document order. Objects of dropped pages stay in the
    /// document until it is pruned.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The document has no pages
    /// - The selection matches no page
    /// - In strict mode, a selector starts past the last page
    /// - Page tree manipulation fails
    pub fn extract_pages(&self, doc: &mut Document, selection: &PageSelection) -> Result<()> {
        let all_pages = doc.get_pages();
        let page_count = all_pages.len() as u32;

        if page_count == 0 {
            return Err(PdfEngineError::structure("document has no pages"));
        }

        if self.strict {
            selection.check_bounds(page_count)?;
        }

        let page_ids: Vec<ObjectId> = selection
            .to_pages(page_count)
            .iter()
            .filter_map(|page_num| all_pages.get(page_num).copied())
            .collect();

        if page_ids.is_empty() {
            return Err(PdfEngineError::NoPagesSelected {
                page_count: page_count as usize,
            });
        }

        for &page_id in &page_ids {
            flatten_inherited(doc, page_id)?;
        }

        let pages_id = pages_root(doc)?;
        replace_kids(doc, pages_id, &page_ids)
    }

    /// Get the number of pages in a document.
    pub fn page_count(&self, doc: &Document) -> usize {
        doc.get_pages().len()
    }
}

/// Object id of the root `Pages` node.
pub(crate) fn pages_root(doc: &Document) -> Result<ObjectId> {
    doc.catalog()
        .and_then(|catalog| catalog.get(b"Pages"))
        .and_then(Object::as_reference)
        .map_err(|e| PdfEngineError::structure(format!("Failed to get pages reference: {e}")))
}

/// Copy attributes inherited from ancestor nodes onto the page itself.
///
/// Needed before a page is re-parented directly under the root node.
pub(crate) fn flatten_inherited(doc: &mut Document, page_id: ObjectId) -> Result<()> {
    let page = doc
        .get_object(page_id)
        .and_then(Object::as_dict)
        .map_err(|e| PdfEngineError::structure(format!("Failed to get page: {e}")))?;

    let mut missing: Vec<&[u8]> = INHERITABLE
        .iter()
        .copied()
        .filter(|key| !page.has(key))
        .collect();
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    let mut inherited = Vec::new();

    for _ in 0..MAX_TREE_DEPTH {
        let Some(parent_id) = parent else { break };
        if missing.is_empty() {
            break;
        }

        let Ok(node) = doc.get_object(parent_id).and_then(Object::as_dict) else {
            break;
        };

        missing.retain(|key| match node.get(key) {
            Ok(value) => {
                inherited.push((key.to_vec(), value.clone()));
                false
            }
            Err(_) => true,
        });
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }

    if inherited.is_empty() {
        return Ok(());
    }

    let page = doc
        .get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| PdfEngineError::structure(format!("Failed to get page: {e}")))?;
    for (key, value) in inherited {
        page.set(key, value);
    }

    Ok(())
}

/// Point each page's `Parent` at `pages_id`.
pub(crate) fn reparent(
    doc: &mut Document,
    pages_id: ObjectId,
    page_ids: &[ObjectId],
) -> Result<()> {
    for &page_id in page_ids {
        let page = doc
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(|e| PdfEngineError::structure(format!("Failed to get page: {e}")))?;
        page.set("Parent", Object::Reference(pages_id));
    }
    Ok(())
}

/// Replace the root node's kids with exactly `page_ids`.
fn replace_kids(doc: &mut Document, pages_id: ObjectId, page_ids: &[ObjectId]) -> Result<()> {
    reparent(doc, pages_id, page_ids)?;

    let pages_obj = doc
        .get_object_mut(pages_id)
        .map_err(|e| PdfEngineError::structure(format!("Failed to get pages object: {e}")))?;

    if let Object::Dictionary(dict) = pages_obj {
        let kids: Vec<Object> = page_ids.iter().map(|&id| Object::Reference(id)).collect();

        dict.set("Kids", Object::Array(kids));
        dict.set("Count", Object::Integer(page_ids.len() as i64));
    } else {
        return Err(PdfEngineError::structure("Pages object is not a dictionary"));
    }

    Ok(())
}
