//! Per-request document lookup with a fetch-once byte cache.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::io::source::{FetchError, InputSource};
use crate::model::Document;

/// Failure to resolve a document.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    /// The id is not part of the request.
    #[error("Couldn't find document '{document_id}'")]
    NotFound {
        /// The unknown id.
        document_id: String,
    },

    /// The input source failed to deliver the bytes.
    #[error("Failed to fetch document '{document_id}': {source}")]
    FetchFailed {
        /// Document whose bytes were requested.
        document_id: String,
        /// Underlying source error.
        #[source]
        source: FetchError,
    },
}

/// Resolves document ids and caches their bytes for the lifetime of a request.
///
/// The first [`bytes`](Self::bytes) call for an id awaits the
/// [`InputSource`]; every later call returns the cached content.
pub struct DocumentLookup<'a, S: ?Sized> {
    documents: HashMap<&'a str, &'a Document>,
    source: &'a S,
    cache: HashMap<String, Arc<[u8]>>,
}

impl<'a, S> DocumentLookup<'a, S>
where
    S: InputSource + ?Sized,
{
    /// Create a lookup over the request's documents.
    pub fn new(documents: &'a [Document], source: &'a S) -> Self {
        Self {
            documents: documents.iter().map(|d| (d.id.as_str(), d)).collect(),
            source,
            cache: HashMap::new(),
        }
    }

    /// Descriptor for `id`, if the request contains it.
    pub fn descriptor(&self, id: &str) -> Option<&'a Document> {
        self.documents.get(id).copied()
    }

    /// Bytes for `id`, fetching them on first use.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::NotFound`] for unknown ids and
    /// [`LookupError::FetchFailed`] if the source fails. Failed fetches are
    /// not cached.
    pub async fn bytes(&mut self, id: &str) -> Result<Arc<[u8]>, LookupError> {
        if let Some(bytes) = self.cached(id) {
            return Ok(bytes);
        }

        let document = self.descriptor(id).ok_or_else(|| LookupError::NotFound {
            document_id: id.to_owned(),
        })?;

        debug!(document_id = id, name = %document.name, "fetching document bytes");

        let bytes: Arc<[u8]> = self
            .source
            .fetch_bytes(document)
            .await
            .map_err(|source| LookupError::FetchFailed {
                document_id: id.to_owned(),
                source,
            })?
            .into();

        self.cache.insert(id.to_owned(), Arc::clone(&bytes));
        Ok(bytes)
    }

    /// Bytes for `id` if they were already fetched.
    pub fn cached(&self, id: &str) -> Option<Arc<[u8]>> {
        self.cache.get(id).cloned()
    }

    /// Number of documents fetched so far.
    pub fn fetched_count(&self) -> usize {
        self.cache.len()
    }
}
