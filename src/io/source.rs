//! Input sources that turn a [`Document`]'s transport text into bytes.
//!
//! The host decides how document content travels: embedded in the request
//! as base64 ([`Base64Source`]) or as a handle that is resolved on demand
//! ([`DirectorySource`]). Either way the pipeline only sees
//! [`InputSource::fetch_bytes`], which may suspend while the host does I/O.

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use std::path::{Component, Path, PathBuf};

#[cfg(test)]
use mockall::automock;

use crate::model::Document;

/// Error returned by an input source.
pub type FetchError = Box<dyn std::error::Error + Send + Sync>;

/// Host collaborator that delivers document bytes.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait InputSource: Send + Sync {
    /// Fetch the raw bytes backing `document`.
    async fn fetch_bytes(&self, document: &Document) -> Result<Vec<u8>, FetchError>;
}

/// Decodes content embedded in the request as standard base64.
///
/// A leading data URL header (`data:<mime>;base64,`) is tolerated.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64Source;

impl Base64Source {
    /// Create a new base64 source.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl InputSource for Base64Source {
    async fn fetch_bytes(&self, document: &Document) -> Result<Vec<u8>, FetchError> {
        let encoded = match document.blob.split_once(";base64,") {
            Some((header, payload)) if header.starts_with("data:") => payload,
            _ => document.blob.as_str(),
        };
        Ok(BASE64.decode(encoded.trim())?)
    }
}

/// Resolves handles as relative paths below a root directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    /// Create a source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory handles are resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, handle: &str) -> Result<PathBuf, FetchError> {
        let relative = Path::new(handle);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));

        if handle.is_empty() || escapes {
            return Err(format!("invalid document handle: '{handle}'").into());
        }

        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl InputSource for DirectorySource {
    async fn fetch_bytes(&self, document: &Document) -> Result<Vec<u8>, FetchError> {
        let path = self.resolve(&document.blob)?;
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| format!("{}: {e}", path.display()))?;
        Ok(bytes)
    }
}
