//! Shared fixtures for the integration tests.
//!
//! Provides a recording PDF engine, an in-memory input source that counts
//! fetches, a request builder and helpers to inspect finished archives.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use lopdf::{Document as PdfDocument, Object, Stream, dictionary};
use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Read};
use std::sync::Mutex;
use std::time::Duration;
use zip::ZipArchive;

use docbundle::io::{FetchError, InputSource};
use docbundle::model::{Customer, Document, DocumentRef, OutputFileSpec, Request};
use docbundle::pdf::{PdfEngine, PdfEngineError};

/// Fixed request timestamp used across tests.
pub fn timestamp() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 7)
        .unwrap()
        .and_hms_opt(9, 5, 1)
        .unwrap()
}

/// Filename prefix for [`timestamp`] and the builder's default customer.
pub const PREFIX: &str = "2024-03-07_09-05-01_Lovelace_Ada";

/// A call observed by [`RecordingEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Trim {
        source: Vec<u8>,
        selectors: Vec<String>,
    },
    Merge {
        sources: Vec<Vec<u8>>,
    },
}

/// PDF engine that records its calls and returns predictable bytes.
///
/// `trim(S, [p, q])` yields `trim(S:p,q)` and `merge([A, B])` yields
/// `merge(A+B)`.
#[derive(Default)]
pub struct RecordingEngine {
    calls: Mutex<Vec<EngineCall>>,
    fail_trim: bool,
    busy: Option<Duration>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine whose trims always fail.
    pub fn failing_trim() -> Self {
        Self {
            fail_trim: true,
            ..Self::default()
        }
    }

    /// Engine whose trims block the calling thread for `busy` first.
    pub fn slow(busy: Duration) -> Self {
        Self {
            busy: Some(busy),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn expected_trim(source: &[u8], selectors: &[&str]) -> Vec<u8> {
        let mut out = b"trim(".to_vec();
        out.extend_from_slice(source);
        out.push(b':');
        out.extend_from_slice(selectors.join(",").as_bytes());
        out.push(b')');
        out
    }

    pub fn expected_merge(sources: &[&[u8]]) -> Vec<u8> {
        let mut out = b"merge(".to_vec();
        out.extend_from_slice(&sources.join(&b'+'));
        out.push(b')');
        out
    }
}

impl PdfEngine for RecordingEngine {
    fn trim(&self, source: &[u8], selectors: &[String]) -> Result<Vec<u8>, PdfEngineError> {
        if let Some(busy) = self.busy {
            std::thread::sleep(busy);
        }

        self.calls.lock().unwrap().push(EngineCall::Trim {
            source: source.to_vec(),
            selectors: selectors.to_vec(),
        });

        if self.fail_trim {
            return Err(PdfEngineError::NoPagesSelected { page_count: 0 });
        }

        let selectors: Vec<&str> = selectors.iter().map(String::as_str).collect();
        Ok(Self::expected_trim(source, &selectors))
    }

    fn merge(&self, sources: &[&[u8]]) -> Result<Vec<u8>, PdfEngineError> {
        self.calls.lock().unwrap().push(EngineCall::Merge {
            sources: sources.iter().map(|s| s.to_vec()).collect(),
        });
        Ok(Self::expected_merge(sources))
    }
}

/// In-memory input source keyed by document blob, counting fetches per id.
#[derive(Default)]
pub struct MemorySource {
    content: HashMap<String, Vec<u8>>,
    failing: HashSet<String>,
    delay: Option<Duration>,
    fetches: Mutex<HashMap<String, usize>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, blob: &str, content: impl Into<Vec<u8>>) -> Self {
        self.content.insert(blob.to_string(), content.into());
        self
    }

    pub fn failing(mut self, blob: &str) -> Self {
        self.failing.insert(blob.to_string());
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fetches(&self, document_id: &str) -> usize {
        self.fetches
            .lock()
            .unwrap()
            .get(document_id)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_fetches(&self) -> usize {
        self.fetches.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl InputSource for MemorySource {
    async fn fetch_bytes(&self, document: &Document) -> Result<Vec<u8>, FetchError> {
        *self
            .fetches
            .lock()
            .unwrap()
            .entry(document.id.clone())
            .or_default() += 1;

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.contains(&document.blob) {
            return Err(format!("storage refused '{}'", document.blob).into());
        }

        self.content
            .get(&document.blob)
            .cloned()
            .ok_or_else(|| format!("no content for '{}'", document.blob).into())
    }
}

/// Fluent builder for [`Request`] values.
pub struct RequestBuilder {
    request: Request,
}

impl RequestBuilder {
    /// Request for Ada Lovelace with no documents or files.
    pub fn new() -> Self {
        Self {
            request: Request {
                customer: Customer {
                    first_name: "Ada".to_string(),
                    last_name: "Lovelace".to_string(),
                },
                documents: Vec::new(),
                files: Vec::new(),
            },
        }
    }

    /// Add a document whose blob equals its id.
    pub fn document(mut self, id: &str, name: &str) -> Self {
        self.request.documents.push(Document {
            id: id.to_string(),
            name: name.to_string(),
            blob: id.to_string(),
        });
        self
    }

    /// Add an output file with `(document_id, selected_pages)` references.
    pub fn file(mut self, id: &str, suffix: &str, refs: &[(&str, &[&str])]) -> Self {
        self.request.files.push(OutputFileSpec {
            id: id.to_string(),
            suffix: suffix.to_string(),
            document_refs: refs
                .iter()
                .map(|(document_id, pages)| DocumentRef {
                    document_id: document_id.to_string(),
                    selected_pages: pages.iter().map(|p| p.to_string()).collect(),
                })
                .collect(),
        });
        self
    }

    pub fn build(self) -> Request {
        self.request
    }

    pub fn json(self) -> String {
        serde_json::to_string(&self.request).unwrap()
    }
}

/// Entries of a ZIP archive as `(name, content)` in archive order.
pub fn read_zip(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut file = archive.by_index(i).unwrap();
            let mut content = Vec::new();
            file.read_to_end(&mut content).unwrap();
            (file.name().to_string(), content)
        })
        .collect()
}

/// Entry names of a ZIP archive in archive order.
pub fn zip_names(bytes: &[u8]) -> Vec<String> {
    read_zip(bytes).into_iter().map(|(name, _)| name).collect()
}

/// Build a PDF whose pages carry `label` and their page number.
pub fn pdf_with_pages(label: &str, pages: usize) -> Vec<u8> {
    let mut doc = PdfDocument::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for n in 1..=pages {
        let content = Stream::new(dictionary! {}, format!("% {label} page {n}").into_bytes());
        let content_id = doc.add_object(content);
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// Page labels of a PDF produced by [`pdf_with_pages`] (or derived from one).
pub fn page_labels(bytes: &[u8]) -> Vec<String> {
    let doc = PdfDocument::load_mem(bytes).unwrap();
    doc.get_pages()
        .into_values()
        .map(|page_id| {
            let content = doc.get_page_content(page_id).unwrap();
            String::from_utf8(content)
                .unwrap()
                .trim_start_matches("% ")
                .to_string()
        })
        .collect()
}
