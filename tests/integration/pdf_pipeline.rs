//! End-to-end tests with the lopdf engine and real PDF content.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use std::sync::Arc;
use tempfile::TempDir;

use docbundle::archive::Assembler;
use docbundle::bridge::RequestBridge;
use docbundle::config::{CompressionLevel, Config};
use docbundle::io::{ArchiveFile, Base64Source, DirectorySource};
use docbundle::model::{Customer, Document, DocumentRef, OutputFileSpec, Request};
use docbundle::pdf::{EngineConfig, LopdfEngine};

use crate::common::{
    MemorySource, PREFIX, RequestBuilder, page_labels, pdf_with_pages, read_zip, timestamp,
};

#[tokio::test]
async fn test_trim_and_merge_real_pdfs() {
    let request = RequestBuilder::new()
        .document("a", "Statement.pdf")
        .document("b", "Annex.pdf")
        .file("copy", "Statement", &[("a", &[])])
        .file("trim", "Summary", &[("a", &["1", "l"])])
        .file("merge", "Bundle", &[("b", &["even"]), ("a", &["!1"])])
        .build();
    let source = MemorySource::new()
        .with("a", pdf_with_pages("a", 3))
        .with("b", pdf_with_pages("b", 4));
    let engine = Arc::new(LopdfEngine::new(EngineConfig::default()));

    let archive = Assembler::new(engine, &source, timestamp())
        .assemble_zip(&request, CompressionLevel::Standard)
        .await
        .unwrap();
    let entries = read_zip(&archive);

    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].0, format!("{PREFIX}_Statement.pdf"));
    assert_eq!(entries[0].1, pdf_with_pages("a", 3));
    assert_eq!(page_labels(&entries[1].1), vec!["a page 1", "a page 3"]);
    assert_eq!(
        page_labels(&entries[2].1),
        vec!["b page 2", "b page 4", "a page 2", "a page 3"]
    );
}

#[tokio::test]
async fn test_strict_ranges_reject_pages_past_the_end() {
    let request = RequestBuilder::new()
        .document("a", "a.pdf")
        .file("f1", "Extract", &[("a", &["5"])])
        .json();
    let source = MemorySource::new().with("a", pdf_with_pages("a", 2));
    let config = Config {
        engine: EngineConfig {
            strict_ranges: true,
            ..EngineConfig::default()
        },
        timestamp: Some(timestamp()),
        ..Config::default()
    };

    let bridge = RequestBridge::new(LopdfEngine::new(config.engine), source, config).unwrap();
    let message = bridge.create_archive(request.clone()).await.unwrap_err();

    assert!(message.starts_with("PDF trim failed for file 'f1' (document 'a')"));
    assert_eq!(bridge.build_archive(&request).await.unwrap_err().exit_code(), 3);
}

#[tokio::test]
async fn test_base64_request_through_bridge() {
    let request = Request {
        customer: Customer {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
        },
        documents: vec![Document {
            id: "a".to_string(),
            name: "a.pdf".to_string(),
            blob: BASE64.encode(pdf_with_pages("a", 2)),
        }],
        files: vec![OutputFileSpec {
            id: "f1".to_string(),
            suffix: "Second".to_string(),
            document_refs: vec![DocumentRef {
                document_id: "a".to_string(),
                selected_pages: vec!["2".to_string()],
            }],
        }],
    };
    let config = Config {
        timestamp: Some(timestamp()),
        ..Config::default()
    };

    let bridge =
        RequestBridge::new(LopdfEngine::new(config.engine), Base64Source::new(), config).unwrap();
    let encoded = bridge
        .create_archive(serde_json::to_string(&request).unwrap())
        .await
        .unwrap();
    let entries = read_zip(&BASE64.decode(encoded).unwrap());

    assert_eq!(entries[0].0, format!("{PREFIX}_Second.pdf"));
    assert_eq!(page_labels(&entries[0].1), vec!["a page 2"]);
}

#[tokio::test]
async fn test_directory_source_and_archive_file() {
    let docs = TempDir::new().unwrap();
    tokio::fs::create_dir(docs.path().join("inbox")).await.unwrap();
    tokio::fs::write(docs.path().join("inbox/a.pdf"), pdf_with_pages("a", 2))
        .await
        .unwrap();

    let mut request = RequestBuilder::new()
        .document("a", "a.pdf")
        .file("f1", "Both", &[("a", &[]), ("a", &["1"])])
        .build();
    request.documents[0].blob = "inbox/a.pdf".to_string();

    let config = Config {
        timestamp: Some(timestamp()),
        ..Config::default()
    };
    let bridge = RequestBridge::new(
        LopdfEngine::new(config.engine),
        DirectorySource::new(docs.path()),
        config,
    )
    .unwrap();
    let encoded = bridge
        .create_archive(serde_json::to_string(&request).unwrap())
        .await
        .unwrap();
    let archive = BASE64.decode(encoded).unwrap();

    let out = TempDir::new().unwrap();
    let path = out.path().join("bundle.zip");
    let written = ArchiveFile::new().save(&archive, &path).await.unwrap();

    assert_eq!(written, archive.len() as u64);
    let saved = tokio::fs::read(&path).await.unwrap();
    let entries = read_zip(&saved);
    assert_eq!(
        page_labels(&entries[0].1),
        vec!["a page 1", "a page 2", "a page 1"]
    );
}

#[tokio::test]
async fn test_non_pdf_input_to_trim_fails() {
    let request = RequestBuilder::new()
        .document("a", "fake.pdf")
        .file("f1", "Broken", &[("a", &["1"])])
        .build();
    let source = MemorySource::new().with("a", "this is not a pdf");
    let engine = Arc::new(LopdfEngine::default());

    let err = Assembler::new(engine, &source, timestamp())
        .assemble_zip(&request, CompressionLevel::None)
        .await
        .unwrap_err();

    assert_eq!(err.exit_code(), 3);
}
