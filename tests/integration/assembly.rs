//! Integration tests for archive assembly.

use rstest::rstest;
use std::collections::HashSet;
use std::sync::Arc;

use docbundle::archive::{Assembler, ZipArchiveWriter};
use docbundle::config::CompressionLevel;
use docbundle::model::Request;

use crate::common::{
    EngineCall, MemorySource, PREFIX, RecordingEngine, RequestBuilder, read_zip, timestamp,
    zip_names,
};

async fn assemble(
    request: &Request,
    engine: &Arc<RecordingEngine>,
    source: &MemorySource,
) -> Vec<u8> {
    Assembler::new(Arc::clone(engine), source, timestamp())
        .assemble_zip(request, CompressionLevel::Standard)
        .await
        .expect("assembly failed")
}

#[tokio::test]
async fn test_one_entry_per_file_in_order() {
    let request = RequestBuilder::new()
        .document("scan", "scan.JPG")
        .document("contract", "contract.pdf")
        .document("notes", "notes")
        .file("1", "Contract", &[("contract", &[])])
        .file("2", "Scan", &[("scan", &[])])
        .file("3", "Notes", &[("notes", &[])])
        .build();
    let source = MemorySource::new()
        .with("scan", "jpeg")
        .with("contract", "%PDF")
        .with("notes", "text");
    let engine = Arc::new(RecordingEngine::new());

    let archive = assemble(&request, &engine, &source).await;

    assert_eq!(
        read_zip(&archive),
        vec![
            (format!("{PREFIX}_Contract.pdf"), b"%PDF".to_vec()),
            (format!("{PREFIX}_Scan.jpg"), b"jpeg".to_vec()),
            (format!("{PREFIX}_Notes"), b"text".to_vec()),
        ]
    );
    assert!(engine.calls().is_empty());
}

#[tokio::test]
async fn test_colliding_suffixes_are_numbered() {
    let request = RequestBuilder::new()
        .document("a", "a.pdf")
        .file("1", "Payslip", &[("a", &[])])
        .file("2", "Payslip", &[("a", &[])])
        .file("3", "Payslip", &[("a", &[])])
        .build();
    let source = MemorySource::new().with("a", "A");
    let engine = Arc::new(RecordingEngine::new());

    let names = zip_names(&assemble(&request, &engine, &source).await);

    assert_eq!(
        names,
        vec![
            format!("{PREFIX}_Payslip.pdf"),
            format!("{PREFIX}_Payslip-1.pdf"),
            format!("{PREFIX}_Payslip-2.pdf"),
        ]
    );
    let distinct: HashSet<_> = names.iter().collect();
    assert_eq!(distinct.len(), names.len());
}

#[rstest]
#[case::single_ref(&[("img", &[][..])][..])]
#[case::extra_refs(&[("img", &["1"][..]), ("pdf", &[][..])][..])]
#[tokio::test]
async fn test_non_pdf_is_copied_verbatim(#[case] refs: &[(&str, &[&str])]) {
    let request = RequestBuilder::new()
        .document("img", "photo.png")
        .document("pdf", "doc.pdf")
        .file("1", "Photo", refs)
        .build();
    let source = MemorySource::new()
        .with("img", vec![0x89, b'P', b'N', b'G'])
        .with("pdf", "%PDF");
    let engine = Arc::new(RecordingEngine::new());

    let entries = read_zip(&assemble(&request, &engine, &source).await);

    assert_eq!(entries[0].0, format!("{PREFIX}_Photo.png"));
    assert_eq!(entries[0].1, vec![0x89, b'P', b'N', b'G']);
    assert!(engine.calls().is_empty());
    assert_eq!(source.fetches("pdf"), 0);
}

#[tokio::test]
async fn test_single_pdf_trim_matches_engine_output() {
    let request = RequestBuilder::new()
        .document("a", "a.PDF")
        .file("1", "Extract", &[("a", &["1", "3-4"])])
        .build();
    let source = MemorySource::new().with("a", "A");
    let engine = Arc::new(RecordingEngine::new());

    let entries = read_zip(&assemble(&request, &engine, &source).await);

    assert_eq!(entries[0].0, format!("{PREFIX}_Extract.pdf"));
    assert_eq!(entries[0].1, RecordingEngine::expected_trim(b"A", &["1", "3-4"]));
    assert_eq!(
        engine.calls(),
        vec![EngineCall::Trim {
            source: b"A".to_vec(),
            selectors: vec!["1".to_string(), "3-4".to_string()],
        }]
    );
}

#[tokio::test]
async fn test_merge_preserves_reference_order() {
    let request = RequestBuilder::new()
        .document("a", "a.pdf")
        .document("b", "b.pdf")
        .file("ab", "AB", &[("a", &[]), ("b", &["2"])])
        .file("ba", "BA", &[("b", &["2"]), ("a", &[])])
        .build();
    let source = MemorySource::new().with("a", "A").with("b", "B");
    let engine = Arc::new(RecordingEngine::new());

    let entries = read_zip(&assemble(&request, &engine, &source).await);

    let trimmed_b = RecordingEngine::expected_trim(b"B", &["2"]);
    assert_eq!(
        entries[0].1,
        RecordingEngine::expected_merge(&[b"A".as_slice(), trimmed_b.as_slice()])
    );
    assert_eq!(
        entries[1].1,
        RecordingEngine::expected_merge(&[trimmed_b.as_slice(), b"A".as_slice()])
    );
    assert_ne!(entries[0].1, entries[1].1);
}

#[tokio::test]
async fn test_documents_are_fetched_once_per_request() {
    let request = RequestBuilder::new()
        .document("a", "a.pdf")
        .document("b", "b.pdf")
        .document("unused", "unused.pdf")
        .file("1", "One", &[("a", &[])])
        .file("2", "Two", &[("a", &["1"]), ("b", &[])])
        .file("3", "Three", &[("b", &[]), ("a", &[])])
        .build();
    let source = MemorySource::new()
        .with("a", "A")
        .with("b", "B")
        .with("unused", "U");
    let engine = Arc::new(RecordingEngine::new());

    assemble(&request, &engine, &source).await;

    assert_eq!(source.fetches("a"), 1);
    assert_eq!(source.fetches("b"), 1);
    assert_eq!(source.fetches("unused"), 0);
}

#[tokio::test]
async fn test_fixed_timestamp_is_idempotent() {
    let request = RequestBuilder::new()
        .document("a", "a.pdf")
        .document("t", "t.txt")
        .file("1", "Doc", &[("a", &["odd"])])
        .file("2", "Doc", &[("t", &[])])
        .file("3", "Doc", &[("a", &[]), ("a", &[])])
        .build();

    let mut archives = Vec::new();
    for _ in 0..2 {
        let source = MemorySource::new().with("a", "A").with("t", "T");
        let engine = Arc::new(RecordingEngine::new());
        archives.push(assemble(&request, &engine, &source).await);
    }

    assert_eq!(read_zip(&archives[0]), read_zip(&archives[1]));
    assert_eq!(archives[0], archives[1]);
}

#[tokio::test]
async fn test_uncompressed_archive_holds_same_entries() {
    let request = RequestBuilder::new()
        .document("t", "t.txt")
        .file("1", "Text", &[("t", &[])])
        .build();
    let source = MemorySource::new().with("t", "plain text content");
    let engine = Arc::new(RecordingEngine::new());

    let assembler = Assembler::new(engine, &source, timestamp());
    let stored = assembler
        .assemble(&request, ZipArchiveWriter::new(CompressionLevel::None, timestamp()))
        .await
        .unwrap();
    let deflated = assembler
        .assemble(&request, ZipArchiveWriter::new(CompressionLevel::Maximum, timestamp()))
        .await
        .unwrap();

    assert_eq!(read_zip(&stored), read_zip(&deflated));
}

#[tokio::test]
async fn test_customer_names_cannot_escape_archive_root() {
    let mut request = RequestBuilder::new()
        .document("t", "t.txt")
        .file("1", "../x", &[("t", &[])])
        .build();
    request.customer.last_name = "a/b".to_string();
    let source = MemorySource::new().with("t", "T");
    let engine = Arc::new(RecordingEngine::new());

    let names = zip_names(&assemble(&request, &engine, &source).await);

    assert_eq!(names, vec!["2024-03-07_09-05-01_a-b_Ada_..-x.txt".to_string()]);
}
