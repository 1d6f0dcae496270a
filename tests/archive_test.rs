//! Integration tests for archive uploads: expansion, checksum pool
//! matching, and batch quota accounting.

mod common;

use std::io::{Cursor, Write};

use bytes::Bytes;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use stratus::UploadRequest;
use stratus_core::config::engine::EngineConfig;
use stratus_core::error::ErrorKind;
use stratus_entity::audit::LogKind;
use stratus_service::digest::Hasher;

fn build_zip(entries: &[(&str, &[u8])]) -> Bytes {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        writer.start_file(*name, options).unwrap();
        writer.write_all(data).unwrap();
    }
    Bytes::from(writer.finish().unwrap().into_inner())
}

fn zip_upload(entries: &[(&str, &[u8])], checksums: Vec<String>) -> UploadRequest {
    UploadRequest {
        file_name: "bundle.zip".to_string(),
        content_type: "application/zip".to_string(),
        data: build_zip(entries),
        checksums,
    }
}

#[tokio::test]
async fn test_archive_upload_creates_one_file_per_entry() {
    let t = common::TestEngine::new().await;

    let entries: [(&str, &[u8]); 3] = [
        ("a.txt", b"alpha"),
        ("b.json", b"{\"k\":1}"),
        ("c.bin", b"\x00\x01\x02"),
    ];
    // Checksums declared in reverse of the entry order.
    let checksums = vec![
        Hasher::digest(b"\x00\x01\x02"),
        Hasher::digest(b"{\"k\":1}"),
        Hasher::digest(b"alpha"),
    ];

    let outcomes = t
        .coordinator
        .upload(&t.caller(), zip_upload(&entries, checksums))
        .await
        .unwrap();
    assert_eq!(outcomes.len(), 3);

    let files = t.coordinator.list_files(&t.caller()).await.unwrap();
    let names: Vec<&str> = files.iter().map(|f| f.file.name.as_str()).collect();
    assert_eq!(names, vec!["a.txt", "b.json", "c.bin"]);
    assert_eq!(files[0].file.content_type, "text/plain");
    assert_eq!(files[1].file.content_type, "application/json");
    assert_eq!(files[2].file.content_type, "application/octet-stream");

    assert!(t.objects.contains("alice@a.txt@1"));
    assert!(t.objects.contains("alice@b.json@1"));
    assert!(t.objects.contains("alice@c.bin@1"));

    let download = t
        .coordinator
        .download_latest(&t.caller(), files[1].file.id)
        .await
        .unwrap();
    assert_eq!(download.data, Bytes::from("{\"k\":1}".as_bytes()));

    let uploads = t
        .store
        .log_entries()
        .await
        .iter()
        .filter(|l| l.kind == LogKind::FileUpload)
        .count();
    assert_eq!(uploads, 3);
}

#[tokio::test]
async fn test_archive_with_wrong_checksum_writes_nothing() {
    let t = common::TestEngine::new().await;

    let entries: [(&str, &[u8]); 2] = [("a.txt", b"alpha"), ("b.txt", b"beta")];
    let checksums = vec![Hasher::digest(b"alpha"), Hasher::digest(b"tampered")];

    let err = t
        .coordinator
        .upload(&t.caller(), zip_upload(&entries, checksums))
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::ChecksumMismatch);
    assert_eq!(t.objects.put_count(), 0);
    assert!(t.coordinator.list_files(&t.caller()).await.unwrap().is_empty());

    let logs = t.store.log_entries().await;
    assert!(logs.iter().any(|l| l.kind == LogKind::FileUploadAttempt));
}

#[tokio::test]
async fn test_archive_checksum_cardinality_must_match() {
    let t = common::TestEngine::new().await;
    let entries: [(&str, &[u8]); 2] = [("a.txt", b"alpha"), ("b.txt", b"beta")];

    let too_few = t
        .coordinator
        .upload(
            &t.caller(),
            zip_upload(&entries, vec![Hasher::digest(b"alpha")]),
        )
        .await
        .unwrap_err();
    assert_eq!(too_few.kind, ErrorKind::ArchiveMismatch);

    let too_many = t
        .coordinator
        .upload(
            &t.caller(),
            zip_upload(
                &entries,
                vec![
                    Hasher::digest(b"alpha"),
                    Hasher::digest(b"beta"),
                    Hasher::digest(b"gamma"),
                ],
            ),
        )
        .await
        .unwrap_err();
    assert_eq!(too_many.kind, ErrorKind::ArchiveMismatch);

    assert_eq!(t.objects.put_count(), 0);
}

#[tokio::test]
async fn test_archive_rejects_empty_entry() {
    let t = common::TestEngine::new().await;

    let entries: [(&str, &[u8]); 2] = [("a.txt", b"alpha"), ("hollow.bin", b"")];
    let checksums = vec![Hasher::digest(b"alpha"), Hasher::digest(b"")];

    let err = t
        .coordinator
        .upload(&t.caller(), zip_upload(&entries, checksums))
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::EmptyEntry);
    assert_eq!(t.objects.put_count(), 0);
}

#[tokio::test]
async fn test_duplicate_contents_consume_duplicate_checksums() {
    let t = common::TestEngine::new().await;

    let entries: [(&str, &[u8]); 2] = [("copy1.txt", b"same bytes"), ("copy2.txt", b"same bytes")];
    let checksums = vec![Hasher::digest(b"same bytes"), Hasher::digest(b"same bytes")];

    let mut request = zip_upload(&entries, checksums);
    request.content_type = "application/x-zip-compressed".to_string();

    let outcomes = t.coordinator.upload(&t.caller(), request).await.unwrap();
    assert_eq!(outcomes.len(), 2);
    assert!(t.objects.contains("alice@copy1.txt@1"));
    assert!(t.objects.contains("alice@copy2.txt@1"));
}

#[tokio::test]
async fn test_plain_upload_with_wrong_checksum_rejected() {
    let t = common::TestEngine::new().await;

    let mut request = common::plain_upload("notes.txt", b"actual content");
    request.checksums = vec![Hasher::digest(b"declared content")];

    let err = t.coordinator.upload(&t.caller(), request).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::ChecksumMismatch);
    assert!(t.objects.is_empty());
}

#[tokio::test]
async fn test_entry_name_with_reserved_delimiter_rejected() {
    let t = common::TestEngine::new().await;

    let entries: [(&str, &[u8]); 1] = [("bad@name.txt", b"data")];
    let checksums = vec![Hasher::digest(b"data")];

    let err = t
        .coordinator
        .upload(&t.caller(), zip_upload(&entries, checksums))
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(t.objects.put_count(), 0);
}

#[tokio::test]
async fn test_archive_batch_counts_against_quota_as_a_whole() {
    let config = EngineConfig {
        max_revisions: 5,
        quota_bytes: 10,
    };
    let t = common::TestEngine::with_config(config).await;

    let first: [(&str, &[u8]); 2] = [("p.bin", b"pppp"), ("q.bin", b"qqqq")];
    t.coordinator
        .upload(
            &t.caller(),
            zip_upload(
                &first,
                vec![Hasher::digest(b"pppp"), Hasher::digest(b"qqqq")],
            ),
        )
        .await
        .unwrap();

    // Four more bytes would land at twelve, over the ten byte limit;
    // the whole batch is rejected before any entry is written.
    let second: [(&str, &[u8]); 2] = [("r.bin", b"rr"), ("s.bin", b"ss")];
    let err = t
        .coordinator
        .upload(
            &t.caller(),
            zip_upload(&second, vec![Hasher::digest(b"rr"), Hasher::digest(b"ss")]),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::QuotaExceeded);
    assert_eq!(t.objects.len(), 2);
}

#[tokio::test]
async fn test_zip_named_file_with_plain_content_type_is_not_expanded() {
    let t = common::TestEngine::new().await;

    let payload = build_zip(&[("inner.txt", b"wrapped")]);
    let request = UploadRequest {
        file_name: "data.zip".to_string(),
        content_type: "application/octet-stream".to_string(),
        data: payload.clone(),
        checksums: vec![Hasher::digest(&payload)],
    };

    let outcomes = t.coordinator.upload(&t.caller(), request).await.unwrap();

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].file.name, "data.zip");
    assert_eq!(outcomes[0].revision.size_bytes, payload.len() as i64);
    assert!(t.objects.contains("alice@data.zip@1"));
}
