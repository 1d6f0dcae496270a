//! ZIP archive expansion with checksum verification.

use std::io::{Cursor, Read};

use bytes::Bytes;
use zip::ZipArchive;

use stratus_core::error::{AppError, ErrorKind};
use stratus_core::result::AppResult;

use crate::digest::Hasher;

/// Content types treated as ZIP containers on upload.
pub fn is_archive(content_type: &str) -> bool {
    matches!(
        content_type,
        "application/zip" | "application/x-zip-compressed"
    )
}

/// One verified entry extracted from an uploaded archive.
#[derive(Debug, Clone)]
pub struct ExpandedEntry {
    /// Entry file name (last path segment, directories stripped).
    pub name: String,
    /// Content type inferred from the entry name.
    pub content_type: String,
    /// Uncompressed size in bytes.
    pub size_bytes: i64,
    /// The entry's full content.
    pub data: Bytes,
}

/// Expands uploaded ZIP containers into verified entries.
pub struct ArchiveExpander;

impl ArchiveExpander {
    /// Expand a ZIP archive and verify every entry against the declared
    /// checksum pool.
    ///
    /// Matching is not positional: each entry's digest is looked up in
    /// the remaining pool and consumes its match, so callers may declare
    /// checksums in any order. Cardinality must match exactly, blank
    /// checksums are unusable, and zero-length entries are rejected.
    /// Entries are returned in the archive's internal order.
    pub fn expand(data: Bytes, expected_checksums: &[String]) -> AppResult<Vec<ExpandedEntry>> {
        if expected_checksums.iter().any(|c| c.trim().is_empty()) {
            return Err(AppError::archive_mismatch(
                "Archive upload declared a blank checksum",
            ));
        }

        let mut archive = ZipArchive::new(Cursor::new(data)).map_err(|e| {
            AppError::with_source(
                ErrorKind::Validation,
                "Uploaded data is not a valid ZIP archive",
                e,
            )
        })?;

        let mut file_indices = Vec::new();
        for i in 0..archive.len() {
            let entry = archive.by_index(i).map_err(|e| {
                AppError::with_source(ErrorKind::Validation, "Failed to read archive entry", e)
            })?;
            if !entry.is_dir() {
                file_indices.push(i);
            }
        }

        if file_indices.len() != expected_checksums.len() {
            return Err(AppError::archive_mismatch(format!(
                "Archive holds {} entries but {} checksums were declared",
                file_indices.len(),
                expected_checksums.len()
            )));
        }

        let mut pool: Vec<&String> = expected_checksums.iter().collect();
        let mut entries = Vec::with_capacity(file_indices.len());
        for i in file_indices {
            let mut entry = archive.by_index(i).map_err(|e| {
                AppError::with_source(ErrorKind::Validation, "Failed to read archive entry", e)
            })?;

            let name = entry
                .enclosed_name()
                .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
                .unwrap_or_else(|| {
                    entry
                        .name()
                        .rsplit('/')
                        .next()
                        .unwrap_or_default()
                        .to_string()
                });

            if entry.size() == 0 {
                return Err(AppError::empty_entry(format!(
                    "Archive entry '{name}' is empty"
                )));
            }

            let mut buf = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut buf).map_err(|e| {
                AppError::with_source(
                    ErrorKind::Validation,
                    format!("Failed to decompress archive entry '{name}'"),
                    e,
                )
            })?;

            let digest = Hasher::digest(&buf);
            match pool.iter().position(|c| **c == digest) {
                Some(idx) => {
                    pool.swap_remove(idx);
                }
                None => {
                    return Err(AppError::checksum_mismatch(format!(
                        "Archive entry '{name}' matches none of the declared checksums"
                    )));
                }
            }

            entries.push(ExpandedEntry {
                content_type: content_type_for_name(&name),
                size_bytes: buf.len() as i64,
                data: Bytes::from(buf),
                name,
            });
        }

        Ok(entries)
    }
}

/// Infer a MIME type from a file name extension, falling back to a
/// generic byte stream for unknown extensions.
pub fn content_type_for_name(name: &str) -> String {
    let ext = name
        .rsplit('.')
        .next()
        .map(str::to_lowercase)
        .unwrap_or_default();
    let mime = match ext.as_str() {
        "txt" => "text/plain",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "xml" => "application/xml",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" | "gzip" => "application/gzip",
        "tar" => "application/x-tar",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "mp4" => "video/mp4",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "csv" => "text/csv",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => "application/octet-stream",
    };
    mime.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::CompressionMethod;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    fn build_zip(entries: &[(&str, &[u8])]) -> Bytes {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in entries {
            let options =
                SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
        }
        Bytes::from(writer.finish().unwrap().into_inner())
    }

    #[test]
    fn test_expand_matches_checksums_in_any_order() {
        let zip = build_zip(&[
            ("a.txt", b"alpha"),
            ("b.json", b"{\"k\":1}"),
            ("c.bin", b"\x00\x01\x02"),
        ]);
        // Reverse of the entry order.
        let checksums = vec![
            Hasher::digest(b"\x00\x01\x02"),
            Hasher::digest(b"{\"k\":1}"),
            Hasher::digest(b"alpha"),
        ];

        let entries = ArchiveExpander::expand(zip, &checksums).unwrap();

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].name, "a.txt");
        assert_eq!(entries[0].content_type, "text/plain");
        assert_eq!(entries[1].name, "b.json");
        assert_eq!(entries[1].content_type, "application/json");
        assert_eq!(entries[2].content_type, "application/octet-stream");
        assert_eq!(entries[2].size_bytes, 3);
    }

    #[test]
    fn test_expand_rejects_wrong_digest() {
        let zip = build_zip(&[("a.txt", b"alpha")]);
        let checksums = vec![Hasher::digest(b"not alpha")];

        let err = ArchiveExpander::expand(zip, &checksums).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ChecksumMismatch);
    }

    #[test]
    fn test_expand_rejects_cardinality_mismatch() {
        let zip = build_zip(&[("a.txt", b"alpha"), ("b.txt", b"beta")]);

        let too_few = vec![Hasher::digest(b"alpha")];
        let err = ArchiveExpander::expand(zip.clone(), &too_few).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ArchiveMismatch);

        let too_many = vec![
            Hasher::digest(b"alpha"),
            Hasher::digest(b"beta"),
            Hasher::digest(b"gamma"),
        ];
        let err = ArchiveExpander::expand(zip, &too_many).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ArchiveMismatch);
    }

    #[test]
    fn test_expand_rejects_blank_checksum() {
        let zip = build_zip(&[("a.txt", b"alpha")]);
        let err = ArchiveExpander::expand(zip, &["   ".to_string()]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ArchiveMismatch);
    }

    #[test]
    fn test_expand_rejects_empty_entry() {
        let zip = build_zip(&[("a.txt", b"alpha"), ("empty.bin", b"")]);
        let checksums = vec![Hasher::digest(b"alpha"), Hasher::digest(b"")];

        let err = ArchiveExpander::expand(zip, &checksums).unwrap_err();
        assert_eq!(err.kind, ErrorKind::EmptyEntry);
    }

    #[test]
    fn test_expand_rejects_non_zip_payload() {
        let err =
            ArchiveExpander::expand(Bytes::from("plain text"), &[Hasher::digest(b"x")])
                .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[test]
    fn test_expand_ignores_directories_and_strips_paths() {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .add_directory("docs/", SimpleFileOptions::default())
            .unwrap();
        writer
            .start_file(
                "docs/readme.txt",
                SimpleFileOptions::default().compression_method(CompressionMethod::Deflated),
            )
            .unwrap();
        writer.write_all(b"hello").unwrap();
        let zip = Bytes::from(writer.finish().unwrap().into_inner());

        let entries = ArchiveExpander::expand(zip, &[Hasher::digest(b"hello")]).unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "readme.txt");
    }

    #[test]
    fn test_is_archive() {
        assert!(is_archive("application/zip"));
        assert!(is_archive("application/x-zip-compressed"));
        assert!(!is_archive("text/plain"));
    }

    #[test]
    fn test_content_type_fallback() {
        assert_eq!(content_type_for_name("report.pdf"), "application/pdf");
        assert_eq!(content_type_for_name("IMG.JPG"), "image/jpeg");
        assert_eq!(content_type_for_name("noext"), "application/octet-stream");
    }
}
