//! Multi-file ZIP bundling for batch downloads.

use std::io::{Cursor, Write};

use bytes::Bytes;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use stratus_core::error::{AppError, ErrorKind};
use stratus_core::result::AppResult;

/// Assembles one ZIP container from independently fetched payloads.
pub struct BundleBuilder;

impl BundleBuilder {
    /// Write one deflated entry per (name, bytes) pair and return the
    /// fully materialized container. Entry names are used as-is; the
    /// container format requires them to be distinct.
    pub fn build(entries: Vec<(String, Bytes)>) -> AppResult<Bytes> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

        for (name, data) in entries {
            let options =
                SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
            writer.start_file(name, options).map_err(|e| {
                AppError::with_source(ErrorKind::Internal, "Failed to start bundle entry", e)
            })?;
            writer.write_all(&data).map_err(|e| {
                AppError::with_source(ErrorKind::Internal, "Failed to write bundle entry", e)
            })?;
        }

        let cursor = writer.finish().map_err(|e| {
            AppError::with_source(ErrorKind::Internal, "Failed to finalize bundle", e)
        })?;
        Ok(Bytes::from(cursor.into_inner()))
    }
}
