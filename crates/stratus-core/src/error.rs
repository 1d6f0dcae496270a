//! The unified error type for Stratus.
//!
//! Every fallible operation across the workspace returns [`AppError`],
//! mapped from underlying library errors via `From` impls or explicit
//! `.map_err()` calls at the boundary where they occur.

use std::fmt;
use thiserror::Error;

/// Classifies an [`AppError`] for handling and audit decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The requested user, file, or revision does not exist.
    NotFound,
    /// The request carried invalid input.
    Validation,
    /// Admitting the upload would exceed the caller's storage quota.
    QuotaExceeded,
    /// Content bytes did not match the expected checksum.
    ChecksumMismatch,
    /// The checksum manifest did not match the archive contents.
    ArchiveMismatch,
    /// An uploaded file or archive entry had no content.
    EmptyEntry,
    /// The request collides with existing state (duplicate name, etc.).
    Conflict,
    /// A bug or unexpected condition inside the engine.
    Internal,
    /// The metadata store reported an error.
    Database,
    /// The object store reported an I/O error.
    Storage,
    /// The object store is temporarily unreachable; the call may be retried.
    StoreUnavailable,
    /// The metadata store and the object store disagree about stored state.
    Inconsistent,
    /// The application configuration is invalid or incomplete.
    Configuration,
    /// Serializing or deserializing a payload failed.
    Serialization,
}

impl ErrorKind {
    /// Stable machine-readable name, also used as the display form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::Validation => "VALIDATION",
            Self::QuotaExceeded => "QUOTA_EXCEEDED",
            Self::ChecksumMismatch => "CHECKSUM_MISMATCH",
            Self::ArchiveMismatch => "ARCHIVE_MISMATCH",
            Self::EmptyEntry => "EMPTY_ENTRY",
            Self::Conflict => "CONFLICT",
            Self::Internal => "INTERNAL",
            Self::Database => "DATABASE",
            Self::Storage => "STORAGE",
            Self::StoreUnavailable => "STORE_UNAVAILABLE",
            Self::Inconsistent => "INCONSISTENT",
            Self::Configuration => "CONFIGURATION",
            Self::Serialization => "SERIALIZATION",
        }
    }

    /// Whether errors of this kind are transient and safe to retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::StoreUnavailable)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error with a [`kind`](ErrorKind), a human-readable message, and
/// optionally the underlying cause it was mapped from.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// An error with no underlying cause.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// An error wrapping the library error it was mapped from.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Shorthand for [`ErrorKind::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Shorthand for [`ErrorKind::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Shorthand for [`ErrorKind::QuotaExceeded`].
    pub fn quota_exceeded(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::QuotaExceeded, message)
    }

    /// Shorthand for [`ErrorKind::ChecksumMismatch`].
    pub fn checksum_mismatch(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ChecksumMismatch, message)
    }

    /// Shorthand for [`ErrorKind::ArchiveMismatch`].
    pub fn archive_mismatch(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ArchiveMismatch, message)
    }

    /// Shorthand for [`ErrorKind::EmptyEntry`].
    pub fn empty_entry(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::EmptyEntry, message)
    }

    /// Shorthand for [`ErrorKind::Conflict`].
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Shorthand for [`ErrorKind::StoreUnavailable`].
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::StoreUnavailable, message)
    }

    /// Shorthand for [`ErrorKind::Inconsistent`].
    pub fn inconsistent(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Inconsistent, message)
    }

    /// Shorthand for [`ErrorKind::Configuration`].
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Whether this error is transient and safe to retry.
    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }
}

// Boxed sources are not cloneable; a clone keeps the kind and message.
impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorKind::Storage, format!("I/O error: {err}"), err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}
