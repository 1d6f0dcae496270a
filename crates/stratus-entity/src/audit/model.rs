//! Audit log entry entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use stratus_core::types::{LogEntryId, UserId};

/// The kind of event an audit entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "log_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    /// A file revision was stored.
    FileUpload,
    /// A file or bundle was downloaded.
    FileDownload,
    /// A file or revision was deleted.
    FileDelete,
    /// An upload was attempted and rejected.
    FileUploadAttempt,
    /// A download was attempted and rejected.
    FileDownloadAttempt,
    /// A deletion was attempted and rejected.
    FileDeleteAttempt,
    /// The caller listed their files.
    ViewListOfFiles,
    /// An operation failed for a reason outside the normal attempt kinds.
    Failure,
}

impl LogKind {
    /// Return the kind as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FileUpload => "file_upload",
            Self::FileDownload => "file_download",
            Self::FileDelete => "file_delete",
            Self::FileUploadAttempt => "file_upload_attempt",
            Self::FileDownloadAttempt => "file_download_attempt",
            Self::FileDeleteAttempt => "file_delete_attempt",
            Self::ViewListOfFiles => "view_list_of_files",
            Self::Failure => "failure",
        }
    }
}

/// An immutable audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LogEntry {
    /// Unique log entry identifier.
    pub id: LogEntryId,
    /// The user the event concerns, when one could be resolved.
    pub user_id: Option<UserId>,
    /// The kind of event.
    pub kind: LogKind,
    /// Human-readable description of the event.
    pub message: String,
    /// When the event occurred.
    pub created_at: DateTime<Utc>,
}

/// Data required to append a new audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLogEntry {
    /// The user the event concerns, if known.
    pub user_id: Option<UserId>,
    /// The kind of event.
    pub kind: LogKind,
    /// Human-readable description.
    pub message: String,
}
