//! File revision entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use stratus_core::result::AppResult;
use stratus_core::types::{FileId, RevisionId};

use super::object_key::ObjectKey;

/// One retained revision of a file.
///
/// The revision number is not stored as a column; it is derived from the
/// trailing segment of the object key, which is the durable record of the
/// numbering sequence.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FileRevision {
    /// Unique revision identifier.
    pub id: RevisionId,
    /// The file this revision belongs to.
    pub file_id: FileId,
    /// Key of this revision's blob in the object store.
    pub object_key: String,
    /// Size of the blob in bytes.
    pub size_bytes: i64,
    /// When this revision was created.
    pub created_at: DateTime<Utc>,
}

impl FileRevision {
    /// The revision number parsed from the object key.
    pub fn revision_number(&self) -> AppResult<u32> {
        ObjectKey::revision_number(&self.object_key)
    }
}
