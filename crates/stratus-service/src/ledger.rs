//! Revision numbering and retention over a file's loaded history.

use chrono::Utc;

use stratus_core::result::AppResult;
use stratus_core::types::RevisionId;
use stratus_entity::file::{FileRevision, FileWithRevisions, ObjectKey};

/// Pure revision bookkeeping. The coordinator loads state, asks the
/// ledger what to add and what to evict, and stages the outcome.
pub struct RevisionLedger;

impl RevisionLedger {
    /// The number the next revision of this file will carry: 1 for a
    /// fresh file, otherwise the latest revision's number plus one.
    /// Numbers keep counting after evictions; they are never reused.
    pub fn next_revision_number(file: &FileWithRevisions) -> AppResult<u32> {
        match file.latest_revision() {
            Some(latest) => Ok(latest.revision_number()? + 1),
            None => Ok(1),
        }
    }

    /// Build the record for the file's next revision.
    pub fn next_revision(
        file: &FileWithRevisions,
        username: &str,
        size_bytes: i64,
    ) -> AppResult<FileRevision> {
        let number = Self::next_revision_number(file)?;
        let key = ObjectKey::new(username, &file.file.name, number)?;
        Ok(FileRevision {
            id: RevisionId::new(),
            file_id: file.file.id,
            object_key: key.into_string(),
            size_bytes,
            created_at: Utc::now(),
        })
    }

    /// The revision to evict so that adding one more stays within the
    /// retention cap: the oldest by creation time, or `None` when the
    /// file still has room. Each upload adds exactly one revision, so
    /// at most one eviction is ever needed.
    pub fn evict_if_overflow(
        file: &FileWithRevisions,
        max_revisions: u32,
    ) -> Option<FileRevision> {
        if file.revisions.len() + 1 > max_revisions as usize {
            file.oldest_revision().cloned()
        } else {
            None
        }
    }
}
