//! File entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use stratus_core::types::{FileId, UserId};

use super::revision::FileRevision;

/// A file stored in Stratus.
///
/// The row carries only identity and descriptive metadata; the actual
/// content lives in the object store, one blob per [`FileRevision`].
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct File {
    /// Unique file identifier.
    pub id: FileId,
    /// The file owner. File names are unique per owner.
    pub owner_id: UserId,
    /// The file name (including extension).
    pub name: String,
    /// MIME type declared at upload time.
    pub content_type: String,
    /// When the file was created.
    pub created_at: DateTime<Utc>,
    /// When the file last received a revision.
    pub modified_at: DateTime<Utc>,
}

impl File {
    /// Get the file extension (lowercase), if any.
    pub fn extension(&self) -> Option<String> {
        self.name
            .rsplit('.')
            .next()
            .filter(|ext| *ext != self.name)
            .map(|ext| ext.to_lowercase())
    }
}

/// A file together with its revision history, ordered by creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileWithRevisions {
    /// The file record.
    pub file: File,
    /// All retained revisions of the file.
    pub revisions: Vec<FileRevision>,
}

impl FileWithRevisions {
    /// The most recently created revision, if any.
    pub fn latest_revision(&self) -> Option<&FileRevision> {
        self.revisions.iter().max_by_key(|r| r.created_at)
    }

    /// The oldest retained revision, if any.
    pub fn oldest_revision(&self) -> Option<&FileRevision> {
        self.revisions.iter().min_by_key(|r| r.created_at)
    }

    /// Total bytes held by every retained revision of this file.
    pub fn total_size_bytes(&self) -> i64 {
        self.revisions.iter().map(|r| r.size_bytes).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use stratus_core::types::RevisionId;

    fn file_with(revision_sizes: &[i64]) -> FileWithRevisions {
        let file = File {
            id: FileId::new(),
            owner_id: UserId::new(),
            name: "report.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            created_at: Utc::now(),
            modified_at: Utc::now(),
        };
        let base = Utc::now();
        let revisions = revision_sizes
            .iter()
            .enumerate()
            .map(|(i, size)| FileRevision {
                id: RevisionId::new(),
                file_id: file.id,
                object_key: format!("alice@report.pdf@{}", i + 1),
                size_bytes: *size,
                created_at: base + Duration::seconds(i as i64),
            })
            .collect();
        FileWithRevisions { file, revisions }
    }

    #[test]
    fn test_extension() {
        let f = file_with(&[]).file;
        assert_eq!(f.extension(), Some("pdf".to_string()));

        let mut noext = file_with(&[]).file;
        noext.name = "README".to_string();
        assert_eq!(noext.extension(), None);
    }

    #[test]
    fn test_latest_and_oldest_revision() {
        let fw = file_with(&[10, 20, 30]);
        assert_eq!(fw.oldest_revision().unwrap().size_bytes, 10);
        assert_eq!(fw.latest_revision().unwrap().size_bytes, 30);
    }

    #[test]
    fn test_total_size() {
        let fw = file_with(&[10, 20, 30]);
        assert_eq!(fw.total_size_bytes(), 60);
        assert_eq!(file_with(&[]).total_size_bytes(), 0);
    }
}
