//! Metadata store contract.
//!
//! The engine coordinates two stores: the object store holds revision
//! blobs, this store holds everything else. Mutations triggered by one
//! logical operation are staged into a [`MetadataTxn`] and applied by a
//! single [`MetadataStore::commit`] call, so a failed object store write
//! never leaves half-applied metadata behind.

use async_trait::async_trait;

use stratus_core::result::AppResult;
use stratus_core::types::{FileId, RevisionId, UserId};
use stratus_entity::audit::{LogEntry, NewLogEntry};
use stratus_entity::file::{File, FileRevision, FileWithRevisions};
use stratus_entity::user::{CreateUser, User};

/// A single staged metadata mutation.
#[derive(Debug, Clone)]
pub enum TxnOp {
    /// Insert the file row, or refresh its mutable columns if it exists.
    UpsertFile(File),
    /// Insert a new revision row.
    InsertRevision(FileRevision),
    /// Remove a revision row.
    DeleteRevision(RevisionId),
    /// Remove a file row.
    DeleteFile(FileId),
}

/// An ordered changeset applied as one transaction.
#[derive(Debug, Clone, Default)]
pub struct MetadataTxn {
    ops: Vec<TxnOp>,
}

impl MetadataTxn {
    /// Create an empty changeset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a file insert-or-refresh.
    pub fn upsert_file(&mut self, file: File) -> &mut Self {
        self.ops.push(TxnOp::UpsertFile(file));
        self
    }

    /// Stage a revision insert.
    pub fn insert_revision(&mut self, revision: FileRevision) -> &mut Self {
        self.ops.push(TxnOp::InsertRevision(revision));
        self
    }

    /// Stage a revision removal.
    pub fn delete_revision(&mut self, id: RevisionId) -> &mut Self {
        self.ops.push(TxnOp::DeleteRevision(id));
        self
    }

    /// Stage a file removal.
    pub fn delete_file(&mut self, id: FileId) -> &mut Self {
        self.ops.push(TxnOp::DeleteFile(id));
        self
    }

    /// Whether anything has been staged.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// The staged operations in application order.
    pub fn ops(&self) -> &[TxnOp] {
        &self.ops
    }

    /// Consume the changeset, yielding the operations.
    pub fn into_ops(self) -> Vec<TxnOp> {
        self.ops
    }
}

/// Trait for the relational metadata store.
///
/// Reads return fully assembled aggregates (files with their revisions,
/// ordered oldest first). All writes besides [`append_log`] go through
/// [`commit`]; audit entries are deliberately written outside operation
/// transactions so a rolled-back operation still leaves its trace.
///
/// [`append_log`]: MetadataStore::append_log
/// [`commit`]: MetadataStore::commit
#[async_trait]
pub trait MetadataStore: Send + Sync + std::fmt::Debug + 'static {
    /// Look up a user by username.
    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// Look up a user by ID.
    async fn find_user_by_id(&self, id: UserId) -> AppResult<Option<User>>;

    /// Create a new, unconfirmed user.
    async fn create_user(&self, user: CreateUser) -> AppResult<User>;

    /// Flag a user's email address as confirmed.
    async fn mark_email_confirmed(&self, id: UserId) -> AppResult<()>;

    /// List a user's files with their revisions, ordered by file name.
    async fn list_files(&self, owner_id: UserId) -> AppResult<Vec<FileWithRevisions>>;

    /// Fetch one of the user's files with its revisions.
    async fn find_file(
        &self,
        owner_id: UserId,
        file_id: FileId,
    ) -> AppResult<Option<FileWithRevisions>>;

    /// Fetch one of the user's files by name.
    async fn find_file_by_name(
        &self,
        owner_id: UserId,
        name: &str,
    ) -> AppResult<Option<FileWithRevisions>>;

    /// Fetch a single revision together with its file, verifying ownership.
    async fn find_revision(
        &self,
        owner_id: UserId,
        revision_id: RevisionId,
    ) -> AppResult<Option<(File, FileRevision)>>;

    /// Apply a staged changeset as one transaction.
    async fn commit(&self, txn: MetadataTxn) -> AppResult<()>;

    /// Append an audit log entry as its own commit.
    async fn append_log(&self, entry: NewLogEntry) -> AppResult<LogEntry>;
}
