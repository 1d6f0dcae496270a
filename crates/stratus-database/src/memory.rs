//! In-memory metadata store.
//!
//! Backs tests and single-process deployments where durability is not
//! required. Mirrors the PostgreSQL store's ordering guarantees: files
//! are listed by name and revisions oldest first.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use stratus_core::error::AppError;
use stratus_core::result::AppResult;
use stratus_core::types::{FileId, LogEntryId, RevisionId, UserId};
use stratus_entity::audit::{LogEntry, NewLogEntry};
use stratus_entity::file::{File, FileRevision, FileWithRevisions};
use stratus_entity::user::{CreateUser, User};

use crate::store::{MetadataStore, MetadataTxn, TxnOp};

#[derive(Debug, Default)]
struct Inner {
    users: HashMap<UserId, User>,
    files: HashMap<FileId, File>,
    revisions: HashMap<RevisionId, FileRevision>,
    logs: Vec<LogEntry>,
}

impl Inner {
    fn assemble(&self, file: &File) -> FileWithRevisions {
        let mut revisions: Vec<FileRevision> = self
            .revisions
            .values()
            .filter(|r| r.file_id == file.id)
            .cloned()
            .collect();
        revisions.sort_by_key(|r| r.created_at);
        FileWithRevisions {
            file: file.clone(),
            revisions,
        }
    }
}

/// Metadata store held entirely in process memory.
#[derive(Debug, Default)]
pub struct MemoryMetadataStore {
    inner: RwLock<Inner>,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the audit log, for inspection in tests.
    pub async fn log_entries(&self) -> Vec<LogEntry> {
        self.inner.read().await.logs.clone()
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_user_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(&id).cloned())
    }

    async fn create_user(&self, user: CreateUser) -> AppResult<User> {
        let mut inner = self.inner.write().await;
        if inner.users.values().any(|u| u.username == user.username) {
            return Err(AppError::conflict(format!(
                "Username '{}' is already taken",
                user.username
            )));
        }
        if inner.users.values().any(|u| u.email == user.email) {
            return Err(AppError::conflict(format!(
                "Email '{}' is already registered",
                user.email
            )));
        }
        let user = User {
            id: UserId::new(),
            username: user.username,
            email: user.email,
            confirmation_code: user.confirmation_code,
            email_confirmed: false,
            created_at: Utc::now(),
        };
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn mark_email_confirmed(&self, id: UserId) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        match inner.users.get_mut(&id) {
            Some(user) => {
                user.email_confirmed = true;
                Ok(())
            }
            None => Err(AppError::not_found(format!("User {id} not found"))),
        }
    }

    async fn list_files(&self, owner_id: UserId) -> AppResult<Vec<FileWithRevisions>> {
        let inner = self.inner.read().await;
        let mut files: Vec<FileWithRevisions> = inner
            .files
            .values()
            .filter(|f| f.owner_id == owner_id)
            .map(|f| inner.assemble(f))
            .collect();
        files.sort_by(|a, b| a.file.name.cmp(&b.file.name));
        Ok(files)
    }

    async fn find_file(
        &self,
        owner_id: UserId,
        file_id: FileId,
    ) -> AppResult<Option<FileWithRevisions>> {
        let inner = self.inner.read().await;
        Ok(inner
            .files
            .get(&file_id)
            .filter(|f| f.owner_id == owner_id)
            .map(|f| inner.assemble(f)))
    }

    async fn find_file_by_name(
        &self,
        owner_id: UserId,
        name: &str,
    ) -> AppResult<Option<FileWithRevisions>> {
        let inner = self.inner.read().await;
        Ok(inner
            .files
            .values()
            .find(|f| f.owner_id == owner_id && f.name == name)
            .map(|f| inner.assemble(f)))
    }

    async fn find_revision(
        &self,
        owner_id: UserId,
        revision_id: RevisionId,
    ) -> AppResult<Option<(File, FileRevision)>> {
        let inner = self.inner.read().await;
        let Some(revision) = inner.revisions.get(&revision_id) else {
            return Ok(None);
        };
        let Some(file) = inner.files.get(&revision.file_id) else {
            return Err(AppError::inconsistent(format!(
                "Revision {revision_id} references a missing file row"
            )));
        };
        if file.owner_id != owner_id {
            return Ok(None);
        }
        Ok(Some((file.clone(), revision.clone())))
    }

    async fn commit(&self, txn: MetadataTxn) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        for op in txn.into_ops() {
            match op {
                TxnOp::UpsertFile(file) => {
                    inner.files.insert(file.id, file);
                }
                TxnOp::InsertRevision(revision) => {
                    inner.revisions.insert(revision.id, revision);
                }
                TxnOp::DeleteRevision(id) => {
                    inner.revisions.remove(&id);
                }
                TxnOp::DeleteFile(id) => {
                    inner.files.remove(&id);
                    inner.revisions.retain(|_, r| r.file_id != id);
                }
            }
        }
        Ok(())
    }

    async fn append_log(&self, entry: NewLogEntry) -> AppResult<LogEntry> {
        let mut inner = self.inner.write().await;
        let entry = LogEntry {
            id: LogEntryId::new(),
            user_id: entry.user_id,
            kind: entry.kind,
            message: entry.message,
            created_at: Utc::now(),
        };
        inner.logs.push(entry.clone());
        Ok(entry)
    }
}
