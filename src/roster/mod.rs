use crate::error::StoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// One chat on the announcement roster. Removal is a soft delete so the
/// history of who added and removed a chat survives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRecord {
    pub id: i64,
    pub title: String,
    pub added_by: String,
    pub added_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub deleted_by: Option<String>,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Outcome of an add request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    Restored,
    AlreadyPresent,
}

/// Flat-file roster of chats. The whole file is read and rewritten on every
/// mutation; the list stays small (dozens of chats at most).
pub struct ChatRoster {
    path: PathBuf,
}

impl ChatRoster {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join("chats.json"),
        }
    }

    /// Missing or unreadable file is an empty roster, not an error.
    pub fn load(&self) -> Vec<ChatRecord> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                tracing::error!("failed to read {}: {e}", self.path.display());
                return Vec::new();
            }
        };
        match serde_json::from_str(&contents) {
            Ok(list) => list,
            Err(e) => {
                tracing::error!("corrupt roster file {}: {e}", self.path.display());
                Vec::new()
            }
        }
    }

    fn save(&self, records: &[ChatRecord]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::Write {
                path: self.path.display().to_string(),
                message: e.to_string(),
            })?;
        }
        let json = serde_json::to_string_pretty(records).map_err(|e| StoreError::Write {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })?;
        fs::write(&self.path, json).map_err(|e| StoreError::Write {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Add a chat, restoring it if it was soft-deleted earlier.
    pub fn add(
        &self,
        chat_id: i64,
        title: &str,
        added_by: &str,
    ) -> Result<AddOutcome, StoreError> {
        let mut records = self.load();

        if let Some(existing) = records.iter_mut().find(|c| c.id == chat_id) {
            if existing.deleted {
                existing.deleted = false;
                existing.deleted_by = None;
                existing.deleted_at = None;
                self.save(&records)?;
                tracing::info!(chat_id, "chat restored on roster");
                return Ok(AddOutcome::Restored);
            }
            tracing::debug!(chat_id, "chat already on roster");
            return Ok(AddOutcome::AlreadyPresent);
        }

        records.push(ChatRecord {
            id: chat_id,
            title: title.to_string(),
            added_by: added_by.to_string(),
            added_at: Utc::now(),
            deleted: false,
            deleted_by: None,
            deleted_at: None,
        });
        self.save(&records)?;
        tracing::info!(chat_id, title, added_by, "chat added to roster");
        Ok(AddOutcome::Added)
    }

    /// Soft-delete a chat. Returns false if the chat is unknown or already
    /// deleted.
    pub fn remove(&self, chat_id: i64, deleted_by: &str) -> Result<bool, StoreError> {
        let mut records = self.load();
        let Some(record) = records.iter_mut().find(|c| c.id == chat_id) else {
            tracing::debug!(chat_id, "chat not on roster");
            return Ok(false);
        };
        if record.deleted {
            tracing::debug!(chat_id, "chat already marked deleted");
            return Ok(false);
        }
        record.deleted = true;
        record.deleted_by = Some(deleted_by.to_string());
        record.deleted_at = Some(Utc::now());
        self.save(&records)?;
        tracing::info!(chat_id, deleted_by, "chat removed from roster");
        Ok(true)
    }

    /// Chats that receive announcements.
    pub fn active(&self) -> Vec<ChatRecord> {
        self.load().into_iter().filter(|c| !c.deleted).collect()
    }
}
