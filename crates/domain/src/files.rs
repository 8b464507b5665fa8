use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::DomainResult;
use crate::error::DomainError;
use crate::groups::ensure_member;
use crate::identity::ActorIdentity;
use crate::ports::files::{FileRepository, FileStore};
use crate::ports::groups::GroupRepository;
use crate::util::{now_ms, uuid_v7_without_dashes};

pub const MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// Stored metadata only; the bytes live behind the `FileStore`
/// collaborator, referenced by `path`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileAttachment {
    pub file_id: String,
    pub group_id: String,
    pub uploader_id: String,
    pub stored_name: String,
    pub original_name: String,
    pub path: String,
    pub size: u64,
    pub mime_type: String,
    pub created_at_ms: i64,
}

#[derive(Clone)]
pub struct FileService {
    groups: Arc<dyn GroupRepository>,
    files: Arc<dyn FileRepository>,
    store: Arc<dyn FileStore>,
    max_upload_bytes: u64,
}

impl FileService {
    pub fn new(
        groups: Arc<dyn GroupRepository>,
        files: Arc<dyn FileRepository>,
        store: Arc<dyn FileStore>,
        max_upload_bytes: u64,
    ) -> Self {
        Self {
            groups,
            files,
            store,
            max_upload_bytes,
        }
    }

    /// Rejects oversized uploads before any byte reaches storage.
    pub async fn store(
        &self,
        actor: &ActorIdentity,
        group_id: &str,
        original_name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> DomainResult<FileAttachment> {
        ensure_member(self.groups.as_ref(), group_id, &actor.user_id).await?;

        let original_name = original_name.trim();
        if original_name.is_empty() {
            return Err(DomainError::Validation("file name is required".into()));
        }
        let size = bytes.len() as u64;
        if size > self.max_upload_bytes {
            return Err(DomainError::Validation(format!(
                "file exceeds upload limit of {} bytes",
                self.max_upload_bytes
            )));
        }

        let stored_name = stored_name_for(original_name);
        let path = self.store.put(&stored_name, bytes).await?;

        let attachment = FileAttachment {
            file_id: uuid_v7_without_dashes(),
            group_id: group_id.to_string(),
            uploader_id: actor.user_id.clone(),
            stored_name,
            original_name: original_name.to_string(),
            path,
            size,
            mime_type: mime_type.trim().to_string(),
            created_at_ms: now_ms(),
        };
        self.files.create_file(&attachment).await
    }

    pub async fn list(
        &self,
        actor: &ActorIdentity,
        group_id: &str,
    ) -> DomainResult<Vec<FileAttachment>> {
        ensure_member(self.groups.as_ref(), group_id, &actor.user_id).await?;
        self.files.list_files(group_id).await
    }
}

fn stored_name_for(original_name: &str) -> String {
    let id = uuid_v7_without_dashes();
    match original_name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() && ext.len() <= 16 => format!("{id}.{ext}"),
        _ => id,
    }
}
