//! Attachments service
//!
//! Handles the single file a todo may carry. Integrates Repository and
//! AttachmentStore; the file system and the row are updated in sequence,
//! not atomically.

use crate::config::{IMAGE_EXTENSIONS, MAX_ATTACHMENT_BYTES, MAX_ATTACHMENT_NAME_LENGTH};
use crate::database::{Attachment, AttachmentKind, Repository};
use crate::error::{AppError, Result};
use crate::storage::attachment_store::{extension_of, public_path};
use crate::storage::AttachmentStore;

/// Service for managing attachments
#[derive(Clone)]
pub struct AttachmentsService {
    repo: Repository,
    store: AttachmentStore,
}

impl AttachmentsService {
    pub fn new(repo: Repository, store: AttachmentStore) -> Self {
        Self { repo, store }
    }

    /// Replace the attachment of a todo with `data`.
    ///
    /// Returns `None` when the caller owns no todo with that id; the file
    /// written for it is removed again. Oversized data is rejected before
    /// the current file is touched.
    pub async fn upsert_attachment(
        &self,
        user_id: i64,
        todo_id: i64,
        file_name: &str,
        data: &[u8],
    ) -> Result<Option<Attachment>> {
        tracing::info!(
            "Uploading attachment: {} for todo: {} (size: {} bytes)",
            file_name,
            todo_id,
            data.len()
        );

        if data.len() > MAX_ATTACHMENT_BYTES {
            return Err(AppError::AttachmentTooLarge {
                size: data.len(),
                limit: MAX_ATTACHMENT_BYTES,
            });
        }

        let extension = extension_of(file_name);

        self.store.remove_matching(user_id, todo_id).await?;
        let stored = self
            .store
            .write(user_id, todo_id, extension.as_deref(), data)
            .await?;

        let attachment = Attachment {
            path: public_path(&stored),
            name: sanitize_filename(file_name),
            kind: classify(extension.as_deref()),
        };

        let updated = self.repo.set_attachment(user_id, todo_id, &attachment).await?;

        match updated {
            Some(todo) => {
                tracing::info!("Attachment stored: {}", attachment.path);
                Ok(todo.attachment())
            }
            None => {
                tracing::debug!("Upload matched no todo: {} (user {})", todo_id, user_id);
                self.store.remove_file(&stored).await?;
                Ok(None)
            }
        }
    }

    /// Remove the attachment file and clear the attachment columns
    pub async fn delete_attachment(&self, user_id: i64, todo_id: i64) -> Result<()> {
        tracing::info!("Deleting attachment of todo: {}", todo_id);

        let removed = self.store.remove_matching(user_id, todo_id).await?;
        self.repo.clear_attachment(user_id, todo_id).await?;

        tracing::info!("Attachment deleted: todo {} ({} files)", todo_id, removed);

        Ok(())
    }
}

/// Image when the lowercased extension is on the allow-list
pub fn classify(extension: Option<&str>) -> AttachmentKind {
    match extension {
        Some(ext) if IMAGE_EXTENSIONS.contains(&ext) => AttachmentKind::Image,
        _ => AttachmentKind::Other,
    }
}

/// Strip path separators and control characters from a display name
fn sanitize_filename(filename: &str) -> String {
    let cleaned: String = filename
        .chars()
        .filter(|c| *c != '/' && *c != '\\' && !c.is_control())
        .take(MAX_ATTACHMENT_NAME_LENGTH)
        .collect();

    if cleaned.trim().is_empty() {
        "Attachment".to_string()
    } else {
        cleaned
    }
}
