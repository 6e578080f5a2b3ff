//! Attachment file storage
//!
//! Each todo owns at most one file in the upload directory, named after
//! its owner and id: `{userId}-{todoId}.{extension}` (or `{userId}-{todoId}`
//! when the upload had no extension). Before a new file is written every
//! file with that stem is removed.
//!
//! Example: user 3 uploading `cat.PNG` to todo 12 produces `3-12.png`.

use crate::config::ATTACHMENT_URL_PREFIX;
use crate::error::Result;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Directory-backed attachment store
#[derive(Clone)]
pub struct AttachmentStore {
    root: PathBuf,
}

impl AttachmentStore {
    /// Create a store rooted at the given directory
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Create the upload directory if needed
    pub async fn initialize(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        tracing::info!("Attachment store initialized at: {:?}", self.root);
        Ok(())
    }

    /// Write `data` as the attachment of a todo, returning the stored file name.
    ///
    /// Callers remove previous files first with [`AttachmentStore::remove_matching`].
    pub async fn write(
        &self,
        user_id: i64,
        todo_id: i64,
        extension: Option<&str>,
        data: &[u8],
    ) -> Result<String> {
        let file_name = file_name(user_id, todo_id, extension);
        let path = self.root.join(&file_name);

        // Temp name starts with a dot so it never matches a todo's stem
        let temp_path = self.root.join(format!(".{}.tmp", file_name));
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;

        fs::rename(&temp_path, &path).await?;

        tracing::debug!("Wrote attachment: {} ({} bytes)", file_name, data.len());

        Ok(file_name)
    }

    /// Remove every file belonging to the todo, returning how many were removed
    pub async fn remove_matching(&self, user_id: i64, todo_id: i64) -> Result<usize> {
        let stem = file_stem(user_id, todo_id);
        let mut removed = 0;

        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };

            if !belongs_to(name, &stem) || !entry.file_type().await?.is_file() {
                continue;
            }

            fs::remove_file(entry.path()).await?;
            tracing::debug!("Removed attachment file: {}", name);
            removed += 1;
        }

        Ok(removed)
    }

    /// Remove a single stored file; missing files are ignored
    pub async fn remove_file(&self, file_name: &str) -> Result<()> {
        match fs::remove_file(self.root.join(file_name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Names of the files currently stored for a todo
    pub async fn files_for(&self, user_id: i64, todo_id: i64) -> Result<Vec<String>> {
        let stem = file_stem(user_id, todo_id);
        let mut names = Vec::new();

        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            if let Some(name) = entry.file_name().to_str() {
                if belongs_to(name, &stem) {
                    names.push(name.to_string());
                }
            }
        }

        names.sort();
        Ok(names)
    }

    /// Get the upload directory
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// `{userId}-{todoId}`
pub fn file_stem(user_id: i64, todo_id: i64) -> String {
    format!("{}-{}", user_id, todo_id)
}

/// `{userId}-{todoId}.{extension}`, or the bare stem without an extension
pub fn file_name(user_id: i64, todo_id: i64, extension: Option<&str>) -> String {
    match extension {
        Some(ext) => format!("{}.{}", file_stem(user_id, todo_id), ext),
        None => file_stem(user_id, todo_id),
    }
}

/// URL under which a stored file is served
pub fn public_path(file_name: &str) -> String {
    format!("{}/{}", ATTACHMENT_URL_PREFIX, file_name)
}

/// Lowercased extension of an uploaded file name.
///
/// Only ASCII alphanumerics survive so the extension can never introduce
/// a path separator.
pub fn extension_of(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;

    let ext: String = ext
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect();

    (!ext.is_empty()).then_some(ext)
}

fn belongs_to(name: &str, stem: &str) -> bool {
    match name.strip_prefix(stem) {
        Some(rest) => rest.is_empty() || rest.starts_with('.'),
        None => false,
    }
}
