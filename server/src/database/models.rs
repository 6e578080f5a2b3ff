//! Database models
//!
//! Rust structs representing database entities and the wire shapes
//! derived from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// A registered account
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    /// Argon2id PHC string
    pub password: String,
}

/// Classification of an uploaded file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    Other,
}

/// File attached to a todo
///
/// The three columns backing it are either all set or all NULL, so the
/// attachment is modelled as a single optional value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Public URL path, e.g. `/user/3-12.png`
    pub path: String,
    /// Original file name shown to the user
    pub name: String,
    pub kind: AttachmentKind,
}

/// A todo row as stored
#[derive(Debug, Clone, FromRow)]
pub struct Todo {
    pub id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub content: String,
    pub attachment: Option<String>,
    pub attachment_name: Option<String>,
    pub attachment_enum: Option<AttachmentKind>,
    pub tags: Json<Vec<String>>,
}

impl Todo {
    /// Collapse the attachment columns into one value
    pub fn attachment(&self) -> Option<Attachment> {
        match (&self.attachment, &self.attachment_name, self.attachment_enum) {
            (Some(path), Some(name), Some(kind)) => Some(Attachment {
                path: path.clone(),
                name: name.clone(),
                kind,
            }),
            _ => None,
        }
    }
}

/// A todo as sent to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoPage {
    pub id: i64,
    pub content: String,
    pub attachment: Option<Attachment>,
    pub tags: Vec<String>,
}

impl From<Todo> for TodoPage {
    fn from(todo: Todo) -> Self {
        let attachment = todo.attachment();
        Self {
            id: todo.id,
            content: todo.content,
            attachment,
            tags: todo.tags.0,
        }
    }
}

/// Credentials submitted to register or log in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Create todo request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTodoRequest {
    #[serde(default)]
    pub content: String,
}

/// Edit todo request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditTodoRequest {
    pub content: String,
}

/// Replace tags request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetTagsRequest {
    pub tags: Vec<String>,
}

/// Result of an attachment upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentResponse {
    pub attachment: Option<Attachment>,
}
