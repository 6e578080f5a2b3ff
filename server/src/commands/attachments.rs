//! Attachment commands
//!
//! Upload expects a multipart form with a `file` field. The stored file
//! is served back under `/user/{userId}-{todoId}.{ext}`.

use super::ApiPath;
use crate::app::AppState;
use crate::database::AttachmentResponse;
use crate::error::{AppError, Result};
use crate::session::CurrentUser;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;

const FILE_FIELD: &str = "file";
const DEFAULT_FILE_NAME: &str = "Attachment";

/// Replace the attachment of a todo
pub async fn upload_attachment(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiPath(todo_id): ApiPath<i64>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<AttachmentResponse>> {
    let mut multipart = multipart?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field
            .file_name()
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_FILE_NAME)
            .to_string();
        let data = field.bytes().await?;

        let attachment = state
            .attachments_service
            .upsert_attachment(user_id, todo_id, &file_name, &data)
            .await?;

        return Ok(Json(AttachmentResponse { attachment }));
    }

    Err(AppError::Multipart(format!("missing `{}` field", FILE_FIELD)))
}

/// Remove the attachment of a todo
pub async fn delete_attachment(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiPath(todo_id): ApiPath<i64>,
) -> Result<StatusCode> {
    state
        .attachments_service
        .delete_attachment(user_id, todo_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
