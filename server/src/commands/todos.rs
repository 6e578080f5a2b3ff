//! Todo commands
//!
//! Every handler is scoped to the session's user. Edits and deletes of an
//! id the caller does not own succeed without touching anything.

use super::{ApiJson, ApiPath};
use crate::app::AppState;
use crate::database::{CreateTodoRequest, EditTodoRequest, SetTagsRequest, TodoPage};
use crate::error::Result;
use crate::session::CurrentUser;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

/// Data rendered on the protected page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodosPage {
    pub todos: Vec<TodoPage>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
}

/// Page data for the signed-in user
pub async fn page(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<TodosPage>> {
    let todos = state.todos_service.list_todos(user_id).await?;
    Ok(Json(TodosPage { todos }))
}

/// List todos, optionally filtered by `?q=`
pub async fn list_todos(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<TodoPage>>> {
    let todos = match query.q.as_deref().map(str::trim) {
        Some(q) if !q.is_empty() => state.todos_service.search_todos(user_id, q).await?,
        _ => state.todos_service.list_todos(user_id).await?,
    };

    Ok(Json(todos))
}

/// Create a todo
pub async fn create_todo(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiJson(req): ApiJson<CreateTodoRequest>,
) -> Result<(StatusCode, Json<TodoPage>)> {
    let todo = state.todos_service.create_todo(user_id, &req.content).await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

/// Replace a todo's content
pub async fn edit_todo(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<EditTodoRequest>,
) -> Result<StatusCode> {
    state
        .todos_service
        .edit_todo(user_id, id, &req.content)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a todo and its attachment
pub async fn delete_todo(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode> {
    state.todos_service.delete_todo(user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Overwrite a todo's tags
pub async fn set_tags(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<SetTagsRequest>,
) -> Result<StatusCode> {
    state.todos_service.set_tags(user_id, id, &req.tags).await?;
    Ok(StatusCode::NO_CONTENT)
}
