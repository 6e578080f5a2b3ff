//! Repository layer for database operations
//!
//! Every todo query is scoped by owner: updates and deletes filter on
//! `id = ? AND user_id = ?` and report the affected row count, so a todo
//! that belongs to someone else behaves exactly like one that does not
//! exist.

use super::models::*;
use crate::error::{AppError, Result};
use chrono::Utc;
use sqlx::types::Json;
use sqlx::SqlitePool;

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ===== Users =====

    /// Insert a user; a duplicate username maps to [`AppError::UsernameTaken`]
    pub async fn create_user(&self, username: &str, password_hash: &str) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password)
            VALUES (?, ?)
            RETURNING *
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::UsernameTaken(username.to_string())
            }
            other => AppError::Database(other),
        })?;

        tracing::debug!("Created user: {} ({})", user.id, user.username);
        Ok(user)
    }

    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    // ===== Todos =====

    /// Create a todo owned by `user_id`
    pub async fn create_todo(&self, user_id: i64, content: &str) -> Result<Todo> {
        let todo = sqlx::query_as::<_, Todo>(
            r#"
            INSERT INTO todos (user_id, content, created_at)
            VALUES (?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(content)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created todo: {} for user: {}", todo.id, user_id);
        Ok(todo)
    }

    /// All todos of a user, oldest first
    pub async fn list_todos(&self, user_id: i64) -> Result<Vec<Todo>> {
        let todos = sqlx::query_as::<_, Todo>(
            r#"
            SELECT * FROM todos
            WHERE user_id = ?
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(todos)
    }

    pub async fn get_todo(&self, user_id: i64, id: i64) -> Result<Option<Todo>> {
        let todo = sqlx::query_as::<_, Todo>("SELECT * FROM todos WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(todo)
    }

    /// Replace a todo's content, returning the number of rows matched
    pub async fn update_content(&self, user_id: i64, id: i64, content: &str) -> Result<u64> {
        let rows = sqlx::query("UPDATE todos SET content = ? WHERE id = ? AND user_id = ?")
            .bind(content)
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::debug!("Updated content of todo: {} ({} rows)", id, rows);
        Ok(rows)
    }

    pub async fn delete_todo(&self, user_id: i64, id: i64) -> Result<u64> {
        let rows = sqlx::query("DELETE FROM todos WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::debug!("Deleted todo: {} ({} rows)", id, rows);
        Ok(rows)
    }

    /// Store attachment metadata; `None` when no owned row matched
    pub async fn set_attachment(
        &self,
        user_id: i64,
        id: i64,
        attachment: &Attachment,
    ) -> Result<Option<Todo>> {
        let todo = sqlx::query_as::<_, Todo>(
            r#"
            UPDATE todos
            SET attachment = ?, attachment_name = ?, attachment_enum = ?
            WHERE id = ? AND user_id = ?
            RETURNING *
            "#,
        )
        .bind(&attachment.path)
        .bind(&attachment.name)
        .bind(attachment.kind)
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        tracing::debug!("Set attachment of todo: {} -> {}", id, attachment.path);
        Ok(todo)
    }

    pub async fn clear_attachment(&self, user_id: i64, id: i64) -> Result<u64> {
        let rows = sqlx::query(
            r#"
            UPDATE todos
            SET attachment = NULL, attachment_name = NULL, attachment_enum = NULL
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        tracing::debug!("Cleared attachment of todo: {} ({} rows)", id, rows);
        Ok(rows)
    }

    /// Overwrite the tag list; no merging with the stored value
    pub async fn set_tags(&self, user_id: i64, id: i64, tags: &[String]) -> Result<u64> {
        let rows = sqlx::query("UPDATE todos SET tags = ? WHERE id = ? AND user_id = ?")
            .bind(Json(tags))
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::debug!("Set {} tags on todo: {} ({} rows)", tags.len(), id, rows);
        Ok(rows)
    }
}
