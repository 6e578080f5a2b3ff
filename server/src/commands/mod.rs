//! HTTP commands exposed to the front end
//!
//! One handler per server action, grouped into submodules:
//! - `auth`: register, login, logout
//! - `todos`: page data, list, create, edit, delete, tags
//! - `attachments`: upload and delete of a todo's file
//!
//! All handlers follow the same pattern:
//! - Resolve the caller with [`CurrentUser`](crate::session::CurrentUser)
//! - Return `Result<T, AppError>`, rendered as `{"error": {"message": ..}}` on failure
//!
//! # Routes
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | GET | / | `todos::page` (redirects to /login without a session) |
//! | GET | /login | `login_page` |
//! | GET | /health | `health_check` |
//! | POST | /api/register | `auth::register` |
//! | POST | /api/login | `auth::login` |
//! | POST | /api/logout | `auth::logout` |
//! | GET, POST | /api/todos | `todos::list_todos`, `todos::create_todo` |
//! | PATCH, DELETE | /api/todos/{id} | `todos::edit_todo`, `todos::delete_todo` |
//! | PUT | /api/todos/{id}/tags | `todos::set_tags` |
//! | PUT | /api/todos/{id}/attachment | `attachments::upload_attachment` |
//! | DELETE | /api/todos/{id}/attachment | `attachments::delete_attachment` |
//! | GET | /user/{file} | uploaded files |

pub mod attachments;
pub mod auth;
pub mod todos;

use crate::app::AppState;
use crate::config::{ATTACHMENT_URL_PREFIX, MAX_ATTACHMENT_BYTES};
use crate::error::AppError;
use crate::session::require_session;
use axum::extract::{DefaultBodyLimit, FromRequest, FromRequestParts};
use axum::routing::{get, patch, post, put};
use axum::{middleware, Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::services::ServeDir;

/// Room for multipart boundaries and headers on top of the file itself
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// JSON body whose rejections render as [`AppError`]
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Path parameters whose rejections render as [`AppError`]
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// Success body of actions that return no data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataBody<T> {
    pub data: T,
}

/// Liveness payload of `/health`: a fixed status and the crate version
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Public landing for visitors without a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginPage {
    pub message: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn login_page() -> Json<LoginPage> {
    Json(LoginPage {
        message: "Log in or register to see your todos".to_string(),
    })
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/", get(todos::page))
        .route_layer(middleware::from_fn_with_state(
            state.sessions.clone(),
            require_session,
        ));

    let api = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/todos", get(todos::list_todos).post(todos::create_todo))
        .route(
            "/todos/{id}",
            patch(todos::edit_todo).delete(todos::delete_todo),
        )
        .route("/todos/{id}/tags", put(todos::set_tags))
        .route(
            "/todos/{id}/attachment",
            put(attachments::upload_attachment).delete(attachments::delete_attachment),
        )
        .layer(DefaultBodyLimit::max(
            MAX_ATTACHMENT_BYTES + MULTIPART_OVERHEAD_BYTES,
        ));

    let uploads = ServeDir::new(&state.upload_dir);

    Router::new()
        .merge(protected)
        .route("/login", get(login_page))
        .route("/health", get(health_check))
        .nest("/api", api)
        .nest_service(ATTACHMENT_URL_PREFIX, uploads)
        .with_state(state)
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use axum::http::header::LOCATION;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_health_check() {
        let app = test_app().await;

        let response = app.send(empty_request("GET", "/health", None)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_protected_page_redirects_without_session() {
        let app = test_app().await;

        let response = app.send(empty_request("GET", "/", None)).await;

        assert!(response.status().is_redirection());
        assert_eq!(response.headers()[LOCATION], "/login");
    }

    #[tokio::test]
    async fn test_protected_page_redirects_with_forged_session() {
        let app = test_app().await;

        let response = app
            .send(empty_request("GET", "/", Some("session=forged-token")))
            .await;

        assert!(response.status().is_redirection());
    }

    #[tokio::test]
    async fn test_protected_page_with_session() {
        let app = test_app().await;
        let cookie = app.login_as("alice").await;

        let response = app.send(empty_request("GET", "/", Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["todos"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_login_page_is_public() {
        let app = test_app().await;

        let response = app.send(empty_request("GET", "/login", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
