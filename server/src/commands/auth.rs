//! Account commands
//!
//! Register, login and logout. A successful register or login answers
//! `{"data": "Success"}` and sets the session cookie.

use super::{ApiJson, DataBody};
use crate::app::AppState;
use crate::database::Credentials;
use crate::error::Result;
use crate::services::IssuedSession;
use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::response::{AppendHeaders, IntoResponse};
use axum::Json;

const SUCCESS: &str = "Success";

fn session_response(state: &AppState, issued: IssuedSession) -> impl IntoResponse {
    let cookie = state.sessions.cookie(issued.token);

    (
        AppendHeaders([(SET_COOKIE, cookie.to_string())]),
        Json(DataBody { data: SUCCESS }),
    )
}

/// Create an account and start a session for it
pub async fn register(
    State(state): State<AppState>,
    ApiJson(credentials): ApiJson<Credentials>,
) -> Result<impl IntoResponse> {
    let issued = state.auth_service.register(credentials).await?;
    Ok(session_response(&state, issued))
}

/// Start a session for an existing account
pub async fn login(
    State(state): State<AppState>,
    ApiJson(credentials): ApiJson<Credentials>,
) -> Result<impl IntoResponse> {
    let issued = state.auth_service.login(credentials).await?;
    Ok(session_response(&state, issued))
}

/// Clear the session cookie
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    let cookie = state.sessions.removal_cookie();

    (
        AppendHeaders([(SET_COOKIE, cookie.to_string())]),
        Json(DataBody { data: SUCCESS }),
    )
}
