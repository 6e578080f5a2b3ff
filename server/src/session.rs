//! Session handling
//!
//! A session is a sealed `{id, iat, exp}` payload stored in the `session`
//! cookie. Nothing is kept server-side: a request is authenticated when
//! its cookie opens under the server key and has not expired.

use crate::config::{LOGIN_ROUTE, SESSION_COOKIE_NAME, SESSION_TTL_DAYS};
use crate::crypto::SealingKey;
use crate::error::{AppError, Result};
use axum::extract::{FromRef, FromRequestParts, Request, State};
use axum::http::header::COOKIE;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use chrono::{Duration, Utc};
use cookie::{Cookie, SameSite};
use serde::{Deserialize, Serialize};

/// Payload sealed into the session cookie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPayload {
    /// User id
    pub id: i64,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expires at (unix seconds)
    pub exp: i64,
}

impl SessionPayload {
    fn new(user_id: i64) -> Self {
        let now = Utc::now();
        Self {
            id: user_id,
            iat: now.timestamp(),
            exp: (now + Duration::days(SESSION_TTL_DAYS)).timestamp(),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Issues and verifies session tokens
#[derive(Clone)]
pub struct SessionManager {
    key: SealingKey,
    secure_cookie: bool,
}

impl SessionManager {
    pub fn new(secret: &str, secure_cookie: bool) -> Result<Self> {
        Ok(Self {
            key: SealingKey::from_secret(secret)?,
            secure_cookie,
        })
    }

    /// Seal a fresh 7-day session for `user_id`
    pub fn issue(&self, user_id: i64) -> Result<String> {
        let payload = serde_json::to_vec(&SessionPayload::new(user_id))?;
        self.key.seal(&payload)
    }

    /// Open a token and check its expiry
    pub fn verify(&self, token: &str) -> Result<SessionPayload> {
        let raw = self.key.open(token)?;
        let payload: SessionPayload = serde_json::from_slice(&raw)?;

        if payload.is_expired() {
            return Err(AppError::Unauthenticated);
        }

        Ok(payload)
    }

    /// Resolve the user id of a request, if it carries a valid session.
    ///
    /// Verification failures are logged and treated as no session.
    pub fn user_id(&self, headers: &HeaderMap) -> Option<i64> {
        let token = session_token(headers)?;

        match self.verify(&token) {
            Ok(payload) => Some(payload.id),
            Err(e) => {
                tracing::warn!("Failed to verify session: {}", e);
                None
            }
        }
    }

    /// `Set-Cookie` value carrying a session token
    pub fn cookie(&self, token: String) -> Cookie<'static> {
        let ttl = cookie::time::Duration::days(SESSION_TTL_DAYS);

        Cookie::build((SESSION_COOKIE_NAME, token))
            .http_only(true)
            .secure(self.secure_cookie)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(ttl)
            .expires(cookie::time::OffsetDateTime::now_utc() + ttl)
            .build()
    }

    /// `Set-Cookie` value that clears the session
    pub fn removal_cookie(&self) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE_NAME, ""))
            .http_only(true)
            .secure(self.secure_cookie)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(cookie::time::Duration::ZERO)
            .expires(cookie::time::OffsetDateTime::UNIX_EPOCH)
            .build()
    }
}

/// Value of the `session` cookie in a request, if any
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| Cookie::split_parse(value))
        .filter_map(|parsed| parsed.ok())
        .find(|c| c.name() == SESSION_COOKIE_NAME)
        .map(|c| c.value().to_string())
}

/// Authenticated caller of an API handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub i64);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    SessionManager: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let sessions = SessionManager::from_ref(state);

        sessions
            .user_id(&parts.headers)
            .map(CurrentUser)
            .ok_or(AppError::Unauthenticated)
    }
}

/// Gate for protected pages: no valid session redirects to the login route
pub async fn require_session(
    State(sessions): State<SessionManager>,
    request: Request,
    next: Next,
) -> Response {
    if sessions.user_id(request.headers()).is_none() {
        tracing::debug!("No session for {}, redirecting", request.uri().path());
        return Redirect::to(LOGIN_ROUTE).into_response();
    }

    next.run(request).await
}
