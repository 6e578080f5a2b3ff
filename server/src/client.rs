//! HTTP client for the todo API
//!
//! Keeps the session cookie returned by register/login and sends it with
//! every later request. Implements [`TodoBackend`] so a [`Reconciler`]
//! can run against a remote server.
//!
//! [`Reconciler`]: crate::optimistic::Reconciler

use crate::config::SESSION_COOKIE_NAME;
use crate::database::{
    Attachment, AttachmentResponse, CreateTodoRequest, Credentials, EditTodoRequest,
    SetTagsRequest, TodoPage,
};
use crate::error::{AppError, ErrorBody, Result};
use crate::optimistic::TodoBackend;
use cookie::Cookie;
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response};
use std::sync::Mutex;

pub struct TodoClient {
    http: reqwest::Client,
    base_url: String,
    session: Mutex<Option<String>>,
}

impl TodoClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("tasktrack/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session: Mutex::new(None),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn session_token(&self) -> Option<String> {
        self.session.lock().ok().and_then(|token| token.clone())
    }

    pub fn is_logged_in(&self) -> bool {
        self.session_token().is_some()
    }

    /// Attach the session cookie, if any
    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.session_token() {
            Some(token) => request.header(COOKIE, format!("{}={}", SESSION_COOKIE_NAME, token)),
            None => request,
        }
    }

    /// Remember the session cookie set by `response`.
    ///
    /// An empty value is the server clearing the session.
    fn store_session(&self, response: &Response) {
        let token = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|value| Cookie::parse(value).ok())
            .find(|c| c.name() == SESSION_COOKIE_NAME)
            .map(|c| c.value().to_string());

        if let (Some(token), Ok(mut session)) = (token, self.session.lock()) {
            *session = (!token.is_empty()).then_some(token);
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = self.authorized(request).send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error.message,
            Err(_) => status.canonical_reason().unwrap_or("Request failed").to_string(),
        };

        tracing::debug!("Server answered {}: {}", status, message);

        Err(AppError::Server {
            status: status.as_u16(),
            message,
        })
    }

    async fn authenticate(&self, path: &str, username: &str, password: &str) -> Result<()> {
        let credentials = Credentials {
            username: username.to_string(),
            password: password.to_string(),
        };

        let response = self
            .send(self.http.post(self.url(path)).json(&credentials))
            .await?;
        self.store_session(&response);

        Ok(())
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<()> {
        self.authenticate("/api/register", username, password).await
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        self.authenticate("/api/login", username, password).await
    }

    pub async fn logout(&self) -> Result<()> {
        let response = self.send(self.http.post(self.url("/api/logout"))).await?;
        self.store_session(&response);
        Ok(())
    }

    /// Todos whose content contains `query`, case-insensitively
    pub async fn search_todos(&self, query: &str) -> Result<Vec<TodoPage>> {
        let request = self.http.get(self.url("/api/todos")).query(&[("q", query)]);
        Ok(self.send(request).await?.json().await?)
    }

    /// Download a stored attachment by its public path
    pub async fn fetch_attachment(&self, path: &str) -> Result<Vec<u8>> {
        let response = self.send(self.http.get(self.url(path))).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

impl TodoBackend for TodoClient {
    async fn list_todos(&self) -> Result<Vec<TodoPage>> {
        let response = self.send(self.http.get(self.url("/api/todos"))).await?;
        Ok(response.json().await?)
    }

    async fn create_todo(&self, content: &str) -> Result<TodoPage> {
        let body = CreateTodoRequest {
            content: content.to_string(),
        };
        let response = self
            .send(self.http.post(self.url("/api/todos")).json(&body))
            .await?;
        Ok(response.json().await?)
    }

    async fn edit_todo(&self, id: i64, content: &str) -> Result<()> {
        let body = EditTodoRequest {
            content: content.to_string(),
        };
        self.send(
            self.http
                .patch(self.url(&format!("/api/todos/{}", id)))
                .json(&body),
        )
        .await?;
        Ok(())
    }

    async fn delete_todo(&self, id: i64) -> Result<()> {
        self.send(self.http.delete(self.url(&format!("/api/todos/{}", id))))
            .await?;
        Ok(())
    }

    async fn upload_attachment(
        &self,
        id: i64,
        file_name: &str,
        data: Vec<u8>,
    ) -> Result<Option<Attachment>> {
        let form = Form::new().part("file", Part::bytes(data).file_name(file_name.to_string()));

        let response = self
            .send(
                self.http
                    .put(self.url(&format!("/api/todos/{}/attachment", id)))
                    .multipart(form),
            )
            .await?;

        let body: AttachmentResponse = response.json().await?;
        Ok(body.attachment)
    }

    async fn delete_attachment(&self, id: i64) -> Result<()> {
        self.send(
            self.http
                .delete(self.url(&format!("/api/todos/{}/attachment", id))),
        )
        .await?;
        Ok(())
    }

    async fn set_tags(&self, id: i64, tags: &[String]) -> Result<()> {
        let body = SetTagsRequest {
            tags: tags.to_vec(),
        };
        self.send(
            self.http
                .put(self.url(&format!("/api/todos/{}/tags", id)))
                .json(&body),
        )
        .await?;
        Ok(())
    }
}
