//! Server side of the optimistic loop
//!
//! [`TodoBackend`] is what the reconciler awaits between an optimistic
//! action and its finish or cancel. [`LocalBackend`] calls the services
//! in-process; [`crate::client::TodoClient`] goes over HTTP.

use crate::database::{Attachment, TodoPage};
use crate::error::Result;
use crate::services::{AttachmentsService, TodosService};
use std::future::Future;

/// Server actions available to a signed-in user
pub trait TodoBackend: Send + Sync {
    fn list_todos(&self) -> impl Future<Output = Result<Vec<TodoPage>>> + Send;

    fn create_todo(&self, content: &str) -> impl Future<Output = Result<TodoPage>> + Send;

    fn edit_todo(&self, id: i64, content: &str) -> impl Future<Output = Result<()>> + Send;

    fn delete_todo(&self, id: i64) -> impl Future<Output = Result<()>> + Send;

    fn upload_attachment(
        &self,
        id: i64,
        file_name: &str,
        data: Vec<u8>,
    ) -> impl Future<Output = Result<Option<Attachment>>> + Send;

    fn delete_attachment(&self, id: i64) -> impl Future<Output = Result<()>> + Send;

    fn set_tags(&self, id: i64, tags: &[String]) -> impl Future<Output = Result<()>> + Send;
}

/// Backend bound to one user, calling the services directly
#[derive(Clone)]
pub struct LocalBackend {
    todos: TodosService,
    attachments: AttachmentsService,
    user_id: i64,
}

impl LocalBackend {
    pub fn new(todos: TodosService, attachments: AttachmentsService, user_id: i64) -> Self {
        Self {
            todos,
            attachments,
            user_id,
        }
    }
}

impl TodoBackend for LocalBackend {
    async fn list_todos(&self) -> Result<Vec<TodoPage>> {
        self.todos.list_todos(self.user_id).await
    }

    async fn create_todo(&self, content: &str) -> Result<TodoPage> {
        self.todos.create_todo(self.user_id, content).await
    }

    async fn edit_todo(&self, id: i64, content: &str) -> Result<()> {
        self.todos.edit_todo(self.user_id, id, content).await
    }

    async fn delete_todo(&self, id: i64) -> Result<()> {
        self.todos.delete_todo(self.user_id, id).await
    }

    async fn upload_attachment(
        &self,
        id: i64,
        file_name: &str,
        data: Vec<u8>,
    ) -> Result<Option<Attachment>> {
        self.attachments
            .upsert_attachment(self.user_id, id, file_name, &data)
            .await
    }

    async fn delete_attachment(&self, id: i64) -> Result<()> {
        self.attachments.delete_attachment(self.user_id, id).await
    }

    async fn set_tags(&self, id: i64, tags: &[String]) -> Result<()> {
        self.todos.set_tags(self.user_id, id, tags).await
    }
}
