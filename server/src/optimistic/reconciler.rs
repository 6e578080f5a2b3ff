//! Drives the optimistic loop against a [`TodoBackend`]
//!
//! Each operation records the values it is about to overwrite, applies the
//! optimistic action, awaits the backend and then applies the finish action
//! or, on any error, the cancel action carrying the recorded values. The
//! error is handed back to the caller. A cancel only restores local state;
//! the server call has already been made.

use super::backend::TodoBackend;
use super::reducer::{reduce, OptimisticTodo, TodoAction};
use crate::database::Attachment;
use crate::error::Result;
use tokio::sync::Mutex;

pub struct Reconciler<B> {
    backend: B,
    state: Mutex<Vec<OptimisticTodo>>,
}

impl<B: TodoBackend> Reconciler<B> {
    pub fn new(backend: B, todos: Vec<OptimisticTodo>) -> Self {
        Self {
            backend,
            state: Mutex::new(todos),
        }
    }

    /// Start from the server's current list
    pub async fn load(backend: B) -> Result<Self> {
        let todos = backend.list_todos().await?;
        let state = todos.into_iter().map(OptimisticTodo::settled).collect();
        Ok(Self::new(backend, state))
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Copy of the current state
    pub async fn snapshot(&self) -> Vec<OptimisticTodo> {
        self.state.lock().await.clone()
    }

    async fn dispatch(&self, action: TodoAction) {
        tracing::debug!("Dispatching {:?}", action);

        let mut state = self.state.lock().await;
        let current = std::mem::take(&mut *state);
        *state = reduce(current, action);
    }

    /// Read a field of the row with `id`
    async fn prior<T>(&self, id: i64, field: impl FnOnce(&OptimisticTodo) -> T) -> Option<T> {
        self.state
            .lock()
            .await
            .iter()
            .find(|row| row.id() == id)
            .map(field)
    }

    /// Apply `finish` if `outcome` succeeded, `cancel` otherwise
    async fn settle<T>(
        &self,
        outcome: Result<T>,
        finish: TodoAction,
        cancel: Option<TodoAction>,
    ) -> Result<T> {
        match outcome {
            Ok(value) => {
                self.dispatch(finish).await;
                Ok(value)
            }
            Err(e) => {
                tracing::warn!("Server action failed, rolling back: {}", e);
                if let Some(cancel) = cancel {
                    self.dispatch(cancel).await;
                }
                Err(e)
            }
        }
    }

    pub async fn create(&self, content: &str) -> Result<()> {
        self.dispatch(TodoAction::OptimisticAdd {
            content: content.to_string(),
        })
        .await;

        match self.backend.create_todo(content).await {
            Ok(todo) => {
                self.dispatch(TodoAction::FinishAdd { todo }).await;
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Server action failed, rolling back: {}", e);
                self.dispatch(TodoAction::CancelAdd).await;
                Err(e)
            }
        }
    }

    pub async fn edit(&self, id: i64, content: &str) -> Result<()> {
        let previous = self.prior(id, |row| row.todo.content.clone()).await;

        self.dispatch(TodoAction::OptimisticEdit {
            id,
            content: content.to_string(),
        })
        .await;

        let outcome = self.backend.edit_todo(id, content).await;
        let cancel = previous.map(|content| TodoAction::CancelEdit { id, content });

        self.settle(outcome, TodoAction::FinishEdit { id }, cancel)
            .await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.dispatch(TodoAction::OptimisticDelete { id }).await;

        let outcome = self.backend.delete_todo(id).await;

        self.settle(
            outcome,
            TodoAction::FinishDelete { id },
            Some(TodoAction::CancelDelete { id }),
        )
        .await
    }

    pub async fn upload(
        &self,
        id: i64,
        file_name: &str,
        data: Vec<u8>,
    ) -> Result<Option<Attachment>> {
        self.dispatch(TodoAction::OptimisticUpload { id }).await;

        match self.backend.upload_attachment(id, file_name, data).await {
            Ok(attachment) => {
                self.dispatch(TodoAction::FinishUpload {
                    id,
                    attachment: attachment.clone(),
                })
                .await;
                Ok(attachment)
            }
            Err(e) => {
                tracing::warn!("Server action failed, rolling back: {}", e);
                self.dispatch(TodoAction::CancelUpload { id }).await;
                Err(e)
            }
        }
    }

    pub async fn delete_attachment(&self, id: i64) -> Result<()> {
        let previous = self.prior(id, |row| row.todo.attachment.clone()).await;

        self.dispatch(TodoAction::OptimisticAssetDelete { id }).await;

        let outcome = self.backend.delete_attachment(id).await;
        let cancel = previous.map(|attachment| TodoAction::CancelAssetDelete { id, attachment });

        self.settle(outcome, TodoAction::FinishAssetDelete { id }, cancel)
            .await
    }

    pub async fn set_tags(&self, id: i64, tags: Vec<String>) -> Result<()> {
        let previous = self.prior(id, |row| row.todo.tags.clone()).await;

        self.dispatch(TodoAction::OptimisticTagEdit {
            id,
            tags: tags.clone(),
        })
        .await;

        let outcome = self.backend.set_tags(id, &tags).await;
        let cancel = previous.map(|tags| TodoAction::CancelTagEdit { id, tags });

        self.settle(outcome, TodoAction::FinishTagEdit { id }, cancel)
            .await
    }

    /// Append `tag` unless the todo already carries it
    pub async fn add_tag(&self, id: i64, tag: &str) -> Result<()> {
        let Some(mut tags) = self.prior(id, |row| row.todo.tags.clone()).await else {
            return Ok(());
        };

        if tags.iter().any(|t| t == tag) {
            return Ok(());
        }

        tags.push(tag.to_string());
        self.set_tags(id, tags).await
    }

    /// Remove the tag at `index`; out-of-range indexes are ignored
    pub async fn remove_tag(&self, id: i64, index: usize) -> Result<()> {
        let Some(mut tags) = self.prior(id, |row| row.todo.tags.clone()).await else {
            return Ok(());
        };

        if index >= tags.len() {
            return Ok(());
        }

        tags.remove(index);
        self.set_tags(id, tags).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{AttachmentKind, TodoPage};
    use crate::error::AppError;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tokio::sync::Notify;

    /// In-memory backend that can be told to fail or to hold calls open
    #[derive(Default)]
    struct FakeBackend {
        fail: AtomicBool,
        gate: Option<Arc<Notify>>,
        tags: std::sync::Mutex<Vec<Vec<String>>>,
    }

    impl FakeBackend {
        async fn answer<T>(&self, value: T) -> Result<T> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(AppError::Server {
                    status: 500,
                    message: "boom".into(),
                });
            }
            Ok(value)
        }
    }

    impl TodoBackend for FakeBackend {
        async fn list_todos(&self) -> Result<Vec<TodoPage>> {
            self.answer(vec![page(1, "first", &["home"])]).await
        }

        async fn create_todo(&self, content: &str) -> Result<TodoPage> {
            self.answer(page(42, content, &[])).await
        }

        async fn edit_todo(&self, _id: i64, _content: &str) -> Result<()> {
            self.answer(()).await
        }

        async fn delete_todo(&self, _id: i64) -> Result<()> {
            self.answer(()).await
        }

        async fn upload_attachment(
            &self,
            id: i64,
            file_name: &str,
            _data: Vec<u8>,
        ) -> Result<Option<Attachment>> {
            self.answer(Some(Attachment {
                path: format!("/user/1-{}.png", id),
                name: file_name.to_string(),
                kind: AttachmentKind::Image,
            }))
            .await
        }

        async fn delete_attachment(&self, _id: i64) -> Result<()> {
            self.answer(()).await
        }

        async fn set_tags(&self, _id: i64, tags: &[String]) -> Result<()> {
            self.tags.lock().unwrap().push(tags.to_vec());
            self.answer(()).await
        }
    }

    fn page(id: i64, content: &str, tags: &[&str]) -> TodoPage {
        TodoPage {
            id,
            content: content.into(),
            attachment: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    async fn loaded() -> Reconciler<FakeBackend> {
        Reconciler::load(FakeBackend::default()).await.unwrap()
    }

    fn fail(reconciler: &Reconciler<FakeBackend>) {
        reconciler.backend().fail.store(true, Ordering::SeqCst);
    }

    #[tokio::test]
    async fn test_create_settles_server_row() {
        let reconciler = loaded().await;

        reconciler.create("Buy milk").await.unwrap();

        let state = reconciler.snapshot().await;
        assert_eq!(state.len(), 2);
        assert_eq!(state[1], OptimisticTodo::settled(page(42, "Buy milk", &[])));
        assert!(state.iter().all(|row| !row.is_ghost()));
    }

    #[tokio::test]
    async fn test_failed_operations_restore_state() {
        let reconciler = loaded().await;
        reconciler.upload(1, "cat.png", b"img".to_vec()).await.unwrap();
        let before = reconciler.snapshot().await;

        fail(&reconciler);

        assert!(reconciler.create("x").await.is_err());
        assert!(reconciler.edit(1, "changed").await.is_err());
        assert!(reconciler.delete(1).await.is_err());
        assert!(reconciler.upload(1, "b.png", Vec::new()).await.is_err());
        assert!(reconciler.delete_attachment(1).await.is_err());
        assert!(reconciler.set_tags(1, vec!["x".into()]).await.is_err());

        assert_eq!(reconciler.snapshot().await, before);
    }

    #[tokio::test]
    async fn test_row_is_pending_while_in_flight() {
        let gate = Arc::new(Notify::new());
        let backend = FakeBackend {
            gate: Some(gate.clone()),
            ..Default::default()
        };
        let reconciler = Arc::new(Reconciler::new(
            backend,
            vec![OptimisticTodo::settled(page(1, "first", &[]))],
        ));

        let task = {
            let reconciler = reconciler.clone();
            tokio::spawn(async move { reconciler.edit(1, "second").await })
        };

        loop {
            let state = reconciler.snapshot().await;
            if state[0].pending {
                assert_eq!(state[0].todo.content, "second");
                break;
            }
            tokio::task::yield_now().await;
        }

        gate.notify_one();
        task.await.unwrap().unwrap();

        let state = reconciler.snapshot().await;
        assert!(!state[0].pending);
        assert_eq!(state[0].todo.content, "second");
    }

    #[tokio::test]
    async fn test_delete_removes_row() {
        let reconciler = loaded().await;

        reconciler.delete(1).await.unwrap();

        assert!(reconciler.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_add_tag_skips_existing() {
        let reconciler = loaded().await;

        reconciler.add_tag(1, "home").await.unwrap();
        assert!(reconciler.backend().tags.lock().unwrap().is_empty());

        reconciler.add_tag(1, "work").await.unwrap();
        assert_eq!(
            reconciler.snapshot().await[0].todo.tags,
            vec!["home".to_string(), "work".to_string()]
        );
    }

    #[tokio::test]
    async fn test_remove_tag_by_index() {
        let reconciler = loaded().await;
        reconciler
            .set_tags(1, vec!["a".into(), "b".into(), "c".into()])
            .await
            .unwrap();

        reconciler.remove_tag(1, 1).await.unwrap();
        reconciler.remove_tag(1, 9).await.unwrap();

        assert_eq!(
            reconciler.snapshot().await[0].todo.tags,
            vec!["a".to_string(), "c".to_string()]
        );
        assert_eq!(reconciler.backend().tags.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_upload_and_delete_attachment() {
        let reconciler = loaded().await;

        let attachment = reconciler.upload(1, "cat.png", b"img".to_vec()).await.unwrap();
        assert_eq!(reconciler.snapshot().await[0].todo.attachment, attachment);

        reconciler.delete_attachment(1).await.unwrap();
        assert!(reconciler.snapshot().await[0].todo.attachment.is_none());
    }
}
