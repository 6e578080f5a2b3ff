//! Todos service
//!
//! Owner-scoped todo lifecycle. Mutations of a todo the caller does not
//! own match zero rows and return normally.

use crate::database::{Repository, TodoPage};
use crate::error::Result;
use crate::storage::AttachmentStore;

/// Service for managing todos
#[derive(Clone)]
pub struct TodosService {
    repo: Repository,
    store: AttachmentStore,
}

impl TodosService {
    pub fn new(repo: Repository, store: AttachmentStore) -> Self {
        Self { repo, store }
    }

    /// Todos of a user, oldest first
    pub async fn list_todos(&self, user_id: i64) -> Result<Vec<TodoPage>> {
        let todos = self.repo.list_todos(user_id).await?;
        Ok(todos.into_iter().map(TodoPage::from).collect())
    }

    /// Create a new todo
    pub async fn create_todo(&self, user_id: i64, content: &str) -> Result<TodoPage> {
        tracing::info!("Creating todo for user: {}", user_id);

        let todo = self.repo.create_todo(user_id, content).await?;

        tracing::info!("Todo created successfully: {}", todo.id);

        Ok(todo.into())
    }

    /// Replace the content of a todo
    pub async fn edit_todo(&self, user_id: i64, id: i64, content: &str) -> Result<()> {
        tracing::debug!("Editing todo: {}", id);

        if self.repo.update_content(user_id, id, content).await? == 0 {
            tracing::debug!("Edit matched no todo: {} (user {})", id, user_id);
        }

        Ok(())
    }

    /// Delete a todo and its attachment file.
    ///
    /// The file goes first, then the row; the two steps are not atomic.
    pub async fn delete_todo(&self, user_id: i64, id: i64) -> Result<()> {
        tracing::info!("Deleting todo: {}", id);

        self.store.remove_matching(user_id, id).await?;
        let rows = self.repo.delete_todo(user_id, id).await?;

        tracing::info!("Todo deleted: {} ({} rows)", id, rows);

        Ok(())
    }

    /// Overwrite the tag list of a todo
    pub async fn set_tags(&self, user_id: i64, id: i64, tags: &[String]) -> Result<()> {
        tracing::debug!("Setting tags on todo: {}", id);

        self.repo.set_tags(user_id, id, tags).await?;

        Ok(())
    }

    /// Case-insensitive search over a user's todo contents
    pub async fn search_todos(&self, user_id: i64, query: &str) -> Result<Vec<TodoPage>> {
        let query_lower = query.to_lowercase();

        let filtered = self
            .list_todos(user_id)
            .await?
            .into_iter()
            .filter(|todo| todo.content.to_lowercase().contains(&query_lower))
            .collect();

        Ok(filtered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::create_memory_pool;
    use tempfile::TempDir;

    async fn create_test_service() -> (TodosService, Repository, TempDir) {
        let repo = Repository::new(create_memory_pool().await.unwrap());

        let temp_dir = TempDir::new().unwrap();
        let store = AttachmentStore::new(temp_dir.path().join("user"));
        store.initialize().await.unwrap();

        (TodosService::new(repo.clone(), store), repo, temp_dir)
    }

    async fn user_id(repo: &Repository, name: &str) -> i64 {
        repo.create_user(name, "hash").await.unwrap().id
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let (service, repo, _temp) = create_test_service().await;
        let alice = user_id(&repo, "alice").await;

        let todo = service.create_todo(alice, "Buy milk").await.unwrap();
        assert_eq!(todo.content, "Buy milk");
        assert!(todo.tags.is_empty());
        assert!(todo.attachment.is_none());

        let todos = service.list_todos(alice).await.unwrap();
        assert_eq!(todos, vec![todo]);
    }

    #[tokio::test]
    async fn test_edit_foreign_todo_is_noop() {
        let (service, repo, _temp) = create_test_service().await;
        let alice = user_id(&repo, "alice").await;
        let bob = user_id(&repo, "bob").await;

        let todo = service.create_todo(alice, "original").await.unwrap();

        service.edit_todo(bob, todo.id, "changed").await.unwrap();
        service.delete_todo(bob, todo.id).await.unwrap();

        let todos = service.list_todos(alice).await.unwrap();
        assert_eq!(todos.len(), 1);
        assert_eq!(todos[0].content, "original");
    }

    #[tokio::test]
    async fn test_delete_removes_row_and_file() {
        let (service, repo, _temp) = create_test_service().await;
        let alice = user_id(&repo, "alice").await;
        let todo = service.create_todo(alice, "with file").await.unwrap();

        service
            .store
            .write(alice, todo.id, Some("txt"), b"data")
            .await
            .unwrap();

        service.delete_todo(alice, todo.id).await.unwrap();

        assert!(service.list_todos(alice).await.unwrap().is_empty());
        assert!(service.store.files_for(alice, todo.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_todos() {
        let (service, repo, _temp) = create_test_service().await;
        let alice = user_id(&repo, "alice").await;

        for content in ["Apple", "Banana", "Cherry"] {
            service.create_todo(alice, content).await.unwrap();
        }

        let results = service.search_todos(alice, "AN").await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].content, "Banana");
    }

    #[tokio::test]
    async fn test_set_tags_overwrites() {
        let (service, repo, _temp) = create_test_service().await;
        let alice = user_id(&repo, "alice").await;
        let todo = service.create_todo(alice, "tagged").await.unwrap();

        service
            .set_tags(alice, todo.id, &["a".into(), "b".into()])
            .await
            .unwrap();
        service.set_tags(alice, todo.id, &["c".into()]).await.unwrap();

        let todos = service.list_todos(alice).await.unwrap();
        assert_eq!(todos[0].tags, vec!["c".to_string()]);
    }
}
