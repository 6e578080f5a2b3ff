//! Application state and initialization
//!
//! This module manages the central application state and lifecycle.
//! All services are initialized here and made available through AppState.

use crate::config::ServerConfig;
use crate::database::{create_pool, Repository};
use crate::error::Result;
use crate::services::{AttachmentsService, AuthService, TodosService};
use crate::session::SessionManager;
use crate::storage::AttachmentStore;
use axum::extract::FromRef;
use sqlx::SqlitePool;
use std::path::PathBuf;

/// Central application state holding all services
#[derive(Clone, FromRef)]
pub struct AppState {
    pub sessions: SessionManager,
    pub auth_service: AuthService,
    pub todos_service: TodosService,
    pub attachments_service: AttachmentsService,
    pub upload_dir: PathBuf,
}

impl AppState {
    /// Wire services over an already-migrated pool
    pub async fn new(
        pool: SqlitePool,
        upload_dir: PathBuf,
        sessions: SessionManager,
    ) -> Result<Self> {
        let repo = Repository::new(pool);

        let store = AttachmentStore::new(upload_dir.clone());
        store.initialize().await?;

        Ok(Self {
            auth_service: AuthService::new(repo.clone(), sessions.clone()),
            todos_service: TodosService::new(repo.clone(), store.clone()),
            attachments_service: AttachmentsService::new(repo, store),
            sessions,
            upload_dir,
        })
    }
}

/// Application setup - called once on startup
pub async fn setup(config: &ServerConfig) -> Result<AppState> {
    tracing::info!("Initializing application");
    tracing::info!("Database: {:?}", config.database_path);
    tracing::info!("Upload directory: {:?}", config.upload_dir);

    let pool = create_pool(&config.database_path).await?;
    let sessions = SessionManager::new(&config.session_secret, config.cookie_secure)?;

    let state = AppState::new(pool, config.upload_dir.clone(), sessions).await?;

    tracing::info!("Application initialized successfully");

    Ok(state)
}
