//! Application state - shared across all handlers.

use std::sync::Arc;

use quill_core::PostService;
use quill_core::ports::{PostRepository, UserRepository};
use quill_infra::database::{self, DbErr};
use quill_infra::{DatabaseConfig, PostgresPostRepository, PostgresUserRepository};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub posts: PostService,
    pub users: Arc<dyn UserRepository>,
}

impl AppState {
    /// Build the state over PostgreSQL when configured, in-memory otherwise.
    pub async fn new(db_config: Option<&DatabaseConfig>) -> Result<Self, DbErr> {
        let state = match db_config {
            Some(config) => {
                let conn = database::connect(config).await?;
                Self::from_repositories(
                    Arc::new(PostgresPostRepository::new(conn.clone())),
                    Arc::new(PostgresUserRepository::new(conn)),
                )
            }
            None => {
                tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
                Self::in_memory()
            }
        };

        tracing::info!("Application state initialized");
        Ok(state)
    }

    /// State over a fresh in-memory store.
    pub fn in_memory() -> Self {
        let (users, posts) = quill_infra::in_memory_repositories();
        Self::from_repositories(Arc::new(posts), Arc::new(users))
    }

    pub fn from_repositories(
        posts: Arc<dyn PostRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            posts: PostService::new(posts, users.clone()),
            users,
        }
    }
}
