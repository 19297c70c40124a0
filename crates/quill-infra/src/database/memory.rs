//! In-memory repositories - used when no database is configured, and in tests.
//!
//! Users and posts share one store so that the post author reference behaves
//! like the database foreign key: inserting a post for an unknown author fails,
//! and deleting a user removes their posts.
//! Note: Data is lost on process restart.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use quill_core::domain::{Post, User};
use quill_core::error::RepoError;
use quill_core::ports::{BaseRepository, PostRepository, PostScope, UserRepository};

#[derive(Default)]
struct Store {
    users: HashMap<Uuid, User>,
    posts: HashMap<Uuid, Post>,
}

/// Build a user and a post repository over one shared store.
pub fn in_memory_repositories() -> (InMemoryUserRepository, InMemoryPostRepository) {
    let store = Arc::new(RwLock::new(Store::default()));
    (
        InMemoryUserRepository {
            store: store.clone(),
        },
        InMemoryPostRepository { store },
    )
}

/// User repository backed by a `HashMap`.
#[derive(Clone)]
pub struct InMemoryUserRepository {
    store: Arc<RwLock<Store>>,
}

/// Post repository backed by a `HashMap`.
#[derive(Clone)]
pub struct InMemoryPostRepository {
    store: Arc<RwLock<Store>>,
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.store.read().await.users.get(&id).cloned())
    }

    async fn insert(&self, user: User) -> Result<User, RepoError> {
        let mut store = self.store.write().await;

        if store.users.contains_key(&user.id) {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }
        if store.users.values().any(|u| u.username == user.username) {
            return Err(RepoError::Constraint(format!(
                "username {} is taken",
                user.username
            )));
        }

        store.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, RepoError> {
        let mut store = self.store.write().await;

        if store
            .users
            .values()
            .any(|u| u.username == user.username && u.id != user.id)
        {
            return Err(RepoError::Constraint(format!(
                "username {} is taken",
                user.username
            )));
        }

        match store.users.get_mut(&user.id) {
            Some(existing) => {
                *existing = user.clone();
                Ok(user)
            }
            None => Err(RepoError::NotFound),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut store = self.store.write().await;

        store.users.remove(&id).ok_or(RepoError::NotFound)?;
        store.posts.retain(|_, p| p.author_id != id);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let store = self.store.read().await;
        Ok(store
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, RepoError> {
        let store = self.store.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| store.users.get(id))
            .cloned()
            .collect())
    }
}

impl InMemoryPostRepository {
    fn in_scope(scope: PostScope, post: &Post) -> bool {
        match scope {
            PostScope::All => true,
            PostScope::Author(author_id) => post.author_id == author_id,
        }
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.store.read().await.posts.get(&id).cloned())
    }

    async fn insert(&self, post: Post) -> Result<Post, RepoError> {
        let mut store = self.store.write().await;

        if !store.users.contains_key(&post.author_id) {
            return Err(RepoError::Constraint(format!(
                "author {} does not exist",
                post.author_id
            )));
        }
        if store.posts.contains_key(&post.id) {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }

        store.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        let mut store = self.store.write().await;

        if !store.users.contains_key(&post.author_id) {
            return Err(RepoError::Constraint(format!(
                "author {} does not exist",
                post.author_id
            )));
        }

        match store.posts.get_mut(&post.id) {
            Some(existing) => {
                *existing = post.clone();
                Ok(post)
            }
            None => Err(RepoError::NotFound),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut store = self.store.write().await;
        store.posts.remove(&id).map(|_| ()).ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn count(&self, scope: PostScope) -> Result<u64, RepoError> {
        let store = self.store.read().await;
        Ok(store
            .posts
            .values()
            .filter(|p| Self::in_scope(scope, p))
            .count() as u64)
    }

    async fn list_recent(
        &self,
        scope: PostScope,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Post>, RepoError> {
        let store = self.store.read().await;

        let mut posts: Vec<&Post> = store
            .posts
            .values()
            .filter(|p| Self::in_scope(scope, p))
            .collect();
        posts.sort_by(|a, b| b.date_posted.cmp(&a.date_posted).then(b.id.cmp(&a.id)));

        Ok(posts
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }
}
