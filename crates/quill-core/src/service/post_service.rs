//! Post use-case service.
//!
//! # Invariants
//! - A created post's author is always the requester, never client input.
//! - Update and delete check, in order: authenticated, post exists, requester is author.
//! - A rejected request leaves the store untouched.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::authz::{Requester, ensure_author, require_authenticated};
use crate::domain::{Post, PostDraft};
use crate::error::{DomainError, RepoError};
use crate::pagination::{POSTS_PER_PAGE, Page, PageRequest, Paginator};
use crate::ports::{BaseRepository, PostRepository, PostScope, UserRepository};

/// A post together with its author's username, ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthoredPost {
    pub post: Post,
    pub author: String,
}

/// Listing, detail and authorship-guarded mutation of posts.
#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    users: Arc<dyn UserRepository>,
}

impl PostService {
    pub fn new(posts: Arc<dyn PostRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { posts, users }
    }

    /// Every post, newest first.
    pub async fn list_all(&self, page: PageRequest) -> Result<Page<AuthoredPost>, DomainError> {
        let page = self.fetch_page(PostScope::All, page).await?;
        self.attach_authors(page).await
    }

    /// Posts by one user, newest first. Unknown usernames are `NotFound`.
    pub async fn list_by_user(
        &self,
        username: &str,
        page: PageRequest,
    ) -> Result<Page<AuthoredPost>, DomainError> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::not_found("User", username))?;

        let page = self.fetch_page(PostScope::Author(user.id), page).await?;
        Ok(page.map(|post| AuthoredPost {
            post,
            author: user.username.clone(),
        }))
    }

    pub async fn detail(&self, id: Uuid) -> Result<AuthoredPost, DomainError> {
        let post = self.find_post(id).await?;
        let author = self
            .users
            .find_by_id(post.author_id)
            .await?
            .ok_or_else(|| missing_author(&post))?;

        Ok(AuthoredPost {
            post,
            author: author.username,
        })
    }

    /// Blank form for a new post.
    pub fn create_form(&self, requester: Option<&Requester>) -> Result<PostDraft, DomainError> {
        require_authenticated(requester)?;
        Ok(PostDraft::default())
    }

    /// Publish a post written by the requester.
    pub async fn create(
        &self,
        requester: Option<&Requester>,
        draft: PostDraft,
    ) -> Result<Post, DomainError> {
        let requester = require_authenticated(requester)?;
        let draft = draft.clean()?;

        let post = self
            .posts
            .insert(Post::new(requester.user_id, draft))
            .await?;

        tracing::info!(post_id = %post.id, author_id = %post.author_id, "Post created");
        Ok(post)
    }

    /// Current values of a post, for its author to edit.
    pub async fn edit_form(
        &self,
        requester: Option<&Requester>,
        id: Uuid,
    ) -> Result<Post, DomainError> {
        let (_, post) = self.load_owned(requester, id).await?;
        Ok(post)
    }

    /// Replace a post's title and content.
    pub async fn update(
        &self,
        requester: Option<&Requester>,
        id: Uuid,
        draft: PostDraft,
    ) -> Result<Post, DomainError> {
        let (requester, mut post) = self.load_owned(requester, id).await?;
        let draft = draft.clean()?;

        post.apply_edit(requester.user_id, draft);
        let post = self.posts.update(post).await.map_err(|e| match e {
            RepoError::NotFound => DomainError::not_found("Post", id),
            other => other.into(),
        })?;

        tracing::info!(post_id = %post.id, author_id = %post.author_id, "Post updated");
        Ok(post)
    }

    /// The post about to be deleted, for its author to confirm.
    pub async fn delete_confirmation(
        &self,
        requester: Option<&Requester>,
        id: Uuid,
    ) -> Result<Post, DomainError> {
        let (_, post) = self.load_owned(requester, id).await?;
        Ok(post)
    }

    /// Remove a post permanently.
    pub async fn delete(&self, requester: Option<&Requester>, id: Uuid) -> Result<(), DomainError> {
        let (requester, post) = self.load_owned(requester, id).await?;

        self.posts.delete(post.id).await.map_err(|e| match e {
            RepoError::NotFound => DomainError::not_found("Post", id),
            other => other.into(),
        })?;

        tracing::info!(post_id = %id, author_id = %requester.user_id, "Post deleted");
        Ok(())
    }

    async fn find_post(&self, id: Uuid) -> Result<Post, DomainError> {
        self.posts
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Post", id))
    }

    async fn load_owned<'r>(
        &self,
        requester: Option<&'r Requester>,
        id: Uuid,
    ) -> Result<(&'r Requester, Post), DomainError> {
        let requester = require_authenticated(requester)?;
        let post = self.find_post(id).await?;
        ensure_author(requester, &post)?;
        Ok((requester, post))
    }

    async fn fetch_page(
        &self,
        scope: PostScope,
        request: PageRequest,
    ) -> Result<Page<Post>, DomainError> {
        let total = self.posts.count(scope).await?;
        let paginator = Paginator::new(total, POSTS_PER_PAGE);
        let window = paginator.resolve(request)?;

        let items = self
            .posts
            .list_recent(scope, window.offset, window.limit)
            .await?;

        Ok(paginator.page(window, items))
    }

    async fn attach_authors(&self, page: Page<Post>) -> Result<Page<AuthoredPost>, DomainError> {
        let ids: Vec<Uuid> = page
            .items
            .iter()
            .map(|p| p.author_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let names: HashMap<Uuid, String> = self
            .users
            .find_by_ids(&ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u.username))
            .collect();

        let Page {
            items,
            number,
            per_page,
            total_items,
            num_pages,
        } = page;

        let items = items
            .into_iter()
            .map(|post| -> Result<AuthoredPost, DomainError> {
                let author = names
                    .get(&post.author_id)
                    .cloned()
                    .ok_or_else(|| missing_author(&post))?;
                Ok(AuthoredPost { post, author })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page {
            items,
            number,
            per_page,
            total_items,
            num_pages,
        })
    }
}

fn missing_author(post: &Post) -> DomainError {
    RepoError::Query(format!(
        "post {} references missing author {}",
        post.id, post.author_id
    ))
    .into()
}
