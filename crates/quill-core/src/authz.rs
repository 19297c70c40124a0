//! Authentication and authorship checks for post mutations.
//!
//! Mutating operations call these in order at entry: first
//! [`require_authenticated`], then load the post, then [`ensure_author`].

use uuid::Uuid;

use crate::domain::Post;
use crate::error::DomainError;

/// The identity behind a request, as established by the auth layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requester {
    pub user_id: Uuid,
    pub username: String,
}

impl Requester {
    pub fn new(user_id: Uuid, username: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
        }
    }
}

/// True when `requester` wrote `post`.
pub fn is_author(requester: &Requester, post: &Post) -> bool {
    requester.user_id == post.author_id
}

/// Reject anonymous requests.
pub fn require_authenticated(requester: Option<&Requester>) -> Result<&Requester, DomainError> {
    requester.ok_or(DomainError::Unauthorized)
}

/// Reject requests from anyone but the post's author.
pub fn ensure_author(requester: &Requester, post: &Post) -> Result<(), DomainError> {
    if is_author(requester, post) {
        Ok(())
    } else {
        tracing::warn!(
            post_id = %post.id,
            requester_id = %requester.user_id,
            "Rejected modification by non-author"
        );
        Err(DomainError::Forbidden)
    }
}
