//! Data Transfer Objects - request/response types for the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to register a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Request to login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response containing a user's public information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub date_joined: DateTime<Utc>,
}

/// Response containing authentication tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// The editable fields of a post.
///
/// Only `title` and `content` are read; an `author` or any other field in
/// the submitted body is ignored. Missing fields arrive as empty strings so
/// that validation can report them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

/// A post as rendered to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub date_posted: DateTime<Utc>,
    pub author_id: Uuid,
    pub author: String,
}

/// Navigation data for a paginated listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageMeta {
    pub number: u64,
    pub per_page: u64,
    pub total_items: u64,
    pub num_pages: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

/// One page of posts, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostListResponse {
    pub posts: Vec<PostResponse>,
    pub page: PageMeta,
}

/// Context for the create/edit form. `post_id` is set when editing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostFormResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_id: Option<Uuid>,
    pub form: PostForm,
}

/// Context for the delete confirmation page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteConfirmationResponse {
    pub post: PostResponse,
}

/// Static page context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AboutResponse {
    pub title: String,
}
