use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Longest title a post may carry, in characters.
pub const TITLE_MAX_LEN: usize = 100;

/// Post entity - a blog entry owned by its author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    pub date_posted: DateTime<Utc>,
}

impl Post {
    /// Create a new post stamped with the current time.
    pub fn new(author_id: Uuid, draft: PostDraft) -> Self {
        Self {
            id: Uuid::new_v4(),
            author_id,
            title: draft.title,
            content: draft.content,
            date_posted: Utc::now(),
        }
    }

    /// Replace the editable fields and pin the author to `editor`.
    ///
    /// Callers must have checked authorship first; `date_posted` is left untouched.
    pub fn apply_edit(&mut self, editor: Uuid, draft: PostDraft) {
        self.title = draft.title;
        self.content = draft.content;
        self.author_id = editor;
    }
}

/// The fields a client is allowed to submit for a post.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
}

impl PostDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }

    /// Trim surrounding whitespace and check field constraints.
    ///
    /// Every failing field is reported, not only the first.
    pub fn clean(self) -> Result<Self, DomainError> {
        let title = self.title.trim().to_string();
        let content = self.content.trim().to_string();
        let mut errors = Vec::new();

        if title.is_empty() {
            errors.push("title: this field is required".to_string());
        } else if title.chars().count() > TITLE_MAX_LEN {
            errors.push(format!(
                "title: ensure this value has at most {} characters",
                TITLE_MAX_LEN
            ));
        }
        if content.is_empty() {
            errors.push("content: this field is required".to_string());
        }

        if errors.is_empty() {
            Ok(Self { title, content })
        } else {
            Err(DomainError::Validation(errors))
        }
    }
}
