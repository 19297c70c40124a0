use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Longest username accepted at registration.
pub const USERNAME_MAX_LEN: usize = 150;

/// User entity - an identity that can author posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub date_joined: DateTime<Utc>,
}

impl User {
    /// Create a new user with generated ID and join timestamp.
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            username,
            email,
            password_hash,
            date_joined: Utc::now(),
        }
    }
}

/// Usernames are letters, digits and `@.+-_`, at most 150 characters.
pub fn validate_username(username: &str) -> Result<(), DomainError> {
    if username.is_empty() || username.chars().count() > USERNAME_MAX_LEN {
        return Err(DomainError::Validation(vec![format!(
            "username: must be between 1 and {} characters",
            USERNAME_MAX_LEN
        )]));
    }

    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_');
    if !username.chars().all(allowed) {
        return Err(DomainError::Validation(vec![
            "username: may contain only letters, numbers, and @/./+/-/_ characters".to_string(),
        ]));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_usernames() {
        for name in ["alice", "bob.smith", "c+d@e", "x_y-z", "ünïcode"] {
            assert!(validate_username(name).is_ok(), "{name}");
        }
    }

    #[test]
    fn test_invalid_usernames() {
        let long = "a".repeat(USERNAME_MAX_LEN + 1);
        for name in ["", "has space", "semi;colon", long.as_str()] {
            assert!(validate_username(name).is_err(), "{name}");
        }
    }
}
