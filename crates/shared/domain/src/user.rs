//! User domain entity and related types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{MAX_EMAIL_LENGTH, MAX_USERNAME_LENGTH};
use crate::error::{DomainError, DomainResult};

/// User domain entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Data required to insert a user. The store assigns the identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl NewUser {
    /// Build a new user record stamped with the current time.
    ///
    /// Surrounding whitespace is dropped; both fields must remain non-empty
    /// and fit their columns.
    pub fn new(username: &str, email: &str) -> DomainResult<Self> {
        let username = username.trim();
        let email = email.trim();

        if username.is_empty() {
            return Err(DomainError::validation("Username is required"));
        }
        if email.is_empty() {
            return Err(DomainError::validation("Email is required"));
        }
        if username.chars().count() > MAX_USERNAME_LENGTH {
            return Err(DomainError::validation(format!(
                "Username must be at most {} characters",
                MAX_USERNAME_LENGTH
            )));
        }
        if email.chars().count() > MAX_EMAIL_LENGTH {
            return Err(DomainError::validation(format!(
                "Email must be at most {} characters",
                MAX_EMAIL_LENGTH
            )));
        }

        Ok(Self {
            username: username.to_string(),
            email: email.to_string(),
            created_at: Utc::now(),
        })
    }
}

/// User response (safe to return to client)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    /// Unique user identifier
    pub id: i64,
    /// Login name
    pub username: String,
    /// User email address
    pub email: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            created_at: user.created_at,
        }
    }
}
