//! User entity and its public projection

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::security::{PasswordHash, Salt};

/// Canonical form used for case-insensitive email comparison
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Persisted identity record.
///
/// Only ever holds derived credentials; the plaintext password never
/// reaches this type.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub password_hash: PasswordHash,
    pub password_salt: Salt,
}

impl User {
    /// Create a user with a freshly assigned id
    pub fn new(email: String, username: String, password_hash: PasswordHash, password_salt: Salt) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            username,
            password_hash,
            password_salt,
        }
    }

    /// Lower-cased email, the key of the unique email index
    pub fn email_key(&self) -> String {
        normalize_email(&self.email)
    }
}

/// What callers get back about a user: never the hash or salt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub username: String,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
        }
    }
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
        }
    }
}
