//! Command definitions
//!
//! Commands represent intentions to change or query the system state. They
//! are consumed by value on dispatch and carry plaintext passwords, so
//! their `Debug` output redacts them.

use crate::dispatch::Request;
use crate::domain::UserProfile;

// =========================================================================
// CreateUserCommand
// =========================================================================

/// Command to register a new user
#[derive(Clone)]
pub struct CreateUserCommand {
    email: String,
    username: String,
    password: String,
}

impl CreateUserCommand {
    pub fn new(
        email: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    pub(crate) fn into_parts(self) -> (String, String, String) {
        (self.email, self.username, self.password)
    }
}

impl std::fmt::Debug for CreateUserCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateUserCommand")
            .field("email", &self.email)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl Request for CreateUserCommand {
    type Response = UserProfile;
}

// =========================================================================
// AuthenticateUserCommand
// =========================================================================

/// Command to check a user's credentials
#[derive(Clone)]
pub struct AuthenticateUserCommand {
    email: String,
    password: String,
}

impl AuthenticateUserCommand {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub(crate) fn into_parts(self) -> (String, String) {
        (self.email, self.password)
    }
}

impl std::fmt::Debug for AuthenticateUserCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticateUserCommand")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl Request for AuthenticateUserCommand {
    type Response = UserProfile;
}
