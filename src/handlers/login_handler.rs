//! Authentication Handler
//!
//! Checks an email/password pair against the stored salted hash. Issues no
//! session or token; callers get the user's profile back.

use async_trait::async_trait;

use crate::dispatch::{Handler, UnitOfWork};
use crate::domain::{FieldErrors, UserProfile};
use crate::error::{AppError, AppResult};
use crate::security::CredentialHasher;

use super::AuthenticateUserCommand;

/// Handler for credential checks
pub struct AuthenticateUserHandler {
    hasher: CredentialHasher,
}

impl AuthenticateUserHandler {
    pub fn new(hasher: CredentialHasher) -> Self {
        Self { hasher }
    }
}

#[async_trait]
impl Handler<AuthenticateUserCommand> for AuthenticateUserHandler {
    async fn handle(
        &self,
        command: AuthenticateUserCommand,
        scope: &mut UnitOfWork,
    ) -> AppResult<UserProfile> {
        let (email, password) = command.into_parts();
        let email = email.trim().to_string();

        let mut errors = FieldErrors::new();
        if email.is_empty() {
            errors.add("email", "can't be blank");
        }
        if password.is_empty() {
            errors.add("password", "can't be blank");
        }
        errors.into_result().map_err(AppError::Validation)?;

        let Some(user) = scope.repository().find_by_email(&email).await? else {
            // Burn a derivation anyway so unknown emails cost the same as wrong passwords
            let salt = self.hasher.generate_salt();
            self.hasher.derive_blocking(password, salt).await?;
            return Err(AppError::InvalidCredentials);
        };

        let matches = self
            .hasher
            .verify_blocking(password, user.password_salt, user.password_hash)
            .await?;

        if !matches {
            tracing::debug!(user_id = %user.id, "Password mismatch");
            return Err(AppError::InvalidCredentials);
        }

        Ok(UserProfile::from(user))
    }
}
