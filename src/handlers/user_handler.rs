//! User Creation Handler
//!
//! Validate, check uniqueness, hash, persist, project.

use std::borrow::Cow;

use async_trait::async_trait;
use validator::ValidateEmail;

use crate::dispatch::{Handler, UnitOfWork};
use crate::domain::{FieldErrors, User, UserProfile};
use crate::error::{AppError, AppResult};
use crate::security::CredentialHasher;

use super::CreateUserCommand;

const BLANK: &str = "can't be blank";
const TAKEN: &str = "has already been taken";

/// Handler for user registration
pub struct CreateUserHandler {
    hasher: CredentialHasher,
    min_password_length: usize,
}

impl CreateUserHandler {
    pub fn new(hasher: CredentialHasher, min_password_length: usize) -> Self {
        Self {
            hasher,
            min_password_length,
        }
    }

    /// Every violated field, not just the first
    fn validate(&self, email: &str, username: &str, password: &str) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();

        if email.is_empty() {
            errors.add("email", BLANK);
        } else if !Cow::Borrowed(email).validate_email() {
            errors.add("email", "is invalid");
        }

        if username.is_empty() {
            errors.add("username", BLANK);
        }

        if password.chars().count() < self.min_password_length {
            errors.add(
                "password",
                format!(
                    "is too short (minimum is {} characters)",
                    self.min_password_length
                ),
            );
        }

        errors.into_result()
    }
}

#[async_trait]
impl Handler<CreateUserCommand> for CreateUserHandler {
    async fn handle(
        &self,
        command: CreateUserCommand,
        scope: &mut UnitOfWork,
    ) -> AppResult<UserProfile> {
        let (email, username, password) = command.into_parts();
        let email = email.trim().to_string();
        let username = username.trim().to_string();

        // Validate: cheapest check first, uniqueness is skipped on failure
        self.validate(&email, &username, &password)
            .map_err(AppError::Validation)?;

        // Pre-commit uniqueness; the store re-checks at commit
        let mut conflicts = FieldErrors::new();
        if scope.repository().find_by_email(&email).await?.is_some() {
            conflicts.add("email", TAKEN);
        }
        if scope.repository().find_by_username(&username).await?.is_some() {
            conflicts.add("username", TAKEN);
        }
        conflicts.into_result().map_err(AppError::Conflict)?;

        // Hash; the plaintext is moved into the derivation and dropped there
        let salt = self.hasher.generate_salt();
        let password_hash = self.hasher.derive_blocking(password, salt).await?;

        // Persist
        let user = User::new(email, username, password_hash, salt);
        scope.repository().create(&user).await?;

        tracing::info!(
            user_id = %user.id,
            unit_of_work = %scope.id(),
            "User registration staged"
        );

        Ok(UserProfile::from(user))
    }
}
