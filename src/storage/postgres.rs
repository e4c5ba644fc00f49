//! Postgres store
//!
//! Each session is one database transaction. The unique indexes on
//! `LOWER(email)` and `username` are the authoritative uniqueness check.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::User;
use crate::error::{AppError, AppResult};
use crate::security::{PasswordHash, Salt};

use super::{Session, Store, UserRepository};

type UserRow = (Uuid, String, String, Vec<u8>, Vec<u8>);

/// Store backed by a Postgres pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> AppResult<Box<dyn Session>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgSession { tx }))
    }
}

/// Dropping the inner transaction without commit rolls it back
struct PgSession {
    tx: Transaction<'static, Postgres>,
}

fn user_from_row((id, email, username, hash, salt): UserRow) -> AppResult<User> {
    let password_hash = PasswordHash::try_from(hash.as_slice())
        .map_err(|e| AppError::Internal(format!("Corrupt credentials for user {}: {}", id, e)))?;
    let password_salt = Salt::try_from(salt.as_slice())
        .map_err(|e| AppError::Internal(format!("Corrupt credentials for user {}: {}", id, e)))?;

    Ok(User {
        id,
        email,
        username,
        password_hash,
        password_salt,
    })
}

/// Unique index on `LOWER(email)`
pub(crate) const EMAIL_INDEX: &str = "users_email_key";
/// Unique index on `username`
pub(crate) const USERNAME_INDEX: &str = "users_username_key";

/// Field guarded by a unique index; `None` for any other constraint
fn guarded_field(constraint: Option<&str>) -> Option<&'static str> {
    match constraint {
        Some(EMAIL_INDEX) => Some("email"),
        Some(USERNAME_INDEX) => Some("username"),
        _ => None,
    }
}

/// Map unique-index violations onto the field they guard
fn map_write_error(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            if let Some(field) = guarded_field(db_err.constraint()) {
                tracing::debug!(constraint = ?db_err.constraint(), "Unique violation");
                return AppError::conflict(field);
            }
        }
    }
    AppError::Database(err)
}

#[async_trait]
impl UserRepository for PgSession {
    async fn find_by_email(&mut self, email: &str) -> AppResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT id, email, username, password_hash, password_salt
            FROM users
            WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email.trim())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(user_from_row).transpose()
    }

    async fn find_by_username(&mut self, username: &str) -> AppResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT id, email, username, password_hash, password_salt
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(user_from_row).transpose()
    }

    async fn create(&mut self, user: &User) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, username, password_hash, password_salt)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.username)
        .bind(user.password_hash.as_bytes())
        .bind(user.password_salt.as_bytes())
        .execute(&mut *self.tx)
        .await
        .map_err(map_write_error)?;

        Ok(())
    }
}

#[async_trait]
impl Session for PgSession {
    fn repository(&mut self) -> &mut dyn UserRepository {
        self
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx.commit().await.map_err(map_write_error)
    }

    async fn discard(self: Box<Self>) -> AppResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
