//! Database module
//!
//! Connection checks and schema bootstrap for the Postgres store.

use sqlx::{Executor, PgPool};

use crate::storage::{EMAIL_INDEX, USERNAME_INDEX};

/// Schema for the users table
pub const USERS_MIGRATION: &str = include_str!("../migrations/0001_create_users.sql");

/// Verify database connectivity
pub async fn verify_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply the bundled migration. Idempotent.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    pool.execute(USERS_MIGRATION).await?;
    tracing::info!("Users schema applied");
    Ok(())
}

/// Check that the users table and its unique indexes exist
pub async fn check_schema(pool: &PgPool) -> Result<bool, sqlx::Error> {
    let table_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM information_schema.tables
            WHERE table_schema = 'public' AND table_name = 'users'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        tracing::error!("Required table 'users' does not exist");
        return Ok(false);
    }

    for index in [EMAIL_INDEX, USERNAME_INDEX] {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM pg_indexes WHERE schemaname = 'public' AND indexname = $1)",
        )
        .bind(index)
        .fetch_one(pool)
        .await?;

        if !exists {
            tracing::error!("Required unique index '{}' does not exist", index);
            return Ok(false);
        }
    }

    Ok(true)
}
