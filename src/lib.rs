//! Conduit Library
//!
//! User registration and authentication through a command dispatcher.
//! Every command runs in its own unit of work against the configured store;
//! passwords are stored only as salted Argon2id hashes.

pub mod api;
pub mod config;
pub mod db;
pub mod dispatch;
pub mod domain;
pub mod handlers;
pub mod security;
pub mod storage;

mod error;

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;

pub use config::{Config, ConfigError, StorageKind};
pub use dispatch::{Dispatcher, Handler, HandlerRegistry, Request, UnitOfWork};
pub use domain::{FieldErrors, OperationContext, User, UserProfile};
pub use error::{AppError, AppResult, ErrorResponse};
pub use security::CredentialHasher;
pub use storage::{MemoryStore, PgStore, Store};

/// Wire store, hasher and handlers from configuration
pub async fn bootstrap(config: &Config) -> AppResult<Dispatcher> {
    let store: Arc<dyn Store> = match config.storage {
        StorageKind::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on exit");
            Arc::new(MemoryStore::new())
        }
        StorageKind::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .ok_or(ConfigError::MissingEnv("DATABASE_URL"))?;

            tracing::info!("Connecting to database...");
            let pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .connect(database_url)
                .await?;
            db::verify_connection(&pool).await?;

            if !db::check_schema(&pool).await? {
                return Err(AppError::Internal(
                    "Database schema incomplete. Please run migrations.".to_string(),
                ));
            }
            tracing::info!("Database connected successfully");

            Arc::new(PgStore::new(pool))
        }
    };

    let hasher = CredentialHasher::new(config.hashing)?;
    tracing::info!(params = ?hasher.params(), "Credential hasher ready");
    let registry = handlers::registry(hasher, config.min_password_length)?;
    tracing::info!(handlers = ?registry.request_types(), "Dispatch table ready");

    Ok(Dispatcher::new(registry, store))
}
