//! Common test utilities

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use conduit::security::HashingParams;
use conduit::{api, handlers, CredentialHasher, Dispatcher, MemoryStore, PgStore};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Cheap Argon2 parameters so tests don't spend seconds hashing
pub fn test_hasher() -> CredentialHasher {
    CredentialHasher::new(HashingParams {
        memory_kib: 64,
        iterations: 1,
        parallelism: 1,
    })
    .expect("Failed to build hasher")
}

/// Dispatcher over a fresh in-memory store
pub fn memory_dispatcher() -> (Dispatcher, MemoryStore) {
    let store = MemoryStore::new();
    let registry = handlers::registry(test_hasher(), 8).expect("Failed to build registry");
    (Dispatcher::new(registry, Arc::new(store.clone())), store)
}

/// Full HTTP app over a fresh in-memory store
pub fn memory_app() -> (Router, MemoryStore) {
    let (dispatcher, store) = memory_dispatcher();
    (api::app(dispatcher), store)
}

/// Setup test database - apply schema and truncate users
pub async fn setup_test_db() -> PgPool {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for tests");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    conduit::db::run_migrations(&pool)
        .await
        .expect("Failed to apply schema");

    sqlx::query("TRUNCATE TABLE users")
        .execute(&pool)
        .await
        .expect("Failed to clean up DB");

    pool
}

/// Dispatcher over the Postgres store
pub fn pg_dispatcher(pool: PgPool) -> Dispatcher {
    let registry = handlers::registry(test_hasher(), 8).expect("Failed to build registry");
    Dispatcher::new(registry, Arc::new(PgStore::new(pool)))
}
