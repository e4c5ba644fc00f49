//! Integration tests for the Postgres store
//!
//! Require DATABASE_URL; run with `cargo test -- --ignored`.

use conduit::handlers::{AuthenticateUserCommand, CreateUserCommand};
use conduit::{AppError, Store, User};

mod common;

#[tokio::test]
#[ignore]
async fn test_schema_is_complete_after_migration() {
    let pool = common::setup_test_db().await;

    assert!(conduit::db::check_schema(&pool).await.unwrap());
}

#[tokio::test]
#[ignore]
async fn test_register_and_authenticate() {
    let pool = common::setup_test_db().await;
    let dispatcher = common::pg_dispatcher(pool.clone());

    let created = dispatcher
        .dispatch(CreateUserCommand::new("jake@jake.jake", "jake", "jakejake"))
        .await
        .unwrap();

    let stored: (String, Vec<u8>, Vec<u8>) =
        sqlx::query_as("SELECT username, password_hash, password_salt FROM users WHERE id = $1")
            .bind(created.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(stored.0, "jake");
    assert_eq!(stored.1.len(), conduit::security::HASH_LEN);
    assert_eq!(stored.2.len(), conduit::security::SALT_LEN);

    let profile = dispatcher
        .dispatch(AuthenticateUserCommand::new("JAKE@jake.jake", "jakejake"))
        .await
        .unwrap();
    assert_eq!(profile, created);
}

#[tokio::test]
#[ignore]
async fn test_duplicate_email_conflicts() {
    let pool = common::setup_test_db().await;
    let dispatcher = common::pg_dispatcher(pool.clone());

    dispatcher
        .dispatch(CreateUserCommand::new("jake@jake.jake", "jake", "jakejake"))
        .await
        .unwrap();

    let err = dispatcher
        .dispatch(CreateUserCommand::new("Jake@Jake.jake", "jacob", "jakejake"))
        .await
        .unwrap_err();
    assert!(matches!(&err, AppError::Conflict(f) if f.contains("email")));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
#[ignore]
async fn test_concurrent_registrations_one_wins() {
    let pool = common::setup_test_db().await;
    let dispatcher = common::pg_dispatcher(pool.clone());

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move {
                dispatcher
                    .dispatch(CreateUserCommand::new(
                        "race@x.io",
                        format!("racer{}", i),
                        "secret123",
                    ))
                    .await
            })
        })
        .collect();

    let results = futures::future::join_all(handles).await;
    let created = results
        .iter()
        .filter(|r| matches!(r, Ok(Ok(_))))
        .count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Ok(Err(AppError::Conflict(_)))))
        .count();

    assert_eq!(created, 1);
    assert_eq!(conflicts, 3);
}

#[tokio::test]
#[ignore]
async fn test_primary_key_collision_is_not_a_conflict() {
    let pool = common::setup_test_db().await;
    let store = conduit::PgStore::new(pool);
    let hasher = common::test_hasher();

    let salt = hasher.generate_salt();
    let hash = hasher.derive("jakejake", &salt).unwrap();
    let first = User::new("a@x.io".into(), "a".into(), hash, salt);
    let mut second = User::new("b@x.io".into(), "b".into(), hash, salt);
    second.id = first.id;

    let mut session = store.begin().await.unwrap();
    session.repository().create(&first).await.unwrap();
    session.commit().await.unwrap();

    let mut session = store.begin().await.unwrap();
    let err = session.repository().create(&second).await.unwrap_err();

    assert!(matches!(err, AppError::Database(_)), "got: {:?}", err);
}
