//! Storage boundary
//!
//! A [`Store`] hands out [`Session`]s. A session is one isolated transaction
//! over the user table: reads see committed data plus the session's own
//! writes, and writes become visible to others only when the session
//! commits.
//!
//! Dropping a session without calling `commit` or `discard` must behave
//! exactly like `discard`. Units of work rely on this when a dispatch future
//! is cancelled mid-flight.

mod memory;
mod postgres;

use async_trait::async_trait;

use crate::domain::User;
use crate::error::AppResult;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub(crate) use postgres::{EMAIL_INDEX, USERNAME_INDEX};

/// User reads and writes inside one session
#[async_trait]
pub trait UserRepository: Send {
    /// Case-insensitive lookup
    async fn find_by_email(&mut self, email: &str) -> AppResult<Option<User>>;

    async fn find_by_username(&mut self, username: &str) -> AppResult<Option<User>>;

    /// Stage a new user. Uniqueness may be rejected here or at commit.
    async fn create(&mut self, user: &User) -> AppResult<()>;
}

/// One transaction against the store
#[async_trait]
pub trait Session: UserRepository {
    fn repository(&mut self) -> &mut dyn UserRepository;

    /// Make every staged write durable, or none of them.
    ///
    /// A uniqueness violation detected here is reported as
    /// [`AppError::Conflict`](crate::AppError::Conflict).
    async fn commit(self: Box<Self>) -> AppResult<()>;

    /// Drop every staged write
    async fn discard(self: Box<Self>) -> AppResult<()>;
}

/// Source of sessions
#[async_trait]
pub trait Store: Send + Sync {
    async fn begin(&self) -> AppResult<Box<dyn Session>>;
}
