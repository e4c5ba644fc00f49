//! Domain module
//!
//! Core domain types that are independent of infrastructure.

pub mod context;
pub mod error;
pub mod user;

pub use context::OperationContext;
pub use error::FieldErrors;
pub use user::{normalize_email, User, UserProfile};
