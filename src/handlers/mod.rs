//! Command Handlers module
//!
//! Handlers run inside the unit of work the dispatcher opens for them.
//! [`registry`] is the single place where request types are bound to
//! handlers.

mod commands;
mod login_handler;
mod user_handler;


pub use commands::*;
pub use login_handler::AuthenticateUserHandler;
pub use user_handler::CreateUserHandler;

use crate::dispatch::HandlerRegistry;
use crate::error::AppResult;
use crate::security::CredentialHasher;

/// Build the application's dispatch table
pub fn registry(hasher: CredentialHasher, min_password_length: usize) -> AppResult<HandlerRegistry> {
    HandlerRegistry::builder()
        .register::<CreateUserCommand, _>(CreateUserHandler::new(
            hasher.clone(),
            min_password_length,
        ))
        .register::<AuthenticateUserCommand, _>(AuthenticateUserHandler::new(hasher))
        .build()
}
