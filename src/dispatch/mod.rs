//! Command dispatch
//!
//! Routes a typed request to its single registered handler inside a fresh
//! unit of work:
//!
//! ```text
//! request
//!   -> HandlerRegistry::resolve      (UnregisteredHandler / AmbiguousHandler)
//!   -> UnitOfWork::open              (one storage session per dispatch)
//!   -> Handler::handle(request, &mut scope)
//!   -> Ok: commit, Err: discard then propagate
//! ```
//!
//! The registry is built and validated once at startup and never mutated
//! afterwards, so concurrent dispatches share it without locking.

mod dispatcher;
mod registry;
mod unit_of_work;

use async_trait::async_trait;

use crate::error::AppResult;

pub use dispatcher::Dispatcher;
pub use registry::{HandlerRegistry, HandlerRegistryBuilder};
pub use unit_of_work::UnitOfWork;

/// A dispatchable request and the type it resolves to
pub trait Request: Send + 'static {
    type Response: Send + 'static;
}

/// Business logic for one request type.
///
/// Handlers only see the scope by mutable reference: they can read and
/// write through it but can neither commit, discard, nor keep it.
#[async_trait]
pub trait Handler<R: Request>: Send + Sync + 'static {
    async fn handle(&self, request: R, scope: &mut UnitOfWork) -> AppResult<R::Response>;
}
