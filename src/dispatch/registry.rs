//! Handler Registry
//!
//! Immutable map from request type to its single handler.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{AppError, AppResult};

use super::{Handler, Request};

/// Type-erased `Arc<dyn Handler<R>>`
struct Registration {
    request_type: &'static str,
    handler: Box<dyn Any + Send + Sync>,
}

/// Collects registrations at startup; [`build`](Self::build) validates them
#[derive(Default)]
pub struct HandlerRegistryBuilder {
    registrations: Vec<(TypeId, Registration)>,
}

impl HandlerRegistryBuilder {
    /// Register `handler` for request type `R`
    pub fn register<R, H>(mut self, handler: H) -> Self
    where
        R: Request,
        H: Handler<R>,
    {
        let handler: Arc<dyn Handler<R>> = Arc::new(handler);
        self.registrations.push((
            TypeId::of::<R>(),
            Registration {
                request_type: type_name::<R>(),
                handler: Box::new(handler),
            },
        ));
        self
    }

    /// Freeze the table. A request type registered twice is rejected here,
    /// before the process serves anything.
    pub fn build(self) -> AppResult<HandlerRegistry> {
        let mut handlers: HashMap<TypeId, Registration> =
            HashMap::with_capacity(self.registrations.len());

        for (type_id, registration) in self.registrations {
            if handlers.contains_key(&type_id) {
                return Err(AppError::AmbiguousHandler {
                    request_type: registration.request_type,
                });
            }
            tracing::debug!(request_type = registration.request_type, "Handler registered");
            handlers.insert(type_id, registration);
        }

        Ok(HandlerRegistry { handlers })
    }
}

/// Read-only dispatch table
pub struct HandlerRegistry {
    handlers: HashMap<TypeId, Registration>,
}

impl HandlerRegistry {
    pub fn builder() -> HandlerRegistryBuilder {
        HandlerRegistryBuilder::default()
    }

    /// Look up the handler for `R`
    pub fn resolve<R: Request>(&self) -> AppResult<Arc<dyn Handler<R>>> {
        let registration = self
            .handlers
            .get(&TypeId::of::<R>())
            .ok_or(AppError::UnregisteredHandler {
                request_type: type_name::<R>(),
            })?;

        // Slot keyed by TypeId::of::<R> always holds an Arc<dyn Handler<R>>
        registration
            .handler
            .downcast_ref::<Arc<dyn Handler<R>>>()
            .cloned()
            .ok_or(AppError::AmbiguousHandler {
                request_type: registration.request_type,
            })
    }

    pub fn contains<R: Request>(&self) -> bool {
        self.handlers.contains_key(&TypeId::of::<R>())
    }

    /// Names of every registered request type, sorted
    pub fn request_types(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.handlers.values().map(|r| r.request_type).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("request_types", &self.request_types())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::UnitOfWork;
    use async_trait::async_trait;

    struct Ping;
    impl Request for Ping {
        type Response = &'static str;
    }

    struct Echo(String);
    impl Request for Echo {
        type Response = String;
    }

    struct PingHandler(&'static str);

    #[async_trait]
    impl Handler<Ping> for PingHandler {
        async fn handle(&self, _request: Ping, _scope: &mut UnitOfWork) -> AppResult<&'static str> {
            Ok(self.0)
        }
    }

    struct EchoHandler;

    #[async_trait]
    impl Handler<Echo> for EchoHandler {
        async fn handle(&self, request: Echo, _scope: &mut UnitOfWork) -> AppResult<String> {
            Ok(request.0)
        }
    }

    #[test]
    fn test_resolve_registered_handler() {
        let registry = HandlerRegistry::builder()
            .register::<Ping, _>(PingHandler("pong"))
            .register::<Echo, _>(EchoHandler)
            .build()
            .unwrap();

        assert_eq!(registry.request_types().len(), 2);
        assert!(registry.contains::<Ping>());
        assert!(registry.resolve::<Ping>().is_ok());
        assert!(registry.resolve::<Echo>().is_ok());
    }

    #[test]
    fn test_unregistered_request_type() {
        let registry = HandlerRegistry::builder()
            .register::<Ping, _>(PingHandler("pong"))
            .build()
            .unwrap();

        match registry.resolve::<Echo>() {
            Err(AppError::UnregisteredHandler { request_type }) => {
                assert!(request_type.ends_with("Echo"));
            }
            Err(e) => panic!("Expected UnregisteredHandler, got: {:?}", e),
            Ok(_) => panic!("Expected error, got a handler"),
        }
    }

    #[test]
    fn test_duplicate_registration_rejected_at_build() {
        let result = HandlerRegistry::builder()
            .register::<Ping, _>(PingHandler("first"))
            .register::<Echo, _>(EchoHandler)
            .register::<Ping, _>(PingHandler("second"))
            .build();

        match result {
            Err(AppError::AmbiguousHandler { request_type }) => {
                assert!(request_type.ends_with("Ping"));
            }
            Err(e) => panic!("Expected AmbiguousHandler, got: {:?}", e),
            Ok(_) => panic!("Duplicate registration should not build"),
        }
    }

    #[test]
    fn test_request_types_listing() {
        let registry = HandlerRegistry::builder()
            .register::<Ping, _>(PingHandler("pong"))
            .register::<Echo, _>(EchoHandler)
            .build()
            .unwrap();

        let names = registry.request_types();
        assert_eq!(names.len(), 2);
        assert!(names.iter().any(|n| n.ends_with("Echo")));
        assert!(format!("{:?}", registry).contains("Ping"));
    }
}
