//! Dispatcher
//!
//! Resolves the handler, opens the unit of work, and resolves the scope
//! with exactly one commit or discard.

use std::any::type_name;
use std::sync::Arc;
use std::time::Instant;

use tracing::Instrument;

use crate::domain::OperationContext;
use crate::error::AppResult;
use crate::storage::Store;

use super::{HandlerRegistry, Request, UnitOfWork};

/// Entry point for every state-changing operation.
///
/// Cheap to clone and safe to share: the registry is frozen and each call
/// gets its own [`UnitOfWork`].
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<HandlerRegistry>,
    store: Arc<dyn Store>,
}

impl Dispatcher {
    pub fn new(registry: HandlerRegistry, store: Arc<dyn Store>) -> Self {
        Self {
            registry: Arc::new(registry),
            store,
        }
    }

    /// Dispatch `request` to its handler
    pub async fn dispatch<R: Request>(&self, request: R) -> AppResult<R::Response> {
        self.dispatch_with(request, &OperationContext::default()).await
    }

    /// Dispatch with request metadata attached to the tracing span
    pub async fn dispatch_with<R: Request>(
        &self,
        request: R,
        context: &OperationContext,
    ) -> AppResult<R::Response> {
        let span = tracing::info_span!(
            "dispatch",
            request_type = type_name::<R>(),
            correlation_id = %context.correlation_id,
            client_ip = ?context.client_ip,
        );

        self.run(request).instrument(span).await
    }

    async fn run<R: Request>(&self, request: R) -> AppResult<R::Response> {
        let handler = self.registry.resolve::<R>()?;
        let mut scope = UnitOfWork::open(self.store.as_ref()).await?;
        let start = Instant::now();

        match handler.handle(request, &mut scope).await {
            Ok(response) => {
                scope.commit().await?;
                tracing::debug!(duration_ms = %start.elapsed().as_millis(), "Dispatch committed");
                Ok(response)
            }
            Err(err) => {
                // The handler's error wins over a failed rollback
                if let Err(discard_err) = scope.discard().await {
                    tracing::error!("Discard failed: {}", discard_err);
                }
                if err.is_client_error() {
                    tracing::debug!("Dispatch rejected: {}", err);
                } else {
                    tracing::warn!("Dispatch failed: {}", err);
                }
                Err(err)
            }
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::User;
    use crate::error::AppError;
    use crate::security::{CredentialHasher, HashingError, HashingParams};
    use crate::storage::MemoryStore;
    use crate::dispatch::Handler;
    use async_trait::async_trait;

    /// What the handler does after staging its write
    enum Then {
        Succeed,
        Fail,
        FailHashing,
        Hang,
    }

    struct Stage {
        email: &'static str,
        then: Then,
    }

    impl Request for Stage {
        type Response = ();
    }

    struct StageHandler {
        hasher: CredentialHasher,
    }

    #[async_trait]
    impl Handler<Stage> for StageHandler {
        async fn handle(&self, request: Stage, scope: &mut UnitOfWork) -> AppResult<()> {
            let salt = self.hasher.generate_salt();
            let hash = self.hasher.derive("secret123", &salt)?;
            let user = User::new(request.email.to_string(), request.email.to_string(), hash, salt);
            scope.repository().create(&user).await?;

            match request.then {
                Then::Succeed => Ok(()),
                Then::Fail => Err(AppError::Internal("handler failed after create".into())),
                Then::FailHashing => Err(HashingError::Derivation("out of memory".into()).into()),
                Then::Hang => std::future::pending().await,
            }
        }
    }

    struct Unregistered;
    impl Request for Unregistered {
        type Response = ();
    }

    fn dispatcher(store: &MemoryStore) -> Dispatcher {
        let hasher = CredentialHasher::new(HashingParams {
            memory_kib: 64,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap();
        let registry = HandlerRegistry::builder()
            .register::<Stage, _>(StageHandler { hasher })
            .build()
            .unwrap();
        Dispatcher::new(registry, Arc::new(store.clone()))
    }

    #[tokio::test]
    async fn test_success_commits() {
        let store = MemoryStore::new();
        let dispatcher = dispatcher(&store);

        dispatcher
            .dispatch(Stage { email: "ok@x.io", then: Then::Succeed })
            .await
            .unwrap();

        assert!(store.find_by_email("ok@x.io").await.is_some());
    }

    #[tokio::test]
    async fn test_failure_discards_and_propagates_unchanged() {
        let store = MemoryStore::new();
        let dispatcher = dispatcher(&store);

        let err = dispatcher
            .dispatch(Stage { email: "bad@x.io", then: Then::Fail })
            .await
            .unwrap_err();

        match err {
            AppError::Internal(msg) => assert_eq!(msg, "handler failed after create"),
            other => panic!("Expected the handler's error, got: {:?}", other),
        }
        assert!(store.find_by_email("bad@x.io").await.is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_hashing_failure_discards_and_propagates() {
        let store = MemoryStore::new();
        let dispatcher = dispatcher(&store);

        let err = dispatcher
            .dispatch(Stage { email: "hash@x.io", then: Then::FailHashing })
            .await
            .unwrap_err();

        assert!(!err.is_client_error());
        match err {
            AppError::HashingFailure(HashingError::Derivation(msg)) => {
                assert_eq!(msg, "out of memory")
            }
            other => panic!("Expected HashingFailure, got: {:?}", other),
        }
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_unregistered_request() {
        let store = MemoryStore::new();
        let dispatcher = dispatcher(&store);

        let err = dispatcher.dispatch(Unregistered).await.unwrap_err();
        assert!(matches!(err, AppError::UnregisteredHandler { .. }));
    }

    #[tokio::test]
    async fn test_cancelled_dispatch_leaves_nothing() {
        let store = MemoryStore::new();
        let dispatcher = dispatcher(&store);

        // Poll once so the handler stages its write and parks, then drop the future
        let mut fut = Box::pin(dispatcher.dispatch(Stage {
            email: "gone@x.io",
            then: Then::Hang,
        }));
        assert!(futures::poll!(fut.as_mut()).is_pending());
        drop(fut);

        assert!(store.find_by_email("gone@x.io").await.is_none());
    }
}
