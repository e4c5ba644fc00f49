//! API module
//!
//! HTTP API endpoints and middleware.

pub mod middleware;
pub mod routes;

use axum::{middleware as axum_middleware, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::dispatch::Dispatcher;

pub use routes::create_router;

/// Per-hop request ID, distinct from the caller-supplied correlation ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Full application router: `/health` plus the API under `/api`
pub fn app(dispatcher: Dispatcher) -> Router {
    let request_id = axum::http::HeaderName::from_static(REQUEST_ID_HEADER);

    // ServiceBuilder runs top to bottom: correlation -> logging -> handler
    let api_routes = create_router().layer(
        ServiceBuilder::new()
            .layer(axum_middleware::from_fn(middleware::correlation_middleware))
            .layer(axum_middleware::from_fn(middleware::logging_middleware)),
    );

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::new(request_id))
                .layer(CorsLayer::permissive()),
        )
        .with_state(dispatcher)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
