//! API Middleware
//!
//! Correlation IDs and request logging. Request bodies are never logged
//! since registration and login bodies carry passwords.

use std::net::IpAddr;
use std::time::Instant;

use axum::{
    body::Body,
    http::{HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::Response,
};

use crate::domain::OperationContext;

/// Header carrying the correlation ID in and out
pub const CORRELATION_HEADER: &str = "x-correlation-id";

const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Replaced by `[REDACTED]` in request logs
const SENSITIVE_HEADERS: &[&str] = &["authorization", "cookie", "set-cookie", "x-api-key"];

/// Build the request's [`OperationContext`], store it as an extension and
/// echo the correlation ID on the response
pub async fn correlation_middleware(mut request: Request<Body>, next: Next) -> Response {
    let context = context_from_headers(request.headers());
    let correlation_id = context.correlation_id;
    request.extensions_mut().insert(context);

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&correlation_id.to_string()) {
        response.headers_mut().insert(CORRELATION_HEADER, value);
    }
    response
}

fn context_from_headers(headers: &HeaderMap) -> OperationContext {
    let raw = headers.get(CORRELATION_HEADER).and_then(|v| v.to_str().ok());
    let context = OperationContext::continuing(raw);

    // Leftmost entry is the original client
    let client_ip = headers
        .get(FORWARDED_FOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse::<IpAddr>().ok());

    match client_ip {
        Some(ip) => context.with_client_ip(ip),
        None => context,
    }
}

/// Header name/value pairs safe to log
pub fn mask_headers_for_logging(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let value = if SENSITIVE_HEADERS.contains(&name.as_str()) {
                "[REDACTED]"
            } else {
                value.to_str().unwrap_or("[invalid utf8]")
            };
            (name.to_string(), value.to_string())
        })
        .collect()
}

/// Log each request on arrival and on completion
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let correlation_id = request
        .extensions()
        .get::<OperationContext>()
        .map(|ctx| ctx.correlation_id);

    tracing::info!(
        %method,
        %path,
        correlation_id = ?correlation_id,
        headers = ?mask_headers_for_logging(request.headers()),
        "Incoming request"
    );

    let start = Instant::now();
    let response = next.run(request).await;

    tracing::info!(
        %method,
        %path,
        status = %response.status(),
        duration_ms = %start.elapsed().as_millis(),
        correlation_id = ?correlation_id,
        "Request completed"
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_headers_for_logging() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", "application/json".parse().unwrap());
        headers.insert("authorization", "Token abc.def.ghi".parse().unwrap());
        headers.insert("cookie", "session=1".parse().unwrap());

        let masked = mask_headers_for_logging(&headers);
        let value = |name: &str| {
            masked
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str())
        };

        assert_eq!(value("authorization"), Some("[REDACTED]"));
        assert_eq!(value("cookie"), Some("[REDACTED]"));
        assert_eq!(value("content-type"), Some("application/json"));
    }

    #[test]
    fn test_context_from_headers() {
        let id = uuid::Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(CORRELATION_HEADER, id.to_string().parse().unwrap());
        headers.insert(FORWARDED_FOR_HEADER, "203.0.113.9, 10.0.0.1".parse().unwrap());

        let context = context_from_headers(&headers);

        assert_eq!(context.correlation_id, id);
        assert_eq!(context.client_ip, Some("203.0.113.9".parse().unwrap()));
    }

    #[test]
    fn test_context_from_empty_headers() {
        let context = context_from_headers(&HeaderMap::new());

        assert!(!context.correlation_id.is_nil());
        assert!(context.client_ip.is_none());
    }
}
