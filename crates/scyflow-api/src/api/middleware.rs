//! Cross-cutting request processing shared by every route.
//!
//! Each middleware is independent and composed in [`crate::api::server`]:
//! request-id tagging, CORS headers, the principal extraction that feeds
//! project-membership checks (§10.5), and HTTP metrics.

use axum::extract::{Request, State};
use axum::http::{header, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use crate::api::AppState;
use crate::error::ApiError;

// ============================================================================
// Request Id
// ============================================================================

/// Tags every request with an id, generating one if the caller did not send
/// `x-request-id`, and echoes it back on the response.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(String::from)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    request.extensions_mut().insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;

    if let Ok(header_value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", header_value);
    }

    response
}

#[derive(Clone, Debug)]
pub struct RequestId(pub String);

// ============================================================================
// Principal extraction (§10.5)
// ============================================================================

/// The caller's already-verified identity, as asserted by an upstream proxy
/// in `state.config.principal_header`. This service trusts the claim; it
/// does not mint or validate a signature over it. Project-scoped handlers
/// combine this with [`scyflow_store::Store::is_member`] to authorize.
#[derive(Clone, Debug)]
pub struct Principal(pub scyflow_core::ScyflowUuid);

/// Extracts the caller's principal id from the configured header and
/// rejects the request with [`ApiError::Unauthenticated`] if it is absent
/// or not a valid id. Route handlers that need the caller's identity pull
/// it back out via the `Principal` request extension.
pub async fn principal_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let header_name = state.config.principal_header.as_str();

    let claimed = request
        .headers()
        .get(header_name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| scyflow_core::ScyflowUuid::parse_str(s).ok());

    match claimed {
        Some(principal_id) => {
            request.extensions_mut().insert(Principal(principal_id));
            next.run(request).await
        }
        None => ApiError::Unauthenticated.into_response(),
    }
}

// ============================================================================
// CORS headers
// ============================================================================

/// Adds CORS headers to the response. Headers are only added if CORS is
/// enabled and origins are explicitly configured — an empty allow-list
/// means no CORS headers at all, never a wildcard fallback.
pub async fn cors_middleware(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;

    if state.config.cors_enabled && !state.config.cors_origins.is_empty() {
        if let Some(origin) = state.config.cors_origins.first() {
            if origin == "*" {
                tracing::warn!("CORS wildcard '*' origin configured; not recommended in production");
            }

            if let Ok(header_value) = HeaderValue::from_str(origin) {
                response
                    .headers_mut()
                    .insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, header_value);
            }
        }

        response.headers_mut().insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
        );
        response.headers_mut().insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type, Authorization, X-Request-Id"),
        );
    }

    response
}

// ============================================================================
// Metrics
// ============================================================================

/// Records request count, duration, and in-flight gauge per route.
#[cfg(feature = "metrics")]
pub async fn metrics_middleware(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let start = std::time::Instant::now();
    let method = request.method().to_string();
    let path = normalize_path_for_metrics(request.uri().path());

    if let Some(metrics) = state.metrics() {
        metrics.http_requests_in_flight.inc();
    }

    let response = next.run(request).await;

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16();

    if let Some(metrics) = state.metrics() {
        metrics.http_requests_in_flight.dec();
        metrics.record_http_request(&method, &path, status, duration);
    }

    response
}

/// No-op when the `metrics` feature is disabled.
#[cfg(not(feature = "metrics"))]
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    next.run(request).await
}

/// Replaces path segments that would otherwise blow up metric cardinality
/// (project/block/port ids) with a fixed placeholder.
#[cfg(feature = "metrics")]
fn normalize_path_for_metrics(path: &str) -> String {
    path.split('/')
        .map(|part| {
            if uuid::Uuid::parse_str(part).is_ok() {
                ":id".to_string()
            } else {
                part.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
#[cfg(feature = "metrics")]
mod metrics_tests {
    use super::*;

    #[test]
    fn normalizes_uuid_segment() {
        let path = "/projects/123e4567-e89b-12d3-a456-426614174000/blocks";
        assert_eq!(normalize_path_for_metrics(path), "/projects/:id/blocks");
    }

    #[test]
    fn leaves_static_path_unchanged() {
        let path = "/projects";
        assert_eq!(normalize_path_for_metrics(path), path);
    }
}
