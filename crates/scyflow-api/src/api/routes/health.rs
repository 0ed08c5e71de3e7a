//! Liveness and readiness checks.
//!
//! - `/health` - is the process running?
//! - `/ready` - can it actually serve (does the graph store answer)?

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use tracing::warn;

use crate::api::state::AppState;

/// Health routes (mounted at root level).
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/", get(root))
}

async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        name: "scyflow",
        version: env!("CARGO_PKG_VERSION"),
        description: "pipeline orchestration control plane",
    })
}

#[derive(Serialize)]
struct ServiceInfo {
    name: &'static str,
    version: &'static str,
    description: &'static str,
}

async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy",
        timestamp: chrono::Utc::now(),
    })
}

#[derive(Serialize)]
struct HealthStatus {
    status: &'static str,
    timestamp: chrono::DateTime<chrono::Utc>,
}

/// Exercises the graph store's connection pool. The workflow engine and
/// manifest repositories are not probed here — their unreachability is a
/// per-request condition (`UPSTREAM_FAILURE`), not a process-wide one.
async fn readiness_check(
    State(state): State<AppState>,
) -> Result<Json<ReadinessStatus>, (StatusCode, Json<ReadinessStatus>)> {
    let mut checks = ReadinessChecks { store: false };
    let mut errors: Vec<String> = Vec::new();

    match state.store.ping().await {
        Ok(()) => checks.store = true,
        Err(e) => {
            let msg = format!("store check failed: {e}");
            warn!("{msg}");
            errors.push(msg);
        }
    }

    let ready = checks.store;
    let status = ReadinessStatus {
        ready,
        checks,
        errors: if errors.is_empty() { None } else { Some(errors) },
    };

    if ready {
        Ok(Json(status))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(status)))
    }
}

#[derive(Debug, Serialize)]
struct ReadinessStatus {
    ready: bool,
    checks: ReadinessChecks,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct ReadinessChecks {
    store: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn health_check_reports_healthy() {
        let response = health_check().await;
        assert_eq!(response.status, "healthy");
    }
}
