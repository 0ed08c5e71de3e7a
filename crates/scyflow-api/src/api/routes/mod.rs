//! API Route Handlers
//!
//! Organized by resource: project CRUD and the pipeline graph under
//! `projects`, push status channels under `ws`, and the ambient ops
//! surface under `health`/`metrics`.

pub mod health;
pub mod metrics;
pub mod projects;
pub mod ws;

use axum::Router;

use crate::api::AppState;

/// Builds the complete API router.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .merge(projects::routes())
        .merge(ws::routes())
        .merge(health::health_routes())
        .merge(metrics::metrics_routes())
        .with_state(state)
}
