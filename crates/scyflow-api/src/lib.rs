//! Control-plane HTTP and WebSocket API for the pipeline orchestration
//! service.
//!
//! This crate has no graph logic of its own: it authenticates and
//! authorizes callers at the membership boundary, translates REST and
//! WebSocket requests into calls against [`scyflow_store::Store`],
//! [`scyflow_template::TemplateEngine`], [`scyflow_dag::DagCompiler`], and
//! [`scyflow_orchestrator::Client`], and maps every domain error onto one
//! client-facing taxonomy.

pub mod error;

#[cfg(feature = "server")]
pub mod api;

#[cfg(feature = "metrics")]
pub mod metrics;

pub use error::{ApiError, Result};

#[cfg(feature = "server")]
pub use api::{ApiConfig, ApiServer, AppState};

#[cfg(feature = "metrics")]
pub use metrics::WorkflowMetrics;
