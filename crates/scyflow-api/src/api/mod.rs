//! HTTP and WebSocket surface for the pipeline orchestration service.
//!
//! # Architecture
//!
//! ```text
//! /projects/                             - project CRUD, membership
//! /projects/:id/blocks                   - compute-block ingestion and deletion
//! /projects/:id/edges                    - wiring ports together
//! /projects/:id/templates                - template discovery and instantiation
//! /projects/:id/config                   - four-bucket workflow configuration view
//! /projects/:id/runs                     - run launch (compile, register, trigger)
//! /workflow/ws/project_status            - fan-out project state stream
//! /workflow/ws/workflow_status/:id       - per-block state stream for one project
//! /health, /ready, /metrics               - ambient ops surface
//! ```

#[cfg(feature = "server")]
pub mod middleware;
#[cfg(feature = "server")]
pub mod routes;
#[cfg(feature = "server")]
pub mod server;
#[cfg(feature = "server")]
pub mod state;

#[cfg(feature = "server")]
pub use server::{ApiConfig, ApiServer};
#[cfg(feature = "server")]
pub use state::{AppState, ServerConfig};
