//! Adapter over the external workflow engine's REST API: token-based auth,
//! DAG registration/triggering, and run/task status projection.

mod client;
mod error;
mod state;

pub use client::{Client, OrchestratorConfig, RunInfo};
pub use error::OrchestratorError;
pub use state::{project_block_state, project_workflow_state, BlockState, WorkflowState};
