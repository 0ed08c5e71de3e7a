//! Projects the engine's raw task/run states onto the two internal state
//! enums the API surface exposes to clients.

use serde::{Deserialize, Serialize};

/// Per-block run status, as surfaced by `task_states`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BlockState {
    /// Not yet started, or no run exists.
    Idle,
    /// Queued by the engine's scheduler but not yet running.
    Scheduled,
    /// Currently executing.
    Running,
    /// Completed successfully.
    Success,
    /// Completed with an error.
    Failed,
}

/// Per-workflow run status. Has no `Scheduled` variant: a workflow run
/// either hasn't started, is running, or has finished one way or another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WorkflowState {
    /// No run exists, or it hasn't started.
    Idle,
    /// Currently executing.
    Running,
    /// Completed successfully.
    Finished,
    /// Completed with an error.
    Failed,
}

/// Projects a raw external state (or its absence) onto [`BlockState`].
pub fn project_block_state(raw: Option<&str>) -> BlockState {
    match raw {
        Some("running") => BlockState::Running,
        Some("success") => BlockState::Success,
        Some("failed") => BlockState::Failed,
        Some("scheduled") => BlockState::Scheduled,
        _ => BlockState::Idle,
    }
}

/// Projects a raw external state (or its absence) onto [`WorkflowState`].
pub fn project_workflow_state(raw: Option<&str>) -> WorkflowState {
    match raw {
        Some("running") => WorkflowState::Running,
        Some("success") => WorkflowState::Finished,
        Some("failed") => WorkflowState::Failed,
        _ => WorkflowState::Idle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_and_null_states_become_idle() {
        assert_eq!(project_block_state(Some("queued")), BlockState::Idle);
        assert_eq!(project_block_state(None), BlockState::Idle);
        assert_eq!(project_workflow_state(Some("scheduled")), WorkflowState::Idle);
    }

    #[test]
    fn workflow_has_no_scheduled_variant() {
        assert_eq!(project_workflow_state(Some("success")), WorkflowState::Finished);
    }

    #[test]
    fn block_retains_scheduled() {
        assert_eq!(project_block_state(Some("scheduled")), BlockState::Scheduled);
    }
}
