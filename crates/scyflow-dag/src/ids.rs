//! Reversible id substitution between the graph store's UUIDs (which
//! contain dashes) and the identifiers the workflow engine accepts (which
//! do not).

use uuid::Uuid;

/// `<uuid>` -> `task_<uuid_with_underscores>`.
pub fn block_id_to_task_id(block_id: Uuid) -> String {
    format!("task_{}", block_id.to_string().replace('-', "_"))
}

/// Inverse of [`block_id_to_task_id`].
pub fn task_id_to_block_id(task_id: &str) -> Option<Uuid> {
    let rest = task_id.strip_prefix("task_")?;
    Uuid::parse_str(&rest.replace('_', "-")).ok()
}

/// `<uuid>` -> `dag_<uuid_with_underscores>`.
pub fn project_id_to_dag_id(project_id: Uuid) -> String {
    format!("dag_{}", project_id.to_string().replace('-', "_"))
}

/// Inverse of [`project_id_to_dag_id`].
pub fn dag_id_to_project_id(dag_id: &str) -> Option<Uuid> {
    let rest = dag_id.strip_prefix("dag_")?;
    Uuid::parse_str(&rest.replace('_', "-")).ok()
}
