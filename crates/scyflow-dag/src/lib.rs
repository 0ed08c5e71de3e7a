//! Compiles a project's pipeline graph into the Python DAG artifact its
//! orchestrator adapter hands to Apache Airflow.

mod error;
mod graph;
mod ids;
mod render;

use std::path::{Path, PathBuf};

use scyflow_store::Store;
use tokio::fs;
use uuid::Uuid;

pub use error::CompileError;
pub use ids::{block_id_to_task_id, dag_id_to_project_id, project_id_to_dag_id, task_id_to_block_id};
pub use render::DagRenderConfig;

/// Compiles project graphs into DAG artifacts on disk.
#[derive(Debug, Clone)]
pub struct DagCompiler {
    store: Store,
    config: DagRenderConfig,
}

impl DagCompiler {
    /// Builds a compiler bound to a store and a set of rendering defaults.
    pub fn new(store: Store, config: DagRenderConfig) -> Self {
        Self { store, config }
    }

    /// Compiles a project, writing its artifact atomically into `dag_dir`
    /// and returning the written path.
    ///
    /// Loads the graph, verifies acyclicity and weak connectivity, renders
    /// the three fragments, and writes via write-to-temp-then-rename within
    /// `dag_dir` so a reader never observes a partial file.
    pub async fn compile(&self, project_id: Uuid, dag_dir: &Path) -> Result<PathBuf, CompileError> {
        let project = self.store.get_project(project_id).await?;
        let graph = self.store.fetch_project_graph(project_id).await?;
        let compiled = graph::build(&graph)?;

        let artifact = render::render_artifact(
            &graph,
            project_id,
            &compiled.order,
            project.default_retries,
            300,
            &self.config,
        )?;

        let final_name = format!("dag_{}.py", project_id.to_string().replace('-', "_"));
        let final_path = dag_dir.join(final_name);
        write_atomic(dag_dir, &final_path, &artifact).await?;
        Ok(final_path)
    }
}

/// Writes `contents` to `final_path` by first writing a sibling temp file
/// in `dir`, then renaming it into place — `rename` within the same
/// filesystem is atomic, so a concurrent reader never sees a partial file.
async fn write_atomic(dir: &Path, final_path: &Path, contents: &str) -> Result<(), CompileError> {
    fs::create_dir_all(dir).await?;
    let tmp_path = dir.join(format!(".{}.tmp", Uuid::new_v4()));
    fs::write(&tmp_path, contents).await?;
    fs::rename(&tmp_path, final_path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_atomic_produces_the_final_file() {
        let dir = tempfile::tempdir().unwrap();
        let final_path = dir.path().join("dag_test.py");
        write_atomic(dir.path(), &final_path, "print('hi')").await.unwrap();
        let contents = fs::read_to_string(&final_path).await.unwrap();
        assert_eq!(contents, "print('hi')");

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with('.'))
            .collect();
        assert!(leftovers.is_empty(), "temp file was not cleaned up by rename");
    }
}
