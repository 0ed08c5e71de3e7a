//! Application State
//!
//! Shared state for all API handlers: the domain collaborators each
//! handler calls through, and the process-wide configuration populated
//! once at startup (§10.3 — nothing here is re-read from the environment
//! past construction).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use scyflow_artifacts::ArtifactLocator;
use scyflow_core::defaults::{FileDefaults, PgTableDefaults};
use scyflow_dag::DagCompiler;
use scyflow_manifest::ManifestLoader;
use scyflow_orchestrator::Client as OrchestratorClient;
use scyflow_store::Store;
use scyflow_template::TemplateEngine;

#[cfg(feature = "metrics")]
use crate::WorkflowMetrics;

/// Shared application state for all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Graph persistence.
    pub store: Store,
    /// Compute-block manifest fetch/parse, shared so its clone cache is
    /// process-wide rather than per-request.
    pub manifest_loader: ManifestLoader,
    /// Workflow template instantiation.
    pub template_engine: TemplateEngine,
    /// Project-graph-to-DAG-artifact compilation.
    pub dag_compiler: DagCompiler,
    /// Workflow engine adapter.
    pub orchestrator: OrchestratorClient,
    /// FILE-typed port presigned-URL resolution.
    pub artifacts: ArtifactLocator,
    /// Default-config values applied to a manifest's declared FILE outputs
    /// on single-block ingestion, mirroring what the template engine
    /// applies during whole-template instantiation.
    pub file_defaults: FileDefaults,
    /// Default-config values applied to a manifest's declared PGTABLE
    /// outputs on single-block ingestion.
    pub pg_defaults: PgTableDefaults,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Prometheus metrics (optional, feature-gated).
    #[cfg(feature = "metrics")]
    pub metrics: Option<Arc<WorkflowMetrics>>,
}

/// Process-wide server configuration (§10.3), populated once at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
    /// Enable CORS.
    pub cors_enabled: bool,
    /// Allowed CORS origins.
    pub cors_origins: Vec<String>,
    /// Base URL this server is reachable at.
    pub base_url: String,
    /// Repository URL the template surface discovers workflow templates in.
    pub template_repo_url: String,
    /// Directory the DAG compiler writes artifacts into, and the
    /// orchestrator adapter removes them from on delete.
    pub dag_dir: PathBuf,
    /// Name of the header carrying the caller's already-verified principal
    /// id (§10.5 — this service trusts the claim, it does not mint it).
    pub principal_header: String,
    /// Bound on the DAG-registration wait-poll (§4.G).
    pub dag_registration_timeout: Duration,
    /// Poll cadence of the DAG-registration wait-poll.
    pub dag_registration_poll_interval: Duration,
    /// Poll cadence of the project/workflow status WebSocket streams.
    pub status_poll_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_body_size: 10 * 1024 * 1024,
            cors_enabled: true,
            // No wildcard "*" origin by default. An empty list means no
            // CORS headers are added at all; deployments must opt in.
            cors_origins: Vec::new(),
            base_url: "http://localhost:3030".to_string(),
            template_repo_url: String::new(),
            dag_dir: PathBuf::from("/var/lib/scyflow/dags"),
            principal_header: "x-scyflow-principal".to_string(),
            dag_registration_timeout: Duration::from_secs(10),
            dag_registration_poll_interval: Duration::from_millis(500),
            status_poll_interval: Duration::from_secs(2),
        }
    }
}

impl AppState {
    /// Assembles application state from its already-constructed
    /// collaborators. Each collaborator owns its own I/O setup (pool,
    /// HTTP client, clone cache); this just wires them together.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Store,
        manifest_loader: ManifestLoader,
        template_engine: TemplateEngine,
        dag_compiler: DagCompiler,
        orchestrator: OrchestratorClient,
        artifacts: ArtifactLocator,
        file_defaults: FileDefaults,
        pg_defaults: PgTableDefaults,
        config: ServerConfig,
    ) -> Self {
        Self {
            store,
            manifest_loader,
            template_engine,
            dag_compiler,
            orchestrator,
            artifacts,
            file_defaults,
            pg_defaults,
            config: Arc::new(config),
            #[cfg(feature = "metrics")]
            metrics: None,
        }
    }

    /// Attaches Prometheus metrics.
    #[cfg(feature = "metrics")]
    pub fn with_metrics(mut self, metrics: WorkflowMetrics) -> Self {
        self.metrics = Some(Arc::new(metrics));
        self
    }

    /// Returns a reference to the metrics, if enabled.
    #[cfg(feature = "metrics")]
    pub fn metrics(&self) -> Option<&Arc<WorkflowMetrics>> {
        self.metrics.as_ref()
    }
}
