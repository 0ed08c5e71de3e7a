//! Process entry point: reads configuration from the environment (§10.3),
//! assembles every domain collaborator, runs pending migrations, and
//! serves until SIGINT/SIGTERM.

use std::time::Duration;

use scyflow_api::api::{ApiConfig, ApiServer, AppState, ServerConfig};
use scyflow_artifacts::{ArtifactLocator, ArtifactLocatorConfig};
use scyflow_core::defaults::{FileDefaults, PgTableDefaults};
use scyflow_dag::{DagCompiler, DagRenderConfig};
use scyflow_manifest::ManifestLoader;
use scyflow_orchestrator::{Client as OrchestratorClient, OrchestratorConfig};
use scyflow_store::{Store, StoreConfig};
use scyflow_template::TemplateEngine;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .json()
        .init();

    if let Err(err) = run().await {
        tracing::error!(error = %err, "scyflow API exited with an error");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::connect(&StoreConfig {
        host: env_var("SCYFLOW_DB_HOST", "localhost"),
        port: env_parse("SCYFLOW_DB_PORT", 5432),
        user: env_var("SCYFLOW_DB_USER", "scyflow"),
        password: env_var("SCYFLOW_DB_PASSWORD", "scyflow"),
        dbname: env_var("SCYFLOW_DB_NAME", "scyflow"),
        max_pool_size: env_parse("SCYFLOW_DB_POOL_SIZE", 16),
    })?;
    store.migrate().await?;

    let manifest_loader = ManifestLoader::new();

    let file_defaults = FileDefaults {
        s3_host: env_var("SCYFLOW_S3_HOST", "http://minio:9000"),
        s3_port: env_parse("SCYFLOW_S3_PORT", 9000),
        s3_access_key: env_var("SCYFLOW_S3_ACCESS_KEY", "minioadmin"),
        s3_secret_key: env_var("SCYFLOW_S3_SECRET_KEY", "minioadmin"),
        bucket_name: env_var("SCYFLOW_S3_BUCKET", "scyflow-data"),
    };
    let pg_defaults = PgTableDefaults {
        pg_user: env_var("SCYFLOW_DEFAULT_PG_USER", "scyflow"),
        pg_pass: env_var("SCYFLOW_DEFAULT_PG_PASSWORD", "scyflow"),
        pg_host: env_var("SCYFLOW_DEFAULT_PG_HOST", "postgres"),
        pg_port: env_parse("SCYFLOW_DEFAULT_PG_PORT", 5432),
    };

    let template_engine = TemplateEngine::new(
        manifest_loader.clone(),
        store.clone(),
        file_defaults.clone(),
        pg_defaults.clone(),
    );

    let dag_compiler = DagCompiler::new(
        store.clone(),
        DagRenderConfig {
            network_mode: env_var("SCYFLOW_DOCKER_NETWORK", "scyflow_net"),
            local_storage_path_external: env_var("SCYFLOW_DATA_PATH", "/var/lib/scyflow/data"),
        },
    );

    let orchestrator = OrchestratorClient::new(OrchestratorConfig {
        base_url: env_var("SCYFLOW_ORCHESTRATOR_URL", "http://localhost:8080/api/v1"),
        token_url: env_var(
            "SCYFLOW_ORCHESTRATOR_TOKEN_URL",
            "http://localhost:8080/auth/token",
        ),
        username: env_var("SCYFLOW_ORCHESTRATOR_USER", "scyflow"),
        password: env_var("SCYFLOW_ORCHESTRATOR_PASSWORD", "scyflow"),
        request_timeout: Duration::from_secs(env_parse("SCYFLOW_ORCHESTRATOR_TIMEOUT_SECS", 30)),
    })?;

    let artifacts = ArtifactLocator::new(ArtifactLocatorConfig {
        internal_host: env_var("SCYFLOW_S3_HOST", "http://minio:9000"),
        external_base_url: env_var("SCYFLOW_S3_EXTERNAL_URL", "http://localhost:9000"),
        presigned_get_ttl: Duration::from_secs(env_parse("SCYFLOW_PRESIGNED_GET_TTL_SECS", 3600)),
        presigned_put_ttl: Duration::from_secs(env_parse("SCYFLOW_PRESIGNED_PUT_TTL_SECS", 3600)),
    });

    let server_config = ServerConfig {
        max_body_size: env_parse("SCYFLOW_MAX_BODY_SIZE", 10 * 1024 * 1024),
        cors_enabled: env_parse("SCYFLOW_CORS_ENABLED", true),
        cors_origins: env_var("SCYFLOW_CORS_ORIGINS", "")
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        base_url: env_var("SCYFLOW_BASE_URL", "http://localhost:3030"),
        template_repo_url: env_var("SCYFLOW_TEMPLATE_REPO_URL", ""),
        dag_dir: env_var("SCYFLOW_DAG_DIR", "/var/lib/scyflow/dags").into(),
        principal_header: env_var("SCYFLOW_PRINCIPAL_HEADER", "x-scyflow-principal"),
        dag_registration_timeout: Duration::from_secs(env_parse("SCYFLOW_DAG_REGISTRATION_TIMEOUT_SECS", 10)),
        dag_registration_poll_interval: Duration::from_millis(env_parse(
            "SCYFLOW_DAG_REGISTRATION_POLL_MS",
            500,
        )),
        status_poll_interval: Duration::from_secs(env_parse("SCYFLOW_STATUS_POLL_INTERVAL_SECS", 2)),
    };

    std::fs::create_dir_all(&server_config.dag_dir)?;

    let mut state = AppState::new(
        store,
        manifest_loader,
        template_engine,
        dag_compiler,
        orchestrator,
        artifacts,
        file_defaults,
        pg_defaults,
        server_config,
    );

    #[cfg(feature = "metrics")]
    {
        state = state.with_metrics(scyflow_api::WorkflowMetrics::new()?);
    }

    let bind_addr = format!(
        "{}:{}",
        env_var("SCYFLOW_BIND_HOST", "0.0.0.0"),
        env_parse::<u16>("SCYFLOW_BIND_PORT", 3030)
    )
    .parse()?;

    let server = ApiServer::new(state, ApiConfig::default().with_addr(bind_addr));
    server.run_until(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    tracing::info!("shutdown signal received");
}

fn env_var(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
