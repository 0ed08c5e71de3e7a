//! HTTP client for the workflow engine's REST API: token-based auth with
//! automatic re-acquisition on 401, DAG lifecycle operations, and run/task
//! status queries.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::OrchestratorError;

/// Static configuration for one orchestrator connection.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Base URL of the engine's REST API, e.g. `https://airflow.internal/api/v1`.
    pub base_url: String,
    /// Token endpoint, relative to nothing — an absolute URL.
    pub token_url: String,
    /// Static username credential exchanged for a bearer token.
    pub username: String,
    /// Static password credential exchanged for a bearer token.
    pub password: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// A single DAG run as returned by the engine.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RunInfo {
    /// The engine's run identifier.
    pub dag_run_id: String,
    /// The DAG this run belongs to.
    pub dag_id: String,
    /// Raw run-level state string, as the engine reports it.
    pub state: Option<String>,
    /// When the run started, used to pick the latest of several.
    pub execution_date: chrono::DateTime<chrono::Utc>,
}

#[derive(Deserialize)]
struct DagRunList {
    dag_runs: Vec<RunInfo>,
}

#[derive(Deserialize)]
struct DagList {
    dags: Vec<DagEntry>,
}

#[derive(Deserialize)]
struct DagEntry {
    dag_id: String,
}

#[derive(Deserialize)]
struct TaskInstanceList {
    task_instances: Vec<TaskInstance>,
}

#[derive(Deserialize)]
struct TaskInstance {
    task_id: String,
    state: Option<String>,
}

struct Inner {
    http: reqwest::Client,
    config: OrchestratorConfig,
    token: RwLock<Option<String>>,
}

/// Client for the workflow engine's REST API.
#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

impl Client {
    /// Builds a client; does not perform any network I/O until first used.
    pub fn new(config: OrchestratorConfig) -> Result<Self, OrchestratorError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            inner: Arc::new(Inner {
                http,
                config,
                token: RwLock::new(None),
            }),
        })
    }

    async fn authenticate(&self) -> Result<String, OrchestratorError> {
        let response = self
            .inner
            .http
            .post(&self.inner.config.token_url)
            .json(&TokenRequest {
                username: &self.inner.config.username,
                password: &self.inner.config.password,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(OrchestratorError::Authentication(format!(
                "token endpoint returned {status}: {body}"
            )));
        }

        let parsed: TokenResponse = response.json().await?;
        Ok(parsed.access_token)
    }

    async fn cached_or_fresh_token(&self) -> Result<String, OrchestratorError> {
        if let Some(token) = self.inner.token.read().await.clone() {
            return Ok(token);
        }
        let token = self.authenticate().await?;
        *self.inner.token.write().await = Some(token.clone());
        Ok(token)
    }

    async fn force_refresh_token(&self) -> Result<String, OrchestratorError> {
        let token = self.authenticate().await?;
        *self.inner.token.write().await = Some(token.clone());
        Ok(token)
    }

    /// Sends one request, retrying exactly once with a freshly acquired
    /// token if the first attempt is rejected with 401.
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<reqwest::Response, OrchestratorError> {
        let url = format!("{}{}", self.inner.config.base_url, path);
        let token = self.cached_or_fresh_token().await?;
        let response = self.build_and_send(&method, &url, body, &token).await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        debug!("orchestrator token rejected, re-authenticating");
        let token = self.force_refresh_token().await?;
        self.build_and_send(&method, &url, body, &token).await
    }

    async fn build_and_send(
        &self,
        method: &Method,
        url: &str,
        body: Option<&Value>,
        token: &str,
    ) -> Result<reqwest::Response, OrchestratorError> {
        let mut builder = self.inner.http.request(method.clone(), url).bearer_auth(token);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        Ok(builder.send().await?)
    }

    async fn send_checked(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<reqwest::Response, OrchestratorError> {
        let response = self.send(method, path, body).await?;
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(OrchestratorError::Api { status, body })
    }

    /// Wait-polls the engine until `dag_id` is known, bounded by `timeout`.
    pub async fn register(
        &self,
        dag_id: &str,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<(), OrchestratorError> {
        let deadline = Instant::now() + timeout;
        loop {
            let response = self
                .send(Method::GET, &format!("/dags/{dag_id}"), None)
                .await?;
            if response.status().is_success() {
                return Ok(());
            }
            if response.status() != StatusCode::NOT_FOUND {
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                return Err(OrchestratorError::Api { status, body });
            }
            if Instant::now() >= deadline {
                return Err(OrchestratorError::RegistrationTimeout(dag_id.to_string()));
            }
            tokio::time::sleep(poll_interval).await;
        }
    }

    /// Unpauses a DAG so the scheduler will run it.
    pub async fn unpause(&self, dag_id: &str) -> Result<(), OrchestratorError> {
        self.send_checked(
            Method::PATCH,
            &format!("/dags/{dag_id}"),
            Some(&json!({"is_paused": false})),
        )
        .await?;
        Ok(())
    }

    /// Creates a new run of `dag_id`, returning the engine's run id.
    pub async fn trigger(&self, dag_id: &str) -> Result<String, OrchestratorError> {
        let response = self
            .send_checked(Method::POST, &format!("/dags/{dag_id}/dagRuns"), Some(&json!({})))
            .await?;
        let run: RunInfo = response.json().await?;
        Ok(run.dag_run_id)
    }

    /// Lists every DAG the engine knows about.
    pub async fn list_dags(&self) -> Result<Vec<String>, OrchestratorError> {
        let response = self.send_checked(Method::GET, "/dags", None).await?;
        let list: DagList = response.json().await?;
        Ok(list.dags.into_iter().map(|d| d.dag_id).collect())
    }

    /// The most recent run of a single DAG, if any has ever run.
    pub async fn latest_run(&self, dag_id: &str) -> Result<Option<RunInfo>, OrchestratorError> {
        let response = self
            .send_checked(
                Method::GET,
                &format!("/dags/{dag_id}/dagRuns?order_by=-execution_date&limit=1"),
                None,
            )
            .await?;
        let list: DagRunList = response.json().await?;
        Ok(list.dag_runs.into_iter().next())
    }

    /// The most recent run per DAG, across many DAGs in one request.
    pub async fn last_run_batch(
        &self,
        dag_ids: &[String],
    ) -> Result<HashMap<String, RunInfo>, OrchestratorError> {
        if dag_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let response = self
            .send_checked(
                Method::POST,
                "/dags/~/dagRuns/list",
                Some(&json!({"dag_ids": dag_ids, "order_by": "-execution_date"})),
            )
            .await?;
        let list: DagRunList = response.json().await?;

        let mut latest: HashMap<String, RunInfo> = HashMap::new();
        for run in list.dag_runs {
            match latest.get(&run.dag_id) {
                Some(existing) if existing.execution_date >= run.execution_date => {}
                _ => {
                    latest.insert(run.dag_id.clone(), run);
                }
            }
        }
        Ok(latest)
    }

    /// Raw per-task state strings for one run, keyed by task id.
    pub async fn task_states(
        &self,
        dag_id: &str,
        run_id: &str,
    ) -> Result<HashMap<String, Option<String>>, OrchestratorError> {
        let response = self
            .send_checked(
                Method::GET,
                &format!("/dags/{dag_id}/dagRuns/{run_id}/taskInstances"),
                None,
            )
            .await?;
        let list: TaskInstanceList = response.json().await?;
        Ok(list
            .task_instances
            .into_iter()
            .map(|t| (t.task_id, t.state))
            .collect())
    }

    /// Removes a DAG's artifact file (if present) and deregisters it from
    /// the engine. A missing file is not an error.
    pub async fn delete(&self, dag_id: &str, dag_dir: &Path) -> Result<(), OrchestratorError> {
        let artifact_path = dag_dir.join(format!("{dag_id}.py"));
        match std::fs::remove_file(&artifact_path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("DAG artifact for '{dag_id}' was already gone");
            }
            Err(e) => warn!("could not remove DAG artifact for '{dag_id}': {e}"),
        }

        self.send_checked(Method::DELETE, &format!("/dags/{dag_id}"), None)
            .await?;
        Ok(())
    }
}
