//! Graph Store (§4.C): transactional relational persistence for projects,
//! blocks, entrypoints, ports, and edges.

mod config;
mod edges;
mod error;
mod graph;
mod ingestion;
mod project;
mod rows;
mod template_txn;

pub use error::StoreError;
pub use graph::ProjectGraph;
pub use ingestion::{IngestedBlock, NewBlock, NewEntrypoint, NewPort};
pub use template_txn::{InstantiatedTemplate, TemplateBlockSpec, TemplateEdgeSpec};

use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use tokio_postgres::NoTls;

/// Connection parameters for the graph store's database.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Postgres host.
    pub host: String,
    /// Postgres port.
    pub port: u16,
    /// Database user.
    pub user: String,
    /// Database password.
    pub password: String,
    /// Database name.
    pub dbname: String,
    /// Maximum pool size.
    pub max_pool_size: usize,
}

/// A pooled handle to the pipeline graph's relational store.
#[derive(Clone)]
pub struct Store {
    pool: Pool,
}

impl Store {
    /// Builds a connection pool from `config`. Does not eagerly connect;
    /// the first query acquires the first connection.
    pub fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let mut pg_config = tokio_postgres::Config::new();
        pg_config
            .host(&config.host)
            .port(config.port)
            .user(&config.user)
            .password(&config.password)
            .dbname(&config.dbname);

        let manager = Manager::from_config(
            pg_config,
            NoTls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );
        let pool = Pool::builder(manager)
            .max_size(config.max_pool_size)
            .build()
            .map_err(|e| StoreError::Conflict(format!("could not build connection pool: {e}")))?;

        Ok(Self { pool })
    }

    /// Acquires and immediately releases a pooled connection. Used as a
    /// readiness probe; a failure here means the database is unreachable.
    pub async fn ping(&self) -> Result<(), StoreError> {
        self.pool.get().await?;
        Ok(())
    }

    /// Runs the embedded schema migration. Idempotent: every statement is
    /// `CREATE ... IF NOT EXISTS` or guarded, so this is safe to call on
    /// every process start.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        let client = self.pool.get().await?;
        client
            .batch_execute(include_str!("../migrations/0001_init.sql"))
            .await
            .or_else(|e| {
                // Enum/constraint creation isn't naturally idempotent in
                // plain SQL; a second run hitting "already exists" is the
                // expected steady state, not a real failure.
                if e.to_string().contains("already exists") {
                    Ok(())
                } else {
                    Err(e)
                }
            })?;
        Ok(())
    }
}
