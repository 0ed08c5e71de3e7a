//! Resolves FILE-typed ports to presigned S3 URLs: bulk download-URL
//! resolution for workflow-configuration responses, and single-port upload
//! URLs for the ingest surface. Clients are pooled per connection
//! parameter tuple so a bucket shared across many ports is opened once.

mod error;
mod locate;
mod pool;
mod upload;

use std::collections::HashMap;
use std::time::Duration;

use scyflow_core::model::{ConfigMap, Port};
use uuid::Uuid;

pub use error::ArtifactError;
pub use locate::{extract_file_location, rewrite_host, FileLocation};
pub use pool::{ClientGroupKey, S3ClientPool};

/// Static configuration for presigning and host rewriting.
#[derive(Debug, Clone)]
pub struct ArtifactLocatorConfig {
    /// The S3-compatible host ports are configured against internally.
    pub internal_host: String,
    /// The externally reachable base URL to rewrite presigned URLs onto
    /// (e.g. `https://files.example.invalid`), when a presigned URL's host
    /// matches `internal_host`.
    pub external_base_url: String,
    /// TTL for presigned download (`GET`) URLs.
    pub presigned_get_ttl: Duration,
    /// TTL for presigned upload (`PUT`) URLs.
    pub presigned_put_ttl: Duration,
}

/// Resolves FILE-typed ports to time-limited S3 URLs, reusing one client
/// per distinct connection parameter tuple across calls.
#[derive(Debug, Clone)]
pub struct ArtifactLocator {
    pool: S3ClientPool,
    config: ArtifactLocatorConfig,
}

impl ArtifactLocator {
    pub fn new(config: ArtifactLocatorConfig) -> Self {
        Self {
            pool: S3ClientPool::new(),
            config,
        }
    }

    /// Resolves download URLs for every port in `ports` whose config is
    /// fully populated and whose object can be found. Ports that fail
    /// either check are silently omitted from the result (logged at warn).
    pub async fn bulk_download_urls(&self, ports: &[&Port]) -> HashMap<Uuid, String> {
        locate::bulk_download_urls(
            ports,
            &self.pool,
            &self.config.internal_host,
            &self.config.external_base_url,
            self.config.presigned_get_ttl,
        )
        .await
    }

    /// Resolves a single port's upload URL, or `None` if its config is
    /// missing a required storage key.
    pub async fn upload_url(&self, config: &ConfigMap) -> Result<Option<String>, ArtifactError> {
        upload::upload_url(
            config,
            &self.pool,
            &self.config.internal_host,
            &self.config.external_base_url,
            self.config.presigned_put_ttl,
        )
        .await
    }
}
