//! Caches S3-compatible clients keyed by connection parameters, so ports
//! sharing a bucket reuse one client instead of one per port.

use std::collections::HashMap;
use std::sync::Arc;

use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::Client;
use tokio::sync::RwLock;

/// The tuple of connection parameters that identifies one reusable client.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientGroupKey {
    pub host: String,
    pub port: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
}

/// A process-lifetime cache of S3 clients, one per distinct connection
/// parameter tuple.
#[derive(Debug, Clone, Default)]
pub struct S3ClientPool {
    clients: Arc<RwLock<HashMap<ClientGroupKey, Client>>>,
}

impl S3ClientPool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached client for `key`, building and inserting one if
    /// this is the first request for that connection parameter tuple.
    pub async fn get_or_build(&self, key: &ClientGroupKey) -> Client {
        if let Some(client) = self.clients.read().await.get(key) {
            return client.clone();
        }

        let mut guard = self.clients.write().await;
        if let Some(client) = guard.get(key) {
            return client.clone();
        }

        let client = build_client(key);
        guard.insert(key.clone(), client.clone());
        client
    }
}

fn build_client(key: &ClientGroupKey) -> Client {
    let credentials = Credentials::new(&key.access_key, &key.secret_key, None, None, "scyflow");
    let config = aws_sdk_s3::Config::builder()
        .region(Region::new("us-east-1"))
        .endpoint_url(format!("http://{}:{}", key.host, key.port))
        .credentials_provider(credentials)
        .behavior_version_latest()
        .force_path_style(true)
        .build();
    Client::from_conf(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn the_same_key_returns_the_same_underlying_client_config() {
        let pool = S3ClientPool::new();
        let key = ClientGroupKey {
            host: "minio".into(),
            port: "9000".into(),
            access_key: "ak".into(),
            secret_key: "sk".into(),
            bucket: "data".into(),
        };
        let first = pool.get_or_build(&key).await;
        let second = pool.get_or_build(&key).await;
        assert_eq!(first.config().endpoint_url(), second.config().endpoint_url());
        assert_eq!(pool.clients.read().await.len(), 1);
    }

    #[tokio::test]
    async fn distinct_keys_get_distinct_clients() {
        let pool = S3ClientPool::new();
        let a = ClientGroupKey {
            host: "minio-a".into(),
            port: "9000".into(),
            access_key: "ak".into(),
            secret_key: "sk".into(),
            bucket: "data".into(),
        };
        let b = ClientGroupKey {
            host: "minio-b".into(),
            port: "9000".into(),
            access_key: "ak".into(),
            secret_key: "sk".into(),
            bucket: "data".into(),
        };
        pool.get_or_build(&a).await;
        pool.get_or_build(&b).await;
        assert_eq!(pool.clients.read().await.len(), 2);
    }
}
