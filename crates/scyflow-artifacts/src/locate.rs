//! Resolves FILE-typed ports to time-limited download URLs: extracts each
//! port's storage location, groups ports that share a bucket to reuse S3
//! clients and list calls, matches the configured object, and presigns.

use std::collections::HashMap;
use std::time::Duration;

use aws_sdk_s3::presigning::PresigningConfig;
use scyflow_core::defaults::{extract_defaults, FILE_DEFAULT_KEYS};
use scyflow_core::model::{ConfigMap, Port};
use tracing::warn;
use uuid::Uuid;

use crate::error::ArtifactError;
use crate::pool::{ClientGroupKey, S3ClientPool};

/// Where a FILE-typed port's default config says its object lives.
#[derive(Debug, Clone)]
pub struct FileLocation {
    pub host: String,
    pub port: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    pub file_path: String,
    pub file_name: String,
}

impl FileLocation {
    fn group_key(&self) -> ClientGroupKey {
        ClientGroupKey {
            host: self.host.clone(),
            port: self.port.clone(),
            access_key: self.access_key.clone(),
            secret_key: self.secret_key.clone(),
            bucket: self.bucket.clone(),
        }
    }
}

/// Extracts a port's file location from its config, using the same
/// substring-matching default-key recovery the configuration engine uses.
/// `FILE_PATH` is allowed to be the empty string (bucket root); every other
/// key must be present and non-empty, or `None` is returned.
pub fn extract_file_location(config: &ConfigMap) -> Option<FileLocation> {
    let extracted = extract_defaults(config, FILE_DEFAULT_KEYS);

    let get = |key: &str| extracted.get(key).map(|v| v.to_env_string());
    let required = ["S3_HOST", "S3_PORT", "S3_ACCESS_KEY", "S3_SECRET_KEY", "BUCKET_NAME", "FILE_NAME"];
    for key in required {
        match get(key) {
            Some(v) if !v.is_empty() => {}
            _ => return None,
        }
    }

    Some(FileLocation {
        host: get("S3_HOST")?,
        port: get("S3_PORT")?,
        access_key: get("S3_ACCESS_KEY")?,
        secret_key: get("S3_SECRET_KEY")?,
        bucket: get("BUCKET_NAME")?,
        file_path: get("FILE_PATH").unwrap_or_default(),
        file_name: get("FILE_NAME")?,
    })
}

/// Rewrites a presigned URL's host:port authority to an externally
/// reachable one, when it matches the configured internal data-plane host.
pub fn rewrite_host(url: &str, internal_host: &str, internal_port: &str, external_base: &str) -> String {
    let internal_authority = format!("{internal_host}:{internal_port}");
    if let Some(after_scheme) = url.splitn(2, "://").nth(1) {
        if after_scheme.starts_with(&internal_authority) {
            let rest = &after_scheme[internal_authority.len()..];
            return format!("{}{}", external_base.trim_end_matches('/'), rest);
        }
    }
    url.to_string()
}

/// Resolves download URLs for every FILE-typed port whose config is fully
/// populated. Ports with missing keys or no matching object are silently
/// skipped (logged at `warn`) rather than failing the whole batch.
pub async fn bulk_download_urls(
    ports: &[&Port],
    pool: &S3ClientPool,
    internal_host: &str,
    external_base: &str,
    ttl: Duration,
) -> HashMap<Uuid, String> {
    let mut by_group: HashMap<ClientGroupKey, Vec<(Uuid, FileLocation)>> = HashMap::new();

    for port in ports {
        match extract_file_location(&port.config) {
            Some(location) => by_group.entry(location.group_key()).or_default().push((port.id, location)),
            None => warn!(port_id = %port.id, "FILE port is missing required storage keys, skipping"),
        }
    }

    let mut urls = HashMap::new();
    for (key, members) in by_group {
        let client = pool.get_or_build(&key).await;

        let mut by_prefix: HashMap<String, Vec<(Uuid, FileLocation)>> = HashMap::new();
        for member in members {
            by_prefix.entry(member.1.file_path.clone()).or_default().push(member);
        }

        for (prefix, members) in by_prefix {
            let listed = match list_object_keys(&client, &key.bucket, &prefix).await {
                Ok(listed) => listed,
                Err(e) => {
                    warn!(bucket = %key.bucket, prefix = %prefix, error = %e, "could not list bucket, skipping group");
                    continue;
                }
            };

            for (port_id, location) in members {
                let Some(object_key) = listed.iter().find(|k| k.contains(&location.file_name)) else {
                    warn!(port_id = %port_id, file_name = %location.file_name, "no object matched, skipping");
                    continue;
                };

                match presign_get(&client, &key.bucket, object_key, ttl).await {
                    Ok(url) => {
                        let rewritten = rewrite_host(&url, internal_host, &location.port, external_base);
                        urls.insert(port_id, rewritten);
                    }
                    Err(e) => warn!(port_id = %port_id, error = %e, "could not presign GET URL, skipping"),
                }
            }
        }
    }

    urls
}

async fn list_object_keys(
    client: &aws_sdk_s3::Client,
    bucket: &str,
    prefix: &str,
) -> Result<Vec<String>, ArtifactError> {
    let output = client
        .list_objects_v2()
        .bucket(bucket)
        .prefix(prefix)
        .send()
        .await
        .map_err(|e| ArtifactError::List(e.to_string()))?;

    Ok(output
        .contents()
        .iter()
        .filter_map(|o| o.key().map(str::to_string))
        .collect())
}

async fn presign_get(
    client: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
    ttl: Duration,
) -> Result<String, ArtifactError> {
    let presigning_config = PresigningConfig::builder()
        .expires_in(ttl)
        .build()
        .map_err(|e| ArtifactError::Presign(e.to_string()))?;
    let presigned = client
        .get_object()
        .bucket(bucket)
        .key(key)
        .presigned(presigning_config)
        .await
        .map_err(|e| ArtifactError::Presign(e.to_string()))?;
    Ok(presigned.uri().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scyflow_core::model::ConfigValue;

    fn file_config() -> ConfigMap {
        let mut c = ConfigMap::new();
        c.insert("S3_HOST".into(), ConfigValue::String("minio-internal".into()));
        c.insert("S3_PORT".into(), ConfigValue::String("9000".into()));
        c.insert("S3_ACCESS_KEY".into(), ConfigValue::String("ak".into()));
        c.insert("S3_SECRET_KEY".into(), ConfigValue::String("sk".into()));
        c.insert("BUCKET_NAME".into(), ConfigValue::String("data".into()));
        c.insert("FILE_PATH".into(), ConfigValue::String(String::new()));
        c.insert("FILE_NAME".into(), ConfigValue::String("file_out_abc123".into()));
        c
    }

    #[test]
    fn extracts_a_fully_populated_file_port() {
        let location = extract_file_location(&file_config()).unwrap();
        assert_eq!(location.host, "minio-internal");
        assert_eq!(location.file_name, "file_out_abc123");
        assert_eq!(location.file_path, "");
    }

    #[test]
    fn missing_required_key_yields_none() {
        let mut config = file_config();
        config.remove("S3_ACCESS_KEY");
        assert!(extract_file_location(&config).is_none());
    }

    #[test]
    fn empty_file_path_does_not_block_extraction() {
        let config = file_config();
        assert!(extract_file_location(&config).is_some());
    }

    #[test]
    fn host_is_rewritten_only_when_it_matches_the_internal_host() {
        let url = "http://minio-internal:9000/data/file_out_abc123?X-Amz-Signature=x";
        let rewritten = rewrite_host(url, "minio-internal", "9000", "https://files.example.invalid");
        assert_eq!(
            rewritten,
            "https://files.example.invalid/data/file_out_abc123?X-Amz-Signature=x"
        );

        let untouched = rewrite_host(url, "some-other-host", "9000", "https://files.example.invalid");
        assert_eq!(untouched, url);
    }
}
