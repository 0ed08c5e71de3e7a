//! Default-Config Provider (§4.B): the settings descriptors for each typed
//! `data_type`, and the substring-based key-matching algorithm that both
//! applies and recovers them.

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::model::{ConfigMap, ConfigValue};

/// Default key set for FILE-typed ports. Declared once so both default
/// assignment and extraction use the exact same keys.
pub const FILE_DEFAULT_KEYS: &[&str] = &[
    "S3_HOST",
    "S3_PORT",
    "S3_ACCESS_KEY",
    "S3_SECRET_KEY",
    "BUCKET_NAME",
    "FILE_PATH",
    "FILE_NAME",
];

/// Default key set for `PGTABLE`-typed ports.
pub const PGTABLE_DEFAULT_KEYS: &[&str] = &["PG_USER", "PG_PASS", "PG_HOST", "PG_PORT", "DB_TABLE"];

/// Process-wide values used to build FILE defaults. Populated once at
/// startup from configuration; never read from the environment directly by
/// this crate.
#[derive(Debug, Clone)]
pub struct FileDefaults {
    /// Internal S3-compatible host.
    pub s3_host: String,
    /// Internal S3-compatible port.
    pub s3_port: u16,
    /// Default access key for the data-plane bucket.
    pub s3_access_key: String,
    /// Default secret key for the data-plane bucket.
    pub s3_secret_key: String,
    /// Default bucket name.
    pub bucket_name: String,
}

impl FileDefaults {
    /// Builds the default config map for a FILE output named `io_name`.
    ///
    /// `FILE_NAME` embeds a fresh UUID so that, per the data model's
    /// uniqueness note, a later prefix-match against the bucket can never
    /// collide with another port's default object.
    pub fn build(&self, io_name: &str) -> ConfigMap {
        let mut m = ConfigMap::new();
        m.insert("S3_HOST".into(), ConfigValue::String(self.s3_host.clone()));
        m.insert("S3_PORT".into(), ConfigValue::String(self.s3_port.to_string()));
        m.insert(
            "S3_ACCESS_KEY".into(),
            ConfigValue::String(self.s3_access_key.clone()),
        );
        m.insert(
            "S3_SECRET_KEY".into(),
            ConfigValue::String(self.s3_secret_key.clone()),
        );
        m.insert(
            "BUCKET_NAME".into(),
            ConfigValue::String(self.bucket_name.clone()),
        );
        m.insert("FILE_PATH".into(), ConfigValue::String(String::new()));
        m.insert(
            "FILE_NAME".into(),
            ConfigValue::String(format!("file_{io_name}_{}", Uuid::new_v4())),
        );
        m
    }
}

/// Process-wide values used to build `PGTABLE` defaults.
#[derive(Debug, Clone)]
pub struct PgTableDefaults {
    /// Default relational user.
    pub pg_user: String,
    /// Default relational password.
    pub pg_pass: String,
    /// Default relational host.
    pub pg_host: String,
    /// Default relational port.
    pub pg_port: u16,
}

impl PgTableDefaults {
    /// Builds the default config map for a `PGTABLE` output named `io_name`.
    pub fn build(&self, io_name: &str) -> ConfigMap {
        let mut m = ConfigMap::new();
        m.insert("PG_USER".into(), ConfigValue::String(self.pg_user.clone()));
        m.insert("PG_PASS".into(), ConfigValue::String(self.pg_pass.clone()));
        m.insert("PG_HOST".into(), ConfigValue::String(self.pg_host.clone()));
        m.insert("PG_PORT".into(), ConfigValue::String(self.pg_port.to_string()));
        m.insert(
            "DB_TABLE".into(),
            ConfigValue::String(format!("table_{io_name}_{}", Uuid::new_v4())),
        );
        m
    }
}

/// Asserts that no default key in `keys` is a substring of another. This is
/// a programmer error, not a runtime condition: call it once per settings
/// descriptor at process startup, not per request.
pub fn assert_default_keys_distinct(keys: &[&str]) -> Result<(), crate::error::CoreError> {
    for (i, a) in keys.iter().enumerate() {
        for (j, b) in keys.iter().enumerate() {
            if i != j && b.contains(a) {
                return Err(crate::error::CoreError::AmbiguousDefaultKeys(
                    (*a).to_string(),
                    (*b).to_string(),
                ));
            }
        }
    }
    Ok(())
}

/// Scans `config` for keys that contain one of `default_keys` as a
/// substring, returning the extracted value under the bare default-key
/// name. The first matching default key wins, matching the walrus/`next`
/// linear scan this is ported from.
pub fn extract_defaults(config: &ConfigMap, default_keys: &[&str]) -> BTreeMap<String, ConfigValue> {
    let mut out = BTreeMap::new();
    for (key, value) in config {
        if let Some(dk) = default_keys.iter().find(|dk| key.contains(*dk)) {
            out.insert((*dk).to_string(), value.clone());
        }
    }
    out
}

/// Applies the values `extract_defaults(source_config)` recovers onto every
/// key of `target_config` that matches the same default key. Keys of
/// `target_config` with no matching default key, and default keys absent
/// from the source, are left untouched.
pub fn apply_defaults_cascade(
    source_config: &ConfigMap,
    target_config: &mut ConfigMap,
    default_keys: &[&str],
) {
    let extracted = extract_defaults(source_config, default_keys);
    for (key, value) in target_config.iter_mut() {
        if let Some(dk) = default_keys.iter().find(|dk| key.contains(*dk)) {
            if let Some(v) = extracted.get(*dk) {
                *value = v.clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_keys_pass() {
        assert!(assert_default_keys_distinct(FILE_DEFAULT_KEYS).is_ok());
        assert!(assert_default_keys_distinct(PGTABLE_DEFAULT_KEYS).is_ok());
    }

    #[test]
    fn substring_collision_is_rejected() {
        let keys = ["S3_HOST", "S3_HOST_PORT"];
        assert!(assert_default_keys_distinct(&keys).is_err());
    }

    #[test]
    fn extract_defaults_matches_namespaced_keys() {
        let mut config = ConfigMap::new();
        config.insert(
            "INPUT1_S3_HOST".into(),
            ConfigValue::String("internal-minio".into()),
        );
        config.insert("UNRELATED".into(), ConfigValue::String("x".into()));
        let extracted = extract_defaults(&config, FILE_DEFAULT_KEYS);
        assert_eq!(
            extracted.get("S3_HOST"),
            Some(&ConfigValue::String("internal-minio".into()))
        );
        assert_eq!(extracted.len(), 1);
    }

    #[test]
    fn cascade_only_touches_matching_keys_and_leaves_unset_source_values_alone() {
        let mut source = ConfigMap::new();
        source.insert("S3_HOST".into(), ConfigValue::String("minio".into()));
        // FILE_NAME intentionally absent from source.

        let mut target = ConfigMap::new();
        target.insert("TARGET_S3_HOST".into(), ConfigValue::String("old".into()));
        target.insert(
            "TARGET_FILE_NAME".into(),
            ConfigValue::String("keep-me".into()),
        );
        target.insert("OTHER".into(), ConfigValue::String("untouched".into()));

        apply_defaults_cascade(&source, &mut target, FILE_DEFAULT_KEYS);

        assert_eq!(
            target.get("TARGET_S3_HOST"),
            Some(&ConfigValue::String("minio".into()))
        );
        assert_eq!(
            target.get("TARGET_FILE_NAME"),
            Some(&ConfigValue::String("keep-me".into()))
        );
        assert_eq!(
            target.get("OTHER"),
            Some(&ConfigValue::String("untouched".into()))
        );
    }
}
