//! Configuration Engine (§4.D): the rules every mutation of a config map
//! must go through. Pure in-memory logic — callers own persistence and
//! cascading across edges (the store knows which ports are downstream of
//! which; this module only knows how to transform one map given another).

use crate::defaults::{apply_defaults_cascade, FileDefaults, PgTableDefaults, FILE_DEFAULT_KEYS, PGTABLE_DEFAULT_KEYS};
use crate::error::CoreError;
use crate::model::{ConfigMap, DataType, Direction, Port};

/// The default key set for a `data_type`, or `None` for `Custom` (which has
/// no defaulting behavior at all).
pub fn default_keys_for(data_type: DataType) -> Option<&'static [&'static str]> {
    match data_type {
        DataType::File => Some(FILE_DEFAULT_KEYS),
        DataType::PgTable => Some(PGTABLE_DEFAULT_KEYS),
        DataType::Custom => None,
    }
}

/// Validates invariants 1 and 3: the edge runs from an `OUTPUT` to an
/// `INPUT`, and both ports share a `data_type` unless that type is
/// `Custom`.
pub fn validate_edge(source: &Port, target: &Port) -> Result<(), CoreError> {
    if source.direction != Direction::Output || target.direction != Direction::Input {
        return Err(CoreError::WrongDirection);
    }
    if source.data_type != target.data_type {
        return Err(CoreError::TypeMismatch {
            source_type: format!("{:?}", source.data_type),
            target_type: format!("{:?}", target.data_type),
        });
    }
    Ok(())
}

/// Applies default-config to a newly-ingested `OUTPUT` port, per the
/// "default assignment on manifest ingestion" rule. `INPUT` ports and
/// `Custom`-typed ports are left as declared by the manifest.
pub fn assign_output_defaults(
    port: &mut Port,
    file: &FileDefaults,
    pg: &PgTableDefaults,
) {
    if port.direction != Direction::Output {
        return;
    }
    let defaults = match port.data_type {
        DataType::File => file.build(&port.name),
        DataType::PgTable => pg.build(&port.name),
        DataType::Custom => return,
    };
    let keys = default_keys_for(port.data_type).unwrap_or(&[]);
    for (key, value) in port.config.iter_mut() {
        if let Some(dk) = keys.iter().find(|dk| key.contains(*dk)) {
            if let Some(v) = defaults.get(*dk) {
                *value = v.clone();
            }
        }
    }
}

/// Propagates a freshly-created (or updated) upstream `OUTPUT`'s config
/// onto a downstream `INPUT`, per the edge-creation and port-update-cascade
/// rules. No-op for `Custom`-typed ports — propagation across them is
/// opt-in and never automatic.
pub fn propagate(source: &Port, target: &mut Port) {
    let Some(keys) = default_keys_for(source.data_type) else {
        return;
    };
    apply_defaults_cascade(&source.config, &mut target.config, keys);
}

/// Validates invariant 4: every key of `update` must already exist in
/// `existing`. Returns the offending keys on failure.
pub fn check_key_subset(existing: &ConfigMap, update: &ConfigMap) -> Result<(), CoreError> {
    let unknown: Vec<String> = update
        .keys()
        .filter(|k| !existing.contains_key(k.as_str()))
        .cloned()
        .collect();
    if unknown.is_empty() {
        Ok(())
    } else {
        Err(CoreError::ConfigKeysMismatch(unknown))
    }
}

/// Validates the key-subset rule, then merges `update` into `existing`
/// (update wins on overlapping keys).
pub fn merge_checked(existing: &mut ConfigMap, update: ConfigMap) -> Result<(), CoreError> {
    check_key_subset(existing, &update)?;
    existing.extend(update);
    Ok(())
}
