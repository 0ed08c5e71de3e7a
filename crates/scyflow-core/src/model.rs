//! The entities of §3: `Project`, `Block`, `Entrypoint`, `Port`, `Edge`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier type used for every entity in the graph.
pub type ScyflowUuid = Uuid;

/// A value that can live in a port's or entrypoint's config map.
///
/// Restricted to what the manifest/template formats can express: scalars, a
/// homogeneous-ish list, a nested map (used by `CUSTOM` ports), or null,
/// matching the `scalar | list | null` shape named in the data model plus
/// the nested-map extension `CUSTOM` ports need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    /// Absence of a value. Distinct from an unset key.
    Null,
    /// A boolean.
    Bool(bool),
    /// A number (integer or float).
    Number(serde_json::Number),
    /// A string.
    String(String),
    /// An ordered list of values.
    List(Vec<ConfigValue>),
    /// A nested map, used by `CUSTOM`-typed ports.
    Map(BTreeMap<String, ConfigValue>),
}

impl Default for ConfigValue {
    fn default() -> Self {
        ConfigValue::Null
    }
}

impl ConfigValue {
    /// True for null, the empty string, the empty list, and the empty map —
    /// the "unconfigured" predicate used throughout §4.D and §4.I.
    pub fn is_unconfigured(&self) -> bool {
        match self {
            ConfigValue::Null => true,
            ConfigValue::String(s) => s.is_empty(),
            ConfigValue::List(v) => v.is_empty(),
            ConfigValue::Map(m) => m.is_empty(),
            ConfigValue::Bool(_) | ConfigValue::Number(_) => false,
        }
    }

    /// Renders the value the way the DAG compiler flattens it into a task's
    /// environment: lists become their JSON textual form, everything else
    /// (including maps) is stringified, null becomes the empty string.
    pub fn to_env_string(&self) -> String {
        match self {
            ConfigValue::Null => String::new(),
            ConfigValue::Bool(b) => b.to_string(),
            ConfigValue::Number(n) => n.to_string(),
            ConfigValue::String(s) => s.clone(),
            ConfigValue::List(_) | ConfigValue::Map(_) => {
                serde_json::to_string(self).unwrap_or_default()
            }
        }
    }
}

/// A config map: key to value, ordered for deterministic rendering.
pub type ConfigMap = BTreeMap<String, ConfigValue>;

/// The storage kind declared by a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// An object-store file.
    File,
    /// A relational table.
    #[serde(rename = "db_table")]
    PgTable,
    /// Anything else; propagation across edges of this type is opt-in.
    Custom,
}

/// The role a port plays on its entrypoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    /// Consumes a value; may be wired to at most the edges that target it.
    Input,
    /// Produces a value; may fan out to many downstream inputs.
    Output,
}

/// A project: the unit of ownership for blocks, and the authorization
/// boundary (membership is checked, never owned data).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Primary identifier.
    pub id: ScyflowUuid,
    /// Human-readable name.
    pub name: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Member user ids. Authorization only — never owned data.
    pub users: Vec<ScyflowUuid>,
    /// Default retry count applied to blocks that don't override it.
    pub default_retries: i32,
}

/// Airflow task-scheduling hints carried unchanged into the DAG compiler.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulingHints {
    /// Task priority weight, if the user overrode the project default.
    pub priority_weight: Option<i32>,
    /// Number of retries on task failure.
    pub retries: i32,
    /// Delay between retries, in seconds.
    pub retry_delay_secs: i32,
}

/// A compute node in a project's pipeline graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    /// Primary identifier.
    pub id: ScyflowUuid,
    /// Owning project.
    pub project_id: ScyflowUuid,
    /// The name declared in the source manifest.
    pub name: String,
    /// The user-chosen display name, unique within the project.
    pub custom_name: String,
    /// Human description, from the manifest.
    pub description: Option<String>,
    /// Manifest author.
    pub author: Option<String>,
    /// Container image reference.
    pub docker_image: String,
    /// URL of the source manifest repository.
    pub repo_url: String,
    /// Canvas X position.
    pub x_pos: f64,
    /// Canvas Y position.
    pub y_pos: f64,
    /// The entrypoint this block currently invokes.
    pub selected_entrypoint_id: Option<ScyflowUuid>,
    /// Scheduling hints passed to the DAG compiler.
    pub scheduling: SchedulingHints,
}

/// A named invocation surface of a block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entrypoint {
    /// Primary identifier.
    pub id: ScyflowUuid,
    /// Owning block.
    pub block_id: ScyflowUuid,
    /// Entrypoint name, as declared in the manifest.
    pub name: String,
    /// Human description.
    pub description: Option<String>,
    /// Environment map passed to the container at invocation.
    pub envs: ConfigMap,
}

/// A typed input or output port on an entrypoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Port {
    /// Primary identifier.
    pub id: ScyflowUuid,
    /// Owning entrypoint.
    pub entrypoint_id: ScyflowUuid,
    /// `INPUT` or `OUTPUT`.
    pub direction: Direction,
    /// Logical name, unique per direction per entrypoint.
    pub name: String,
    /// Storage kind.
    pub data_type: DataType,
    /// Human description.
    pub description: Option<String>,
    /// Port-local configuration.
    pub config: ConfigMap,
}

/// A directed connection from one `OUTPUT` port to one `INPUT` port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// The block owning the source port.
    pub upstream_block_id: ScyflowUuid,
    /// The `OUTPUT` port the edge originates from.
    pub upstream_output_id: ScyflowUuid,
    /// The block owning the target port.
    pub downstream_block_id: ScyflowUuid,
    /// The `INPUT` port the edge terminates at.
    pub downstream_input_id: ScyflowUuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_predicate_matches_spec_boundary_cases() {
        assert!(ConfigValue::Null.is_unconfigured());
        assert!(ConfigValue::String(String::new()).is_unconfigured());
        assert!(ConfigValue::List(vec![]).is_unconfigured());
        assert!(ConfigValue::Map(BTreeMap::new()).is_unconfigured());
        assert!(!ConfigValue::String("x".into()).is_unconfigured());
        assert!(!ConfigValue::Bool(false).is_unconfigured());
        assert!(!ConfigValue::Number(0.into()).is_unconfigured());
    }

    #[test]
    fn env_string_encodes_lists_as_json() {
        let v = ConfigValue::List(vec![ConfigValue::String("a".into()), ConfigValue::Number(1.into())]);
        assert_eq!(v.to_env_string(), "[\"a\",1]");
    }
}
