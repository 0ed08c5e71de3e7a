//! The wire shape of a compute block manifest (`cbc.yaml`).

use std::collections::BTreeMap;

use scyflow_core::model::{ConfigMap, DataType};
use serde::Deserialize;

/// A parsed, not-yet-persisted compute block manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct BlockManifest {
    /// The block's declared name.
    pub name: String,
    /// Human description.
    #[serde(default)]
    pub description: Option<String>,
    /// Manifest author.
    #[serde(default)]
    pub author: Option<String>,
    /// Container image reference.
    pub docker_image: String,
    /// Invocation surfaces, keyed by entrypoint name.
    pub entrypoints: BTreeMap<String, EntrypointManifest>,
}

/// One invocation surface declared by a manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct EntrypointManifest {
    /// Human description.
    #[serde(default)]
    pub description: Option<String>,
    /// Environment map passed to the container.
    #[serde(default)]
    pub envs: ConfigMap,
    /// Declared input ports, keyed by logical name.
    #[serde(default)]
    pub inputs: BTreeMap<String, PortManifest>,
    /// Declared output ports, keyed by logical name.
    #[serde(default)]
    pub outputs: BTreeMap<String, PortManifest>,
}

/// One input or output port declared by a manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct PortManifest {
    /// The manifest's raw type string (`"file"`, `"db_table"`, or anything
    /// else, which is treated as `Custom`).
    #[serde(rename = "type")]
    pub type_: String,
    /// Human description.
    #[serde(default)]
    pub description: Option<String>,
    /// Declared config map.
    #[serde(default)]
    pub config: ConfigMap,
}

impl PortManifest {
    /// Normalizes the manifest's raw type string into a [`DataType`].
    pub fn data_type(&self) -> DataType {
        match self.type_.as_str() {
            "file" => DataType::File,
            "db_table" => DataType::PgTable,
            _ => DataType::Custom,
        }
    }
}

pub(crate) fn parse(raw: &str) -> Result<BlockManifest, serde_yml::Error> {
    serde_yml::from_str(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_manifest() {
        let yaml = r#"
name: ingest-csv
description: Ingests a CSV into a table
author: platform-team
docker_image: registry.example/ingest-csv:1.0
entrypoints:
  main:
    description: default entrypoint
    envs:
      LOG_LEVEL: "info"
    inputs:
      raw_file:
        type: file
        description: input csv
        config:
          S3_HOST: ""
          FILE_PATH: ""
          FILE_NAME: ""
    outputs:
      table:
        type: db_table
        description: output table
        config:
          PG_HOST: ""
          DB_TABLE: ""
"#;
        let manifest = parse(yaml).unwrap();
        assert_eq!(manifest.name, "ingest-csv");
        let main = manifest.entrypoints.get("main").unwrap();
        assert_eq!(main.inputs.get("raw_file").unwrap().data_type(), DataType::File);
        assert_eq!(main.outputs.get("table").unwrap().data_type(), DataType::PgTable);
    }

    #[test]
    fn unknown_type_strings_become_custom() {
        let port = PortManifest {
            type_: "message_queue".into(),
            description: None,
            config: ConfigMap::new(),
        };
        assert_eq!(port.data_type(), DataType::Custom);
    }
}
