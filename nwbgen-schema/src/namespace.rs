//! Namespace file model.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Contents of a `*.namespace.yaml` file.
#[derive(Debug, Clone, Deserialize)]
pub struct NamespaceFile {
    /// Declared namespaces.
    pub namespaces: Vec<NamespaceDef>,
}

/// A single namespace declaration.
#[derive(Debug, Clone, Deserialize)]
pub struct NamespaceDef {
    /// Namespace name, e.g. `core` or `hdmf-common`.
    pub name: String,
    /// Version string.
    #[serde(default, deserialize_with = "lenient_string")]
    pub version: Option<String>,
    /// Documentation.
    #[serde(default)]
    pub doc: Option<String>,
    /// Human readable name.
    #[serde(default)]
    pub full_name: Option<String>,
    /// Ordered schema entries.
    #[serde(default)]
    pub schema: Vec<SchemaEntry>,
}

/// Entry of a namespace's `schema` list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SchemaEntry {
    /// A schema source file, relative to the namespace file.
    Source {
        /// Source file name.
        source: String,
    },
    /// An included namespace, optionally filtered to some of its types.
    Include {
        /// Included namespace name.
        namespace: String,
        /// Types to import; all when absent.
        #[serde(default, alias = "neurodata_types")]
        data_types: Option<Vec<String>>,
    },
}

/// Accepts versions written as bare YAML numbers (`version: 1.0`).
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// Builds the manifest embedded next to a namespace's schema sources.
///
/// The manifest is the namespace declaration wrapped as
/// `{"namespaces": [<decl>]}`, with file extensions removed from `source`
/// entries so they match the embedded schema identifiers.
#[must_use]
pub fn manifest_value(declaration: &Value) -> Value {
    let mut decl = declaration.clone();
    if let Some(Value::Array(entries)) = decl.get_mut("schema") {
        for entry in entries {
            if let Some(Value::String(source)) = entry.get_mut("source") {
                *source = strip_schema_extension(source).to_string();
            }
        }
    }
    let mut root = serde_json::Map::new();
    root.insert("namespaces".to_string(), Value::Array(vec![decl]));
    Value::Object(root)
}

/// Removes a trailing `.yaml`, `.yml` or `.json` extension.
#[must_use]
pub fn strip_schema_extension(name: &str) -> &str {
    [".yaml", ".yml", ".json"]
        .iter()
        .find_map(|ext| name.strip_suffix(ext))
        .unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_namespace_entries() {
        let json = r#"{
            "namespaces": [{
                "name": "core",
                "version": 2.7,
                "schema": [
                    {"namespace": "hdmf-common", "neurodata_types": ["Data", "Container"]},
                    {"source": "nwb.base"},
                    {"source": "nwb.file.yaml"}
                ]
            }]
        }"#;
        let file: NamespaceFile = serde_json::from_str(json).expect("Failed to parse");
        let ns = &file.namespaces[0];
        assert_eq!(ns.version.as_deref(), Some("2.7"));
        assert_eq!(
            ns.schema[0],
            SchemaEntry::Include {
                namespace: "hdmf-common".to_string(),
                data_types: Some(vec!["Data".to_string(), "Container".to_string()]),
            }
        );
        assert_eq!(
            ns.schema[1],
            SchemaEntry::Source {
                source: "nwb.base".to_string()
            }
        );
    }

    #[test]
    fn test_manifest_strips_extensions() {
        let decl = serde_json::json!({
            "name": "core",
            "schema": [{"source": "nwb.base.yaml"}, {"namespace": "hdmf-common"}]
        });
        let manifest = manifest_value(&decl);
        assert_eq!(
            manifest["namespaces"][0]["schema"][0]["source"],
            serde_json::json!("nwb.base")
        );
        assert_eq!(
            manifest["namespaces"][0]["schema"][1]["namespace"],
            serde_json::json!("hdmf-common")
        );
    }
}
