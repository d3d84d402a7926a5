//! Schema document reader.
//!
//! Documents are decoded once into a [`serde_json::Value`], which keeps the
//! source key order, and then into the typed model. The value is what gets
//! re-serialised when a schema is embedded in generated code.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::Path;

use crate::error::ParseError;
use crate::namespace::NamespaceFile;
use crate::spec::SchemaDocument;

/// On-disk encoding of a schema document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaFormat {
    /// YAML (`.yaml`, `.yml`).
    Yaml,
    /// JSON (`.json`).
    Json,
}

impl SchemaFormat {
    /// Picks the format from the file extension.
    ///
    /// # Errors
    /// Returns [`ParseError::UnsupportedFormat`] for any other extension.
    pub fn from_path(path: &Path) -> Result<Self, ParseError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Ok(Self::Yaml),
            Some("json") => Ok(Self::Json),
            _ => Err(ParseError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

/// A decoded document together with its raw value.
#[derive(Debug, Clone)]
pub struct Parsed<T> {
    /// Typed view.
    pub document: T,
    /// Raw value in source key order.
    pub value: Value,
}

/// Decodes text into a raw value.
///
/// # Errors
/// Returns `ParseError` if the text is not valid YAML or JSON.
pub fn parse_value(text: &str, format: SchemaFormat) -> Result<Value, ParseError> {
    let value = match format {
        SchemaFormat::Yaml => serde_yaml::from_str::<Value>(text)?,
        SchemaFormat::Json => serde_json::from_str::<Value>(text)?,
    };
    Ok(value)
}

fn parse_typed<T: DeserializeOwned>(
    text: &str,
    format: SchemaFormat,
) -> Result<Parsed<T>, ParseError> {
    let value = parse_value(text, format)?;
    // An empty YAML file decodes to null.
    let value = if value.is_null() {
        Value::Object(serde_json::Map::new())
    } else {
        value
    };
    if !value.is_object() {
        return Err(ParseError::structure("document root must be a mapping"));
    }
    let document = serde_json::from_value(value.clone())?;
    Ok(Parsed { document, value })
}

/// Parses a schema source document.
///
/// # Errors
/// Returns `ParseError` if decoding fails or the structure is invalid.
pub fn parse_schema_document(
    text: &str,
    format: SchemaFormat,
) -> Result<Parsed<SchemaDocument>, ParseError> {
    parse_typed(text, format)
}

/// Parses a namespace document.
///
/// # Errors
/// Returns `ParseError` if decoding fails or the structure is invalid.
pub fn parse_namespace_document(
    text: &str,
    format: SchemaFormat,
) -> Result<Parsed<NamespaceFile>, ParseError> {
    parse_typed(text, format)
}

/// Reads and parses a schema source file.
///
/// # Errors
/// Returns `ParseError` if reading, decoding or validation fails.
pub fn read_schema_document(path: &Path) -> Result<Parsed<SchemaDocument>, ParseError> {
    let format = SchemaFormat::from_path(path)?;
    let text = std::fs::read_to_string(path)?;
    parse_schema_document(&text, format)
}

/// Reads and parses a namespace file.
///
/// # Errors
/// Returns `ParseError` if reading, decoding or validation fails.
pub fn read_namespace_document(path: &Path) -> Result<Parsed<NamespaceFile>, ParseError> {
    let format = SchemaFormat::from_path(path)?;
    let text = std::fs::read_to_string(path)?;
    parse_namespace_document(&text, format)
}

/// Serialises a value as compact JSON, preserving key order.
///
/// # Errors
/// Returns `ParseError` if the value cannot be encoded.
pub fn canonical_json(value: &Value) -> Result<String, ParseError> {
    Ok(serde_json::to_string(value)?)
}

/// Returns true if the path names a namespace file.
#[must_use]
pub fn is_namespace_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| {
            n.ends_with(".namespace.yaml")
                || n.ends_with(".namespace.yml")
                || n.ends_with(".namespace.json")
                || n == "namespace.yaml"
                || n == "namespace.json"
        })
}
