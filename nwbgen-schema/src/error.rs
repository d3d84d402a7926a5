//! Error types for schema loading, inheritance resolution and field walking.

use std::path::PathBuf;
use thiserror::Error;

/// Error type for reading and decoding a single schema document.
#[derive(Debug, Error)]
pub enum ParseError {
    /// YAML decoding error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON decoding or encoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The file extension does not name a known schema format.
    #[error("unsupported schema format for '{path}' (expected .yaml, .yml or .json)")]
    UnsupportedFormat {
        /// Offending path.
        path: PathBuf,
    },

    /// A `quantity` value that is neither a count nor a known symbol.
    #[error("invalid quantity '{value}'")]
    InvalidQuantity {
        /// Raw value.
        value: String,
    },

    /// Invalid document structure.
    #[error("invalid schema structure: {message}")]
    InvalidStructure {
        /// Error message.
        message: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error type for namespace loading and type resolution.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A namespace file or one of its sources failed to parse.
    #[error("failed to load '{path}': {source}")]
    Load {
        /// File being loaded.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: ParseError,
    },

    /// An included namespace could not be located in any search directory.
    #[error("namespace '{name}' included by '{included_by}' was not found")]
    NamespaceNotFound {
        /// Missing namespace name.
        name: String,
        /// Namespace that asked for it.
        included_by: String,
    },

    /// A schema source listed by a namespace does not exist.
    #[error("schema source '{source_name}' of namespace '{namespace}' was not found")]
    SourceNotFound {
        /// Namespace declaring the source.
        namespace: String,
        /// Source as written in the namespace file.
        source_name: String,
    },

    /// Namespaces include each other.
    #[error("circular namespace include detected: {path}")]
    CircularInclude {
        /// Include chain.
        path: String,
    },

    /// Types inherit from each other.
    #[error("circular inheritance detected: {path}")]
    CircularInheritance {
        /// Inheritance chain.
        path: String,
    },

    /// Type not found.
    #[error("type '{name}' not found")]
    TypeNotFound {
        /// Type name.
        name: String,
    },

    /// A dataset or group is neither named nor typed.
    #[error("field at '{path}' in type '{type_name}' has neither a name nor a type")]
    AnonymousUntypedField {
        /// Containing type.
        type_name: String,
        /// Path prefix of the offending field.
        path: String,
    },

    /// No namespace files were found.
    #[error("no namespace files found under '{path}'")]
    NoNamespaces {
        /// Searched path.
        path: PathBuf,
    },

    /// Validation error.
    #[error("validation error: {message}")]
    Validation {
        /// Error message.
        message: String,
    },
}

impl ParseError {
    /// Creates an invalid structure error.
    pub fn structure(message: impl Into<String>) -> Self {
        Self::InvalidStructure {
            message: message.into(),
        }
    }
}

impl SchemaError {
    /// Wraps a parse error with the path that produced it.
    pub fn load(path: impl Into<PathBuf>, source: ParseError) -> Self {
        Self::Load {
            path: path.into(),
            source,
        }
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}
