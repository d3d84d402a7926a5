//! Error types for code generation.

use std::path::PathBuf;
use thiserror::Error;

/// Error type for code generation operations.
#[derive(Debug, Error)]
pub enum CodegenError {
    /// Schema parsing error.
    #[error("schema parse error: {0}")]
    Parse(#[from] nwbgen_schema::ParseError),

    /// Schema loading or validation error.
    #[error("schema error: {0}")]
    Schema(#[from] nwbgen_schema::SchemaError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An artifact could not be written.
    #[error("failed to write '{path}': {source}")]
    Write {
        /// Destination path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Embedded text would terminate the raw string literal holding it.
    #[error("schema text '{identifier}' contains the raw string terminator")]
    UnsafeEmbeddedText {
        /// Constant the text was meant for.
        identifier: String,
    },

    /// Type not present in the registry.
    #[error("type '{name}' is not registered")]
    UnknownType {
        /// Type name.
        name: String,
    },

    /// Invalid generator configuration.
    #[error("invalid configuration: {message}")]
    Config {
        /// Error message.
        message: String,
    },

    /// Code generation error.
    #[error("generation error: {message}")]
    Generation {
        /// Error message.
        message: String,
    },
}

impl CodegenError {
    /// Creates a generation error with the given message.
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation {
            message: message.into(),
        }
    }

    /// Creates a write error for the given path.
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }
}
