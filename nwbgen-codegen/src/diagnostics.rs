//! Recoverable per-type findings.
//!
//! A diagnostic never stops a type from being generated; it marks a place
//! where the output fell back to a generic choice.

use std::fmt;
use thiserror::Error;

/// What went wrong.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiagnosticKind {
    /// The parent type is not defined by any loaded namespace.
    #[error("parent type '{parent}' is unresolved, falling back to '{fallback}'")]
    UnresolvedParent {
        /// Declared parent.
        parent: String,
        /// Base class used instead.
        fallback: String,
    },

    /// A dtype with no C++ mapping.
    #[error("field '{field}' has unsupported dtype ({dtype}), using an opaque value")]
    UnsupportedDtype {
        /// Field path.
        field: String,
        /// Description of the dtype.
        dtype: String,
    },

    /// A default or fixed value that cannot be rendered.
    #[error("field '{field}' has a default that cannot be rendered: {reason}")]
    UnsupportedDefault {
        /// Field path.
        field: String,
        /// Why rendering failed.
        reason: String,
    },

    /// Two fields produced the same parameter name.
    #[error("parameter name '{name}' of field '{field}' was already taken, renamed to '{renamed}'")]
    RenamedParameter {
        /// Field path.
        field: String,
        /// Name derived from the path.
        name: String,
        /// Name actually used.
        renamed: String,
    },
}

/// A diagnostic attached to one generated type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Type the diagnostic belongs to.
    pub type_name: String,
    /// Details.
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    /// Creates a diagnostic for a type.
    pub fn new(type_name: impl Into<String>, kind: DiagnosticKind) -> Self {
        Self {
            type_name: type_name.into(),
            kind,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.type_name, self.kind)
    }
}
