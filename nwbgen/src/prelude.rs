//! Prelude module for convenient imports.
//!
//! ```ignore
//! use nwbgen::prelude::*;
//! ```

// Schema types
pub use nwbgen_schema::{
    CatalogOptions, FieldKind, FieldSpec, NamespaceCatalog, ParentRef, SchemaError, TypeRecord,
    TypeRegistry, WalkedField, walk_type,
};

// Generation types
pub use nwbgen_codegen::{
    CodegenError, Diagnostic, DiagnosticKind, Generator, GeneratorConfig, OverrideStatus,
    RunSummary, TypeArtifacts, generate_namespace,
};
