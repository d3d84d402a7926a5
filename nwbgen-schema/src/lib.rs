//! # nwbgen Schema
//!
//! NWB/HDMF namespace and schema loading.
//!
//! This crate provides:
//! - YAML and JSON schema document parsing
//! - Namespace catalog with includes and inheritance resolution
//! - Type registry with owning namespaces and resolved parents
//! - Breadth-first field walking over resolved types

pub mod catalog;
pub mod error;
pub mod field;
pub mod namespace;
pub mod naming;
pub mod parser;
pub mod registry;
pub mod spec;
pub mod types;
pub mod validation;
pub mod walker;

pub use catalog::{CatalogOptions, LoadedNamespace, NamespaceCatalog, ResolvedType, SchemaSource};
pub use error::{ParseError, SchemaError};
pub use field::{FieldKind, FieldPath, FieldSpec};
pub use parser::{SchemaFormat, canonical_json};
pub use registry::{ParentRef, TypeKind, TypeRecord, TypeRegistry};
pub use spec::{AttributeSpec, DatasetSpec, GroupSpec, SchemaDocument, TypeSpec};
pub use types::{CompoundField, Dtype, PrimitiveDtype, Quantity, RefKind, Shape};
pub use validation::{ValidationReport, validate_catalog};
pub use walker::{WalkedField, walk_type};
