//! # nwbgen Codegen
//!
//! AqNWB C++ binding generation from NWB/HDMF schemas.
//!
//! This crate provides:
//! - Inheritance/override classification of a type's fields
//! - `initialize` parameter derivation and ordering
//! - A structured model of declarations and definitions, rendered last
//! - Per-namespace schema headers with size-bounded embedded text
//! - A smoke-test CMake project
//! - A concurrent run driver with atomic artifact writes

pub mod chunk;
pub mod cpp;
pub mod diagnostics;
pub mod error;
pub mod generator;
pub mod model;
pub mod overrides;
pub mod params;
pub mod writer;

#[cfg(test)]
mod test_support;

pub use chunk::{DEFAULT_CHUNK_THRESHOLD, EmbeddedBlob, SchemaChunk, split_chunks};
pub use diagnostics::{Diagnostic, DiagnosticKind};
pub use error::CodegenError;
pub use generator::{Generator, GeneratorConfig, RunSummary, SkippedType, TypeArtifacts};
pub use model::{Artifact, ArtifactKind, Node};
pub use overrides::{OverrideResolver, OverrideStatus};
pub use params::{DerivedParameters, ParameterDescriptor, Representation, derive_parameters};

use std::path::Path;

use nwbgen_schema::{CatalogOptions, NamespaceCatalog, validate_catalog};

/// Loads a namespace file or directory and generates bindings into the
/// configured output directory.
///
/// # Arguments
/// * `schema` - Namespace file, or a directory of namespace files
/// * `options` - Catalog options such as extra include directories
/// * `config` - Generation settings
///
/// # Returns
/// The run summary.
///
/// # Errors
/// Returns `CodegenError::Schema` if the namespaces cannot be loaded or
/// have no root namespace. Type level failures are reported in the summary
/// instead.
pub fn generate_namespace(
    schema: &Path,
    options: &CatalogOptions,
    config: GeneratorConfig,
) -> Result<RunSummary, CodegenError> {
    let catalog = NamespaceCatalog::load(schema, options)?;
    validate_catalog(&catalog)?;
    Ok(Generator::new(&catalog, config).run())
}
