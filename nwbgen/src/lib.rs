//! # nwbgen
//!
//! Compiles NWB/HDMF namespace schemas into C++ classes for the AqNWB
//! library.
//!
//! ## Features
//!
//! - **Schema loading** - YAML or JSON namespaces with includes and inheritance
//! - **Parameter derivation** - ordered `initialize` signatures per type
//! - **Structured emission** - declarations and definitions built as node lists
//! - **Embedded schemas** - per-namespace headers with chunked raw strings
//! - **Smoke test** - an optional CMake project instantiating every class
//!
//! ## Quick Start
//!
//! ```ignore
//! use nwbgen::prelude::*;
//!
//! let catalog = NamespaceCatalog::load(Path::new("core/nwb.namespace.yaml"), &CatalogOptions::new())?;
//! let summary = Generator::new(&catalog, GeneratorConfig::new("out")).run();
//! println!("{} types generated", summary.succeeded.len());
//! ```
//!
//! ## Crate Organization
//!
//! - [`schema`] - Namespace catalog, type registry and field walking
//! - [`codegen`] - Parameter derivation and C++ emission
//! - [`cli`] - Command line definitions
//! - [`commands`] - Command implementations used by the binary

pub mod cli;
pub mod commands;
pub mod prelude;

/// Namespace catalog, type registry and field walking.
pub mod schema {
    pub use nwbgen_schema::*;
}

/// Parameter derivation and C++ emission.
pub mod codegen {
    pub use nwbgen_codegen::*;
}

/// Version of the nwbgen crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
