//! Schema fixtures for unit tests.

use std::fs;
use std::path::{Path, PathBuf};

use nwbgen_schema::{CatalogOptions, NamespaceCatalog, TypeRegistry};
use tempfile::TempDir;

/// A catalog loaded from files in a temporary directory.
pub(crate) struct Fixture {
    pub dir: TempDir,
    pub catalog: NamespaceCatalog,
}

impl Fixture {
    /// One namespace `name` with a single schema source.
    pub fn single(name: &str, schema: &str) -> Self {
        Self::build(&[(name, schema, None)])
    }

    /// Namespaces in dependency order: each entry is (name, schema, include).
    /// The last one is loaded.
    pub fn build(namespaces: &[(&str, &str, Option<&str>)]) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let mut last = PathBuf::new();
        for (name, schema, include) in namespaces {
            let mut manifest = format!(
                "namespaces:\n- name: {name}\n  version: 0.1.0\n  doc: {name} types\n  schema:\n"
            );
            if let Some(inc) = include {
                manifest.push_str(&format!("  - namespace: {inc}\n"));
            }
            manifest.push_str(&format!("  - source: {name}.types.yaml\n"));
            write(dir.path(), &format!("{name}.types.yaml"), schema);
            last = dir.path().join(format!("{name}.namespace.yaml"));
            write(dir.path(), &format!("{name}.namespace.yaml"), &manifest);
        }
        let catalog =
            NamespaceCatalog::load(&last, &CatalogOptions::new()).expect("Failed to load catalog");
        Self { dir, catalog }
    }

    pub fn registry(&self) -> TypeRegistry {
        TypeRegistry::build(&self.catalog, None)
    }
}

fn write(dir: &Path, name: &str, text: &str) {
    fs::write(dir.join(name), text).expect("Failed to write fixture");
}
