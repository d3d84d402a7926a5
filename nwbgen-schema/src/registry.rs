//! Type registry.
//!
//! Built in two passes over a loaded catalog: first every type is mapped to
//! the namespace whose own sources define it, then one [`TypeRecord`] is
//! created per emitted type with its parent resolved against that map.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::PathBuf;

use tracing::debug;

use crate::catalog::NamespaceCatalog;
use crate::naming::{source_subfolder, split_qualified};
use crate::walker::walk_type;

/// Kind of a registered type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// Composite of attributes, datasets and subgroups.
    Group,
    /// Array with attributes.
    Dataset,
}

/// Parent of a registered type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentRef {
    /// The type declares no parent.
    Root,
    /// The parent was found.
    Resolved {
        /// Parent type name.
        name: String,
        /// Namespace owning the parent.
        namespace: String,
    },
    /// The parent is not defined by any loaded namespace.
    Unresolved {
        /// Declared parent name.
        name: String,
    },
}

impl ParentRef {
    /// Returns the parent type name, resolved or not.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Root => None,
            Self::Resolved { name, .. } | Self::Unresolved { name } => Some(name),
        }
    }
}

/// Everything the generators need to know about one type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRecord {
    /// Type name.
    pub name: String,
    /// Group or dataset.
    pub kind: TypeKind,
    /// Owning namespace, after any rename.
    pub namespace: String,
    /// Schema source defining the type.
    pub source_file: PathBuf,
    /// Output subfolder derived from the source file stem.
    pub source_subfolder: String,
    /// Parent type.
    pub parent: ParentRef,
    /// Documentation.
    pub doc: String,
    /// Other types this one refers to through members or reference dtypes.
    pub referenced_types: BTreeSet<String>,
}

/// Registry of every type selected for emission.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    records: Vec<TypeRecord>,
    index: HashMap<String, usize>,
    owners: HashMap<String, String>,
    renamed: Option<(String, String)>,
}

impl TypeRegistry {
    /// Builds the registry for the catalog's root namespaces.
    ///
    /// The emitted set is every type visible from a root namespace plus
    /// their ancestors. When `namespace_override` is given, the first root
    /// namespace is presented under that name.
    #[must_use]
    pub fn build(catalog: &NamespaceCatalog, namespace_override: Option<&str>) -> Self {
        let renamed = namespace_override
            .zip(catalog.roots().first())
            .map(|(to, from)| (from.clone(), to.to_string()));
        let display = |ns: &str| -> String {
            match &renamed {
                Some((from, to)) if from == ns => to.clone(),
                _ => ns.to_string(),
            }
        };

        // Pass one: owning namespace of every loaded type.
        let mut owners: HashMap<String, String> = HashMap::new();
        for ns in catalog.namespaces() {
            for t in ns.member_types() {
                owners.entry(t.clone()).or_insert_with(|| display(&ns.name));
            }
        }

        let mut selected: Vec<String> = Vec::new();
        let mut seen = HashSet::new();
        for root in catalog.roots() {
            for t in catalog.visible_types(root) {
                let mut chain = vec![t];
                while let Some(parent) = chain
                    .last()
                    .and_then(|t| catalog.get_type(t))
                    .and_then(|t| t.parent.clone())
                {
                    if chain.contains(&parent) || catalog.get_type(&parent).is_none() {
                        break;
                    }
                    chain.push(parent);
                }
                for t in chain.into_iter().rev() {
                    if seen.insert(t.clone()) {
                        selected.push(t);
                    }
                }
            }
        }

        // Pass two: one record per selected type.
        let mut records = Vec::with_capacity(selected.len());
        for name in selected {
            let Some(resolved) = catalog.get_type(&name) else {
                continue;
            };
            let parent = match resolved.parent.as_deref() {
                None => ParentRef::Root,
                Some(p) => match owners.get(p) {
                    Some(ns) => ParentRef::Resolved {
                        name: p.to_string(),
                        namespace: ns.clone(),
                    },
                    None => ParentRef::Unresolved {
                        name: p.to_string(),
                    },
                },
            };
            let kind = if resolved.spec.is_group() {
                TypeKind::Group
            } else {
                TypeKind::Dataset
            };
            let stem = resolved
                .source_file()
                .file_name()
                .and_then(|n| n.to_str())
                .map(crate::namespace::strip_schema_extension)
                .unwrap_or_default();

            let mut referenced_types = BTreeSet::new();
            match walk_type(&name, &resolved.spec) {
                Ok(fields) => {
                    for w in &fields {
                        let target = w
                            .field
                            .data_type()
                            .or_else(|| w.field.dtype().and_then(|d| d.reference_target()));
                        if let Some(t) = target {
                            let (_, bare) = split_qualified(t);
                            if bare != name {
                                referenced_types.insert(bare.to_string());
                            }
                        }
                    }
                }
                Err(e) => debug!(type_name = %name, error = %e, "could not collect references"),
            }

            records.push(TypeRecord {
                kind,
                namespace: display(&resolved.namespace),
                source_file: resolved.source_file().to_path_buf(),
                source_subfolder: source_subfolder(stem),
                parent,
                doc: resolved.spec.doc().unwrap_or_default().to_string(),
                referenced_types,
                name,
            });
        }

        let index = records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.name.clone(), i))
            .collect();
        debug!(types = records.len(), "built type registry");
        Self {
            records,
            index,
            owners,
            renamed,
        }
    }

    /// Returns every record in emission order.
    #[must_use]
    pub fn records(&self) -> &[TypeRecord] {
        &self.records
    }

    /// Looks up a record by (optionally qualified) type name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TypeRecord> {
        let (_, bare) = split_qualified(name);
        self.index.get(bare).map(|&i| &self.records[i])
    }

    /// Returns the namespace owning any loaded type, emitted or not.
    #[must_use]
    pub fn namespace_of(&self, type_name: &str) -> Option<&str> {
        let (_, bare) = split_qualified(type_name);
        self.owners.get(bare).map(String::as_str)
    }

    /// Returns the name a loaded namespace is presented under.
    #[must_use]
    pub fn display_namespace<'a>(&'a self, namespace: &'a str) -> &'a str {
        match &self.renamed {
            Some((from, to)) if from == namespace => to,
            _ => namespace,
        }
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if no type was selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogOptions;
    use crate::parser::is_namespace_file;
    use std::fs;
    use std::path::Path;

    fn load(files: &[(&str, &str)], entry: &str) -> (tempfile::TempDir, NamespaceCatalog) {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        for (name, text) in files {
            fs::write(dir.path().join(name), text).expect("Failed to write fixture");
        }
        assert!(is_namespace_file(Path::new(entry)));
        let catalog = NamespaceCatalog::load(&dir.path().join(entry), &CatalogOptions::new())
            .expect("Failed to load");
        (dir, catalog)
    }

    const NS: &str = "namespaces:\n- name: test-ns\n  version: 0.1.0\n  schema:\n  - source: nwb.things.yaml\n";

    #[test]
    fn test_parent_resolution() {
        let (_dir, catalog) = load(
            &[
                ("test.namespace.yaml", NS),
                (
                    "nwb.things.yaml",
                    "groups:\n\
                     - neurodata_type_def: Base\n  doc: base\n\
                     - neurodata_type_def: Derived\n  neurodata_type_inc: Base\n  doc: derived\n  groups:\n  - name: owner\n    neurodata_type_inc: Base\n    doc: o\n\
                     - neurodata_type_def: Orphan\n  neurodata_type_inc: Missing\n  doc: orphan\n",
                ),
            ],
            "test.namespace.yaml",
        );
        let registry = TypeRegistry::build(&catalog, None);
        assert_eq!(registry.len(), 3);

        let base = registry.get("Base").expect("Base");
        assert_eq!(base.parent, ParentRef::Root);
        assert_eq!(base.source_subfolder, "things");
        assert_eq!(base.namespace, "test-ns");

        let derived = registry.get("test-ns/Derived").expect("Derived");
        assert_eq!(
            derived.parent,
            ParentRef::Resolved {
                name: "Base".to_string(),
                namespace: "test-ns".to_string()
            }
        );
        assert!(derived.referenced_types.contains("Base"));

        let orphan = registry.get("Orphan").expect("Orphan");
        assert_eq!(
            orphan.parent,
            ParentRef::Unresolved {
                name: "Missing".to_string()
            }
        );
        assert_eq!(orphan.kind, TypeKind::Group);
    }

    #[test]
    fn test_namespace_override() {
        let (_dir, catalog) = load(
            &[
                ("test.namespace.yaml", NS),
                ("nwb.things.yaml", "datasets:\n- neurodata_type_def: Column\n  doc: c\n"),
            ],
            "test.namespace.yaml",
        );
        let registry = TypeRegistry::build(&catalog, Some("renamed"));
        assert_eq!(registry.get("Column").expect("Column").namespace, "renamed");
        assert_eq!(registry.namespace_of("Column"), Some("renamed"));
        assert_eq!(registry.display_namespace("test-ns"), "renamed");
        assert_eq!(registry.get("Column").expect("Column").kind, TypeKind::Dataset);
    }
}
