//! Namespace catalog.
//!
//! Loads a namespace file (or every namespace file under a directory), the
//! namespaces it includes and their schema sources, then resolves type
//! inheritance so every type exposes its full field set.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::SchemaError;
use crate::namespace::{NamespaceDef, SchemaEntry, manifest_value, strip_schema_extension};
use crate::naming::split_qualified;
use crate::parser::{canonical_json, is_namespace_file, read_namespace_document, read_schema_document};
use crate::spec::{AttributeSpec, DatasetSpec, GroupSpec, TypeSpec};

/// Options controlling where included namespaces are searched for.
#[derive(Debug, Clone, Default)]
pub struct CatalogOptions {
    search_dirs: Vec<PathBuf>,
}

impl CatalogOptions {
    /// Creates options with no extra search directories.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a directory searched (recursively) for included namespaces.
    #[must_use]
    pub fn search_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_dirs.push(dir.into());
        self
    }

    /// Returns the extra search directories.
    #[must_use]
    pub fn search_dirs(&self) -> &[PathBuf] {
        &self.search_dirs
    }
}

/// A schema source file belonging to a namespace.
#[derive(Debug, Clone)]
pub struct SchemaSource {
    /// File name without extension, e.g. `nwb.base`.
    pub stem: String,
    /// Location on disk.
    pub path: PathBuf,
    /// Compact JSON re-serialisation of the document.
    pub canonical: String,
}

/// A namespace included by another one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceInclude {
    /// Included namespace name.
    pub namespace: String,
    /// Imported types; all when `None`.
    pub data_types: Option<Vec<String>>,
}

/// A namespace that has been loaded into the catalog.
#[derive(Debug, Clone)]
pub struct LoadedNamespace {
    /// Namespace name.
    pub name: String,
    /// Version string, if declared.
    pub version: Option<String>,
    /// Documentation.
    pub doc: Option<String>,
    /// Namespace file.
    pub path: PathBuf,
    /// Own schema sources in declaration order.
    pub sources: Vec<SchemaSource>,
    /// Included namespaces in declaration order.
    pub includes: Vec<NamespaceInclude>,
    /// Compact JSON manifest of the namespace declaration.
    pub manifest: String,
    member_types: Vec<String>,
}

impl LoadedNamespace {
    /// Returns the types defined by this namespace's own sources.
    #[must_use]
    pub fn member_types(&self) -> &[String] {
        &self.member_types
    }

    /// Returns true if this namespace's own sources define the type.
    #[must_use]
    pub fn defines(&self, type_name: &str) -> bool {
        self.member_types.iter().any(|t| t == type_name)
    }
}

/// A type definition with inheritance applied.
#[derive(Debug, Clone)]
pub struct ResolvedType {
    /// Type name.
    pub name: String,
    /// Namespace whose sources define the type.
    pub namespace: String,
    /// Declared parent, without namespace qualifier.
    pub parent: Option<String>,
    /// Whether the parent was found in the catalog.
    pub parent_found: bool,
    /// Full definition including inherited members.
    pub spec: TypeSpec,
    source_file: PathBuf,
    inherited: BTreeSet<String>,
    overridden: BTreeSet<String>,
}

impl ResolvedType {
    /// Returns the schema source file defining this type.
    #[must_use]
    pub fn source_file(&self) -> &Path {
        &self.source_file
    }

    /// Returns true if the top-level member named by `key` comes from an
    /// ancestor, whether or not this type redefines it.
    ///
    /// `key` is a member name, or `<Type>` for unnamed typed members.
    /// Nested paths are looked up by their first segment.
    #[must_use]
    pub fn is_inherited_field(&self, key: &str) -> bool {
        self.inherited.contains(top_segment(key))
    }

    /// Returns true if an inherited top-level member is redefined here.
    #[must_use]
    pub fn is_overridden_field(&self, key: &str) -> bool {
        self.overridden.contains(top_segment(key))
    }
}

fn top_segment(key: &str) -> &str {
    key.split('/').next().unwrap_or(key)
}

/// All namespaces and types reachable from the loaded namespace files.
#[derive(Debug, Clone)]
pub struct NamespaceCatalog {
    namespaces: Vec<LoadedNamespace>,
    namespace_map: HashMap<String, usize>,
    types: Vec<ResolvedType>,
    type_map: HashMap<String, usize>,
    roots: Vec<String>,
}

impl NamespaceCatalog {
    /// Loads a namespace file, or every namespace file under a directory.
    ///
    /// Included namespaces are looked up next to the loaded files and in the
    /// option's search directories.
    ///
    /// # Errors
    /// Returns `SchemaError` if any file fails to parse, an include or source
    /// is missing, or inheritance is circular.
    pub fn load(path: &Path, options: &CatalogOptions) -> Result<Self, SchemaError> {
        let entry_files = if path.is_dir() {
            let files = find_namespace_files(path);
            if files.is_empty() {
                return Err(SchemaError::NoNamespaces {
                    path: path.to_path_buf(),
                });
            }
            files
        } else {
            vec![path.to_path_buf()]
        };

        let mut search_dirs: Vec<PathBuf> = Vec::new();
        if path.is_dir() {
            search_dirs.push(path.to_path_buf());
        }
        for file in &entry_files {
            if let Some(dir) = file.parent() {
                search_dirs.push(dir.to_path_buf());
            }
        }
        search_dirs.extend(options.search_dirs.iter().cloned());

        let mut loader = Loader::new(search_dirs);
        let mut entry_namespaces = Vec::new();
        for file in &entry_files {
            let parsed = read_namespace_document(file).map_err(|e| SchemaError::load(file, e))?;
            for (i, def) in parsed.document.namespaces.iter().enumerate() {
                let raw = raw_declaration(&parsed.value, i);
                loader.load_namespace(def, &raw, file)?;
                entry_namespaces.push(def.name.clone());
            }
        }

        let included: HashSet<&str> = loader
            .namespaces
            .iter()
            .flat_map(|ns| ns.includes.iter().map(|inc| inc.namespace.as_str()))
            .collect();
        let mut roots: Vec<String> = Vec::new();
        for name in &entry_namespaces {
            if !included.contains(name.as_str()) && !roots.contains(name) {
                roots.push(name.clone());
            }
        }

        let types = resolve_types(&loader.raw_types, &loader.raw_type_map)?;
        let type_map = types
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name.clone(), i))
            .collect();
        let namespace_map = loader
            .namespaces
            .iter()
            .enumerate()
            .map(|(i, ns)| (ns.name.clone(), i))
            .collect();

        info!(
            namespaces = loader.namespaces.len(),
            types = types.len(),
            roots = ?roots,
            "loaded namespace catalog"
        );

        Ok(Self {
            namespaces: loader.namespaces,
            namespace_map,
            types,
            type_map,
            roots,
        })
    }

    /// Returns the loaded namespaces, included namespaces first.
    #[must_use]
    pub fn namespaces(&self) -> &[LoadedNamespace] {
        &self.namespaces
    }

    /// Looks up a namespace by name.
    #[must_use]
    pub fn namespace(&self, name: &str) -> Option<&LoadedNamespace> {
        self.namespace_map.get(name).map(|&i| &self.namespaces[i])
    }

    /// Returns the namespaces that were requested and are not included by
    /// any other loaded namespace.
    #[must_use]
    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    /// Looks up a type by (optionally namespace-qualified) name.
    #[must_use]
    pub fn get_type(&self, name: &str) -> Option<&ResolvedType> {
        let (_, bare) = split_qualified(name);
        self.type_map.get(bare).map(|&i| &self.types[i])
    }

    /// Returns every resolved type in load order.
    #[must_use]
    pub fn types(&self) -> &[ResolvedType] {
        &self.types
    }

    /// Returns the types visible from a namespace: those of its includes
    /// (subject to their type filters) followed by its own.
    #[must_use]
    pub fn visible_types(&self, namespace: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        self.collect_visible(namespace, None, &mut out, &mut seen, &mut Vec::new());
        out
    }

    fn collect_visible(
        &self,
        namespace: &str,
        filter: Option<&[String]>,
        out: &mut Vec<String>,
        seen: &mut HashSet<String>,
        stack: &mut Vec<String>,
    ) {
        let Some(ns) = self.namespace(namespace) else {
            return;
        };
        if stack.iter().any(|s| s == namespace) {
            return;
        }
        stack.push(namespace.to_string());
        let mut local = Vec::new();
        let mut local_seen = HashSet::new();
        for include in &ns.includes {
            self.collect_visible(
                &include.namespace,
                include.data_types.as_deref(),
                &mut local,
                &mut local_seen,
                stack,
            );
        }
        for t in &ns.member_types {
            if local_seen.insert(t.clone()) {
                local.push(t.clone());
            }
        }
        stack.pop();

        for t in local {
            let keep = filter.is_none_or(|f| f.iter().any(|name| name == &t));
            if keep && seen.insert(t.clone()) {
                out.push(t);
            }
        }
    }
}

fn raw_declaration(file_value: &Value, index: usize) -> Value {
    file_value
        .get("namespaces")
        .and_then(|n| n.get(index))
        .cloned()
        .unwrap_or(Value::Null)
}

fn find_namespace_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file() && is_namespace_file(e.path()))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

struct RawType {
    name: String,
    namespace: String,
    source_file: PathBuf,
    spec: TypeSpec,
}

struct Loader {
    search_dirs: Vec<PathBuf>,
    index: Option<HashMap<String, PathBuf>>,
    namespaces: Vec<LoadedNamespace>,
    loading: Vec<String>,
    raw_types: Vec<RawType>,
    raw_type_map: HashMap<String, usize>,
}

impl Loader {
    fn new(search_dirs: Vec<PathBuf>) -> Self {
        Self {
            search_dirs,
            index: None,
            namespaces: Vec::new(),
            loading: Vec::new(),
            raw_types: Vec::new(),
            raw_type_map: HashMap::new(),
        }
    }

    fn is_loaded(&self, name: &str) -> bool {
        self.namespaces.iter().any(|ns| ns.name == name)
    }

    /// Maps namespace names to the files declaring them, built on first use.
    fn locate(&mut self, name: &str) -> Option<PathBuf> {
        let index = self.index.get_or_insert_with(|| {
            let mut index = HashMap::new();
            for dir in &self.search_dirs {
                for file in find_namespace_files(dir) {
                    match read_namespace_document(&file) {
                        Ok(parsed) => {
                            for ns in parsed.document.namespaces {
                                index.entry(ns.name).or_insert_with(|| file.clone());
                            }
                        }
                        Err(e) => {
                            debug!(path = %file.display(), error = %e, "skipping unreadable namespace file");
                        }
                    }
                }
            }
            index
        });
        index.get(name).cloned()
    }

    fn load_namespace(
        &mut self,
        def: &NamespaceDef,
        raw: &Value,
        file: &Path,
    ) -> Result<(), SchemaError> {
        if self.is_loaded(&def.name) {
            return Ok(());
        }
        if self.loading.contains(&def.name) {
            let mut chain = self.loading.clone();
            chain.push(def.name.clone());
            return Err(SchemaError::CircularInclude {
                path: chain.join(" -> "),
            });
        }
        self.loading.push(def.name.clone());

        let mut includes = Vec::new();
        let mut sources = Vec::new();
        let mut member_types = Vec::new();
        let base_dir = file.parent().unwrap_or_else(|| Path::new("."));

        for entry in &def.schema {
            match entry {
                SchemaEntry::Include {
                    namespace,
                    data_types,
                } => {
                    self.load_include(namespace, &def.name)?;
                    includes.push(NamespaceInclude {
                        namespace: namespace.clone(),
                        data_types: data_types.clone(),
                    });
                }
                SchemaEntry::Source { source } => {
                    let path = find_source(base_dir, source).ok_or_else(|| {
                        SchemaError::SourceNotFound {
                            namespace: def.name.clone(),
                            source_name: source.clone(),
                        }
                    })?;
                    let parsed =
                        read_schema_document(&path).map_err(|e| SchemaError::load(&path, e))?;
                    let canonical =
                        canonical_json(&parsed.value).map_err(|e| SchemaError::load(&path, e))?;
                    let file_name = path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .unwrap_or(source.as_str());
                    let stem = strip_schema_extension(file_name).to_string();

                    for spec in parsed.document.into_types() {
                        let Some(name) = spec.name().map(str::to_string) else {
                            warn!(source = %path.display(), "skipping top-level entry without a type definition");
                            continue;
                        };
                        if let Some(&existing) = self.raw_type_map.get(&name) {
                            warn!(
                                type_name = %name,
                                first = %self.raw_types[existing].namespace,
                                again = %def.name,
                                "type defined more than once, keeping first definition"
                            );
                            continue;
                        }
                        self.raw_type_map.insert(name.clone(), self.raw_types.len());
                        self.raw_types.push(RawType {
                            name: name.clone(),
                            namespace: def.name.clone(),
                            source_file: path.clone(),
                            spec,
                        });
                        member_types.push(name);
                    }
                    sources.push(SchemaSource {
                        stem,
                        path,
                        canonical,
                    });
                }
            }
        }

        let manifest = canonical_json(&manifest_value(raw)).map_err(|e| SchemaError::load(file, e))?;

        self.loading.pop();
        debug!(
            namespace = %def.name,
            sources = sources.len(),
            types = member_types.len(),
            "loaded namespace"
        );
        self.namespaces.push(LoadedNamespace {
            name: def.name.clone(),
            version: def.version.clone(),
            doc: def.doc.clone(),
            path: file.to_path_buf(),
            sources,
            includes,
            manifest,
            member_types,
        });
        Ok(())
    }

    fn load_include(&mut self, name: &str, included_by: &str) -> Result<(), SchemaError> {
        if self.is_loaded(name) {
            return Ok(());
        }
        let not_found = || SchemaError::NamespaceNotFound {
            name: name.to_string(),
            included_by: included_by.to_string(),
        };
        let file = self.locate(name).ok_or_else(not_found)?;
        let parsed = read_namespace_document(&file).map_err(|e| SchemaError::load(&file, e))?;
        let (i, def) = parsed
            .document
            .namespaces
            .iter()
            .enumerate()
            .find(|(_, ns)| ns.name == name)
            .ok_or_else(not_found)?;
        let raw = raw_declaration(&parsed.value, i);
        self.load_namespace(def, &raw, &file)
    }
}

fn find_source(base_dir: &Path, source: &str) -> Option<PathBuf> {
    let direct = base_dir.join(source);
    if direct.is_file() {
        return Some(direct);
    }
    ["yaml", "yml", "json"]
        .iter()
        .map(|ext| base_dir.join(format!("{source}.{ext}")))
        .find(|p| p.is_file())
}

fn resolve_types(
    raw: &[RawType],
    index: &HashMap<String, usize>,
) -> Result<Vec<ResolvedType>, SchemaError> {
    let mut done: Vec<Option<ResolvedType>> = vec![None; raw.len()];
    let mut stack = Vec::new();
    for i in 0..raw.len() {
        resolve_one(i, raw, index, &mut done, &mut stack)?;
    }
    Ok(done.into_iter().flatten().collect())
}

fn resolve_one(
    i: usize,
    raw: &[RawType],
    index: &HashMap<String, usize>,
    done: &mut [Option<ResolvedType>],
    stack: &mut Vec<usize>,
) -> Result<(), SchemaError> {
    if done[i].is_some() {
        return Ok(());
    }
    if stack.contains(&i) {
        let mut chain: Vec<&str> = stack.iter().map(|&s| raw[s].name.as_str()).collect();
        chain.push(&raw[i].name);
        return Err(SchemaError::CircularInheritance {
            path: chain.join(" -> "),
        });
    }
    stack.push(i);

    let item = &raw[i];
    let parent = item.spec.parent().map(|p| split_qualified(p).1.to_string());
    let parent_index = parent.as_deref().and_then(|p| index.get(p).copied());
    if let Some(p) = parent_index {
        resolve_one(p, raw, index, done, stack)?;
    }

    let mut inherited = BTreeSet::new();
    let mut overridden = BTreeSet::new();
    let spec = match parent_index.and_then(|p| done[p].as_ref()) {
        Some(parent_type) => merge_type(
            &item.spec,
            &parent_type.spec,
            &mut inherited,
            &mut overridden,
        )
        .unwrap_or_else(|| {
            warn!(
                type_name = %item.name,
                parent = %parent_type.name,
                "type and parent are of different kinds, not merging"
            );
            item.spec.clone()
        }),
        None => item.spec.clone(),
    };
    if parent.is_some() && parent_index.is_none() {
        debug!(type_name = %item.name, parent = ?parent, "parent type not in catalog");
    }

    stack.pop();
    done[i] = Some(ResolvedType {
        name: item.name.clone(),
        namespace: item.namespace.clone(),
        parent,
        parent_found: parent_index.is_some(),
        spec,
        source_file: item.source_file.clone(),
        inherited,
        overridden,
    });
    Ok(())
}

fn merge_type(
    child: &TypeSpec,
    parent: &TypeSpec,
    inherited: &mut BTreeSet<String>,
    overridden: &mut BTreeSet<String>,
) -> Option<TypeSpec> {
    match (child, parent) {
        (TypeSpec::Group(c), TypeSpec::Group(p)) => {
            let mut merged = c.clone();
            merged.doc = c.doc.clone().or_else(|| p.doc.clone());
            merged.attributes =
                merge_attributes(&c.attributes, &p.attributes, Some((&mut *inherited, &mut *overridden)));
            merged.datasets = merge_members(
                &c.datasets,
                &p.datasets,
                DatasetSpec::member_key,
                merge_dataset,
                Some((&mut *inherited, &mut *overridden)),
            );
            merged.groups = merge_members(
                &c.groups,
                &p.groups,
                GroupSpec::member_key,
                merge_group,
                Some((&mut *inherited, &mut *overridden)),
            );
            Some(TypeSpec::Group(merged))
        }
        (TypeSpec::Dataset(c), TypeSpec::Dataset(p)) => {
            let mut merged = merge_dataset(c, p);
            merged.data_type_def = c.data_type_def.clone();
            merged.data_type_inc = c.data_type_inc.clone();
            merged.attributes =
                merge_attributes(&c.attributes, &p.attributes, Some((&mut *inherited, &mut *overridden)));
            inherited.insert("data".to_string());
            if c.dtype.is_some() || c.shape.is_some() || c.value.is_some() || c.default_value.is_some() {
                overridden.insert("data".to_string());
            }
            Some(TypeSpec::Dataset(merged))
        }
        _ => None,
    }
}

type Flags<'a> = Option<(&'a mut BTreeSet<String>, &'a mut BTreeSet<String>)>;

/// Child members come first in their own order, followed by the parent's
/// members the child does not redefine.
fn merge_members<T: Clone>(
    child: &[T],
    parent: &[T],
    key: impl Fn(&T) -> Option<String>,
    merge: impl Fn(&T, &T) -> T,
    mut flags: Flags<'_>,
) -> Vec<T> {
    let mut out = Vec::with_capacity(child.len() + parent.len());
    for c in child {
        let k = key(c);
        let matched = k
            .as_ref()
            .and_then(|k| parent.iter().find(|p| key(p).as_ref() == Some(k)));
        match matched {
            Some(p) => {
                if let (Some((_, overridden)), Some(k)) = (flags.as_mut(), k) {
                    overridden.insert(k);
                }
                out.push(merge(c, p));
            }
            None => out.push(c.clone()),
        }
    }
    for p in parent {
        let k = key(p);
        if let (Some((inherited, _)), Some(k)) = (flags.as_mut(), k.clone()) {
            inherited.insert(k);
        }
        let redefined = k
            .as_ref()
            .is_some_and(|k| child.iter().any(|c| key(c).as_ref() == Some(k)));
        if !redefined {
            out.push(p.clone());
        }
    }
    out
}

fn merge_attributes(
    child: &[AttributeSpec],
    parent: &[AttributeSpec],
    flags: Flags<'_>,
) -> Vec<AttributeSpec> {
    merge_members(child, parent, |a| Some(a.name.clone()), merge_attribute, flags)
}

fn merge_attribute(c: &AttributeSpec, p: &AttributeSpec) -> AttributeSpec {
    let mut merged = c.clone();
    merged.doc = c.doc.clone().or_else(|| p.doc.clone());
    merged.dtype = c.dtype.clone().or_else(|| p.dtype.clone());
    merged.shape = c.shape.clone().or_else(|| p.shape.clone());
    merged.dims = c.dims.clone().or_else(|| p.dims.clone());
    if c.value.is_none() && c.default_value.is_none() {
        merged.value = p.value.clone();
        merged.default_value = p.default_value.clone();
    }
    merged
}

fn merge_dataset(c: &DatasetSpec, p: &DatasetSpec) -> DatasetSpec {
    let mut merged = c.clone();
    merged.doc = c.doc.clone().or_else(|| p.doc.clone());
    merged.dtype = c.dtype.clone().or_else(|| p.dtype.clone());
    merged.shape = c.shape.clone().or_else(|| p.shape.clone());
    merged.dims = c.dims.clone().or_else(|| p.dims.clone());
    merged.data_type_inc = c.data_type_inc.clone().or_else(|| p.data_type_inc.clone());
    if c.value.is_none() && c.default_value.is_none() {
        merged.value = p.value.clone();
        merged.default_value = p.default_value.clone();
    }
    merged.attributes = merge_attributes(&c.attributes, &p.attributes, None);
    merged
}

fn merge_group(c: &GroupSpec, p: &GroupSpec) -> GroupSpec {
    let mut merged = c.clone();
    merged.doc = c.doc.clone().or_else(|| p.doc.clone());
    merged.data_type_inc = c.data_type_inc.clone().or_else(|| p.data_type_inc.clone());
    merged.attributes = merge_attributes(&c.attributes, &p.attributes, None);
    merged.datasets = merge_members(
        &c.datasets,
        &p.datasets,
        DatasetSpec::member_key,
        merge_dataset,
        None,
    );
    merged.groups = merge_members(&c.groups, &p.groups, GroupSpec::member_key, merge_group, None);
    merged
}
