//! End-to-end generation scenarios over small on-disk schemas.

use std::fs;
use std::num::NonZeroUsize;
use std::path::Path;

use bytes::Bytes;
use nwbgen_codegen::{
    CodegenError, DiagnosticKind, Generator, GeneratorConfig, OverrideStatus, generate_namespace,
    split_chunks,
};
use nwbgen_schema::{CatalogOptions, NamespaceCatalog};
use tempfile::TempDir;

const BASE_SCHEMA: &str = "\
datasets:
- neurodata_type_def: Device
  doc: a device
groups:
- neurodata_type_def: Base
  doc: base type
  attributes:
  - name: name
    dtype: text
    doc: the name
  datasets:
  - name: owner
    neurodata_type_inc: Device
    doc: the owning device
    quantity: '?'
- neurodata_type_def: Derived
  neurodata_type_inc: Base
  doc: derived type
  attributes:
  - name: name
    dtype: text
    doc: the name
    default_value: unnamed
";

fn load(schema: &str) -> (TempDir, NamespaceCatalog) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    fs::write(dir.path().join("demo.types.yaml"), schema).expect("Failed to write schema");
    fs::write(
        dir.path().join("demo.namespace.yaml"),
        "namespaces:\n- name: demo\n  version: 1.2.0\n  doc: demo types\n  schema:\n  - source: demo.types.yaml\n",
    )
    .expect("Failed to write namespace");
    let catalog = NamespaceCatalog::load(&dir.path().join("demo.namespace.yaml"), &CatalogOptions::new())
        .expect("Failed to load catalog");
    (dir, catalog)
}

fn config(out: &Path) -> GeneratorConfig {
    GeneratorConfig::new(out).jobs(NonZeroUsize::new(3).expect("non-zero"))
}

#[test]
fn test_base_parameters() {
    let (_dir, catalog) = load(BASE_SCHEMA);
    let generator = Generator::new(&catalog, GeneratorConfig::new("unused"));
    let base = generator.emit_type("Base").expect("Failed to emit Base");
    let signature = base.declaration.signature().expect("signature");

    let names: Vec<&str> = signature.params.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["name", "owner"]);
    assert_eq!(signature.params[0].default, None);
    assert!(!signature.params[0].suggestion);
    assert!(signature.params[1].suggestion);
    assert_eq!(signature.params[1].default.as_deref(), Some("nullptr"));

    let text = base.declaration.render();
    assert!(text.contains("// Optional RegisteredTypes are usually created after initialize"));
}

#[test]
fn test_derived_override_is_live() {
    let (_dir, catalog) = load(BASE_SCHEMA);
    let generator = Generator::new(&catalog, GeneratorConfig::new("unused"));
    let derived = generator.emit_type("Derived").expect("Failed to emit Derived");

    let name = derived
        .declaration
        .live_accessors()
        .find(|a| a.path == "name")
        .expect("name accessor is live");
    assert_eq!(name.status, OverrideStatus::InheritedOverridden);

    let signature = derived.declaration.signature().expect("signature");
    let param = signature
        .params
        .iter()
        .find(|p| p.name == "name")
        .expect("name parameter");
    assert_eq!(param.default.as_deref(), Some("\"unnamed\""));
}

#[test]
fn test_override_completeness() {
    let (_dir, catalog) = load(BASE_SCHEMA);
    let generator = Generator::new(&catalog, GeneratorConfig::new("unused"));
    let derived = generator.emit_type("Derived").expect("Failed to emit Derived");

    assert!(
        derived
            .declaration
            .live_accessors()
            .all(|a| a.status != OverrideStatus::InheritedUnmodified)
    );
    let commented: Vec<&str> = derived
        .declaration
        .commented_accessors()
        .map(|a| a.path.as_str())
        .collect();
    assert_eq!(commented, ["owner"]);
    assert!(
        derived
            .declaration
            .commented_accessors()
            .all(|a| a.status == OverrideStatus::InheritedUnmodified)
    );
}

#[test]
fn test_parameter_ordering() {
    let schema = "\
groups:
- neurodata_type_def: Widget
  doc: widget
- neurodata_type_def: Mixed
  doc: mixed fields
  attributes:
  - name: label
    dtype: text
    doc: label
    default_value: none
  - name: kind
    dtype: text
    doc: fixed kind
    value: mixed
  - name: count
    dtype: int32
    doc: count
  datasets:
  - name: samples
    dtype: float64
    shape: [null]
    doc: samples
  - name: extra
    dtype: float32
    doc: optional array
    quantity: '?'
  groups:
  - name: helper
    neurodata_type_inc: Widget
    doc: optional helper
    quantity: '?'
  - neurodata_type_inc: Widget
    doc: any widgets
    quantity: '*'
";
    let (_dir, catalog) = load(schema);
    let generator = Generator::new(&catalog, GeneratorConfig::new("unused"));
    let mixed = generator.emit_type("Mixed").expect("Failed to emit Mixed");
    let params = &mixed.declaration.signature().expect("signature").params;

    assert!(params.iter().all(|p| p.name != "kind"));
    let first_suggestion = params.iter().position(|p| p.suggestion).expect("a suggestion");
    assert!(params[first_suggestion..].iter().all(|p| p.suggestion));
    let last_required = params
        .iter()
        .rposition(|p| p.default.is_none() && !p.suggestion)
        .expect("a required parameter");
    assert!(last_required < first_suggestion);
    let first_defaulted = params
        .iter()
        .position(|p| p.default.is_some())
        .expect("a defaulted parameter");
    assert!(params[..first_defaulted].iter().all(|p| p.default.is_none()));
}

#[test]
fn test_emission_is_idempotent() {
    let (_dir, catalog) = load(BASE_SCHEMA);
    let generator = Generator::new(&catalog, GeneratorConfig::new("unused"));
    let first = generator.emit_type("Derived").expect("Failed to emit");
    let second = generator.emit_type("Derived").expect("Failed to emit");
    assert_eq!(first.declaration, second.declaration);
    assert_eq!(first.definition.render(), second.definition.render());

    let a = tempfile::tempdir().expect("Failed to create temp dir");
    let b = tempfile::tempdir().expect("Failed to create temp dir");
    let _ = Generator::new(&catalog, config(a.path())).run();
    let _ = Generator::new(&catalog, config(b.path())).run();
    for rel in ["demo/demo_types/Derived.hpp", "demo/demo_types/Derived.cpp", "spec/demo.hpp"] {
        assert_eq!(
            fs::read(a.path().join(rel)).expect("Failed to read"),
            fs::read(b.path().join(rel)).expect("Failed to read"),
            "{rel} differs between runs"
        );
    }
}

#[test]
fn test_unresolved_parent_still_succeeds() {
    let schema = "\
groups:
- neurodata_type_def: Orphan
  neurodata_type_inc: NowhereToBeFound
  doc: parent is missing
- neurodata_type_def: Fine
  doc: fine
";
    let (_dir, catalog) = load(schema);
    let out = tempfile::tempdir().expect("Failed to create temp dir");
    let summary = Generator::new(&catalog, config(out.path())).run();

    assert_eq!(summary.succeeded, ["Fine", "Orphan"]);
    assert_eq!(summary.exit_code(), 0);
    assert!(summary.diagnostics.iter().any(|d| d.type_name == "Orphan"
        && matches!(&d.kind, DiagnosticKind::UnresolvedParent { parent, .. } if parent == "NowhereToBeFound")));
    let header = fs::read_to_string(out.path().join("demo/demo_types/Orphan.hpp")).expect("Failed to read");
    assert!(header.contains("class Orphan : public AQNWB::NWB::Container"));
}

#[test]
fn test_blocked_artifact_skips_only_that_type() {
    let (_dir, catalog) = load(BASE_SCHEMA);
    let out = tempfile::tempdir().expect("Failed to create temp dir");
    fs::create_dir_all(out.path().join("demo/demo_types/Derived.cpp")).expect("Failed to create dir");
    let summary = Generator::new(&catalog, config(out.path()).smoke_test(true)).run();

    assert_eq!(summary.succeeded, ["Base", "Device"]);
    assert_eq!(summary.skipped.len(), 1);
    let skipped = &summary.skipped[0];
    assert_eq!(skipped.type_name, "Derived");
    assert!(matches!(&skipped.error, CodegenError::Write { path, .. } if path.ends_with("Derived.cpp")));
    assert_eq!(summary.attempted(), 3);
    assert_eq!(summary.exit_code(), 0);

    assert!(!out.path().join("demo/demo_types/Derived.hpp").exists());
    assert!(out.path().join("demo/demo_types/Base.hpp").is_file());
    assert!(out.path().join("demo/demo_types/Base.cpp").is_file());
    assert!(out.path().join("spec/demo.hpp").is_file());
    let main = fs::read_to_string(out.path().join("test_app/main.cpp")).expect("Failed to read");
    assert!(main.contains("Base"));
    assert!(!main.contains("Derived"));
}

#[test]
fn test_chunking_of_large_text() {
    let text = Bytes::from(vec![b'x'; 40_000]);
    let chunks = split_chunks(&text, NonZeroUsize::new(16_000).expect("non-zero"));
    let sizes: Vec<usize> = chunks.iter().map(|c| c.data.len()).collect();
    assert_eq!(sizes, [16_000, 16_000, 8_000]);
    let joined: Vec<u8> = chunks.iter().flat_map(|c| c.data.iter().copied()).collect();
    assert_eq!(joined, text.to_vec());
}

#[test]
fn test_small_chunk_size_splits_schema_header() {
    let (_dir, catalog) = load(BASE_SCHEMA);
    let out = tempfile::tempdir().expect("Failed to create temp dir");
    let config = config(out.path()).chunk_size(64).expect("valid chunk size");
    let summary = Generator::new(&catalog, config).run();
    assert!(summary.failed_artifacts.is_empty());

    let header = fs::read_to_string(out.path().join("spec/demo.hpp")).expect("Failed to read");
    assert!(header.contains("constexpr std::string_view demo_types_part0 = R\"delimiter("));
    assert!(header.contains("joinSchemaParts<demo_types_size>(demo_types_parts)"));
    assert!(header.contains("const std::string version = \"1.2.0\";"));
}

#[test]
fn test_generate_namespace_from_directory() {
    let (dir, _catalog) = load(BASE_SCHEMA);
    let out = tempfile::tempdir().expect("Failed to create temp dir");
    let summary = generate_namespace(dir.path(), &CatalogOptions::new(), config(out.path()))
        .expect("Failed to generate");
    assert_eq!(summary.succeeded, ["Base", "Derived", "Device"]);
    assert_eq!(summary.attempted(), 3);
    assert!(out.path().join("demo/demo_types/Device.hpp").is_file());
}
