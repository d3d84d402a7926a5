//! Run driver: emits every registered type, the schema headers and the
//! optional smoke-test project.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::thread;

use bytes::Bytes;
use crossbeam_channel::{bounded, unbounded};
use nwbgen_schema::{NamespaceCatalog, TypeRecord, TypeRegistry};
use tracing::{debug, error, info, warn};

use crate::chunk::default_threshold;
use crate::cpp::schema_header::{SchemaHeaderGenerator, schema_header_path};
use crate::cpp::smoke_test::SmokeTestGenerator;
use crate::cpp::{DeclarationGenerator, DefinitionGenerator, TypeContext};
use crate::diagnostics::Diagnostic;
use crate::error::CodegenError;
use crate::model::{Artifact, ArtifactKind};
use crate::writer::ArtifactWriter;

/// Settings for one generation run.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    output_dir: PathBuf,
    chunk_threshold: NonZeroUsize,
    namespace_override: Option<String>,
    smoke_test: bool,
    jobs: NonZeroUsize,
}

impl GeneratorConfig {
    /// Creates a configuration writing to `output_dir` with default settings.
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            chunk_threshold: default_threshold(),
            namespace_override: None,
            smoke_test: false,
            jobs: thread::available_parallelism().unwrap_or(NonZeroUsize::MIN),
        }
    }

    /// Sets the chunk threshold.
    #[must_use]
    pub fn chunk_threshold(mut self, threshold: NonZeroUsize) -> Self {
        self.chunk_threshold = threshold;
        self
    }

    /// Sets the chunk threshold from a raw byte count.
    ///
    /// # Errors
    /// Returns `CodegenError::Config` if `bytes` is zero.
    pub fn chunk_size(self, bytes: usize) -> Result<Self, CodegenError> {
        let threshold = NonZeroUsize::new(bytes).ok_or_else(|| CodegenError::Config {
            message: "chunk size must be greater than zero".to_string(),
        })?;
        Ok(self.chunk_threshold(threshold))
    }

    /// Presents the root namespace under another name.
    #[must_use]
    pub fn namespace_override(mut self, name: impl Into<String>) -> Self {
        self.namespace_override = Some(name.into());
        self
    }

    /// Enables the smoke-test project.
    #[must_use]
    pub fn smoke_test(mut self, enabled: bool) -> Self {
        self.smoke_test = enabled;
        self
    }

    /// Sets the number of worker threads.
    #[must_use]
    pub fn jobs(mut self, jobs: NonZeroUsize) -> Self {
        self.jobs = jobs;
        self
    }

    /// Returns the output directory.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Returns the chunk threshold.
    #[must_use]
    pub fn threshold(&self) -> NonZeroUsize {
        self.chunk_threshold
    }

    /// Returns the namespace override, if any.
    #[must_use]
    pub fn override_name(&self) -> Option<&str> {
        self.namespace_override.as_deref()
    }

    /// Returns true if the smoke-test project is generated.
    #[must_use]
    pub fn generates_smoke_test(&self) -> bool {
        self.smoke_test
    }

    /// Returns the worker count.
    #[must_use]
    pub fn worker_count(&self) -> NonZeroUsize {
        self.jobs
    }
}

/// Both artifacts of one type, not yet written.
#[derive(Debug, Clone)]
pub struct TypeArtifacts {
    /// Type name.
    pub type_name: String,
    /// Declaration model.
    pub declaration: Artifact,
    /// Definition model.
    pub definition: Artifact,
    /// Declaration path relative to the output directory.
    pub declaration_path: PathBuf,
    /// Definition path relative to the output directory.
    pub definition_path: PathBuf,
    /// Recoverable findings.
    pub diagnostics: Vec<Diagnostic>,
}

/// A type that could not be emitted.
#[derive(Debug)]
pub struct SkippedType {
    /// Type name.
    pub type_name: String,
    /// Why it was skipped.
    pub error: CodegenError,
}

/// Outcome of a run.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Types whose artifacts were written, sorted by name.
    pub succeeded: Vec<String>,
    /// Types that were skipped, sorted by name.
    pub skipped: Vec<SkippedType>,
    /// Per-type findings of the succeeded types.
    pub diagnostics: Vec<Diagnostic>,
    /// Every file written.
    pub written: Vec<PathBuf>,
    /// Shared artifacts (schema headers, smoke test) that failed.
    pub failed_artifacts: Vec<(PathBuf, CodegenError)>,
}

impl RunSummary {
    /// Number of types attempted.
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.skipped.len()
    }

    /// Process exit status: non-zero only when types were attempted and
    /// none succeeded.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        if self.succeeded.is_empty() && !self.skipped.is_empty() {
            1
        } else {
            0
        }
    }
}

struct TypeOutcome {
    type_name: String,
    result: Result<(TypeArtifacts, Vec<PathBuf>), CodegenError>,
}

/// Emits AqNWB bindings for a loaded catalog.
pub struct Generator<'a> {
    catalog: &'a NamespaceCatalog,
    registry: TypeRegistry,
    config: GeneratorConfig,
}

impl<'a> Generator<'a> {
    /// Creates a generator and builds the type registry.
    #[must_use]
    pub fn new(catalog: &'a NamespaceCatalog, config: GeneratorConfig) -> Self {
        let registry = TypeRegistry::build(catalog, config.override_name());
        Self {
            catalog,
            registry,
            config,
        }
    }

    /// Returns the type registry.
    #[must_use]
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Builds both artifacts of a type without writing them.
    ///
    /// # Errors
    /// Returns `CodegenError` if the type is unknown or cannot be walked.
    pub fn emit_type(&self, type_name: &str) -> Result<TypeArtifacts, CodegenError> {
        let ctx = TypeContext::build(self.catalog, &self.registry, type_name)?;
        let declaration = DeclarationGenerator::new(&ctx).generate();
        let definition = DefinitionGenerator::new(&ctx).generate();
        let diagnostics = ctx
            .diagnostics
            .iter()
            .cloned()
            .map(|kind| Diagnostic::new(type_name, kind))
            .collect();
        Ok(TypeArtifacts {
            type_name: ctx.record.name.clone(),
            declaration_path: artifact_path(ctx.record, ArtifactKind::Declaration),
            definition_path: artifact_path(ctx.record, ArtifactKind::Definition),
            declaration,
            definition,
            diagnostics,
        })
    }

    /// Renders the schema header of every namespace that owns an emitted
    /// type, keyed by the relative output path.
    #[must_use]
    pub fn schema_headers(&self) -> Vec<(PathBuf, Result<Bytes, CodegenError>)> {
        self.catalog
            .namespaces()
            .iter()
            .filter_map(|ns| {
                let display = self.registry.display_namespace(&ns.name);
                self.registry
                    .records()
                    .iter()
                    .any(|r| r.namespace == display)
                    .then(|| {
                        let text =
                            SchemaHeaderGenerator::new(ns, display, self.config.threshold()).generate();
                        (schema_header_path(display), text)
                    })
            })
            .collect()
    }

    /// Emits and writes everything.
    #[must_use]
    pub fn run(&self) -> RunSummary {
        let writer = ArtifactWriter::new(self.config.output_dir());
        let names: Vec<&str> = self.registry.records().iter().map(|r| r.name.as_str()).collect();
        info!(
            types = names.len(),
            jobs = self.config.worker_count().get(),
            output = %self.config.output_dir().display(),
            "starting generation"
        );

        let mut outcomes = self.emit_all(&names, &writer);
        outcomes.sort_by(|a, b| a.type_name.cmp(&b.type_name));

        let mut summary = RunSummary::default();
        let mut emitted = Vec::new();
        for outcome in outcomes {
            match outcome.result {
                Ok((artifacts, paths)) => {
                    for d in &artifacts.diagnostics {
                        warn!(type_name = %d.type_name, reason = %d.kind, "diagnostic");
                    }
                    summary.succeeded.push(outcome.type_name);
                    summary.diagnostics.extend(artifacts.diagnostics.iter().cloned());
                    summary.written.extend(paths);
                    emitted.push(artifacts);
                }
                Err(e) => {
                    error!(type_name = %outcome.type_name, reason = %e, "skipped type");
                    summary.skipped.push(SkippedType {
                        type_name: outcome.type_name,
                        error: e,
                    });
                }
            }
        }

        for (path, text) in self.schema_headers() {
            match text.and_then(|bytes| writer.write(&path, &bytes)) {
                Ok(written) => summary.written.push(written),
                Err(e) => {
                    error!(path = %path.display(), reason = %e, "failed to write schema header");
                    summary.failed_artifacts.push((path, e));
                }
            }
        }

        if self.config.generates_smoke_test() {
            self.write_smoke_test(&writer, &emitted, &mut summary);
        }

        info!(
            succeeded = summary.succeeded.len(),
            skipped = summary.skipped.len(),
            diagnostics = summary.diagnostics.len(),
            files = summary.written.len(),
            "generation finished"
        );
        summary
    }

    /// Fans type emission out over scoped workers fed by a bounded queue.
    fn emit_all(&self, names: &[&str], writer: &ArtifactWriter) -> Vec<TypeOutcome> {
        let workers = self.config.worker_count().get().min(names.len()).max(1);
        let (work_tx, work_rx) = bounded::<&str>(workers * 2);
        let (result_tx, result_rx) = unbounded::<TypeOutcome>();

        thread::scope(|scope| {
            for _ in 0..workers {
                let work_rx = work_rx.clone();
                let result_tx = result_tx.clone();
                scope.spawn(move || {
                    for name in work_rx.iter() {
                        let result = self
                            .emit_type(name)
                            .and_then(|artifacts| {
                                let paths = write_type(writer, &artifacts)?;
                                Ok((artifacts, paths))
                            });
                        debug!(type_name = name, ok = result.is_ok(), "emitted type");
                        let outcome = TypeOutcome {
                            type_name: name.to_string(),
                            result,
                        };
                        if result_tx.send(outcome).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(work_rx);
            for &name in names {
                if work_tx.send(name).is_err() {
                    break;
                }
            }
            drop(work_tx);
        });
        drop(result_tx);
        result_rx.iter().collect()
    }

    fn write_smoke_test(&self, writer: &ArtifactWriter, emitted: &[TypeArtifacts], summary: &mut RunSummary) {
        let records: Vec<&TypeRecord> = emitted
            .iter()
            .filter_map(|a| self.registry.get(&a.type_name))
            .collect();
        let definitions: Vec<PathBuf> = emitted.iter().map(|a| a.definition_path.clone()).collect();
        let schema = self
            .catalog
            .roots()
            .first()
            .and_then(|root| self.catalog.namespace(root))
            .map(|ns| ns.path.clone())
            .unwrap_or_default();

        for file in SmokeTestGenerator::new(&records, &definitions, &schema).generate() {
            match writer.write(&file.path, file.contents.as_bytes()) {
                Ok(written) => summary.written.push(written),
                Err(e) => {
                    warn!(path = %file.path.display(), reason = %e, "failed to write smoke test");
                    summary.failed_artifacts.push((file.path, e));
                }
            }
        }
    }
}

/// Relative output path of a type's artifact.
#[must_use]
pub fn artifact_path(record: &TypeRecord, kind: ArtifactKind) -> PathBuf {
    PathBuf::from(&record.namespace)
        .join(&record.source_subfolder)
        .join(format!("{}.{}", record.name, kind.extension()))
}

/// Writes both artifacts of a type as one unit, so a skipped type leaves
/// neither file behind.
fn write_type(writer: &ArtifactWriter, artifacts: &TypeArtifacts) -> Result<Vec<PathBuf>, CodegenError> {
    let header = artifacts.declaration.render();
    let source = artifacts.definition.render();
    writer.write_all(&[
        (artifacts.declaration_path.as_path(), header.as_bytes()),
        (artifacts.definition_path.as_path(), source.as_bytes()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Fixture;

    const SCHEMA: &str = "\
groups:
- neurodata_type_def: Device
  doc: a device
- neurodata_type_def: Probe
  neurodata_type_inc: Device
  doc: a probe
  attributes:
  - name: channels
    dtype: int32
    doc: channel count
";

    #[test]
    fn test_config_defaults() {
        let config = GeneratorConfig::new("out");
        assert_eq!(config.threshold().get(), 16_000);
        assert!(!config.generates_smoke_test());
        assert!(config.override_name().is_none());
        assert!(config.worker_count().get() >= 1);
        assert!(matches!(
            GeneratorConfig::new("out").chunk_size(0),
            Err(CodegenError::Config { .. })
        ));
    }

    #[test]
    fn test_emit_type_paths() {
        let fixture = Fixture::single("test", SCHEMA);
        let generator = Generator::new(&fixture.catalog, GeneratorConfig::new(fixture.dir.path()));
        let artifacts = generator.emit_type("Probe").expect("Failed to emit");
        assert_eq!(artifacts.declaration_path, PathBuf::from("test/test_types/Probe.hpp"));
        assert_eq!(artifacts.definition_path, PathBuf::from("test/test_types/Probe.cpp"));
        assert!(artifacts.diagnostics.is_empty());
    }

    #[test]
    fn test_run_writes_everything() {
        let fixture = Fixture::single("test", SCHEMA);
        let out = tempfile::tempdir().expect("Failed to create temp dir");
        let config = GeneratorConfig::new(out.path())
            .smoke_test(true)
            .jobs(NonZeroUsize::new(2).expect("non-zero"));
        let summary = Generator::new(&fixture.catalog, config).run();

        assert_eq!(summary.succeeded, ["Device", "Probe"]);
        assert!(summary.skipped.is_empty());
        assert_eq!(summary.exit_code(), 0);
        for rel in [
            "test/test_types/Device.hpp",
            "test/test_types/Probe.cpp",
            "spec/test.hpp",
            "test_app/CMakeLists.txt",
            "test_app/main.cpp",
        ] {
            assert!(out.path().join(rel).is_file(), "missing {rel}");
        }
    }

    #[test]
    fn test_namespace_override() {
        let fixture = Fixture::single("test", SCHEMA);
        let out = tempfile::tempdir().expect("Failed to create temp dir");
        let config = GeneratorConfig::new(out.path()).namespace_override("renamed");
        let summary = Generator::new(&fixture.catalog, config).run();
        assert_eq!(summary.succeeded.len(), 2);
        assert!(out.path().join("renamed/test_types/Probe.hpp").is_file());
        let header = std::fs::read_to_string(out.path().join("spec/renamed.hpp"))
            .expect("Failed to read header");
        assert!(header.contains("namespace AQNWB::SPEC::RENAMED"));
        assert!(header.contains("const std::string namespaceName = \"renamed\";"));
    }

    #[test]
    fn test_exit_code() {
        let mut summary = RunSummary::default();
        assert_eq!(summary.exit_code(), 0);
        summary.skipped.push(SkippedType {
            type_name: "A".to_string(),
            error: CodegenError::generation("boom"),
        });
        assert_eq!(summary.exit_code(), 1);
        summary.succeeded.push("B".to_string());
        assert_eq!(summary.exit_code(), 0);
    }
}
