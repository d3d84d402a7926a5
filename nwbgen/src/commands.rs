//! Command implementations.

use std::fmt::Write as _;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use nwbgen_codegen::{Generator, GeneratorConfig, Node, RunSummary};
use nwbgen_schema::{CatalogOptions, NamespaceCatalog, validate_catalog};
use tracing::{info, warn};

use crate::cli::Command;

/// Settings of the `compile` command beyond its two paths.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Chunk threshold in bytes; `None` keeps the default.
    pub chunk_size: Option<usize>,
    /// Name the root namespace is presented under.
    pub namespace_override: Option<String>,
    /// Write the smoke-test project.
    pub smoke_test: bool,
    /// Worker threads; `None` uses the available parallelism.
    pub jobs: Option<NonZeroUsize>,
    /// Extra directories searched for included namespaces.
    pub include_dirs: Vec<PathBuf>,
}

/// Runs a parsed command, printing any report to stdout, and returns the
/// process exit status.
///
/// # Errors
/// Returns an error if the schema cannot be loaded or the options are
/// invalid.
pub fn execute(command: Command) -> Result<u8> {
    match command {
        Command::Compile {
            schema,
            output_dir,
            chunk_size,
            namespace_override,
            generate_smoke_test,
            jobs,
            include_dirs,
        } => {
            let options = CompileOptions {
                chunk_size: Some(chunk_size),
                namespace_override,
                smoke_test: generate_smoke_test,
                jobs,
                include_dirs,
            };
            let summary = compile(&schema, &output_dir, options)?;
            for skipped in &summary.skipped {
                println!("skipped {}: {}", skipped.type_name, skipped.error);
            }
            println!(
                "{} types generated, {} skipped, {} diagnostics",
                summary.succeeded.len(),
                summary.skipped.len(),
                summary.diagnostics.len()
            );
            Ok(summary.exit_code())
        }
        Command::Inspect {
            schema,
            type_name,
            include_dirs,
        } => {
            print!("{}", inspect(&schema, type_name.as_deref(), &include_dirs)?);
            Ok(0)
        }
    }
}

/// Loads the schema and generates bindings into `output_dir`.
///
/// # Errors
/// Returns an error if the schema cannot be loaded or the chunk size is
/// zero. Type level failures are reported in the summary.
pub fn compile(schema: &Path, output_dir: &Path, options: CompileOptions) -> Result<RunSummary> {
    let catalog = load_catalog(schema, &options.include_dirs)?;

    let mut config = GeneratorConfig::new(output_dir).smoke_test(options.smoke_test);
    if let Some(size) = options.chunk_size {
        config = config.chunk_size(size)?;
    }
    if let Some(name) = options.namespace_override {
        config = config.namespace_override(name);
    }
    if let Some(jobs) = options.jobs {
        config = config.jobs(jobs);
    }

    let summary = Generator::new(&catalog, config).run();
    info!(
        output = %output_dir.display(),
        succeeded = summary.succeeded.len(),
        skipped = summary.skipped.len(),
        "compile finished"
    );
    Ok(summary)
}

/// Describes each type's namespace, base class and ordered parameters.
///
/// # Errors
/// Returns an error if the schema cannot be loaded or `type_name` is not
/// generated from it.
pub fn inspect(schema: &Path, type_name: Option<&str>, include_dirs: &[PathBuf]) -> Result<String> {
    let catalog = load_catalog(schema, include_dirs)?;
    let generator = Generator::new(&catalog, GeneratorConfig::new("."));

    let names: Vec<&str> = match type_name {
        Some(name) => match generator.registry().get(name) {
            Some(record) => vec![record.name.as_str()],
            None => bail!("type '{name}' is not generated from {}", schema.display()),
        },
        None => generator.registry().records().iter().map(|r| r.name.as_str()).collect(),
    };

    let mut out = String::new();
    for name in names {
        let namespace = generator
            .registry()
            .get(name)
            .map_or("", |r| r.namespace.as_str());
        let artifacts = match generator.emit_type(name) {
            Ok(artifacts) => artifacts,
            Err(e) => {
                let _ = writeln!(out, "{name} [{namespace}]: {e}");
                continue;
            }
        };
        let base = artifacts
            .declaration
            .nodes
            .iter()
            .find_map(|n| match n {
                Node::ClassOpen { base, .. } => Some(base.as_str()),
                _ => None,
            })
            .unwrap_or_default();
        let _ = writeln!(out, "{name} [{namespace}] : {base}");
        for param in artifacts
            .declaration
            .signature()
            .map(|s| s.params.as_slice())
            .unwrap_or_default()
        {
            let _ = write!(out, "  {} {}", param.cpp_type, param.name);
            if let Some(default) = &param.default {
                let _ = write!(out, " = {default}");
            }
            if param.suggestion {
                out.push_str("  (optional handle)");
            }
            out.push('\n');
        }
        for diagnostic in &artifacts.diagnostics {
            let _ = writeln!(out, "  ! {}", diagnostic.kind);
        }
    }
    Ok(out)
}

fn load_catalog(schema: &Path, include_dirs: &[PathBuf]) -> Result<NamespaceCatalog> {
    let options = include_dirs
        .iter()
        .fold(CatalogOptions::new(), |opts, dir| opts.search_dir(dir.clone()));
    let catalog = NamespaceCatalog::load(schema, &options)
        .with_context(|| format!("failed to load namespaces from {}", schema.display()))?;
    let report = validate_catalog(&catalog)?;
    if !report.warnings.is_empty() {
        warn!(warnings = report.warnings.len(), "schema validation reported problems");
    }
    Ok(catalog)
}
