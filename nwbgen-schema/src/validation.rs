//! Catalog consistency checks.
//!
//! Problems that make the whole catalog unusable are errors. Problems that
//! only affect individual types are collected as warnings so the remaining
//! types can still be generated.

use tracing::warn;

use crate::catalog::NamespaceCatalog;
use crate::error::SchemaError;
use crate::walker::walk_type;

/// Non-fatal findings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Human readable warnings.
    pub warnings: Vec<String>,
}

impl ValidationReport {
    fn warn(&mut self, message: String) {
        warn!("{message}");
        self.warnings.push(message);
    }
}

/// Validates a loaded catalog.
///
/// # Errors
/// Returns `SchemaError::Validation` if there is no root namespace to
/// generate.
pub fn validate_catalog(catalog: &NamespaceCatalog) -> Result<ValidationReport, SchemaError> {
    if catalog.roots().is_empty() {
        return Err(SchemaError::validation(
            "no root namespace: every loaded namespace is included by another",
        ));
    }

    let mut report = ValidationReport::default();
    validate_includes(catalog, &mut report);
    validate_types(catalog, &mut report);
    Ok(report)
}

fn validate_includes(catalog: &NamespaceCatalog, report: &mut ValidationReport) {
    for ns in catalog.namespaces() {
        for include in &ns.includes {
            let Some(filter) = &include.data_types else {
                continue;
            };
            let visible = catalog.visible_types(&include.namespace);
            for t in filter {
                if !visible.contains(t) {
                    report.warn(format!(
                        "namespace '{}' imports '{}' from '{}', which does not provide it",
                        ns.name, t, include.namespace
                    ));
                }
            }
        }
    }
}

fn validate_types(catalog: &NamespaceCatalog, report: &mut ValidationReport) {
    for t in catalog.types() {
        if let (Some(parent), false) = (&t.parent, t.parent_found) {
            report.warn(format!(
                "type '{}' extends '{}', which is not defined by any loaded namespace",
                t.name, parent
            ));
        }
        let fields = match walk_type(&t.name, &t.spec) {
            Ok(fields) => fields,
            Err(e) => {
                report.warn(e.to_string());
                continue;
            }
        };
        for w in &fields {
            let field = &w.field;
            if field.fixed_value.is_some() && field.default_value.is_some() {
                report.warn(format!(
                    "field '{}' of type '{}' has both a fixed value and a default",
                    field.path, t.name
                ));
            }
        }
    }
}
