//! Initializer parameter derivation.
//!
//! Turns the walked field list of a type into parameter descriptors. The
//! signature order is a stable partition of the traversal order:
//!
//! 1. parameters without a default,
//! 2. parameters with a default taken from the schema,
//! 3. parameters with a synthesized default (absent array configuration),
//! 4. optional typed handles, which are rendered commented out.
//!
//! Fixed-value fields and untyped structural groups never enter the
//! signature, but remain in the descriptor list for the definition body.

use std::collections::HashSet;
use std::fmt;

use nwbgen_schema::naming::to_camel_case;
use nwbgen_schema::{Dtype, FieldKind, FieldSpec, RefKind, TypeRecord, TypeRegistry, WalkedField};
use serde_json::Value;

use crate::cpp::naming::{is_cpp_keyword, qualified_class, string_literal};
use crate::cpp::types::CppScalar;
use crate::diagnostics::DiagnosticKind;
use crate::overrides::OverrideStatus;

/// AqNWB array dataset configuration type.
pub const ARRAY_CONFIG_TYPE: &str = "AQNWB::IO::ArrayDataSetConfig";

/// A generated class, qualified by the namespace owning its type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedType {
    /// Owning namespace (schema spelling).
    pub namespace: Option<String>,
    /// Type name.
    pub name: String,
}

impl fmt::Display for QualifiedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&qualified_class(self.namespace.as_deref(), &self.name))
    }
}

/// How a field is passed to `initialize`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Representation {
    /// A single value.
    Scalar(CppScalar),
    /// A list of values.
    Sequence(CppScalar),
    /// One instance of a generated type.
    Handle(QualifiedType),
    /// Several instances of a generated type.
    HandleSequence(QualifiedType),
    /// Shape and chunking configuration for an array dataset.
    ArrayConfig {
        /// The dataset may be absent.
        optional: bool,
    },
    /// An untyped group; never a parameter.
    Structural,
}

impl Representation {
    /// Returns the C++ parameter type.
    #[must_use]
    pub fn cpp_type(&self) -> Option<String> {
        let ty = match self {
            Self::Scalar(s) if s.is_string() => format!("const {s}&"),
            Self::Scalar(s) => s.cpp_name().to_string(),
            Self::Sequence(s) => format!("const std::vector<{s}>&"),
            Self::Handle(q) => format!("const std::shared_ptr<{q}>&"),
            Self::HandleSequence(q) => format!("const std::vector<std::shared_ptr<{q}>>&"),
            Self::ArrayConfig { optional: false } => format!("const {ARRAY_CONFIG_TYPE}&"),
            Self::ArrayConfig { optional: true } => {
                format!("const std::optional<{ARRAY_CONFIG_TYPE}>&")
            }
            Self::Structural => return None,
        };
        Some(ty)
    }

    /// Returns the value type of scalar and sequence representations.
    #[must_use]
    pub fn scalar(&self) -> Option<CppScalar> {
        match self {
            Self::Scalar(s) | Self::Sequence(s) => Some(*s),
            _ => None,
        }
    }

    /// Returns the referenced class of handle representations.
    #[must_use]
    pub fn handle_type(&self) -> Option<&QualifiedType> {
        match self {
            Self::Handle(q) | Self::HandleSequence(q) => Some(q),
            _ => None,
        }
    }
}

/// Where a parameter's default comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultSource {
    /// `value` or `default_value` in the schema.
    Schema,
    /// An empty value chosen for an optional field.
    Synthesized,
}

/// One entry of a type's parameter list.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDescriptor {
    /// C++ variable name, unique within the type.
    pub variable_name: String,
    /// How the value is passed.
    pub representation: Representation,
    /// Rendered default expression.
    pub default: Option<String>,
    /// Origin of the default.
    pub default_source: Option<DefaultSource>,
    /// The schema fixes the value.
    pub is_fixed: bool,
    /// An optional typed handle usually attached after construction.
    pub is_optional_handle: bool,
    /// Relationship to the parent type.
    pub status: OverrideStatus,
    /// The field this parameter is derived from.
    pub field: FieldSpec,
    /// Enclosing untyped container.
    pub parent: Option<FieldSpec>,
}

impl ParameterDescriptor {
    /// Returns true if the descriptor is part of the signature.
    #[must_use]
    pub fn is_parameter(&self) -> bool {
        !self.is_fixed && self.representation != Representation::Structural
    }

    /// Returns the C++ parameter type.
    #[must_use]
    pub fn cpp_type(&self) -> Option<String> {
        self.representation.cpp_type()
    }

    /// Returns the field path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.field.path.as_str()
    }

    /// Signature partition, lower sorts first.
    #[must_use]
    pub fn rank(&self) -> u8 {
        if self.is_optional_handle {
            3
        } else {
            match self.default_source {
                None => 0,
                Some(DefaultSource::Schema) => 1,
                Some(DefaultSource::Synthesized) => 2,
            }
        }
    }
}

/// Parameters of one type, in traversal order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedParameters {
    entries: Vec<ParameterDescriptor>,
    diagnostics: Vec<DiagnosticKind>,
}

impl DerivedParameters {
    /// Returns every descriptor in traversal order.
    #[must_use]
    pub fn entries(&self) -> &[ParameterDescriptor] {
        &self.entries
    }

    /// Returns the signature: non-fixed, non-structural descriptors sorted
    /// by [`ParameterDescriptor::rank`], ties in traversal order.
    #[must_use]
    pub fn signature(&self) -> Vec<&ParameterDescriptor> {
        let mut params: Vec<&ParameterDescriptor> =
            self.entries.iter().filter(|p| p.is_parameter()).collect();
        params.sort_by_key(|p| p.rank());
        params
    }

    /// Returns the fixed-value descriptors in traversal order.
    pub fn fixed(&self) -> impl Iterator<Item = &ParameterDescriptor> {
        self.entries.iter().filter(|p| p.is_fixed)
    }

    /// Looks up a descriptor by variable name.
    #[must_use]
    pub fn find(&self, variable_name: &str) -> Option<&ParameterDescriptor> {
        self.entries.iter().find(|p| p.variable_name == variable_name)
    }

    /// Returns problems found while deriving.
    #[must_use]
    pub fn diagnostics(&self) -> &[DiagnosticKind] {
        &self.diagnostics
    }
}

/// Derives the parameters of a type.
///
/// `statuses` holds the override status of each field, in the same order as
/// `fields`; missing entries count as native. Referenced types not known to
/// the registry are qualified with the record's own namespace.
#[must_use]
pub fn derive_parameters(
    record: &TypeRecord,
    fields: &[WalkedField],
    statuses: &[OverrideStatus],
    registry: &TypeRegistry,
) -> DerivedParameters {
    let mut names = NameAllocator::default();
    let mut out = DerivedParameters::default();

    for (i, walked) in fields.iter().enumerate() {
        let field = &walked.field;
        let status = statuses.get(i).copied().unwrap_or(OverrideStatus::Native);
        let qualify = |t: &str| QualifiedType {
            namespace: Some(
                registry
                    .namespace_of(t)
                    .unwrap_or(record.namespace.as_str())
                    .to_string(),
            ),
            name: t.to_string(),
        };

        let mut default = None;
        let mut default_source = None;
        let mut is_optional_handle = false;

        let representation = match &field.kind {
            FieldKind::Group { data_type: None } => Representation::Structural,
            FieldKind::Group {
                data_type: Some(t),
            }
            | FieldKind::Dataset {
                data_type: Some(t), ..
            } => {
                let single = field.name.is_some() || field.quantity.is_single();
                if !field.required {
                    default = Some(if single { "nullptr" } else { "{}" }.to_string());
                    default_source = Some(DefaultSource::Synthesized);
                    is_optional_handle = true;
                }
                if single {
                    Representation::Handle(qualify(t))
                } else {
                    Representation::HandleSequence(qualify(t))
                }
            }
            FieldKind::Dataset { .. }
                if field.default_value.is_none() && field.fixed_value.is_none() =>
            {
                if !field.required {
                    default = Some("std::nullopt".to_string());
                    default_source = Some(DefaultSource::Synthesized);
                }
                Representation::ArrayConfig {
                    optional: !field.required,
                }
            }
            FieldKind::Attribute { dtype, .. } | FieldKind::Dataset { dtype, .. } => {
                let sequence = field.shape().is_some() || matches!(dtype, Dtype::ArrayOf(_));
                let representation = match dtype {
                    Dtype::Reference {
                        target_type,
                        kind: RefKind::Object,
                    } => {
                        let q = qualify(nwbgen_schema::naming::split_qualified(target_type).1);
                        if sequence {
                            Representation::HandleSequence(q)
                        } else {
                            Representation::Handle(q)
                        }
                    }
                    _ => {
                        let scalar = CppScalar::from_dtype(dtype).unwrap_or_else(|e| {
                            out.diagnostics.push(DiagnosticKind::UnsupportedDtype {
                                field: field.path.to_string(),
                                dtype: e.dtype,
                            });
                            CppScalar::Opaque
                        });
                        if sequence {
                            Representation::Sequence(scalar)
                        } else {
                            Representation::Scalar(scalar)
                        }
                    }
                };
                if let Some(value) = field.fixed_value.as_ref().or(field.default_value.as_ref()) {
                    match render_default(value, &representation) {
                        Ok(text) => {
                            default = Some(text);
                            default_source = Some(DefaultSource::Schema);
                        }
                        Err(reason) => out.diagnostics.push(DiagnosticKind::UnsupportedDefault {
                            field: field.path.to_string(),
                            reason,
                        }),
                    }
                }
                representation
            }
        };

        let base = base_variable_name(field);
        let variable_name = names.allocate(&base);
        if variable_name != base {
            out.diagnostics.push(DiagnosticKind::RenamedParameter {
                field: field.path.to_string(),
                name: base,
                renamed: variable_name.clone(),
            });
        }

        out.entries.push(ParameterDescriptor {
            variable_name,
            representation,
            default,
            default_source,
            is_fixed: field.is_fixed(),
            is_optional_handle,
            status,
            field: field.clone(),
            parent: walked.parent.clone(),
        });
    }
    out
}

/// Builds the variable name from the field's path segments.
///
/// Unnamed typed fields become `param<Type>` at the root, or
/// `<prefix>Param<Type>` inside a container.
fn base_variable_name(field: &FieldSpec) -> String {
    let joined = field.path.segments().collect::<Vec<_>>().join("_");
    let name = match (&field.name, field.data_type()) {
        (None, Some(t)) if joined.is_empty() => format!("param{}", to_camel_case(t, false)),
        (None, Some(t)) => format!(
            "{}Param{}",
            to_camel_case(&joined, true),
            to_camel_case(t, false)
        ),
        _ => to_camel_case(&joined, true),
    };
    if name.is_empty() || is_cpp_keyword(&name) {
        format!("{name}Value")
    } else {
        name
    }
}

#[derive(Default)]
struct NameAllocator {
    used: HashSet<String>,
}

impl NameAllocator {
    fn allocate(&mut self, base: &str) -> String {
        if self.used.insert(base.to_string()) {
            return base.to_string();
        }
        let mut n = 2;
        loop {
            let candidate = format!("{base}{n}");
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}

/// Renders a schema value as a C++ expression for `representation`.
///
/// # Errors
/// Returns a reason for nested lists, nulls, objects and values attached to
/// non-value representations.
pub fn render_default(value: &Value, representation: &Representation) -> Result<String, String> {
    match representation {
        Representation::Scalar(s) => render_scalar(value, *s),
        Representation::Sequence(s) => match value {
            Value::Array(items) => {
                if items.iter().any(Value::is_array) {
                    return Err("multi-dimensional default values are not supported".to_string());
                }
                let rendered = items
                    .iter()
                    .map(|v| render_scalar(v, *s))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(format!("{{{}}}", rendered.join(", ")))
            }
            other => render_scalar(other, *s).map(|v| format!("{{{v}}}")),
        },
        _ => Err("only attribute and dataset values can have defaults".to_string()),
    }
}

fn render_scalar(value: &Value, scalar: CppScalar) -> Result<String, String> {
    match value {
        Value::String(text) if scalar.is_string() || scalar == CppScalar::Opaque => {
            Ok(string_literal(text))
        }
        Value::String(text) if is_literal_of(text, scalar) => Ok(text.clone()),
        Value::String(text) => Err(format!("'{text}' is not a valid {scalar} literal")),
        Value::Number(n) if scalar.is_string() => Ok(string_literal(&n.to_string())),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) if scalar.is_string() => Ok(string_literal(&b.to_string())),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Err("null value".to_string()),
        Value::Array(_) => Err("nested list value".to_string()),
        Value::Object(_) => Err("mapping value".to_string()),
    }
}

/// Whether `text` reads as a literal of a numeric or boolean scalar.
fn is_literal_of(text: &str, scalar: CppScalar) -> bool {
    match scalar {
        CppScalar::Bool => matches!(text, "true" | "false"),
        CppScalar::Float | CppScalar::Double => text.parse::<f64>().is_ok_and(f64::is_finite),
        CppScalar::Int8 | CppScalar::Int16 | CppScalar::Int32 | CppScalar::Int64 => {
            text.parse::<i64>().is_ok()
        }
        CppScalar::UInt8 | CppScalar::UInt16 | CppScalar::UInt32 | CppScalar::UInt64 => {
            text.parse::<u64>().is_ok()
        }
        CppScalar::String | CppScalar::Opaque => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overrides::OverrideResolver;
    use crate::test_support::Fixture;
    use nwbgen_schema::walk_type;

    const SCHEMA: &str = "\
groups:
- neurodata_type_def: Holder
  doc: holder
  attributes:
  - name: unit
    dtype: text
    doc: u
    default_value: volts
  - name: version
    dtype: text
    doc: v
    value: '1.0'
  - name: resolution
    dtype: float32
    doc: r
  - name: offsets
    dtype: float64
    shape: [null]
    doc: o
    default_value: [0.5, 1.5]
  - name: table
    dtype:
      target_type: Table
      reftype: object
    doc: t
  datasets:
  - name: data
    doc: d
    dtype: int32
    shape: [null]
  - name: timestamps
    doc: ts
    dtype: float64
    shape: [null]
    quantity: '?'
  - name: table_ref
    neurodata_type_inc: Table
    doc: tr
  - neurodata_type_inc: Table
    doc: many tables
    quantity: '*'
  groups:
  - name: extra
    doc: structural
    attributes:
    - name: description
      dtype: text
      doc: ed
- neurodata_type_def: Table
  doc: table
";

    fn derive(fixture: &Fixture, name: &str) -> DerivedParameters {
        let registry = fixture.registry();
        let record = registry.get(name).expect("record");
        let resolved = fixture.catalog.get_type(name).expect("type");
        let fields = walk_type(name, &resolved.spec).expect("walk");
        let statuses = OverrideResolver::root().classify_all(&fields);
        derive_parameters(record, &fields, &statuses, &registry)
    }

    fn signature_names(params: &DerivedParameters) -> Vec<&str> {
        params
            .signature()
            .iter()
            .map(|p| p.variable_name.as_str())
            .collect()
    }

    #[test]
    fn test_representations_and_defaults() {
        let fixture = Fixture::single("test", SCHEMA);
        let params = derive(&fixture, "Holder");

        let unit = params.find("unit").expect("unit");
        assert_eq!(unit.cpp_type().as_deref(), Some("const std::string&"));
        assert_eq!(unit.default.as_deref(), Some("\"volts\""));

        let version = params.find("version").expect("version");
        assert!(version.is_fixed);
        assert!(!version.is_parameter());

        let offsets = params.find("offsets").expect("offsets");
        assert_eq!(offsets.cpp_type().as_deref(), Some("const std::vector<double>&"));
        assert_eq!(offsets.default.as_deref(), Some("{0.5, 1.5}"));

        let table = params.find("table").expect("table");
        assert_eq!(
            table.cpp_type().as_deref(),
            Some("const std::shared_ptr<TEST::Table>&")
        );

        let data = params.find("data").expect("data");
        assert_eq!(data.representation, Representation::ArrayConfig { optional: false });

        let ts = params.find("timestamps").expect("timestamps");
        assert_eq!(
            ts.cpp_type().as_deref(),
            Some("const std::optional<AQNWB::IO::ArrayDataSetConfig>&")
        );
        assert_eq!(ts.default.as_deref(), Some("std::nullopt"));

        let many = params.find("paramTable").expect("paramTable");
        assert!(many.is_optional_handle);
        assert_eq!(many.default.as_deref(), Some("{}"));
        assert_eq!(
            many.cpp_type().as_deref(),
            Some("const std::vector<std::shared_ptr<TEST::Table>>&")
        );

        let extra = params.find("extra").expect("extra");
        assert_eq!(extra.representation, Representation::Structural);
        assert!(params.find("extraDescription").is_some());
    }

    #[test]
    fn test_signature_partition() {
        let fixture = Fixture::single("test", SCHEMA);
        let params = derive(&fixture, "Holder");
        assert_eq!(
            signature_names(&params),
            [
                "resolution",
                "table",
                "data",
                "tableRef",
                "extraDescription",
                "unit",
                "offsets",
                "timestamps",
                "paramTable",
            ]
        );
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let fixture = Fixture::single("test", SCHEMA);
        assert_eq!(derive(&fixture, "Holder"), derive(&fixture, "Holder"));
    }

    #[test]
    fn test_render_default_limits() {
        let seq = Representation::Sequence(CppScalar::Int32);
        assert!(render_default(&serde_json::json!([[1, 2], [3, 4]]), &seq).is_err());
        assert_eq!(
            render_default(&serde_json::json!(3), &seq).as_deref(),
            Ok("{3}")
        );
        let flag = Representation::Scalar(CppScalar::Bool);
        assert_eq!(render_default(&serde_json::json!(true), &flag).as_deref(), Ok("true"));
        assert!(render_default(&serde_json::json!(null), &flag).is_err());
    }

    #[test]
    fn test_text_default_on_numeric_scalar() {
        let float = Representation::Scalar(CppScalar::Float);
        assert_eq!(render_default(&serde_json::json!("2.5"), &float).as_deref(), Ok("2.5"));
        let err = render_default(&serde_json::json!("abc"), &float).expect_err("abc is not a float");
        assert!(err.contains("float"));
        let count = Representation::Sequence(CppScalar::UInt32);
        assert!(render_default(&serde_json::json!(["1", "-2"]), &count).is_err());
        let flag = Representation::Scalar(CppScalar::Bool);
        assert!(render_default(&serde_json::json!("yes"), &flag).is_err());
    }

    #[test]
    fn test_text_default_reports_diagnostic() {
        let schema = "\
groups:
- neurodata_type_def: Gain
  doc: gain
  attributes:
  - name: factor
    dtype: float32
    doc: f
    default_value: abc
";
        let fixture = Fixture::single("test", schema);
        let params = derive(&fixture, "Gain");
        let factor = params.find("factor").expect("factor");
        assert_eq!(factor.default, None);
        assert!(params.diagnostics.iter().any(|d| matches!(
            d,
            DiagnosticKind::UnsupportedDefault { field, .. } if field == "factor"
        )));
    }

    #[test]
    fn test_name_collisions_are_suffixed() {
        let mut names = NameAllocator::default();
        assert_eq!(names.allocate("data"), "data");
        assert_eq!(names.allocate("data"), "data2");
        assert_eq!(names.allocate("data"), "data3");
    }
}
