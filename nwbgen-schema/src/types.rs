//! Dtype taxonomy, cardinality and shape types.
//!
//! These mirror the value vocabulary of the NWB/HDMF specification language:
//! primitive dtype names, object and region references, compound dtypes and
//! the `quantity` keyword of datasets and groups.

use serde::Deserialize;
use std::fmt;

use crate::error::ParseError;

/// Primitive dtypes of the specification language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveDtype {
    /// Variable length UTF-8 text (`text`, `utf`, `utf8`, `utf-8`).
    Text,
    /// ASCII text (`ascii`, `str`, `bytes`).
    Ascii,
    /// ISO 8601 datetime stored as text.
    IsoDatetime,
    /// 32-bit float.
    Float32,
    /// 64-bit float.
    Float64,
    /// Any numeric type.
    Numeric,
    /// Signed 8-bit integer.
    Int8,
    /// Signed 16-bit integer.
    Int16,
    /// Signed 32-bit integer.
    Int32,
    /// Signed 64-bit integer.
    Int64,
    /// Unsigned 8-bit integer.
    Uint8,
    /// Unsigned 16-bit integer.
    Uint16,
    /// Unsigned 32-bit integer.
    Uint32,
    /// Unsigned 64-bit integer.
    Uint64,
    /// Boolean.
    Bool,
}

impl PrimitiveDtype {
    /// Parses a dtype name as written in a schema document.
    #[must_use]
    pub fn from_schema_name(name: &str) -> Option<Self> {
        let dtype = match name {
            "text" | "utf" | "utf8" | "utf-8" => Self::Text,
            "ascii" | "str" | "bytes" => Self::Ascii,
            "isodatetime" | "datetime" => Self::IsoDatetime,
            "float32" | "float" => Self::Float32,
            "float64" | "double" => Self::Float64,
            "numeric" | "number" => Self::Numeric,
            "int8" => Self::Int8,
            "int16" | "short" => Self::Int16,
            "int32" | "int" => Self::Int32,
            "int64" | "long" => Self::Int64,
            "uint8" => Self::Uint8,
            "uint16" => Self::Uint16,
            "uint32" | "uint" => Self::Uint32,
            "uint64" => Self::Uint64,
            "bool" => Self::Bool,
            _ => return None,
        };
        Some(dtype)
    }

    /// Returns the canonical schema name.
    #[must_use]
    pub const fn schema_name(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Ascii => "ascii",
            Self::IsoDatetime => "isodatetime",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Numeric => "numeric",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Uint8 => "uint8",
            Self::Uint16 => "uint16",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
            Self::Bool => "bool",
        }
    }

    /// Returns true for the textual dtypes.
    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self, Self::Text | Self::Ascii | Self::IsoDatetime)
    }
}

impl fmt::Display for PrimitiveDtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.schema_name())
    }
}

/// Kind of a reference dtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefKind {
    /// Reference to a whole object.
    Object,
    /// Reference to a region of a dataset.
    Region,
}

/// One member of a compound dtype.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CompoundField {
    /// Member name.
    pub name: String,
    /// Member dtype.
    pub dtype: Dtype,
    /// Member documentation.
    #[serde(default)]
    pub doc: Option<String>,
}

/// Element type of an attribute or dataset.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(from = "RawDtype")]
pub enum Dtype {
    /// No dtype given.
    #[default]
    Unspecified,
    /// A primitive dtype.
    Primitive(PrimitiveDtype),
    /// An array whose elements have the inner dtype.
    ArrayOf(Box<Dtype>),
    /// A reference to an instance of another type.
    Reference {
        /// Referenced type name.
        target_type: String,
        /// Reference kind.
        kind: RefKind,
    },
    /// A compound (struct-like) dtype.
    Compound(Vec<CompoundField>),
    /// A dtype name the compiler does not recognise.
    Unknown(String),
}

impl Dtype {
    /// Returns the primitive dtype, if any.
    #[must_use]
    pub fn primitive(&self) -> Option<PrimitiveDtype> {
        match self {
            Self::Primitive(p) => Some(*p),
            _ => None,
        }
    }

    /// Returns true if the dtype is textual.
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.primitive().is_some_and(|p| p.is_text())
    }

    /// Returns the target type of an object reference.
    #[must_use]
    pub fn reference_target(&self) -> Option<&str> {
        match self {
            Self::Reference { target_type, .. } => Some(target_type),
            _ => None,
        }
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unspecified => f.write_str("unspecified"),
            Self::Primitive(p) => write!(f, "{p}"),
            Self::ArrayOf(inner) => write!(f, "array of {inner}"),
            Self::Reference {
                target_type,
                kind: RefKind::Object,
            } => write!(f, "object reference to {target_type}"),
            Self::Reference {
                target_type,
                kind: RefKind::Region,
            } => write!(f, "region reference to {target_type}"),
            Self::Compound(fields) => write!(f, "compound of {} fields", fields.len()),
            Self::Unknown(name) => write!(f, "unknown dtype '{name}'"),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDtype {
    Name(String),
    Reference {
        target_type: String,
        reftype: String,
    },
    Compound(Vec<CompoundField>),
}

impl From<RawDtype> for Dtype {
    fn from(raw: RawDtype) -> Self {
        match raw {
            RawDtype::Name(name) => match PrimitiveDtype::from_schema_name(&name) {
                Some(p) => Self::Primitive(p),
                None => Self::Unknown(name),
            },
            RawDtype::Reference {
                target_type,
                reftype,
            } => match reftype.as_str() {
                "object" | "ref" | "reference" => Self::Reference {
                    target_type,
                    kind: RefKind::Object,
                },
                "region" => Self::Reference {
                    target_type,
                    kind: RefKind::Region,
                },
                other => Self::Unknown(format!("{other} reference to {target_type}")),
            },
            RawDtype::Compound(fields) => Self::Compound(fields),
        }
    }
}

/// Cardinality of a dataset or group inside its container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "RawQuantity")]
pub enum Quantity {
    /// Exactly one (the default).
    #[default]
    One,
    /// Zero or one (`?`).
    ZeroOrOne,
    /// Zero or more (`*`).
    ZeroOrMany,
    /// One or more (`+`).
    OneOrMany,
    /// A fixed count greater than one.
    Exactly(u64),
}

impl Quantity {
    /// Returns true if at most one instance may exist.
    #[must_use]
    pub const fn is_single(&self) -> bool {
        matches!(self, Self::One | Self::ZeroOrOne)
    }

    /// Returns true if at least one instance must exist.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        matches!(self, Self::One | Self::OneOrMany | Self::Exactly(_))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::One => f.write_str("1"),
            Self::ZeroOrOne => f.write_str("?"),
            Self::ZeroOrMany => f.write_str("*"),
            Self::OneOrMany => f.write_str("+"),
            Self::Exactly(n) => write!(f, "{n}"),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawQuantity {
    Count(u64),
    Symbol(String),
}

impl TryFrom<RawQuantity> for Quantity {
    type Error = ParseError;

    fn try_from(raw: RawQuantity) -> Result<Self, Self::Error> {
        match raw {
            RawQuantity::Count(0) => Err(ParseError::InvalidQuantity {
                value: "0".to_string(),
            }),
            RawQuantity::Count(1) => Ok(Self::One),
            RawQuantity::Count(n) => Ok(Self::Exactly(n)),
            RawQuantity::Symbol(s) => match s.as_str() {
                "1" => Ok(Self::One),
                "?" | "zero_or_one" | "one_or_zero" => Ok(Self::ZeroOrOne),
                "*" | "zero_or_many" => Ok(Self::ZeroOrMany),
                "+" | "one_or_many" => Ok(Self::OneOrMany),
                other => other
                    .parse::<u64>()
                    .ok()
                    .filter(|n| *n > 1)
                    .map(Self::Exactly)
                    .ok_or_else(|| ParseError::InvalidQuantity {
                        value: other.to_string(),
                    }),
            },
        }
    }
}

/// Shape of an attribute or dataset.
///
/// Either a single list of dimension sizes (`null` meaning unbounded) or a
/// list of alternative shapes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Shape(serde_json::Value);

impl Shape {
    /// Returns the rank of the first allowed shape.
    #[must_use]
    pub fn rank(&self) -> usize {
        match &self.0 {
            serde_json::Value::Array(dims) => match dims.first() {
                Some(serde_json::Value::Array(first)) => first.len(),
                _ => dims.len(),
            },
            serde_json::Value::Null => 0,
            _ => 1,
        }
    }

    /// Returns the raw shape value.
    #[must_use]
    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}
