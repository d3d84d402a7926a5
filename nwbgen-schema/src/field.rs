//! Normalised view of a single attribute, dataset or group inside a type.

use serde_json::Value;
use std::fmt;

use crate::error::SchemaError;
use crate::naming::split_qualified;
use crate::spec::{AttributeSpec, DatasetSpec, GroupSpec, member_key};
use crate::types::{Dtype, Quantity, Shape};

/// Slash-separated location of a field relative to its owning type.
///
/// Named fields end with their own name. Unnamed typed fields carry the
/// path of the container they live in, which is empty at the type root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct FieldPath(String);

impl FieldPath {
    /// Builds a path from a prefix and an optional name.
    #[must_use]
    pub fn join(prefix: &str, name: Option<&str>) -> Self {
        match (prefix.is_empty(), name) {
            (false, Some(name)) => Self(format!("{prefix}/{name}")),
            (true, Some(name)) => Self(name.to_string()),
            (_, None) => Self(prefix.to_string()),
        }
    }

    /// Returns the path as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true at the type root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the path segments in declaration order.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Returns the path of the containing object, empty for root members.
    #[must_use]
    pub fn container(&self) -> &str {
        self.0.rsplit_once('/').map_or("", |(head, _)| head)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind-specific payload of a field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// An attribute.
    Attribute {
        /// Element type.
        dtype: Dtype,
        /// Shape, absent for scalars.
        shape: Option<Shape>,
    },
    /// A dataset, possibly of a registered type.
    Dataset {
        /// Element type.
        dtype: Dtype,
        /// Shape, absent for scalars.
        shape: Option<Shape>,
        /// Registered type of the dataset.
        data_type: Option<String>,
    },
    /// A group, possibly of a registered type.
    Group {
        /// Registered type of the group.
        data_type: Option<String>,
    },
}

/// Normalised field description.
///
/// Every dataset or group field has a name, a registered type, or both.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    /// Fixed name, if any.
    pub name: Option<String>,
    /// Location inside the owning type.
    pub path: FieldPath,
    /// Documentation.
    pub doc: String,
    /// Cardinality.
    pub quantity: Quantity,
    /// Whether at least one instance must exist.
    pub required: bool,
    /// Schema default value.
    pub default_value: Option<Value>,
    /// Fixed value.
    pub fixed_value: Option<Value>,
    /// Kind-specific payload.
    pub kind: FieldKind,
}

impl FieldSpec {
    /// Builds the field for an attribute.
    #[must_use]
    pub fn from_attribute(attr: &AttributeSpec, prefix: &str) -> Self {
        Self {
            name: Some(attr.name.clone()),
            path: FieldPath::join(prefix, Some(&attr.name)),
            doc: attr.doc.clone().unwrap_or_default(),
            quantity: if attr.required {
                Quantity::One
            } else {
                Quantity::ZeroOrOne
            },
            required: attr.required,
            default_value: attr.default_value.clone(),
            fixed_value: attr.value.clone(),
            kind: FieldKind::Attribute {
                dtype: attr.dtype.clone().unwrap_or_default(),
                shape: attr.shape.clone(),
            },
        }
    }

    /// Builds the field for a dataset.
    ///
    /// # Errors
    /// Returns `SchemaError::AnonymousUntypedField` if the dataset has
    /// neither a name nor a type.
    pub fn from_dataset(
        ds: &DatasetSpec,
        prefix: &str,
        type_name: &str,
    ) -> Result<Self, SchemaError> {
        let data_type = bare_type(ds.data_type());
        check_identified(ds.name.as_deref(), data_type.as_deref(), prefix, type_name)?;
        Ok(Self {
            name: ds.name.clone(),
            path: FieldPath::join(prefix, ds.name.as_deref()),
            doc: ds.doc.clone().unwrap_or_default(),
            quantity: ds.quantity,
            required: ds.quantity.is_required(),
            default_value: ds.default_value.clone(),
            fixed_value: ds.value.clone(),
            kind: FieldKind::Dataset {
                dtype: ds.dtype.clone().unwrap_or_default(),
                shape: ds.shape.clone(),
                data_type,
            },
        })
    }

    /// Builds the field for a group.
    ///
    /// # Errors
    /// Returns `SchemaError::AnonymousUntypedField` if the group has
    /// neither a name nor a type.
    pub fn from_group(g: &GroupSpec, prefix: &str, type_name: &str) -> Result<Self, SchemaError> {
        let data_type = bare_type(g.data_type());
        check_identified(g.name.as_deref(), data_type.as_deref(), prefix, type_name)?;
        Ok(Self {
            name: g.name.clone(),
            path: FieldPath::join(prefix, g.name.as_deref()),
            doc: g.doc.clone().unwrap_or_default(),
            quantity: g.quantity,
            required: g.quantity.is_required(),
            default_value: None,
            fixed_value: None,
            kind: FieldKind::Group { data_type },
        })
    }

    /// Returns the registered type of a dataset or group field.
    #[must_use]
    pub fn data_type(&self) -> Option<&str> {
        match &self.kind {
            FieldKind::Dataset { data_type, .. } | FieldKind::Group { data_type } => {
                data_type.as_deref()
            }
            FieldKind::Attribute { .. } => None,
        }
    }

    /// Returns the dtype of an attribute or dataset field.
    #[must_use]
    pub fn dtype(&self) -> Option<&Dtype> {
        match &self.kind {
            FieldKind::Attribute { dtype, .. } | FieldKind::Dataset { dtype, .. } => Some(dtype),
            FieldKind::Group { .. } => None,
        }
    }

    /// Returns the shape of an attribute or dataset field.
    #[must_use]
    pub fn shape(&self) -> Option<&Shape> {
        match &self.kind {
            FieldKind::Attribute { shape, .. } | FieldKind::Dataset { shape, .. } => {
                shape.as_ref()
            }
            FieldKind::Group { .. } => None,
        }
    }

    /// Returns true for attributes.
    #[must_use]
    pub fn is_attribute(&self) -> bool {
        matches!(self.kind, FieldKind::Attribute { .. })
    }

    /// Returns true for datasets.
    #[must_use]
    pub fn is_dataset(&self) -> bool {
        matches!(self.kind, FieldKind::Dataset { .. })
    }

    /// Returns true for groups.
    #[must_use]
    pub fn is_group(&self) -> bool {
        matches!(self.kind, FieldKind::Group { .. })
    }

    /// Returns true for a group with no registered type.
    #[must_use]
    pub fn is_structural_group(&self) -> bool {
        matches!(self.kind, FieldKind::Group { data_type: None })
    }

    /// Returns true if the field carries a fixed value.
    #[must_use]
    pub fn is_fixed(&self) -> bool {
        self.fixed_value.is_some()
    }

    /// Returns the key used to match this field against a parent type's
    /// fields: its path, plus its type when it has no name.
    #[must_use]
    pub fn match_key(&self) -> (FieldPath, Option<&str>) {
        let ty = if self.name.is_none() {
            self.data_type()
        } else {
            None
        };
        (self.path.clone(), ty)
    }

    /// Returns the top-level member key used by the catalog's inheritance
    /// queries.
    #[must_use]
    pub fn inheritance_key(&self) -> String {
        match self.path.segments().next() {
            Some(first) => first.to_string(),
            None => member_key(None, self.data_type()).unwrap_or_default(),
        }
    }
}

fn bare_type(data_type: Option<&str>) -> Option<String> {
    data_type.map(|t| split_qualified(t).1.to_string())
}

fn check_identified(
    name: Option<&str>,
    data_type: Option<&str>,
    prefix: &str,
    type_name: &str,
) -> Result<(), SchemaError> {
    if name.is_none() && data_type.is_none() {
        return Err(SchemaError::AnonymousUntypedField {
            type_name: type_name.to_string(),
            path: if prefix.is_empty() {
                "<root>".to_string()
            } else {
                prefix.to_string()
            },
        });
    }
    Ok(())
}
