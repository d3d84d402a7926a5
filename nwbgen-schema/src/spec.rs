//! Typed model of schema source documents.
//!
//! Both the `data_type_*` spelling (HDMF) and the `neurodata_type_*` spelling
//! (NWB) are accepted.

use serde::Deserialize;
use serde_json::Value;

use crate::types::{Dtype, Quantity, Shape};

fn default_true() -> bool {
    true
}

/// A named scalar or array attached to a group or dataset.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AttributeSpec {
    /// Attribute name.
    pub name: String,
    /// Documentation.
    #[serde(default)]
    pub doc: Option<String>,
    /// Element type.
    #[serde(default)]
    pub dtype: Option<Dtype>,
    /// Shape; absent means scalar.
    #[serde(default)]
    pub shape: Option<Shape>,
    /// Dimension labels.
    #[serde(default)]
    pub dims: Option<Value>,
    /// Whether the attribute must be present.
    #[serde(default = "default_true")]
    pub required: bool,
    /// Fixed value.
    #[serde(default)]
    pub value: Option<Value>,
    /// Default value.
    #[serde(default)]
    pub default_value: Option<Value>,
}

/// A dataset, either a type definition or a member of a group.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct DatasetSpec {
    /// Type defined by this dataset.
    #[serde(default, alias = "neurodata_type_def")]
    pub data_type_def: Option<String>,
    /// Type this dataset includes or extends.
    #[serde(default, alias = "neurodata_type_inc")]
    pub data_type_inc: Option<String>,
    /// Fixed name.
    #[serde(default)]
    pub name: Option<String>,
    /// Suggested name.
    #[serde(default)]
    pub default_name: Option<String>,
    /// Documentation.
    #[serde(default)]
    pub doc: Option<String>,
    /// Element type.
    #[serde(default)]
    pub dtype: Option<Dtype>,
    /// Shape; absent means scalar.
    #[serde(default)]
    pub shape: Option<Shape>,
    /// Dimension labels.
    #[serde(default)]
    pub dims: Option<Value>,
    /// Cardinality.
    #[serde(default)]
    pub quantity: Quantity,
    /// Fixed value.
    #[serde(default)]
    pub value: Option<Value>,
    /// Default value.
    #[serde(default)]
    pub default_value: Option<Value>,
    /// Attributes.
    #[serde(default)]
    pub attributes: Vec<AttributeSpec>,
}

/// A group, either a type definition or a member of another group.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct GroupSpec {
    /// Type defined by this group.
    #[serde(default, alias = "neurodata_type_def")]
    pub data_type_def: Option<String>,
    /// Type this group includes or extends.
    #[serde(default, alias = "neurodata_type_inc")]
    pub data_type_inc: Option<String>,
    /// Fixed name.
    #[serde(default)]
    pub name: Option<String>,
    /// Suggested name.
    #[serde(default)]
    pub default_name: Option<String>,
    /// Documentation.
    #[serde(default)]
    pub doc: Option<String>,
    /// Cardinality.
    #[serde(default)]
    pub quantity: Quantity,
    /// Attributes.
    #[serde(default)]
    pub attributes: Vec<AttributeSpec>,
    /// Member datasets.
    #[serde(default)]
    pub datasets: Vec<DatasetSpec>,
    /// Member groups.
    #[serde(default)]
    pub groups: Vec<GroupSpec>,
}

/// Key identifying a member of a container for inheritance merging.
///
/// Named members are keyed by name; unnamed members by their type.
pub(crate) fn member_key(name: Option<&str>, data_type: Option<&str>) -> Option<String> {
    match (name, data_type) {
        (Some(name), _) => Some(name.to_string()),
        (None, Some(t)) => Some(format!("<{t}>")),
        (None, None) => None,
    }
}

impl DatasetSpec {
    /// Returns the type this dataset defines or includes.
    #[must_use]
    pub fn data_type(&self) -> Option<&str> {
        self.data_type_def
            .as_deref()
            .or(self.data_type_inc.as_deref())
    }

    pub(crate) fn member_key(&self) -> Option<String> {
        member_key(self.name.as_deref(), self.data_type())
    }
}

impl GroupSpec {
    /// Returns the type this group defines or includes.
    #[must_use]
    pub fn data_type(&self) -> Option<&str> {
        self.data_type_def
            .as_deref()
            .or(self.data_type_inc.as_deref())
    }

    pub(crate) fn member_key(&self) -> Option<String> {
        member_key(self.name.as_deref(), self.data_type())
    }
}

/// Top-level type definition from a schema source.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeSpec {
    /// Composite of attributes, datasets and subgroups.
    Group(GroupSpec),
    /// Array with attributes.
    Dataset(DatasetSpec),
}

impl TypeSpec {
    /// Returns the defined type name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Group(g) => g.data_type_def.as_deref(),
            Self::Dataset(d) => d.data_type_def.as_deref(),
        }
    }

    /// Returns the declared parent type, possibly namespace-qualified.
    #[must_use]
    pub fn parent(&self) -> Option<&str> {
        match self {
            Self::Group(g) => g.data_type_inc.as_deref(),
            Self::Dataset(d) => d.data_type_inc.as_deref(),
        }
    }

    /// Returns the documentation string.
    #[must_use]
    pub fn doc(&self) -> Option<&str> {
        match self {
            Self::Group(g) => g.doc.as_deref(),
            Self::Dataset(d) => d.doc.as_deref(),
        }
    }

    /// Returns the attributes of the type.
    #[must_use]
    pub fn attributes(&self) -> &[AttributeSpec] {
        match self {
            Self::Group(g) => &g.attributes,
            Self::Dataset(d) => &d.attributes,
        }
    }

    /// Returns true for group types.
    #[must_use]
    pub fn is_group(&self) -> bool {
        matches!(self, Self::Group(_))
    }
}

/// Contents of one schema source file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SchemaDocument {
    /// Group type definitions.
    #[serde(default)]
    pub groups: Vec<GroupSpec>,
    /// Dataset type definitions.
    #[serde(default)]
    pub datasets: Vec<DatasetSpec>,
}

impl SchemaDocument {
    /// Returns the type definitions in document order, groups first.
    pub fn into_types(self) -> impl Iterator<Item = TypeSpec> {
        self.groups
            .into_iter()
            .map(TypeSpec::Group)
            .chain(self.datasets.into_iter().map(TypeSpec::Dataset))
    }
}
