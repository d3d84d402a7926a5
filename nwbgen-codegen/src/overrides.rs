//! Classifies a type's fields against its parent's fields.

use std::collections::HashMap;

use nwbgen_schema::{FieldPath, FieldSpec, WalkedField};

/// Relationship of a field to the same field on the parent type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverrideStatus {
    /// Declared by this type only.
    Native,
    /// Inherited without change.
    InheritedUnmodified,
    /// Inherited and redefined with a different contract.
    InheritedOverridden,
}

impl OverrideStatus {
    /// Returns true if the field exists on the parent.
    #[must_use]
    pub const fn is_inherited(&self) -> bool {
        !matches!(self, Self::Native)
    }

    /// Returns true if the field's accessor belongs in the live section.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        !matches!(self, Self::InheritedUnmodified)
    }

    /// Lower-case label used in logs and reports.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::InheritedUnmodified => "inherited_unmodified",
            Self::InheritedOverridden => "inherited_overridden",
        }
    }
}

/// Matches fields by path, and by type as well for unnamed typed fields.
#[derive(Debug, Default)]
pub struct OverrideResolver<'a> {
    parent: HashMap<(FieldPath, Option<String>), &'a FieldSpec>,
}

impl<'a> OverrideResolver<'a> {
    /// Creates a resolver against the parent's full field list.
    #[must_use]
    pub fn new(parent_fields: &'a [WalkedField]) -> Self {
        let parent = parent_fields
            .iter()
            .map(|w| (owned_key(&w.field), &w.field))
            .collect();
        Self { parent }
    }

    /// Creates a resolver for a type with no parent: every field is native.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Classifies one field.
    #[must_use]
    pub fn classify(&self, field: &FieldSpec) -> OverrideStatus {
        match self.parent.get(&owned_key(field)) {
            None => OverrideStatus::Native,
            Some(parent) if same_contract(field, parent) => OverrideStatus::InheritedUnmodified,
            Some(_) => OverrideStatus::InheritedOverridden,
        }
    }

    /// Classifies every field, in order.
    #[must_use]
    pub fn classify_all(&self, fields: &[WalkedField]) -> Vec<OverrideStatus> {
        fields.iter().map(|w| self.classify(&w.field)).collect()
    }
}

fn owned_key(field: &FieldSpec) -> (FieldPath, Option<String>) {
    let (path, ty) = field.match_key();
    (path, ty.map(str::to_string))
}

/// Documentation changes do not count as an override.
fn same_contract(a: &FieldSpec, b: &FieldSpec) -> bool {
    a.kind == b.kind
        && a.quantity == b.quantity
        && a.required == b.required
        && a.default_value == b.default_value
        && a.fixed_value == b.fixed_value
}

#[cfg(test)]
mod tests {
    use super::*;
    use nwbgen_schema::{AttributeSpec, Dtype, GroupSpec, PrimitiveDtype, Quantity};

    fn attr(name: &str, default: Option<&str>) -> AttributeSpec {
        AttributeSpec {
            name: name.to_string(),
            doc: Some("doc".to_string()),
            dtype: Some(Dtype::Primitive(PrimitiveDtype::Text)),
            shape: None,
            dims: None,
            required: true,
            value: None,
            default_value: default.map(|d| serde_json::json!(d)),
        }
    }

    fn walked(field: FieldSpec) -> WalkedField {
        WalkedField { field, parent: None }
    }

    #[test]
    fn test_classification() {
        let parent = vec![walked(FieldSpec::from_attribute(&attr("name", None), ""))];
        let resolver = OverrideResolver::new(&parent);

        let same = FieldSpec::from_attribute(&attr("name", None), "");
        assert_eq!(resolver.classify(&same), OverrideStatus::InheritedUnmodified);

        let mut doc_only = same.clone();
        doc_only.doc = "reworded".to_string();
        assert_eq!(resolver.classify(&doc_only), OverrideStatus::InheritedUnmodified);

        let changed = FieldSpec::from_attribute(&attr("name", Some("unnamed")), "");
        assert_eq!(resolver.classify(&changed), OverrideStatus::InheritedOverridden);

        let other = FieldSpec::from_attribute(&attr("other", None), "");
        assert_eq!(resolver.classify(&other), OverrideStatus::Native);
    }

    #[test]
    fn test_unnamed_fields_match_by_type() {
        let group = |t: &str| GroupSpec {
            data_type_inc: Some(t.to_string()),
            quantity: Quantity::ZeroOrMany,
            ..Default::default()
        };
        let parent = vec![walked(FieldSpec::from_group(&group("TimeSeries"), "", "P").expect("field"))];
        let resolver = OverrideResolver::new(&parent);
        let same = FieldSpec::from_group(&group("TimeSeries"), "", "C").expect("field");
        let other = FieldSpec::from_group(&group("Image"), "", "C").expect("field");
        assert_eq!(resolver.classify(&same), OverrideStatus::InheritedUnmodified);
        assert_eq!(resolver.classify(&other), OverrideStatus::Native);
    }

    #[test]
    fn test_root_resolver_is_all_native() {
        let field = FieldSpec::from_attribute(&attr("name", None), "");
        assert_eq!(OverrideResolver::root().classify(&field), OverrideStatus::Native);
        assert!(OverrideStatus::InheritedOverridden.is_live());
        assert!(!OverrideStatus::InheritedUnmodified.is_live());
    }
}
