//! Breadth-first field walker.
//!
//! Produces the ordered field list of a resolved type. The type root and
//! untyped containers are expanded; members with a registered type are
//! reported but not entered, since their contents belong to that type.

use std::borrow::Cow;
use std::collections::VecDeque;

use crate::error::SchemaError;
use crate::field::FieldSpec;
use crate::spec::{AttributeSpec, DatasetSpec, GroupSpec, TypeSpec};

/// A field together with the untyped container it was found in.
#[derive(Debug, Clone, PartialEq)]
pub struct WalkedField {
    /// The field.
    pub field: FieldSpec,
    /// Enclosing untyped container, `None` for members of the type root.
    pub parent: Option<FieldSpec>,
}

enum Node<'a> {
    Attribute(&'a AttributeSpec),
    Dataset(Cow<'a, DatasetSpec>),
    Group(&'a GroupSpec),
}

type Queue<'a> = VecDeque<(Node<'a>, Option<FieldSpec>, String)>;

fn push_members<'a>(
    queue: &mut Queue<'a>,
    attributes: &'a [AttributeSpec],
    datasets: &'a [DatasetSpec],
    groups: &'a [GroupSpec],
    parent: Option<&FieldSpec>,
    prefix: &str,
) {
    for a in attributes {
        queue.push_back((Node::Attribute(a), parent.cloned(), prefix.to_string()));
    }
    for d in datasets {
        queue.push_back((Node::Dataset(Cow::Borrowed(d)), parent.cloned(), prefix.to_string()));
    }
    for g in groups {
        queue.push_back((Node::Group(g), parent.cloned(), prefix.to_string()));
    }
}

/// The array held by a dataset type, exposed as a field named `data`.
fn data_field_of(ds: &DatasetSpec) -> DatasetSpec {
    DatasetSpec {
        name: Some("data".to_string()),
        doc: ds.doc.clone(),
        dtype: ds.dtype.clone(),
        shape: ds.shape.clone(),
        dims: ds.dims.clone(),
        value: ds.value.clone(),
        default_value: ds.default_value.clone(),
        ..Default::default()
    }
}

/// Walks a resolved type and returns its fields in traversal order.
///
/// # Errors
/// Returns `SchemaError::AnonymousUntypedField` if a dataset or group has
/// neither a name nor a type.
pub fn walk_type(type_name: &str, spec: &TypeSpec) -> Result<Vec<WalkedField>, SchemaError> {
    let mut queue: Queue<'_> = VecDeque::new();
    match spec {
        TypeSpec::Group(g) => {
            push_members(&mut queue, &g.attributes, &g.datasets, &g.groups, None, "");
        }
        TypeSpec::Dataset(d) => {
            push_members(&mut queue, &d.attributes, &[], &[], None, "");
            queue.push_back((Node::Dataset(Cow::Owned(data_field_of(d))), None, String::new()));
        }
    }

    let mut out = Vec::new();
    while let Some((node, parent, prefix)) = queue.pop_front() {
        let field = match node {
            Node::Attribute(a) => FieldSpec::from_attribute(a, &prefix),
            Node::Dataset(d) => {
                let field = FieldSpec::from_dataset(&d, &prefix, type_name)?;
                if field.data_type().is_none() {
                    let Cow::Borrowed(d) = d else {
                        // The synthesized data field has no attributes.
                        out.push(WalkedField { field, parent });
                        continue;
                    };
                    push_members(&mut queue, &d.attributes, &[], &[], Some(&field), field.path.as_str());
                }
                field
            }
            Node::Group(g) => {
                let field = FieldSpec::from_group(g, &prefix, type_name)?;
                if field.data_type().is_none() {
                    push_members(
                        &mut queue,
                        &g.attributes,
                        &g.datasets,
                        &g.groups,
                        Some(&field),
                        field.path.as_str(),
                    );
                }
                field
            }
        };
        out.push(WalkedField { field, parent });
    }
    Ok(out)
}
