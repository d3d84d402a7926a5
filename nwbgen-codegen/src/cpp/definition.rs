//! Definition (`.cpp`) generation.

use nwbgen_schema::FieldKind;

use crate::cpp::context::{BaseClass, TypeContext, local_type};
use crate::cpp::declaration::signature;
use crate::cpp::types::CppScalar;
use crate::model::{
    Artifact, ArtifactKind, AttributeCreate, CallArg, FixedLocal, Include, InitializeBody, Node,
    ParentCall, Stub,
};
use crate::overrides::OverrideStatus;
use crate::params::{ParameterDescriptor, Representation};

/// Generator for a type's definition.
pub struct DefinitionGenerator<'a> {
    ctx: &'a TypeContext<'a>,
}

impl<'a> DefinitionGenerator<'a> {
    /// Creates a new definition generator.
    #[must_use]
    pub fn new(ctx: &'a TypeContext<'a>) -> Self {
        Self { ctx }
    }

    /// Builds the definition.
    #[must_use]
    pub fn generate(&self) -> Artifact {
        let ctx = self.ctx;
        let class = ctx.class_name().to_string();

        let mut out = Artifact::new(ArtifactKind::Definition);
        out.push(Node::Include(Include::local(format!("{class}.hpp"))));
        out.push(Node::Include(Include::local("Utils.hpp")));
        out.push(Node::Blank);
        out.push(Node::UsingNamespace(ctx.cpp_namespace()));
        out.push(Node::UsingNamespace("AQNWB::IO".to_string()));
        out.push(Node::Blank);
        out.push(Node::Comment(
            "Initialize the static registered_ member to trigger registration".to_string(),
        ));
        out.push(Node::RegisterSubclassImpl {
            class: class.clone(),
        });
        out.push(Node::Blank);
        out.push(Node::Comment("Constructor".to_string()));
        out.push(Node::ConstructorDef {
            class: class.clone(),
            base: ctx.base.class().to_string(),
        });
        out.push(Node::Blank);
        out.push(Node::InitializeDef(InitializeBody {
            class,
            signature: signature(ctx),
            locals: self.fixed_locals(),
            parent_call: self.parent_call(),
            stubs: ctx.native().filter_map(stub).collect(),
        }));
        out
    }

    /// Locals for fixed values, which the parent may still take as arguments.
    fn fixed_locals(&self) -> Vec<FixedLocal> {
        self.ctx
            .params
            .fixed()
            .filter_map(|p| {
                let cpp_type = p.cpp_type()?;
                let parent = self.ctx.parent_descriptor(p);
                // A fixed dataset overriding a configurable parent dataset keeps
                // the parent's type so the forwarding call still compiles.
                if let Some(parent) = parent.filter(|q| {
                    p.status == OverrideStatus::InheritedOverridden
                        && p.field.is_dataset()
                        && !q.is_fixed
                }) {
                    let parent_type = parent.cpp_type()?;
                    return Some(FixedLocal {
                        cpp_type: local_type(&parent_type).to_string(),
                        name: p.variable_name.clone(),
                        value: parent.default.clone(),
                        note: Some(format!(
                            "TODO: Value should be fixed to {} {}.",
                            local_type(&cpp_type),
                            p.default.as_deref().unwrap_or("{}")
                        )),
                    });
                }
                let note = p
                    .default
                    .is_none()
                    .then(|| "TODO: The fixed value could not be rendered.".to_string());
                Some(FixedLocal {
                    cpp_type: local_type(&cpp_type).to_string(),
                    name: p.variable_name.clone(),
                    value: p.default.clone(),
                    note,
                })
            })
            .collect()
    }

    fn parent_call(&self) -> ParentCall {
        let ctx = self.ctx;
        match &ctx.base {
            BaseClass::Generated { class, params, .. } => {
                let args = params
                    .signature()
                    .into_iter()
                    .map(|parent| {
                        let own = ctx.own_descriptor(parent);
                        CallArg {
                            name: own.map_or_else(
                                || parent.variable_name.clone(),
                                |p| p.variable_name.clone(),
                            ),
                            suggestion: parent.is_optional_handle
                                || own.is_some_and(|p| p.is_optional_handle),
                        }
                    })
                    .collect();
                ParentCall::Call {
                    class: class.clone(),
                    args,
                }
            }
            base => ParentCall::Missing {
                class: base.class().to_string(),
            },
        }
    }
}

/// Creation stub for a field declared by this type.
fn stub(p: &ParameterDescriptor) -> Option<Stub> {
    let path = p.path().to_string();
    let variable = p.variable_name.clone();
    let cpp_type = p.cpp_type();
    let stub = match (&p.field.kind, &p.representation) {
        (_, Representation::Structural) => Stub::Group { path },
        (FieldKind::Attribute { .. }, rep) => {
            let create = match rep {
                Representation::Scalar(CppScalar::String) => AttributeCreate::String,
                Representation::Scalar(s) => s
                    .base_data_type()
                    .map_or(AttributeCreate::None, |t| AttributeCreate::Scalar(t.to_string())),
                _ => AttributeCreate::None,
            };
            let fixed = p.is_fixed.then(|| {
                format!(
                    "{} {}",
                    cpp_type.as_deref().map_or("", local_type),
                    p.default.as_deref().unwrap_or("{}")
                )
            });
            Stub::Attribute {
                path,
                variable,
                fixed,
                create,
            }
        }
        (_, Representation::Handle(_) | Representation::HandleSequence(_)) => Stub::Handle {
            cpp_type: cpp_type?,
            variable,
            required: !p.is_optional_handle,
        },
        (_, Representation::ArrayConfig { .. }) => Stub::ArrayDataset { path, variable },
        (_, Representation::Scalar(CppScalar::String)) if !p.is_fixed => {
            Stub::StringDataset { path, variable }
        }
        (_, _) => Stub::ValueDataset {
            path,
            cpp_type: local_type(&cpp_type?).to_string(),
            value: p.default.clone(),
            fixed: p.is_fixed,
        },
    };
    Some(stub)
}
