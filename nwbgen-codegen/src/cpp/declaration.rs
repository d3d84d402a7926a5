//! Declaration (`.hpp`) generation.

use std::collections::BTreeSet;

use nwbgen_schema::naming::{namespace_file_stem, split_qualified};
use nwbgen_schema::{Dtype, FieldKind, RefKind};

use crate::cpp::context::TypeContext;
use crate::cpp::naming::{brief, header_include, macro_doc, path_suffix, qualified_class};
use crate::cpp::types::CppScalar;
use crate::model::{Accessor, AccessorKind, Artifact, ArtifactKind, Include, Node, Signature, SignatureParam};
use crate::overrides::OverrideStatus;
use crate::params::{ParameterDescriptor, Representation};

/// Generator for a type's declaration.
pub struct DeclarationGenerator<'a> {
    ctx: &'a TypeContext<'a>,
}

impl<'a> DeclarationGenerator<'a> {
    /// Creates a new declaration generator.
    #[must_use]
    pub fn new(ctx: &'a TypeContext<'a>) -> Self {
        Self { ctx }
    }

    /// Builds the declaration.
    #[must_use]
    pub fn generate(&self) -> Artifact {
        let ctx = self.ctx;
        let class = ctx.class_name();
        let ns = ctx.cpp_namespace();
        let accessors = self.accessors();
        let signature = signature(ctx);

        let mut out = Artifact::new(ArtifactKind::Declaration);
        out.push(Node::Pragma);
        out.push(Node::Blank);
        out.push(Node::Comment("Common STL includes".to_string()));
        for header in ["memory", "string", "vector", "optional"] {
            out.push(Node::Include(Include::system(header)));
        }
        if self.uses_any(&accessors) {
            out.push(Node::Include(Include::system("any")));
        }
        out.push(Node::Comment("Base AqNWB includes for IO and RegisteredType".to_string()));
        for header in ["nwb/RegisteredType.hpp", "io/ReadIO.hpp", "io/BaseIO.hpp"] {
            out.push(Node::Include(Include::local(header)));
        }
        if let Some(include) = ctx.base.include() {
            out.push(Node::Comment("Include for parent type".to_string()));
            out.push(Node::Include(Include::local(include)));
        }
        let referenced = self.referenced_includes();
        if !referenced.is_empty() {
            out.push(Node::Comment("Includes for types that are referenced and used".to_string()));
            for include in referenced {
                out.push(Node::Include(Include::local(include)));
            }
        }
        out.push(Node::Comment("Include for the namespace schema header".to_string()));
        out.push(Node::Include(Include::local(format!(
            "spec/{}.hpp",
            namespace_file_stem(&ctx.record.namespace)
        ))));
        out.push(Node::Blank);

        out.push(Node::NamespaceOpen(ns.clone()));
        out.push(Node::Blank);
        out.push(Node::ClassDoc(brief(&ctx.record.doc)));
        out.push(Node::ClassOpen {
            name: class.to_string(),
            base: ctx.base.class().to_string(),
        });
        out.push(Node::ConstructorDecl {
            class: class.to_string(),
        });
        out.push(Node::Blank);
        out.push(Node::DestructorDecl {
            class: class.to_string(),
        });
        out.push(Node::Blank);
        out.push(Node::InitializeDecl(signature));
        out.push(Node::Blank);

        out.push(Node::Comment("Define read methods".to_string()));
        let (live, inherited): (Vec<Accessor>, Vec<Accessor>) =
            accessors.into_iter().partition(|a| a.status.is_live());
        for accessor in live {
            out.push(Node::Accessor(accessor));
            out.push(Node::Blank);
        }
        if !inherited.is_empty() {
            out.push(Node::InheritedBlock(inherited));
            out.push(Node::Blank);
        }

        out.push(Node::RegisterSubclass {
            class: class.to_string(),
            parent: ctx.base.short_name().to_string(),
            namespace: format!("AQNWB::SPEC::{ns}::namespaceName"),
        });
        out.push(Node::ClassClose);
        out.push(Node::Blank);
        out.push(Node::NamespaceClose(ns));
        out
    }

    /// Accessors in traversal order, live and inherited alike.
    fn accessors(&self) -> Vec<Accessor> {
        self.ctx
            .params
            .entries()
            .iter()
            .filter(|p| !p.is_fixed || p.status == OverrideStatus::InheritedOverridden)
            .filter_map(accessor)
            .collect()
    }

    fn uses_any(&self, accessors: &[Accessor]) -> bool {
        let params = self.ctx.params.entries().iter().filter_map(ParameterDescriptor::cpp_type);
        let macros = accessors.iter().filter_map(|a| match &a.kind {
            AccessorKind::Attribute { cpp_type } | AccessorKind::Dataset { cpp_type } => {
                Some(cpp_type.clone())
            }
            _ => None,
        });
        params.chain(macros).any(|t| t.contains("std::any"))
    }

    /// Headers of referenced types, sorted and without the parent's.
    fn referenced_includes(&self) -> BTreeSet<String> {
        let ctx = self.ctx;
        let parent = ctx.base.include();
        ctx.record
            .referenced_types
            .iter()
            .map(|t| match ctx.registry.get(t) {
                Some(r) => header_include(&r.namespace, &r.source_subfolder, &r.name),
                None => format!("{t}.hpp"),
            })
            .filter(|inc| Some(inc.as_str()) != parent)
            .collect()
    }
}

/// The `initialize` signature of a type, suggestions last.
#[must_use]
pub fn signature(ctx: &TypeContext<'_>) -> Signature {
    Signature {
        params: ctx
            .params
            .signature()
            .into_iter()
            .filter_map(|p| {
                Some(SignatureParam {
                    cpp_type: p.cpp_type()?,
                    name: p.variable_name.clone(),
                    default: p.default.clone(),
                    suggestion: p.is_optional_handle,
                })
            })
            .collect(),
    }
}

fn accessor(p: &ParameterDescriptor) -> Option<Accessor> {
    let field = &p.field;
    let doc = macro_doc(&field.doc);
    let suffix = path_suffix(field.path.as_str());
    let kind = match (&field.kind, &p.representation) {
        (_, Representation::Structural) => return None,
        (FieldKind::Group { data_type: Some(_) } | FieldKind::Dataset { data_type: Some(_), .. }, rep) => {
            let target = rep.handle_type()?;
            let class = target.to_string();
            if field.name.is_none() {
                return Some(Accessor {
                    kind: AccessorKind::UnnamedRegistered {
                        class,
                        type_name: target.name.clone(),
                    },
                    suffix: format!("{suffix}{}", target.name),
                    path: field.path.to_string(),
                    doc,
                    status: p.status,
                });
            }
            AccessorKind::Registered { class }
        }
        (
            FieldKind::Attribute {
                dtype:
                    Dtype::Reference {
                        target_type,
                        kind: RefKind::Object,
                    },
                ..
            },
            rep,
        ) => {
            let class = match rep.handle_type() {
                Some(q) => q.to_string(),
                None => qualified_class(None, split_qualified(target_type).1),
            };
            AccessorKind::Referenced { class }
        }
        (FieldKind::Attribute { dtype, .. }, _) => AccessorKind::Attribute {
            cpp_type: value_type(dtype),
        },
        (FieldKind::Dataset { dtype, .. }, _) => AccessorKind::Dataset {
            cpp_type: value_type(dtype),
        },
        (FieldKind::Group { .. }, _) => return None,
    };
    Some(Accessor {
        kind,
        suffix,
        path: field.path.to_string(),
        doc,
        status: p.status,
    })
}

fn value_type(dtype: &Dtype) -> String {
    CppScalar::from_dtype(dtype)
        .unwrap_or(CppScalar::Opaque)
        .cpp_name()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Fixture;

    const SCHEMA: &str = "\
groups:
- neurodata_type_def: Device
  doc: A device, such as a probe.
- neurodata_type_def: Recorder
  doc: recorder
  attributes:
  - name: description
    dtype: text
    doc: What it is, in \"plain\" words.
  - name: linked
    dtype:
      target_type: Device
      reftype: object
    doc: link
  datasets:
  - name: samples
    dtype: int16
    shape: [null]
    doc: raw samples
  groups:
  - name: probe
    neurodata_type_inc: Device
    doc: the device
  - neurodata_type_inc: Device
    doc: extra devices
    quantity: '*'
  - name: settings
    doc: folder
    attributes:
    - name: gain
      dtype: float32
      doc: gain
";

    fn declaration(fixture: &Fixture, name: &str) -> Artifact {
        let registry = fixture.registry();
        let ctx = TypeContext::build(&fixture.catalog, &registry, name).expect("Failed to build context");
        DeclarationGenerator::new(&ctx).generate()
    }

    #[test]
    fn test_accessor_kinds() {
        let fixture = Fixture::single("test", SCHEMA);
        let decl = declaration(&fixture, "Recorder");
        let names: Vec<String> = decl.live_accessors().map(Accessor::read_name).collect();
        assert_eq!(
            names,
            [
                "readDescription",
                "readLinked",
                "readSamples",
                "readProbe",
                "readDevice",
                "readSettingsGain",
            ]
        );
        let kinds: Vec<&AccessorKind> = decl.live_accessors().map(|a| &a.kind).collect();
        assert!(matches!(kinds[1], AccessorKind::Referenced { class } if class == "TEST::Device"));
        assert!(matches!(kinds[2], AccessorKind::Dataset { cpp_type } if cpp_type == "int16_t"));
        assert!(matches!(kinds[3], AccessorKind::Registered { .. }));
        assert!(matches!(kinds[4], AccessorKind::UnnamedRegistered { type_name, .. } if type_name == "Device"));
        assert_eq!(decl.commented_accessors().count(), 0);
    }

    #[test]
    fn test_includes_and_text() {
        let fixture = Fixture::single("test", SCHEMA);
        let text = declaration(&fixture, "Recorder").render();
        assert!(text.starts_with("#pragma once\n"));
        assert!(text.contains("#include \"nwb/hdmf/base/Container.hpp\"\n"));
        assert!(text.contains("#include \"test/test_types/Device.hpp\"\n"));
        assert!(text.contains("#include \"spec/test.hpp\"\n"));
        assert!(text.contains("namespace TEST {\n"));
        assert!(text.contains("class Recorder : public AQNWB::NWB::Container\n{\npublic:\n"));
        assert!(text.contains("        \"What it is - in plain words.\")\n"));
        assert!(text.contains("    REGISTER_SUBCLASS(\n        Recorder,\n        Container,\n        AQNWB::SPEC::TEST::namespaceName)\n"));
        assert!(text.ends_with("};\n\n} // namespace TEST\n"));
    }

    #[test]
    fn test_unnamed_accessor_uses_create() {
        let fixture = Fixture::single("test", SCHEMA);
        let text = declaration(&fixture, "Recorder").render();
        assert!(text.contains(
            "    DEFINE_UNNAMED_REGISTERED_FIELD(\n        readDevice,\n        createDevice,\n        TEST::Device,\n        \"\",\n        \"extra devices\")\n"
        ));
    }
}
