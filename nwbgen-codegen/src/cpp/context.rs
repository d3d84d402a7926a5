//! Everything the emitters need to know about one type.

use nwbgen_schema::naming::cpp_namespace_name;
use nwbgen_schema::{
    NamespaceCatalog, ParentRef, TypeKind, TypeRecord, TypeRegistry, WalkedField, walk_type,
};
use tracing::{debug, warn};

use crate::cpp::naming::{header_include, qualified_class};
use crate::diagnostics::DiagnosticKind;
use crate::error::CodegenError;
use crate::overrides::{OverrideResolver, OverrideStatus};
use crate::params::{DerivedParameters, ParameterDescriptor, derive_parameters};

/// Types that sit directly on AqNWB's `RegisteredType`.
const REGISTERED_TYPE_ROOTS: [&str; 2] = ["Container", "Data"];

/// The base class of a generated type.
#[derive(Debug, Clone, PartialEq)]
pub enum BaseClass {
    /// Another generated type.
    Generated {
        /// Qualified class name.
        class: String,
        /// Unqualified class name.
        name: String,
        /// Header of the parent.
        include: String,
        /// The parent's parameters, used to build the forwarding call.
        params: DerivedParameters,
    },
    /// AqNWB's generic `Container` or `Data`.
    Fallback {
        /// Qualified class name.
        class: &'static str,
        /// Header of the base.
        include: &'static str,
    },
    /// AqNWB's `RegisteredType`.
    RegisteredType,
}

impl BaseClass {
    fn fallback(kind: TypeKind) -> Self {
        match kind {
            TypeKind::Group => Self::Fallback {
                class: "AQNWB::NWB::Container",
                include: "nwb/hdmf/base/Container.hpp",
            },
            TypeKind::Dataset => Self::Fallback {
                class: "AQNWB::NWB::Data",
                include: "nwb/hdmf/base/Data.hpp",
            },
        }
    }

    /// Returns the qualified class name.
    #[must_use]
    pub fn class(&self) -> &str {
        match self {
            Self::Generated { class, .. } => class,
            Self::Fallback { class, .. } => class,
            Self::RegisteredType => "AQNWB::NWB::RegisteredType",
        }
    }

    /// Returns the unqualified class name.
    #[must_use]
    pub fn short_name(&self) -> &str {
        let class = self.class();
        class.rsplit_once("::").map_or(class, |(_, name)| name)
    }

    /// Returns the header to include for the base, if one is needed beyond
    /// the common AqNWB includes.
    #[must_use]
    pub fn include(&self) -> Option<&str> {
        match self {
            Self::Generated { include, .. } => Some(include),
            Self::Fallback { include, .. } => Some(include),
            Self::RegisteredType => None,
        }
    }

    /// Returns the parent's parameters when the parent is generated.
    #[must_use]
    pub fn params(&self) -> Option<&DerivedParameters> {
        match self {
            Self::Generated { params, .. } => Some(params),
            _ => None,
        }
    }
}

/// The resolved inputs for emitting one type.
#[derive(Debug)]
pub struct TypeContext<'a> {
    /// Registry record.
    pub record: &'a TypeRecord,
    /// Shared registry.
    pub registry: &'a TypeRegistry,
    /// Base class.
    pub base: BaseClass,
    /// Derived parameters, in traversal order.
    pub params: DerivedParameters,
    /// Per-type findings, including those from parameter derivation.
    pub diagnostics: Vec<DiagnosticKind>,
}

impl<'a> TypeContext<'a> {
    /// Resolves a registered type.
    ///
    /// # Errors
    /// Returns `CodegenError::UnknownType` if the type is not registered, or
    /// `CodegenError::Schema` if its fields cannot be walked.
    pub fn build(
        catalog: &NamespaceCatalog,
        registry: &'a TypeRegistry,
        type_name: &str,
    ) -> Result<Self, CodegenError> {
        let record = registry.get(type_name).ok_or_else(|| CodegenError::UnknownType {
            name: type_name.to_string(),
        })?;
        let fields = walk(catalog, type_name)?;
        let mut diagnostics = Vec::new();

        let (base, statuses) = if REGISTERED_TYPE_ROOTS.contains(&type_name) {
            (BaseClass::RegisteredType, OverrideResolver::root().classify_all(&fields))
        } else {
            match &record.parent {
                ParentRef::Resolved { name, namespace } => {
                    let parent_fields = walk(catalog, name)?;
                    let statuses = OverrideResolver::new(&parent_fields).classify_all(&fields);
                    let base = match registry.get(name) {
                        Some(parent_record) => {
                            let parent_statuses =
                                OverrideResolver::root().classify_all(&parent_fields);
                            BaseClass::Generated {
                                class: qualified_class(Some(namespace), name),
                                name: name.clone(),
                                include: header_include(
                                    namespace,
                                    &parent_record.source_subfolder,
                                    name,
                                ),
                                params: derive_parameters(
                                    parent_record,
                                    &parent_fields,
                                    &parent_statuses,
                                    registry,
                                ),
                            }
                        }
                        None => BaseClass::fallback(record.kind),
                    };
                    (base, statuses)
                }
                ParentRef::Unresolved { name } => {
                    let base = BaseClass::fallback(record.kind);
                    warn!(
                        type_name = %record.name,
                        parent = %name,
                        fallback = base.class(),
                        "unresolved parent type"
                    );
                    diagnostics.push(DiagnosticKind::UnresolvedParent {
                        parent: name.clone(),
                        fallback: base.class().to_string(),
                    });
                    (base, OverrideResolver::root().classify_all(&fields))
                }
                ParentRef::Root => (
                    BaseClass::fallback(record.kind),
                    OverrideResolver::root().classify_all(&fields),
                ),
            }
        };

        let params = derive_parameters(record, &fields, &statuses, registry);
        diagnostics.extend(params.diagnostics().iter().cloned());
        debug!(
            type_name = %record.name,
            base = base.class(),
            fields = fields.len(),
            parameters = params.signature().len(),
            "resolved type"
        );

        Ok(Self {
            record,
            registry,
            base,
            params,
            diagnostics,
        })
    }

    /// C++ namespace of the type.
    #[must_use]
    pub fn cpp_namespace(&self) -> String {
        cpp_namespace_name(&self.record.namespace)
    }

    /// Class name.
    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.record.name
    }

    /// Finds the parent's descriptor for the same field.
    #[must_use]
    pub fn parent_descriptor(&self, param: &ParameterDescriptor) -> Option<&ParameterDescriptor> {
        let key = param.field.match_key();
        self.base
            .params()?
            .entries()
            .iter()
            .find(|p| p.field.match_key() == key)
    }

    /// Finds this type's descriptor matching a parent descriptor.
    #[must_use]
    pub fn own_descriptor(&self, parent: &ParameterDescriptor) -> Option<&ParameterDescriptor> {
        let key = parent.field.match_key();
        self.params
            .entries()
            .iter()
            .find(|p| p.field.match_key() == key)
    }

    /// Returns the descriptors that belong to this type alone.
    pub fn native(&self) -> impl Iterator<Item = &ParameterDescriptor> {
        self.params
            .entries()
            .iter()
            .filter(|p| p.status == OverrideStatus::Native)
    }
}

fn walk(catalog: &NamespaceCatalog, type_name: &str) -> Result<Vec<WalkedField>, CodegenError> {
    let resolved = catalog
        .get_type(type_name)
        .ok_or_else(|| CodegenError::UnknownType {
            name: type_name.to_string(),
        })?;
    Ok(walk_type(type_name, &resolved.spec)?)
}

/// Strips `const` and `&` from a parameter type to get a local's type.
#[must_use]
pub fn local_type(cpp_type: &str) -> &str {
    let ty = cpp_type.strip_prefix("const ").unwrap_or(cpp_type);
    ty.strip_suffix('&').unwrap_or(ty)
}
