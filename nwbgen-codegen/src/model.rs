//! Structured emission model.
//!
//! Emitters build an [`Artifact`] as a list of typed [`Node`]s. Rendering to
//! text is a separate final pass, so tests can inspect accessors, includes
//! and signatures without matching on generated text.

use crate::overrides::OverrideStatus;

const INDENT: &str = "    ";

/// Trailing note on commented-out optional handle parameters.
pub const OPTIONAL_HANDLE_NOTE: &str = "Optional RegisteredTypes are usually created after initialize";

/// An `#include` line.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Include {
    /// Header path.
    pub path: String,
    /// `<...>` instead of `"..."`.
    pub system: bool,
}

impl Include {
    /// A standard library include.
    #[must_use]
    pub fn system(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            system: true,
        }
    }

    /// A project include.
    #[must_use]
    pub fn local(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            system: false,
        }
    }

    fn render(&self) -> String {
        if self.system {
            format!("#include <{}>", self.path)
        } else {
            format!("#include \"{}\"", self.path)
        }
    }
}

/// One `initialize` parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureParam {
    /// C++ type.
    pub cpp_type: String,
    /// Variable name.
    pub name: String,
    /// Default expression.
    pub default: Option<String>,
    /// Rendered commented out, as a suggestion.
    pub suggestion: bool,
}

/// The `initialize` parameter list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    /// Parameters in signature order; suggestions come last.
    pub params: Vec<SignatureParam>,
}

impl Signature {
    /// Returns the names of the live parameters.
    pub fn live_names(&self) -> impl Iterator<Item = &str> {
        self.params
            .iter()
            .filter(|p| !p.suggestion)
            .map(|p| p.name.as_str())
    }

    fn lines(&self, with_defaults: bool) -> Vec<String> {
        let live: Vec<&SignatureParam> = self.params.iter().filter(|p| !p.suggestion).collect();
        let mut lines = Vec::with_capacity(self.params.len());
        for (i, p) in live.iter().enumerate() {
            let sep = if i + 1 < live.len() { "," } else { "" };
            lines.push(format!("{}{sep}", p.declaration(with_defaults)));
        }
        for p in self.params.iter().filter(|p| p.suggestion) {
            lines.push(format!(
                "// {}, // {OPTIONAL_HANDLE_NOTE}",
                p.declaration(with_defaults)
            ));
        }
        lines
    }
}

impl SignatureParam {
    fn declaration(&self, with_defaults: bool) -> String {
        match (&self.default, with_defaults) {
            (Some(d), true) => format!("{} {} = {d}", self.cpp_type, self.name),
            _ => format!("{} {}", self.cpp_type, self.name),
        }
    }
}

/// One argument of the parent `initialize` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallArg {
    /// Variable passed.
    pub name: String,
    /// Rendered commented out.
    pub suggestion: bool,
}

/// Which accessor macro a field uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessorKind {
    /// `DEFINE_ATTRIBUTE_FIELD`
    Attribute {
        /// Value type.
        cpp_type: String,
    },
    /// `DEFINE_DATASET_FIELD`
    Dataset {
        /// Value type.
        cpp_type: String,
    },
    /// `DEFINE_REGISTERED_FIELD`
    Registered {
        /// Qualified class.
        class: String,
    },
    /// `DEFINE_UNNAMED_REGISTERED_FIELD`
    UnnamedRegistered {
        /// Qualified class.
        class: String,
        /// Bare type name, shown in labels.
        type_name: String,
    },
    /// `DEFINE_REFERENCED_REGISTERED_FIELD`
    Referenced {
        /// Qualified class.
        class: String,
    },
}

/// A generated read (and record/create) accessor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accessor {
    /// Macro and its type argument.
    pub kind: AccessorKind,
    /// Name suffix after `read`, `record` or `create`.
    pub suffix: String,
    /// Field path, or container path for unnamed fields.
    pub path: String,
    /// Macro-safe documentation.
    pub doc: String,
    /// Relationship to the parent type.
    pub status: OverrideStatus,
}

impl Accessor {
    /// Returns the read function name.
    #[must_use]
    pub fn read_name(&self) -> String {
        format!("read{}", self.suffix)
    }

    /// Path label used in annotation comments.
    #[must_use]
    pub fn label(&self) -> String {
        match &self.kind {
            AccessorKind::UnnamedRegistered { type_name, .. } => {
                format!("{}/<{type_name}>", self.path)
            }
            _ => self.path.clone(),
        }
    }

    fn macro_lines(&self) -> Vec<String> {
        let (name, mut args) = match &self.kind {
            AccessorKind::Attribute { cpp_type } => {
                ("DEFINE_ATTRIBUTE_FIELD", vec![self.read_name(), cpp_type.clone()])
            }
            AccessorKind::Dataset { cpp_type } => (
                "DEFINE_DATASET_FIELD",
                vec![
                    self.read_name(),
                    format!("record{}", self.suffix),
                    cpp_type.clone(),
                ],
            ),
            AccessorKind::Registered { class } => {
                ("DEFINE_REGISTERED_FIELD", vec![self.read_name(), class.clone()])
            }
            AccessorKind::UnnamedRegistered { class, .. } => (
                "DEFINE_UNNAMED_REGISTERED_FIELD",
                vec![
                    self.read_name(),
                    format!("create{}", self.suffix),
                    class.clone(),
                ],
            ),
            AccessorKind::Referenced { class } => (
                "DEFINE_REFERENCED_REGISTERED_FIELD",
                vec![self.read_name(), class.clone()],
            ),
        };
        args.push(format!("\"{}\"", self.path));
        args.push(format!("\"{}\"", self.doc));

        let mut lines = vec![format!("{name}(")];
        let last = args.len() - 1;
        for (i, arg) in args.into_iter().enumerate() {
            let tail = if i == last { ")" } else { "," };
            lines.push(format!("{INDENT}{arg}{tail}"));
        }
        lines
    }
}

/// A local holding a fixed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedLocal {
    /// Local type.
    pub cpp_type: String,
    /// Variable name.
    pub name: String,
    /// Initializer.
    pub value: Option<String>,
    /// Trailing comment.
    pub note: Option<String>,
}

/// How `initialize` reaches the parent class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentCall {
    /// Forward the parent's own argument list.
    Call {
        /// Parent class.
        class: String,
        /// Arguments in the parent's signature order.
        args: Vec<CallArg>,
    },
    /// The parent's parameters are unknown; emit a commented reminder.
    Missing {
        /// Parent class.
        class: String,
    },
}

/// How an attribute stub creates its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeCreate {
    /// `createAttribute(value, path, name)`
    String,
    /// `createAttribute(type, &value, path, name)`
    Scalar(String),
    /// No creation hint.
    None,
}

/// Commented creation code left for developer completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stub {
    /// An untyped group.
    Group {
        /// Field path.
        path: String,
    },
    /// A typed handle passed in as a parameter.
    Handle {
        /// Parameter type.
        cpp_type: String,
        /// Parameter name.
        variable: String,
        /// Required by the schema.
        required: bool,
    },
    /// A scalar string dataset.
    StringDataset {
        /// Field path.
        path: String,
        /// Parameter name.
        variable: String,
    },
    /// An array dataset created from its configuration.
    ArrayDataset {
        /// Field path.
        path: String,
        /// Parameter name.
        variable: String,
    },
    /// A dataset written from a default or fixed value.
    ValueDataset {
        /// Field path.
        path: String,
        /// Parameter type.
        cpp_type: String,
        /// Value expression.
        value: Option<String>,
        /// The value is fixed.
        fixed: bool,
    },
    /// An attribute.
    Attribute {
        /// Field path.
        path: String,
        /// Parameter name.
        variable: String,
        /// `"T V"` when the value is fixed.
        fixed: Option<String>,
        /// Creation hint.
        create: AttributeCreate,
    },
}

impl Stub {
    fn lines(&self) -> Vec<String> {
        match self {
            Self::Group { path } => {
                let var = crate::cpp::naming::path_variable(path);
                vec![
                    format!("// TODO: Initialize {path} group"),
                    format!("// auto {var} = AQNWB::mergePaths(m_path, \"{path}\");"),
                    format!("// m_io->createGroup({var});"),
                ]
            }
            Self::Handle {
                cpp_type,
                variable,
                required: true,
            } => vec![format!(
                "// TODO: Required RegisteredType {cpp_type} passed as parameter {variable}"
            )],
            Self::Handle {
                cpp_type, variable, ..
            } => vec![format!(
                "// TODO: Optional RegisteredType {cpp_type} passed as parameter {variable}. Usually created after initialize."
            )],
            Self::StringDataset { path, variable } => {
                let var = crate::cpp::naming::path_variable(path);
                vec![
                    format!("// TODO: Initialize {path} dataset"),
                    format!("// auto {var} = AQNWB::mergePaths(m_path, \"{path}\");"),
                    format!("// m_io->createStringDataSet({var}, {variable});"),
                ]
            }
            Self::ArrayDataset { path, variable } => {
                let var = crate::cpp::naming::path_variable(path);
                vec![
                    format!("// TODO: Initialize {path} dataset"),
                    format!("// auto {var} = AQNWB::mergePaths(m_path, \"{path}\");"),
                    format!(
                        "// std::unique_ptr<IO::BaseRecordingData> {variable}Data = m_io->createArrayDataSet({variable}, {var});"
                    ),
                ]
            }
            Self::ValueDataset {
                path,
                cpp_type,
                value,
                fixed,
            } => {
                let var = crate::cpp::naming::path_variable(path);
                let how = if *fixed { "fixed" } else { "default" };
                let value = value.as_deref().unwrap_or("{}");
                let mut head = format!("// TODO: Initialize {path} dataset");
                if *fixed {
                    head.push_str(&format!(" with fixed value {cpp_type} {value}"));
                }
                vec![
                    head,
                    format!("// auto {var} = AQNWB::mergePaths(m_path, \"{path}\");"),
                    format!("// create scalar dataset at {var} with {how} value {cpp_type} {value}"),
                ]
            }
            Self::Attribute {
                path,
                variable,
                fixed,
                create,
            } => {
                let mut head = format!("// TODO: Initialize {path} attribute");
                if let Some(fixed) = fixed {
                    head.push_str(&format!(" with fixed value {fixed}"));
                }
                let (parent, attr) = match path.rsplit_once('/') {
                    Some((parent, attr)) => (format!("AQNWB::mergePaths(m_path, \"{parent}\")"), attr),
                    None => ("m_path".to_string(), path.as_str()),
                };
                let mut lines = vec![head];
                match create {
                    AttributeCreate::String => lines.push(format!(
                        "// m_io->createAttribute({variable}, {parent}, \"{attr}\");"
                    )),
                    AttributeCreate::Scalar(base) => lines.push(format!(
                        "// m_io->createAttribute({base}, &{variable}, {parent}, \"{attr}\");"
                    )),
                    AttributeCreate::None => {}
                }
                lines
            }
        }
    }
}

/// Body of the `initialize` definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitializeBody {
    /// Owning class.
    pub class: String,
    /// Parameters, rendered without defaults.
    pub signature: Signature,
    /// Fixed-value locals.
    pub locals: Vec<FixedLocal>,
    /// Parent initialization.
    pub parent_call: ParentCall,
    /// Creation stubs for native fields.
    pub stubs: Vec<Stub>,
}

/// One element of an artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// `#pragma once`
    Pragma,
    /// A `//` comment line.
    Comment(String),
    /// An include.
    Include(Include),
    /// An empty line.
    Blank,
    /// `using namespace X;`
    UsingNamespace(String),
    /// `namespace X {`
    NamespaceOpen(String),
    /// `} // namespace X`
    NamespaceClose(String),
    /// Class-level `@brief` block.
    ClassDoc(String),
    /// Class head, up to and including `public:`.
    ClassOpen {
        /// Class name.
        name: String,
        /// Qualified base class.
        base: String,
    },
    /// `};`
    ClassClose,
    /// Constructor declaration.
    ConstructorDecl {
        /// Class name.
        class: String,
    },
    /// Virtual destructor.
    DestructorDecl {
        /// Class name.
        class: String,
    },
    /// `initialize` declaration with defaults.
    InitializeDecl(Signature),
    /// A live accessor.
    Accessor(Accessor),
    /// Inherited accessors, commented out under one header.
    InheritedBlock(Vec<Accessor>),
    /// `REGISTER_SUBCLASS(...)`
    RegisterSubclass {
        /// Class name.
        class: String,
        /// Unqualified parent class.
        parent: String,
        /// Namespace name constant.
        namespace: String,
    },
    /// `REGISTER_SUBCLASS_IMPL(...)`
    RegisterSubclassImpl {
        /// Class name.
        class: String,
    },
    /// Constructor definition forwarding to the base.
    ConstructorDef {
        /// Class name.
        class: String,
        /// Qualified base class.
        base: String,
    },
    /// `initialize` definition.
    InitializeDef(InitializeBody),
}

/// Kind of a per-type artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// `.hpp`
    Declaration,
    /// `.cpp`
    Definition,
}

impl ArtifactKind {
    /// File extension without the dot.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Declaration => "hpp",
            Self::Definition => "cpp",
        }
    }
}

/// A declaration or definition, as nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Artifact kind.
    pub kind: ArtifactKind,
    /// Nodes in output order.
    pub nodes: Vec<Node>,
}

impl Artifact {
    /// Creates an empty artifact.
    #[must_use]
    pub fn new(kind: ArtifactKind) -> Self {
        Self {
            kind,
            nodes: Vec::new(),
        }
    }

    /// Appends a node.
    pub fn push(&mut self, node: Node) {
        self.nodes.push(node);
    }

    /// Returns the include paths, in order.
    pub fn includes(&self) -> impl Iterator<Item = &Include> {
        self.nodes.iter().filter_map(|n| match n {
            Node::Include(inc) => Some(inc),
            _ => None,
        })
    }

    /// Returns the accessors emitted live.
    pub fn live_accessors(&self) -> impl Iterator<Item = &Accessor> {
        self.nodes.iter().filter_map(|n| match n {
            Node::Accessor(a) => Some(a),
            _ => None,
        })
    }

    /// Returns the accessors emitted in the commented inherited block.
    pub fn commented_accessors(&self) -> impl Iterator<Item = &Accessor> {
        self.nodes
            .iter()
            .filter_map(|n| match n {
                Node::InheritedBlock(block) => Some(block.iter()),
                _ => None,
            })
            .flatten()
    }

    /// Returns the declared `initialize` signature.
    #[must_use]
    pub fn signature(&self) -> Option<&Signature> {
        self.nodes.iter().find_map(|n| match n {
            Node::InitializeDecl(sig) => Some(sig),
            Node::InitializeDef(body) => Some(&body.signature),
            _ => None,
        })
    }

    /// Returns the `initialize` body of a definition.
    #[must_use]
    pub fn body(&self) -> Option<&InitializeBody> {
        self.nodes.iter().find_map(|n| match n {
            Node::InitializeDef(body) => Some(body),
            _ => None,
        })
    }

    /// Renders the artifact to text.
    #[must_use]
    pub fn render(&self) -> String {
        let mut w = CodeWriter::default();
        for node in &self.nodes {
            render_node(&mut w, node);
        }
        w.finish()
    }
}

#[derive(Default)]
struct CodeWriter {
    out: String,
    depth: usize,
}

impl CodeWriter {
    fn line(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if !text.is_empty() {
            for _ in 0..self.depth {
                self.out.push_str(INDENT);
            }
            self.out.push_str(text);
        }
        self.out.push('\n');
    }

    fn lines<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for l in lines {
            self.line(l);
        }
    }

    fn indent(&mut self) {
        self.depth += 1;
    }

    fn dedent(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn finish(self) -> String {
        self.out
    }
}

fn render_node(w: &mut CodeWriter, node: &Node) {
    match node {
        Node::Pragma => w.line("#pragma once"),
        Node::Comment(text) => w.line(format!("// {text}")),
        Node::Include(inc) => w.line(inc.render()),
        Node::Blank => w.line(""),
        Node::UsingNamespace(ns) => w.line(format!("using namespace {ns};")),
        Node::NamespaceOpen(ns) => w.line(format!("namespace {ns} {{")),
        Node::NamespaceClose(ns) => w.line(format!("}} // namespace {ns}")),
        Node::ClassDoc(doc) => w.lines(["/**".to_string(), format!(" * @brief {doc}"), " */".to_string()]),
        Node::ClassOpen { name, base } => {
            w.lines([format!("class {name} : public {base}"), "{".to_string(), "public:".to_string()]);
            w.indent();
        }
        Node::ClassClose => {
            w.dedent();
            w.line("};");
        }
        Node::ConstructorDecl { class } => w.lines([
            "/**".to_string(),
            " * @brief Constructor".to_string(),
            " * @param path Path to the object in the file".to_string(),
            " * @param io IO object for reading/writing".to_string(),
            " */".to_string(),
            format!("{class}(const std::string& path, std::shared_ptr<AQNWB::IO::BaseIO> io);"),
        ]),
        Node::DestructorDecl { class } => w.lines([
            "/**".to_string(),
            " * @brief Virtual destructor.".to_string(),
            " */".to_string(),
            format!("virtual ~{class}() override {{}}"),
        ]),
        Node::InitializeDecl(sig) => {
            w.lines([
                "// TODO: Update the initialize method as appropriate.",
                "/**",
                " * @brief Initialize the object",
                " */",
            ]);
            render_signature(w, "Status initialize", sig, true);
        }
        Node::Accessor(a) => {
            if a.status == OverrideStatus::InheritedOverridden {
                w.line(format!(
                    "// {} overrides inherited field from parent neurodata_type",
                    a.label()
                ));
            }
            w.lines(a.macro_lines());
        }
        Node::InheritedBlock(block) => {
            w.line("// TODO: The following fields have been commented because they should have been inherited from the parent class.");
            w.line("//       They are included here for your convenience so you can decide which fields may still need be defined here.");
            for a in block {
                w.line("/*");
                w.line(format!("// {} inherited from parent neurodata_type", a.label()));
                w.lines(a.macro_lines());
                w.line("*/");
            }
        }
        Node::RegisterSubclass {
            class,
            parent,
            namespace,
        } => w.lines([
            "REGISTER_SUBCLASS(".to_string(),
            format!("{INDENT}{class},"),
            format!("{INDENT}{parent},"),
            format!("{INDENT}{namespace})"),
        ]),
        Node::RegisterSubclassImpl { class } => w.line(format!("REGISTER_SUBCLASS_IMPL({class})")),
        Node::ConstructorDef { class, base } => w.lines([
            format!("{class}::{class}(const std::string& path, std::shared_ptr<AQNWB::IO::BaseIO> io)"),
            format!("{INDENT}: {base}(path, io)"),
            "{".to_string(),
            "}".to_string(),
        ]),
        Node::InitializeDef(body) => render_initialize_def(w, body),
    }
}

fn render_signature(w: &mut CodeWriter, head: &str, sig: &Signature, with_defaults: bool) {
    if sig.params.is_empty() {
        w.line(format!("{head}();"));
        return;
    }
    w.line(format!("{head}("));
    w.indent();
    w.lines(sig.lines(with_defaults));
    w.dedent();
    w.line(");");
}

fn render_initialize_def(w: &mut CodeWriter, body: &InitializeBody) {
    w.line("// Initialize the object");
    let head = format!("Status {}::initialize", body.class);
    if body.signature.params.is_empty() {
        w.line(format!("{head}()"));
    } else {
        w.line(format!("{head}("));
        w.indent();
        w.lines(body.signature.lines(false));
        w.dedent();
        w.line(")");
    }
    w.line("{");
    w.indent();
    w.line("Status initStatus = Status::Success;");

    if !body.locals.is_empty() {
        w.line("");
        w.line("// Initialize fixed field values");
        for local in &body.locals {
            let mut text = match &local.value {
                Some(v) => format!("{} {} = {v};", local.cpp_type, local.name),
                None => format!("{} {};", local.cpp_type, local.name),
            };
            if let Some(note) = &local.note {
                text.push_str(&format!(" // {note}"));
            }
            w.line(text);
        }
    }

    w.line("");
    w.line("// Call parent initialize method");
    match &body.parent_call {
        ParentCall::Call { class, args } if args.is_empty() => {
            w.line(format!("Status parentInitStatus = {class}::initialize();"));
            w.line("initStatus = initStatus && parentInitStatus;");
        }
        ParentCall::Call { class, args } => {
            w.line(format!("Status parentInitStatus = {class}::initialize("));
            w.indent();
            let live: Vec<&CallArg> = args.iter().filter(|a| !a.suggestion).collect();
            for (i, a) in live.iter().enumerate() {
                let sep = if i + 1 < live.len() { "," } else { "" };
                w.line(format!("{}{sep}", a.name));
            }
            for a in args.iter().filter(|a| a.suggestion) {
                w.line(format!("// {}, // {OPTIONAL_HANDLE_NOTE}", a.name));
            }
            w.dedent();
            w.line(");");
            w.line("initStatus = initStatus && parentInitStatus;");
        }
        ParentCall::Missing { class } => {
            w.line("// TODO: Call the parents initialize method if applicable.");
            w.line(format!("// Status parentInitStatus = {class}::initialize();"));
            w.line("// initStatus = initStatus && parentInitStatus;");
        }
    }

    if !body.stubs.is_empty() {
        w.line("");
        w.line("// Initialize attributes, datasets, and groups");
        for (i, stub) in body.stubs.iter().enumerate() {
            if i > 0 {
                w.line("");
            }
            w.lines(stub.lines());
        }
    }

    w.line("");
    w.line("return initStatus;");
    w.dedent();
    w.line("}");
}
