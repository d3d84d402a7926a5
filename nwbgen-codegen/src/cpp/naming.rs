//! C++ naming and text helpers.

use nwbgen_schema::naming::{cpp_namespace_name, to_camel_case};

const CPP_KEYWORDS: &[&str] = &[
    "alignas", "alignof", "and", "asm", "auto", "bool", "break", "case", "catch", "char",
    "class", "const", "constexpr", "continue", "default", "delete", "do", "double", "else",
    "enum", "explicit", "export", "extern", "false", "float", "for", "friend", "goto", "if",
    "inline", "int", "long", "mutable", "namespace", "new", "not", "nullptr", "operator", "or",
    "private", "protected", "public", "register", "return", "short", "signed", "sizeof",
    "static", "struct", "switch", "template", "this", "throw", "true", "try", "typedef",
    "typename", "union", "unsigned", "using", "virtual", "void", "volatile", "while",
];

/// Returns true if `name` is a reserved C++ word.
#[must_use]
pub fn is_cpp_keyword(name: &str) -> bool {
    CPP_KEYWORDS.contains(&name)
}

/// Makes a documentation string safe for a macro string argument.
///
/// Quotes are dropped, commas become ` -` and whitespace runs (including
/// newlines) collapse to one space.
#[must_use]
pub fn macro_doc(doc: &str) -> String {
    let cleaned = doc.replace(['"', '\''], "").replace(',', " -");
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Collapses a documentation string to a single line for `@brief`.
#[must_use]
pub fn brief(doc: &str) -> String {
    let line = doc.split_whitespace().collect::<Vec<_>>().join(" ");
    if line.is_empty() {
        "No documentation provided".to_string()
    } else {
        line.replace("*/", "* /")
    }
}

/// Escapes text for a C++ string literal.
#[must_use]
pub fn string_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Accessor suffix for a field path, `general/devices` to `GeneralDevices`.
#[must_use]
pub fn path_suffix(path: &str) -> String {
    to_camel_case(&path.replace('/', "_"), false)
}

/// Qualified C++ class name of a type.
#[must_use]
pub fn qualified_class(namespace: Option<&str>, type_name: &str) -> String {
    match namespace {
        Some(ns) => format!("{}::{}", cpp_namespace_name(ns), type_name),
        None => type_name.to_string(),
    }
}

/// Relative include path of a generated declaration.
#[must_use]
pub fn header_include(namespace: &str, subfolder: &str, type_name: &str) -> String {
    format!("{namespace}/{subfolder}/{type_name}.hpp")
}

/// Local variable holding the absolute path of a field.
#[must_use]
pub fn path_variable(path: &str) -> String {
    format!("{}Path", to_camel_case(&path.replace('/', "_"), true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_macro_doc() {
        assert_eq!(
            macro_doc("The \"name\", as it's\n  stored."),
            "The name - as its stored."
        );
    }

    #[test]
    fn test_string_literal_escapes() {
        assert_eq!(string_literal("a\"b\\c\n"), r#""a\"b\\c\n""#);
    }

    #[test]
    fn test_names() {
        assert_eq!(path_suffix("general/extracellular_ephys"), "GeneralExtracellularEphys");
        assert_eq!(qualified_class(Some("hdmf-common"), "VectorData"), "HDMF_COMMON::VectorData");
        assert_eq!(qualified_class(None, "Thing"), "Thing");
        assert_eq!(header_include("core", "ecephys", "ElectricalSeries"), "core/ecephys/ElectricalSeries.hpp");
        assert_eq!(path_variable("general/devices"), "generalDevicesPath");
        assert!(is_cpp_keyword("namespace"));
        assert!(!is_cpp_keyword("name"));
    }

    #[test]
    fn test_brief_defaults() {
        assert_eq!(brief("  \n"), "No documentation provided");
        assert_eq!(brief("two\nlines"), "two lines");
    }
}
