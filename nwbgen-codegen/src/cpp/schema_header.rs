//! Per-namespace schema header.
//!
//! Embeds the canonical text of every schema source and the namespace
//! manifest as raw string constants, and registers them with AqNWB's
//! namespace registry. Sources longer than the chunk threshold are split
//! into part constants and joined back at compile time.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use bytes::{BufMut, Bytes, BytesMut};
use nwbgen_schema::LoadedNamespace;
use nwbgen_schema::naming::{cpp_namespace_name, namespace_file_stem};

use crate::chunk::EmbeddedBlob;
use crate::cpp::naming::string_literal;
use crate::error::CodegenError;

const RAW_OPEN: &[u8] = b"R\"delimiter(";
const RAW_CLOSE: &[u8] = b")delimiter\"";

/// Names already used by the header itself.
const RESERVED: [&str; 4] = ["namespaceName", "version", "namespaces", "specVariables"];

/// Key of the manifest in `specVariables`.
const MANIFEST_KEY: &str = "namespace";

const JOIN_HELPER: &str = "\
// Joins the parts of a schema that was too long for a single literal
template <std::size_t N, std::size_t M>
constexpr std::array<char, N> joinSchemaParts(const std::array<std::string_view, M>& parts)
{
    std::array<char, N> out {};
    std::size_t pos = 0;
    for (const auto& part : parts) {
        for (char c : part) {
            out[pos++] = c;
        }
    }
    return out;
}";

/// Relative path of a namespace's schema header.
#[must_use]
pub fn schema_header_path(namespace: &str) -> PathBuf {
    PathBuf::from("spec").join(format!("{}.hpp", namespace_file_stem(namespace)))
}

/// A schema text with its lookup key and constant name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecVariable {
    /// Key in `specVariables`.
    pub key: String,
    /// Embedded text.
    pub blob: EmbeddedBlob,
}

/// Generator for a namespace's schema header.
pub struct SchemaHeaderGenerator<'a> {
    namespace: &'a LoadedNamespace,
    display_name: &'a str,
    threshold: NonZeroUsize,
}

impl<'a> SchemaHeaderGenerator<'a> {
    /// Creates a generator. `display_name` is the namespace name used in the
    /// generated code, which differs from the schema name when overridden.
    #[must_use]
    pub fn new(namespace: &'a LoadedNamespace, display_name: &'a str, threshold: NonZeroUsize) -> Self {
        Self {
            namespace,
            display_name,
            threshold,
        }
    }

    /// Returns the embedded texts in output order, the manifest last.
    #[must_use]
    pub fn variables(&self) -> Vec<SpecVariable> {
        let mut used: Vec<String> = RESERVED.iter().map(|s| (*s).to_string()).collect();
        let mut vars = Vec::with_capacity(self.namespace.sources.len() + 1);
        for source in &self.namespace.sources {
            let id = unique_identifier(&source.stem, &mut used);
            vars.push(SpecVariable {
                key: source.stem.clone(),
                blob: EmbeddedBlob::encode(id, Bytes::from(source.canonical.clone()), self.threshold),
            });
        }
        vars.push(SpecVariable {
            key: MANIFEST_KEY.to_string(),
            blob: EmbeddedBlob::encode(
                "namespaces",
                Bytes::from(self.namespace.manifest.clone()),
                self.threshold,
            ),
        });
        vars
    }

    /// Renders the header.
    ///
    /// # Errors
    /// Returns `CodegenError::UnsafeEmbeddedText` if a text contains the raw
    /// string terminator.
    pub fn generate(&self) -> Result<Bytes, CodegenError> {
        let vars = self.variables();
        for var in &vars {
            if contains(&var.blob.reassemble(), RAW_CLOSE) {
                return Err(CodegenError::UnsafeEmbeddedText {
                    identifier: var.blob.name().to_string(),
                });
            }
        }

        let ns = cpp_namespace_name(self.display_name);
        let mut out = BytesMut::new();
        for l in [
            "#pragma once",
            "",
            "#include <array>",
            "#include <cstddef>",
            "#include <string>",
            "#include <string_view>",
            "#include <utility>",
            "#include <vector>",
            "#include \"spec/NamespaceRegistry.hpp\"",
            "",
        ] {
            line(&mut out, l);
        }
        line(&mut out, &format!("namespace AQNWB::SPEC::{ns}"));
        line(&mut out, "{");
        line(&mut out, "");
        line(
            &mut out,
            &format!("const std::string namespaceName = {};", string_literal(self.display_name)),
        );
        line(&mut out, "");
        line(
            &mut out,
            &format!(
                "const std::string version = {};",
                string_literal(self.namespace.version.as_deref().unwrap_or_default())
            ),
        );
        line(&mut out, "");

        if vars.iter().any(|v| matches!(v.blob, EmbeddedBlob::Chunked { .. })) {
            line(&mut out, JOIN_HELPER);
            line(&mut out, "");
        }
        for var in &vars {
            render_blob(&mut out, &var.blob);
            line(&mut out, "");
        }

        line(&mut out, "const std::vector<std::pair<std::string_view, std::string_view>>");
        line(&mut out, "    specVariables {{");
        let last = vars.len().saturating_sub(1);
        for (i, var) in vars.iter().enumerate() {
            let sep = if i < last { "," } else { "" };
            line(
                &mut out,
                &format!("  {{{}, {}}}{sep}", string_literal(&var.key), var.blob.name()),
            );
        }
        line(&mut out, "}};");
        line(&mut out, "");
        line(&mut out, "// Register this namespace with the global registry");
        line(&mut out, "REGISTER_NAMESPACE(namespaceName, version, specVariables)");
        line(&mut out, "");
        line(&mut out, &format!("}}  // namespace AQNWB::SPEC::{ns}"));
        Ok(out.freeze())
    }
}

fn render_blob(out: &mut BytesMut, blob: &EmbeddedBlob) {
    match blob {
        EmbeddedBlob::Whole { name, data } => raw_constant(out, name, data),
        EmbeddedBlob::Chunked {
            name,
            chunks,
            total_len,
        } => {
            let parts = blob.part_names();
            for (part, chunk) in parts.iter().zip(chunks) {
                raw_constant(out, part, &chunk.data);
            }
            line(
                out,
                &format!(
                    "constexpr std::array<std::string_view, {}> {name}_parts {{{{{}}}}};",
                    parts.len(),
                    parts.join(", ")
                ),
            );
            line(out, &format!("constexpr std::size_t {name}_size = {total_len};"));
            line(
                out,
                &format!("constexpr auto {name}_buffer = joinSchemaParts<{name}_size>({name}_parts);"),
            );
            line(
                out,
                &format!("constexpr std::string_view {name} {{{name}_buffer.data(), {name}_size}};"),
            );
        }
    }
}

fn raw_constant(out: &mut BytesMut, name: &str, data: &[u8]) {
    out.put_slice(format!("constexpr std::string_view {name} = ").as_bytes());
    out.put_slice(RAW_OPEN);
    out.put_slice(data);
    out.put_slice(RAW_CLOSE);
    out.put_slice(b";\n");
}

fn line(out: &mut BytesMut, text: &str) {
    out.put_slice(text.as_bytes());
    out.put_u8(b'\n');
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// Turns a source stem into a C++ identifier not yet in `used`.
fn unique_identifier(stem: &str, used: &mut Vec<String>) -> String {
    let mut id: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if id.is_empty() || id.starts_with(|c: char| c.is_ascii_digit()) {
        id.insert(0, '_');
    }
    let mut candidate = id.clone();
    let mut n = 2;
    while used.contains(&candidate) {
        candidate = format!("{id}_{n}");
        n += 1;
    }
    used.push(candidate.clone());
    candidate
}
