//! Name conversion helpers shared by the registry and code generators.

/// Converts `snake_case`, `kebab-case` or `path/like` names to CamelCase.
///
/// Characters after the first of each word are kept as written, so
/// `electrode_group` becomes `ElectrodeGroup` and `ElectrodeGroup` is left
/// unchanged. With `lower_first` the first character is lowercased.
#[must_use]
pub fn to_camel_case(name: &str, lower_first: bool) -> String {
    let mut result = String::with_capacity(name.len());
    for word in name
        .split(['_', '-', '/', ' ', '.'])
        .filter(|w| !w.is_empty())
    {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            result.extend(first.to_uppercase());
            result.push_str(chars.as_str());
        }
    }
    if lower_first {
        let mut chars = result.chars();
        if let Some(first) = chars.next() {
            return first.to_lowercase().chain(chars).collect();
        }
    }
    result
}

/// Converts a namespace name to its C++ namespace identifier.
///
/// `hdmf-common` becomes `HDMF_COMMON`.
#[must_use]
pub fn cpp_namespace_name(namespace: &str) -> String {
    namespace.to_uppercase().replace(['-', '.', ' '], "_")
}

/// Converts a namespace name to a file stem, `hdmf-common` to `hdmf_common`.
#[must_use]
pub fn namespace_file_stem(namespace: &str) -> String {
    namespace.replace(['-', '.', ' '], "_")
}

/// Derives the output subfolder from a schema source file stem.
///
/// A leading `nwb.` is dropped and remaining dots become underscores:
/// `nwb.ecephys` maps to `ecephys`, `hdmf-common.table` to `hdmf-common_table`.
#[must_use]
pub fn source_subfolder(stem: &str) -> String {
    stem.strip_prefix("nwb.").unwrap_or(stem).replace('.', "_")
}

/// Splits an optionally namespace-qualified type name (`ns/Type`).
#[must_use]
pub fn split_qualified(name: &str) -> (Option<&str>, &str) {
    match name.rsplit_once('/') {
        Some((ns, ty)) if !ns.is_empty() => (Some(ns), ty),
        Some((_, ty)) => (None, ty),
        None => (None, name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_camel_case() {
        assert_eq!(to_camel_case("electrode_group", false), "ElectrodeGroup");
        assert_eq!(to_camel_case("electrode_group", true), "electrodeGroup");
        assert_eq!(
            to_camel_case("general/extracellular_ephys", true),
            "generalExtracellularEphys"
        );
        assert_eq!(to_camel_case("TimeSeries", true), "timeSeries");
        assert_eq!(to_camel_case("", true), "");
    }

    #[test]
    fn test_namespace_names() {
        assert_eq!(cpp_namespace_name("hdmf-common"), "HDMF_COMMON");
        assert_eq!(cpp_namespace_name("core"), "CORE");
        assert_eq!(namespace_file_stem("hdmf-experimental"), "hdmf_experimental");
    }

    #[test]
    fn test_source_subfolder() {
        assert_eq!(source_subfolder("nwb.ecephys"), "ecephys");
        assert_eq!(source_subfolder("table"), "table");
        assert_eq!(source_subfolder("ndx.my.ext"), "ndx_my_ext");
    }

    #[test]
    fn test_split_qualified() {
        assert_eq!(
            split_qualified("hdmf-common/Container"),
            (Some("hdmf-common"), "Container")
        );
        assert_eq!(split_qualified("Container"), (None, "Container"));
    }
}
