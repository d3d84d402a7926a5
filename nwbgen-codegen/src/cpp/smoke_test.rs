//! Smoke-test CMake project that compiles and instantiates every generated
//! class.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use nwbgen_schema::TypeRecord;
use nwbgen_schema::naming::cpp_namespace_name;

use crate::cpp::naming::header_include;

/// Project and executable name.
pub const APP_NAME: &str = "schema_compilation_test";

/// Directory of the project, relative to the output directory.
pub const APP_DIR: &str = "test_app";

/// One rendered file of the project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmokeTestFile {
    /// Path relative to the output directory.
    pub path: PathBuf,
    /// File contents.
    pub contents: String,
}

/// Generator for the smoke-test project.
pub struct SmokeTestGenerator<'a> {
    types: &'a [&'a TypeRecord],
    definitions: &'a [PathBuf],
    schema: &'a Path,
}

impl<'a> SmokeTestGenerator<'a> {
    /// Creates a generator for the given types and definition files, the
    /// latter relative to the output directory.
    #[must_use]
    pub fn new(types: &'a [&'a TypeRecord], definitions: &'a [PathBuf], schema: &'a Path) -> Self {
        Self {
            types,
            definitions,
            schema,
        }
    }

    /// Renders `CMakeLists.txt`, `main.cpp` and `README.md`.
    #[must_use]
    pub fn generate(&self) -> Vec<SmokeTestFile> {
        let dir = PathBuf::from(APP_DIR);
        vec![
            SmokeTestFile {
                path: dir.join("CMakeLists.txt"),
                contents: self.cmake(),
            },
            SmokeTestFile {
                path: dir.join("main.cpp"),
                contents: self.main(),
            },
            SmokeTestFile {
                path: dir.join("README.md"),
                contents: self.readme(),
            },
        ]
    }

    fn cmake(&self) -> String {
        let mut out = String::new();
        out.push_str("cmake_minimum_required(VERSION 3.15)\n");
        out.push_str(&format!("project({APP_NAME} VERSION 0.1.0 LANGUAGES CXX)\n\n"));
        out.push_str("# Set C++ standard\n");
        out.push_str("set(CMAKE_CXX_STANDARD 17)\n");
        out.push_str("set(CMAKE_CXX_STANDARD_REQUIRED ON)\n\n");
        out.push_str("# Find aqnwb package. The aqnwb_DIR must be set on the command line\n");
        out.push_str("# e.g. -Daqnwb_DIR=/path/to/aqnwb/install/lib/cmake/aqnwb\n");
        out.push_str("find_package(aqnwb REQUIRED)\n\n");
        out.push_str("# Find HDF5\n");
        out.push_str("find_package(HDF5 REQUIRED COMPONENTS CXX)\n\n");
        out.push_str("# Generated source files\n");
        out.push_str("set(GENERATED_SOURCES");
        for def in self.definitions {
            let def = def.to_string_lossy().replace('\\', "/");
            out.push_str(&format!("\n    \"${{CMAKE_CURRENT_SOURCE_DIR}}/../{def}\""));
        }
        out.push_str("\n)\n\n");
        out.push_str("# Add the executable\n");
        out.push_str(&format!("add_executable({APP_NAME}\n    main.cpp\n    ${{GENERATED_SOURCES}}\n)\n\n"));
        out.push_str("# Include directories\n");
        out.push_str(&format!("target_include_directories({APP_NAME} PRIVATE\n"));
        out.push_str("    \"${CMAKE_CURRENT_SOURCE_DIR}/..\"\n");
        out.push_str("    \"${CMAKE_CURRENT_SOURCE_DIR}/../spec\"\n");
        out.push_str("    ${HDF5_INCLUDE_DIRS}\n)\n\n");
        out.push_str("# Link libraries\n");
        out.push_str(&format!(
            "target_link_libraries({APP_NAME}\n    aqnwb::aqnwb\n    ${{HDF5_CXX_LIBRARIES}}\n)\n\n"
        ));
        out.push_str("# If on Windows, link bcrypt\n");
        out.push_str(&format!("if(WIN32)\n    target_link_libraries({APP_NAME} bcrypt)\nendif()\n\n"));
        out.push_str("# Set the output directory\n");
        out.push_str(&format!(
            "set_target_properties({APP_NAME} PROPERTIES\n    RUNTIME_OUTPUT_DIRECTORY ${{CMAKE_CURRENT_BINARY_DIR}}/bin\n)\n"
        ));
        out
    }

    fn main(&self) -> String {
        let mut by_namespace: BTreeMap<String, Vec<&TypeRecord>> = BTreeMap::new();
        for record in self.types {
            by_namespace
                .entry(cpp_namespace_name(&record.namespace))
                .or_default()
                .push(record);
        }
        let mut includes: Vec<String> = self
            .types
            .iter()
            .map(|r| header_include(&r.namespace, &r.source_subfolder, &r.name))
            .collect();
        includes.sort();
        includes.dedup();

        let mut out = String::new();
        out.push_str("#include <iostream>\n#include <memory>\n#include <string>\n");
        out.push_str("#include \"io/hdf5/HDF5IO.hpp\"\n#include \"Utils.hpp\"\n#include \"nwb/RegisteredType.hpp\"\n\n");
        for include in includes {
            out.push_str(&format!("#include \"{include}\"\n"));
        }
        out.push_str("\nint main()\n{\n");
        out.push_str("    std::cout << \"Starting C++ class compilation test...\" << std::endl;\n\n");
        out.push_str("    std::string testFilePath = \"test_compilation.nwb\";\n\n");
        out.push_str("    try {\n");
        out.push_str("        auto io = AQNWB::createIO(\"HDF5\", testFilePath);\n");
        out.push_str("        io->open(AQNWB::IO::FileMode::Overwrite);\n\n");
        out.push_str("        std::cout << \"Testing instantiation of all generated C++ classes:\" << std::endl;\n\n");
        for (ns, records) in &by_namespace {
            out.push_str(&format!("        // Testing {ns} namespace types\n"));
            for record in records {
                let var = record.name.to_lowercase();
                let name = &record.name;
                out.push_str("        try {\n");
                out.push_str(&format!("            std::string {var}_path = \"/test_{var}\";\n"));
                out.push_str(&format!(
                    "            auto {var}_obj = AQNWB::NWB::RegisteredType::create<{ns}::{name}>({var}_path, io);\n"
                ));
                out.push_str(&format!(
                    "            std::cout << \"   {name} instantiated successfully\" << std::endl;\n"
                ));
                out.push_str("        } catch (const std::exception& e) {\n");
                out.push_str(&format!(
                    "            std::cout << \"   {name} instantiation failed: \" << e.what() << std::endl;\n"
                ));
                out.push_str("        }\n\n");
            }
        }
        out.push_str("        io->close();\n\n");
        out.push_str("        std::cout << \"Compilation test completed successfully!\" << std::endl;\n");
        out.push_str("    } catch (const std::exception& e) {\n");
        out.push_str("        std::cerr << \"Test failed with exception: \" << e.what() << std::endl;\n");
        out.push_str("        return 1;\n    }\n\n    return 0;\n}\n");
        out
    }

    fn readme(&self) -> String {
        format!(
            "# {APP_NAME}\n\n\
             Generated test application that checks that every C++ class generated from the schema compiles and can be instantiated.\n\n\
             ## Generated from Schema\n\
             - Schema: `{schema}`\n\
             - Classes: {count}\n\n\
             ## Building and Running\n\n\
             Requires CMake 3.15 or higher, a C++17 compiler, HDF5 and an installed aqnwb.\n\n\
             ```bash\n\
             mkdir build\n\
             cd build\n\
             cmake .. -Daqnwb_DIR=/path/to/aqnwb/install/lib/cmake/aqnwb\n\
             make\n\
             ./bin/{APP_NAME}\n\
             ```\n\n\
             The application instantiates each class with a test path and a shared IO object and reports success or failure per type. It does not test behavior beyond construction.\n",
            schema = self.schema.display(),
            count = self.types.len(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nwbgen_schema::{ParentRef, TypeKind};
    use std::collections::BTreeSet;

    fn record(name: &str, namespace: &str) -> TypeRecord {
        TypeRecord {
            name: name.to_string(),
            kind: TypeKind::Group,
            namespace: namespace.to_string(),
            source_file: PathBuf::from("nwb.misc.yaml"),
            source_subfolder: "misc".to_string(),
            parent: ParentRef::Root,
            doc: String::new(),
            referenced_types: BTreeSet::new(),
        }
    }

    #[test]
    fn test_project_files() {
        let a = record("Units", "core");
        let b = record("VectorData", "hdmf-common");
        let types = [&a, &b];
        let defs = [PathBuf::from("core/misc/Units.cpp")];
        let files = SmokeTestGenerator::new(&types, &defs, Path::new("schema/core.namespace.yaml")).generate();

        let names: Vec<_> = files.iter().map(|f| f.path.clone()).collect();
        assert_eq!(
            names,
            [
                PathBuf::from("test_app/CMakeLists.txt"),
                PathBuf::from("test_app/main.cpp"),
                PathBuf::from("test_app/README.md"),
            ]
        );
        assert!(files[0].contents.contains("    \"${CMAKE_CURRENT_SOURCE_DIR}/../core/misc/Units.cpp\"\n)"));
        assert!(files[1].contents.contains("#include \"core/misc/Units.hpp\"\n"));
        assert!(files[1].contents.contains("RegisteredType::create<HDMF_COMMON::VectorData>(vectordata_path, io)"));
        assert!(files[1].contents.find("// Testing CORE").expect("core") < files[1].contents.find("// Testing HDMF_COMMON").expect("hdmf"));
        assert!(!files[2].contents.contains("Generated on"));
    }
}
