//! AqNWB C++ code generation modules.

pub mod context;
pub mod declaration;
pub mod definition;
pub mod naming;
pub mod schema_header;
pub mod smoke_test;
pub mod types;

pub use context::{BaseClass, TypeContext};
pub use declaration::DeclarationGenerator;
pub use definition::DefinitionGenerator;
pub use schema_header::SchemaHeaderGenerator;
pub use smoke_test::SmokeTestGenerator;
pub use types::CppScalar;
