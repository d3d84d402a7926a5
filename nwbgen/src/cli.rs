//! Command line definitions.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Command line arguments.
#[derive(Debug, Parser)]
#[command(name = "nwbgen", version)]
#[command(about = "Compile NWB/HDMF schemas into AqNWB C++ classes", long_about = None)]
pub struct Cli {
    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate C++ declarations, definitions and schema headers
    Compile {
        /// Namespace file, or a directory of namespace files
        schema: PathBuf,

        /// Directory the generated files are written to
        output_dir: PathBuf,

        /// Largest schema text embedded as a single literal, in bytes
        #[arg(long, default_value_t = 16_000)]
        chunk_size: usize,

        /// Present the root namespace under this name
        #[arg(long)]
        namespace_override: Option<String>,

        /// Also write a CMake project that instantiates every class
        #[arg(long)]
        generate_smoke_test: bool,

        /// Number of worker threads (defaults to the available parallelism)
        #[arg(long)]
        jobs: Option<NonZeroUsize>,

        /// Extra directory searched for included namespaces
        #[arg(long = "include-dir")]
        include_dirs: Vec<PathBuf>,
    },

    /// Print each type's namespace, base and parameters without writing files
    Inspect {
        /// Namespace file, or a directory of namespace files
        schema: PathBuf,

        /// Only show this type
        #[arg(long = "type")]
        type_name: Option<String>,

        /// Extra directory searched for included namespaces
        #[arg(long = "include-dir")]
        include_dirs: Vec<PathBuf>,
    },
}
