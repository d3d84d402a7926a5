use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use nwbgen::cli::Cli;
use nwbgen::commands;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match commands::execute(cli.command) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            let reason = format!("{e:#}");
            error!(reason = %reason, "nwbgen failed");
            ExitCode::FAILURE
        }
    }
}
