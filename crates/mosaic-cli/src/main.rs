mod cli;
mod commands;
mod error;
mod metadata;
mod output;
mod plan;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::error::CliError;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

async fn run(cli: &Cli) -> Result<(), CliError> {
    let envelope = commands::run(cli).await?;
    output::render(&envelope, cli.pretty)
}

/// Logs go to stderr so stdout stays a single JSON document.
fn init_tracing(verbose: bool) {
    let default_directive = if verbose {
        "mosaic=debug,mosaic_core=debug,mosaic_cli=debug"
    } else {
        "mosaic=info,mosaic_core=info,mosaic_cli=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive)),
        )
        .with_writer(std::io::stderr)
        .init();
}
