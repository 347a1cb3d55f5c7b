// obfmap entry point
use clap::Parser;
use std::process::ExitCode;

use obfmap_cli::pipeline::{run, Invocation};
use obfmap_cli::{get_version, logging, Cli};

fn main() -> ExitCode {
    // usage errors exit with status 2 inside parse
    let cli = Cli::parse();
    logging::init(cli.debug, cli.trace);
    tracing::info!("{}", get_version());
    tracing::debug!(os = std::env::consts::OS, arch = std::env::consts::ARCH, "platform");

    let outcome = Invocation::from_cli(&cli).and_then(|invocation| run(&invocation));
    match outcome {
        Ok(outcome) => {
            tracing::info!(
                entries = outcome.table.len(),
                generated = outcome.generated,
                "processing has finished successfully"
            );
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}
