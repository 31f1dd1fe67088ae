//! Protopack CLI - Python gRPC package generator
//!
//! Entry point for the protopack command-line application.

use anyhow::Result;
use clap::Parser;

use protopack::cli::output::{display_error, OutputConfig};
use protopack::cli::Cli;

fn main() -> Result<()> {
    // Values from .env feed the clap `env` fallbacks
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    // Apply output configuration globally
    let output_config = OutputConfig::new(cli.quiet, cli.json, cli.verbose);
    output_config.apply_global();

    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(output_config.log_level().into()),
        )
        .init();

    // Run the command and handle errors
    match cli.run() {
        Ok(()) => Ok(()),
        Err(e) => {
            display_error(&e);
            std::process::exit(1);
        }
    }
}
