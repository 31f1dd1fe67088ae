//! Command-line interface module
//!
//! This module handles argument parsing and output formatting.
//! It contains no business logic - that belongs in the [`crate::core`] module.

pub mod commands;
pub mod output;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use crate::core::config::{Overrides, ProjectConfig, Settings};
use commands::Commands;

/// Protopack - generate installable Python gRPC packages from proto files
///
/// Compiles proto definitions into one package per service role, with
/// cross-package imports, manifests and documentation.
#[derive(Parser, Debug)]
#[command(name = "protopack")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Path to protopack.toml (defaults to ./protopack.toml if present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory containing the proto files
    #[arg(long, global = true, env = "PROTO_DIR", value_name = "DIR")]
    pub proto_dir: Option<PathBuf>,

    /// Output root for generated packages
    #[arg(long, global = true, env = "OUTPUT_DIR", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Directory with template overrides
    #[arg(long, global = true, env = "PROTOPACK_TEMPLATES_DIR", value_name = "DIR")]
    pub templates_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Where to find the project configuration and what to override in it
#[derive(Debug, Clone, Default)]
pub struct ProjectOptions {
    /// Explicit config file
    pub config: Option<PathBuf>,
    /// Command-line and environment overrides
    pub overrides: Overrides,
}

impl ProjectOptions {
    /// Load and resolve settings relative to `cwd`
    pub fn load(&self, cwd: &Path) -> Result<Settings> {
        let (config, base_dir) = ProjectConfig::discover(self.config.as_deref(), cwd)
            .context("Failed to load configuration")?;
        let settings = config
            .resolve(&base_dir, cwd, &self.overrides)
            .context("Failed to resolve configuration")?;

        tracing::debug!("Proto directory: {}", settings.proto_dir.display());
        tracing::debug!("Output directory: {}", settings.output_dir.display());
        Ok(settings)
    }
}

/// Version line with the build metadata emitted by `build.rs`
pub fn build_info() -> String {
    format!(
        "protopack {} (git {}, rustc {}, {})",
        env!("CARGO_PKG_VERSION"),
        option_env!("VERGEN_GIT_SHA").unwrap_or("unknown"),
        option_env!("VERGEN_RUSTC_SEMVER").unwrap_or("unknown"),
        option_env!("VERGEN_CARGO_TARGET_TRIPLE").unwrap_or("unknown"),
    )
}

impl Cli {
    /// Project options taken from the global flags
    pub fn project_options(&self) -> ProjectOptions {
        ProjectOptions {
            config: self.config.clone(),
            overrides: Overrides {
                proto_dir: self.proto_dir.clone(),
                output_dir: self.output_dir.clone(),
                templates_dir: self.templates_dir.clone(),
            },
        }
    }

    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let project = self.project_options();
        if let Some(cmd) = self.command {
            cmd.run(&project)
        } else {
            // No subcommand provided, show help
            use clap::CommandFactory;
            let mut cmd = Self::command();
            cmd.print_help()?;
            Ok(())
        }
    }
}
