//! CLI command implementations
//!
//! Each command is implemented in its own submodule.

pub mod build;
pub mod check;
pub mod doctor;
pub mod git_setup;
pub mod init;
pub mod templates;
pub mod tree;

use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;

use crate::cli::ProjectOptions;

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a protopack.toml describing the default package table
    Init {
        /// Overwrite an existing protopack.toml
        #[arg(short, long)]
        force: bool,
    },

    /// Generate every package
    Build,

    /// Validate configuration without building
    Check,

    /// Display dependency tree
    Tree {
        /// Show dependencies for specific package
        package: Option<String>,

        /// Output in DOT graph format
        #[arg(long)]
        graph: bool,
    },

    /// Check system dependencies
    Doctor,

    /// Template management subcommands
    Templates {
        #[command(subcommand)]
        command: TemplateCommands,
    },

    /// Initialize git repositories for generated packages
    GitSetup,
}

/// Template subcommands
#[derive(Subcommand, Debug)]
pub enum TemplateCommands {
    /// Write the built-in templates to a directory
    Export {
        /// Target directory
        dir: PathBuf,

        /// Overwrite existing files
        #[arg(short, long)]
        force: bool,
    },
}

impl Commands {
    /// Execute the command
    pub fn run(self, project: &ProjectOptions) -> Result<()> {
        let current_dir = std::env::current_dir()?;
        match self {
            Self::Init { force } => init::execute(&current_dir, force),
            Self::Build => build::execute(&project.load(&current_dir)?),
            Self::Check => check::execute(&project.load(&current_dir)?),
            Self::Tree { package, graph } => {
                tree::execute(&project.load(&current_dir)?, package.as_deref(), graph)
            }
            Self::Doctor => doctor::execute(&project.load(&current_dir)?),
            Self::Templates { command } => match command {
                TemplateCommands::Export { dir, force } => {
                    templates::export(&current_dir.join(dir), force)
                }
            },
            Self::GitSetup => git_setup::execute(&project.load(&current_dir)?),
        }
    }
}
