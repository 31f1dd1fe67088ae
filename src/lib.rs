//! Protopack - Python gRPC package generator
//!
//! This library turns a set of proto files into installable Python packages,
//! one per service role, with cross-package imports rewritten so that
//! dependent packages share message types with their base package.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Build pipeline and project operations
//! - [`infra`] - Infrastructure layer (filesystem, compiler, git)
//! - [`config`] - Configuration constants and defaults
//! - [`error`] - Error types and handling

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;

#[cfg(test)]
pub mod test_utils;
