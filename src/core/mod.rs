//! Core business logic module
//!
//! This module contains the package build pipeline and the project-level
//! operations built on it. Process execution lives in [`crate::infra`].
//!
//! # Submodules
//!
//! - [`package`] - Package specification (name, role, proto files)
//! - [`config`] - Configuration (protopack.toml) loading and resolution
//! - [`resolver`] - Dependency resolution
//! - [`render`] - Template rendering
//! - [`rewrite`] - Cross-package reference rewriting
//! - [`manifest`] - Python package manifest dependencies
//! - [`report`] - Build results and artifact sets
//! - [`assembler`] - Per-package build stages
//! - [`builder`] - Build orchestration logic
//! - [`check`] - Configuration validation logic
//! - [`doctor`] - System dependency checks
//! - [`init`] - Project initialization logic
//! - [`tree`] - Dependency tree visualization
//! - [`git_setup`] - Repository bootstrap for generated packages

pub mod assembler;
pub mod builder;
pub mod check;
pub mod config;
pub mod doctor;
pub mod git_setup;
pub mod init;
pub mod manifest;
pub mod package;
pub mod render;
pub mod report;
pub mod resolver;
pub mod rewrite;
pub mod tree;
