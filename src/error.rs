//! Error types for protopack
//!
//! Domain-specific error types using thiserror.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors (protopack.toml and the package table)
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config file '{path}': {error}")]
    ReadError { path: PathBuf, error: String },

    /// Config file is not valid TOML or does not match the schema
    #[error("Failed to parse config file '{path}': {error}")]
    ParseError { path: PathBuf, error: String },

    /// Two packages share a name
    #[error("Package '{name}' is defined more than once")]
    DuplicatePackage { name: String },

    /// Missing required field
    #[error("Package '{package}' is missing required field '{field}'")]
    MissingField { package: String, field: String },

    /// Version is not valid semver
    #[error("Package '{package}' has invalid version '{version}': {error}")]
    InvalidVersion {
        package: String,
        version: String,
        error: String,
    },

    /// Interface-definition file does not exist
    #[error("Package '{package}' references missing proto file '{path}'")]
    MissingProtoFile { package: String, path: PathBuf },

    /// Package table is empty
    #[error("No packages configured")]
    NoPackages,
}

/// Dependency resolution errors
#[derive(Error, Debug)]
pub enum ResolverError {
    /// Circular dependency detected
    #[error("Circular dependency detected: {}", cycle.join(" -> "))]
    CircularDependency { cycle: Vec<String> },

    /// Missing dependency
    #[error("Missing dependency: '{dependency}' required by '{package}'")]
    MissingDependency { package: String, dependency: String },

    /// The same package appears twice in the table
    #[error("Package '{name}' appears more than once in the build table")]
    DuplicatePackage { name: String },
}

/// Code compiler errors
#[derive(Error, Debug)]
pub enum CompileError {
    /// Compiler executable not found
    #[error("Compiler '{program}' not found in PATH")]
    CompilerNotFound { program: String },

    /// Compiler command line is empty
    #[error("Compiler command is empty")]
    EmptyCommand,

    /// Interface-definition file missing
    #[error("Proto file not found: {path}")]
    MissingDefinition { path: PathBuf },

    /// Compiler could not be started
    #[error("Failed to run '{program}': {error}")]
    Spawn { program: String, error: String },

    /// Compiler exited with an error
    #[error("Compiler exited with {status}: {diagnostics}")]
    Failed { status: String, diagnostics: String },

    /// Output directory could not be scanned
    #[error("Failed to scan compiler output in '{path}': {error}")]
    ScanOutput { path: PathBuf, error: String },

    /// Filesystem error while preparing the output
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),
}

/// Reference rewriting errors
#[derive(Error, Debug)]
pub enum RewriteError {
    /// Expected generated artifact was not produced
    #[error("Expected generated artifact missing: {path}")]
    MissingArtifact { path: PathBuf },

    /// A base symbol is still referenced without the base package qualifier
    #[error("Unqualified reference to '{symbol}' remains in {path} at line {line}")]
    UnqualifiedReference {
        path: PathBuf,
        symbol: String,
        line: usize,
    },

    /// Matcher for a base symbol could not be built
    #[error("Invalid rewrite pattern for '{symbol}': {error}")]
    Pattern { symbol: String, error: String },

    /// Generated module directory could not be scanned
    #[error("Failed to scan '{path}': {error}")]
    Scan { path: PathBuf, error: String },

    /// Filesystem error
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),
}

/// Template rendering errors
#[derive(Error, Debug)]
pub enum RenderError {
    /// Template file does not exist
    #[error("Template '{template}' not found at '{path}'")]
    TemplateNotFound { template: String, path: PathBuf },

    /// Template references a parameter the template does not accept
    #[error("Template '{template}' references unknown parameter '{parameter}'")]
    UnknownParameter { template: String, parameter: String },

    /// Client or server package without a service family
    #[error("Package '{package}' has role '{role}' but no service family")]
    MissingFamily { package: String, role: String },

    /// Template could not be read
    #[error("Failed to read template '{template}': {error}")]
    ReadError { template: String, error: String },

    /// Filesystem error while writing rendered output
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),
}

impl RenderError {
    /// Whether this error indicates a packaging defect rather than a
    /// per-package problem
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::TemplateNotFound { .. } | Self::UnknownParameter { .. }
        )
    }
}

/// Filesystem errors
#[derive(Error, Debug)]
pub enum FilesystemError {
    /// Failed to create directory
    #[error("Failed to create directory '{path}': {error}")]
    CreateDir { path: PathBuf, error: String },

    /// Failed to write file
    #[error("Failed to write file '{path}': {error}")]
    WriteFile { path: PathBuf, error: String },

    /// Failed to read file
    #[error("Failed to read file '{path}': {error}")]
    ReadFile { path: PathBuf, error: String },

    /// Failed to remove file
    #[error("Failed to remove file '{path}': {error}")]
    RemoveFile { path: PathBuf, error: String },

    /// Failed to resolve the working directory
    #[error("Failed to resolve absolute path for '{path}': {error}")]
    Absolutize { path: PathBuf, error: String },
}

/// Git bootstrap errors
#[derive(Error, Debug)]
pub enum GitError {
    /// git executable not found
    #[error("git not found in PATH")]
    NotInstalled,

    /// Package directory does not exist
    #[error("Package directory {path} does not exist")]
    MissingPackage { path: PathBuf },

    /// A git command failed
    #[error("'git {command}' failed in '{path}': {error}")]
    CommandFailed {
        command: String,
        path: PathBuf,
        error: String,
    },

    /// Filesystem error
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),
}

/// Project initialization errors
#[derive(Error, Debug)]
pub enum InitError {
    /// Target directory does not exist
    #[error("Directory '{path}' does not exist")]
    DirectoryNotFound { path: PathBuf },

    /// Config file already present
    #[error("'{path}' already exists (use --force to overwrite)")]
    ConfigExists { path: PathBuf },

    /// Default config could not be serialized
    #[error("Failed to generate config: {error}")]
    Serialize { error: String },

    /// Filesystem error
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),
}

/// Top-level protopack error type
#[derive(Error, Debug)]
pub enum ProtopackError {
    /// Configuration error
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Resolver error
    #[error("Resolver error: {0}")]
    Resolver(#[from] ResolverError),

    /// Template configuration error
    #[error("Template error: {0}")]
    Render(#[from] RenderError),

    /// Filesystem error
    #[error("Filesystem error: {0}")]
    Filesystem(#[from] FilesystemError),

    /// Git error
    #[error("Git error: {0}")]
    Git(#[from] GitError),

    /// Init error
    #[error("Init error: {0}")]
    Init(#[from] InitError),
}
