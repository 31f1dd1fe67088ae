//! Package specification handling
//!
//! A [`PackageSpec`] describes one generated package: which proto files it
//! compiles, what role it plays, and which packages it depends on. Specs are
//! loaded once before a build and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::config::defaults::DEFAULT_PACKAGE_VERSION;
use crate::error::ConfigError;

/// Role a package plays in the generated set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageRole {
    /// Shared message definitions, no RPC bindings needed at runtime
    Messages,
    /// Client wrapper around a service stub
    Client,
    /// Server skeleton plus launcher
    Server,
}

impl PackageRole {
    /// Get the role name as used in configuration
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Messages => "messages",
            Self::Client => "client",
            Self::Server => "server",
        }
    }

    /// Whether packages with this role need a service and family
    pub fn requires_service(self) -> bool {
        !matches!(self, Self::Messages)
    }
}

impl fmt::Display for PackageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Service family, selecting which method-set templates a package uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceFamily {
    /// Speech-to-text worker
    Transcription,
    /// Voice cloning worker
    Cloning,
}

impl ServiceFamily {
    /// Get the family name as used in configuration
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Transcription => "transcription",
            Self::Cloning => "cloning",
        }
    }

    /// Client-side method names exposed by the generated wrapper, in order
    pub fn client_methods(self) -> &'static [&'static str] {
        match self {
            Self::Transcription => &["transcribe", "health_check"],
            Self::Cloning => &["clone_audio", "health_check"],
        }
    }
}

impl fmt::Display for ServiceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable descriptor of one generated package
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageSpec {
    /// Unique package name (e.g. `AudioMessages`)
    pub name: String,

    /// Proto files, relative to the proto directory
    pub proto_files: Vec<String>,

    /// Package role
    pub role: PackageRole,

    /// Service identifier (client and server roles)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,

    /// Service family (client and server roles)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<ServiceFamily>,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Names of packages this one depends on
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,

    /// Package version written to the manifest
    #[serde(default = "default_version")]
    pub version: String,

    /// Git remote used by `git-setup`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
}

fn default_version() -> String {
    DEFAULT_PACKAGE_VERSION.to_string()
}

impl PackageSpec {
    /// Create a spec with the given name, role and proto files
    pub fn new(name: &str, role: PackageRole, proto_files: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            proto_files: proto_files.iter().map(|f| (*f).to_string()).collect(),
            role,
            service: None,
            family: None,
            description: String::new(),
            dependencies: Vec::new(),
            version: default_version(),
            repository: None,
        }
    }

    /// Set the service identifier and family
    #[must_use]
    pub fn with_service(mut self, service: &str, family: ServiceFamily) -> Self {
        self.service = Some(service.to_string());
        self.family = Some(family);
        self
    }

    /// Set the description
    #[must_use]
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// Add a dependency
    #[must_use]
    pub fn depends_on(mut self, dependency: &str) -> Self {
        self.dependencies.push(dependency.to_string());
        self
    }

    /// Set the git remote
    #[must_use]
    pub fn with_repository(mut self, url: &str) -> Self {
        self.repository = Some(url.to_string());
        self
    }

    /// Python module (and package directory) name
    pub fn module_name(&self) -> String {
        self.name.to_lowercase()
    }

    /// Logical module names of the compiled proto files, in declaration order
    pub fn proto_modules(&self) -> Vec<String> {
        self.proto_files.iter().map(|f| logical_name(f)).collect()
    }

    /// Logical module name of the primary (first) proto file
    pub fn primary_proto_module(&self) -> Option<String> {
        self.proto_files.first().map(|f| logical_name(f))
    }

    /// Service identifier, or an empty string for messages packages
    pub fn service_name(&self) -> &str {
        self.service.as_deref().unwrap_or_default()
    }

    /// Validate the fields of a single spec
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::MissingField {
                package: "<unnamed>".to_string(),
                field: "name".to_string(),
            });
        }

        if self.proto_files.is_empty() {
            return Err(self.missing("proto_files"));
        }

        if self.role.requires_service() {
            if self.service.as_deref().map_or(true, str::is_empty) {
                return Err(self.missing("service"));
            }
            if self.family.is_none() {
                return Err(self.missing("family"));
            }
        }

        semver::Version::parse(&self.version).map_err(|e| ConfigError::InvalidVersion {
            package: self.name.clone(),
            version: self.version.clone(),
            error: e.to_string(),
        })?;

        Ok(())
    }

    fn missing(&self, field: &str) -> ConfigError {
        ConfigError::MissingField {
            package: self.name.clone(),
            field: field.to_string(),
        }
    }
}

/// Derive the compiler's module name for a proto file
///
/// `audio-message.proto` becomes `audio_message`, matching the file names the
/// Python protobuf plugin emits (`audio_message_pb2.py`).
pub fn logical_name(proto_file: &str) -> String {
    let stem = Path::new(proto_file)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(proto_file);
    stem.replace('-', "_")
}
