//! Template rendering
//!
//! Every derived artifact is produced from a named template. Templates use
//! `{{ name }}` placeholders; each [`TemplateId`] declares the parameters it
//! accepts and each [`Template`] variant carries a typed parameter struct, so
//! a placeholder outside the declared set is a packaging defect reported as
//! [`RenderError::UnknownParameter`].
//!
//! Templates are compiled into the binary. An override directory may replace
//! the whole set; it must then contain every template a build needs.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::core::package::{PackageRole, ServiceFamily};
use crate::error::RenderError;
use crate::infra::filesystem;

/// Closed set of templates known to the generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TemplateId {
    /// Client wrapper module (`client.py`)
    ClientWrapper,
    /// Transcription client method set
    TranscribeClientMethods,
    /// Cloning client method set
    CloneClientMethods,
    /// Server skeleton module (`server.py`)
    ServerSkeleton,
    /// Transcription server method stubs
    TranscribeServerMethods,
    /// Cloning server method stubs
    CloneServerMethods,
    /// Standalone server launcher (`grpc_server_launcher.py`)
    ServerLauncher,
    /// Example wiring skeleton to launcher (`server_example.py`)
    ServerExample,
    /// Messages package initializer (`__init__.py`)
    MessagesInit,
    /// Package manifest (`pyproject.toml`)
    PackageManifest,
    /// Package README
    PackageReadme,
    /// README usage section for messages packages
    MessagesUsage,
    /// README usage section for client packages
    ClientUsage,
    /// README usage section for server packages
    ServerUsage,
}

impl TemplateId {
    /// Every template, in export order
    pub const ALL: [Self; 14] = [
        Self::ClientWrapper,
        Self::TranscribeClientMethods,
        Self::CloneClientMethods,
        Self::ServerSkeleton,
        Self::TranscribeServerMethods,
        Self::CloneServerMethods,
        Self::ServerLauncher,
        Self::ServerExample,
        Self::MessagesInit,
        Self::PackageManifest,
        Self::PackageReadme,
        Self::MessagesUsage,
        Self::ClientUsage,
        Self::ServerUsage,
    ];

    /// File name of the template, both built-in and in an override directory
    pub fn file_name(self) -> &'static str {
        match self {
            Self::ClientWrapper => "grpc_client_wrapper.py.tmpl",
            Self::TranscribeClientMethods => "transcribe_client_methods.py.tmpl",
            Self::CloneClientMethods => "clone_client_methods.py.tmpl",
            Self::ServerSkeleton => "grpc_server_skeleton.py.tmpl",
            Self::TranscribeServerMethods => "transcribe_server_methods.py.tmpl",
            Self::CloneServerMethods => "clone_server_methods.py.tmpl",
            Self::ServerLauncher => "grpc_server_launcher.py.tmpl",
            Self::ServerExample => "server_with_launcher_example.py.tmpl",
            Self::MessagesInit => "messages_package_init.py.tmpl",
            Self::PackageManifest => "python_package_config.toml.tmpl",
            Self::PackageReadme => "package_readme.md.tmpl",
            Self::MessagesUsage => "messages_usage_example.md.tmpl",
            Self::ClientUsage => "client_usage_example.md.tmpl",
            Self::ServerUsage => "server_usage_example.md.tmpl",
        }
    }

    /// Parameter names the template may reference
    pub fn parameters(self) -> &'static [&'static str] {
        match self {
            Self::ClientWrapper => &[
                "description",
                "module_name",
                "package_name",
                "service_name",
                "service_methods",
                "proto_module",
            ],
            Self::TranscribeClientMethods
            | Self::CloneClientMethods
            | Self::TranscribeServerMethods
            | Self::CloneServerMethods => &["service_name"],
            Self::ServerSkeleton => &[
                "description",
                "module_name",
                "service_name",
                "service_methods",
                "proto_module",
            ],
            Self::ServerLauncher => &[],
            Self::ServerExample => &[
                "description",
                "module_name",
                "package_name",
                "service_name",
                "proto_module",
            ],
            Self::MessagesInit => &["description", "message_imports"],
            Self::PackageManifest => &[
                "module_name",
                "version",
                "description",
                "requires_python",
                "dependencies",
            ],
            Self::PackageReadme => &["package_name", "description", "usage_examples"],
            Self::MessagesUsage | Self::ClientUsage | Self::ServerUsage => &[
                "package_name",
                "module_name",
                "service_name",
                "message_module",
            ],
        }
    }

    /// Built-in template text
    pub fn builtin(self) -> &'static str {
        match self {
            Self::ClientWrapper => include_str!("../templates/grpc_client_wrapper.py.tmpl"),
            Self::TranscribeClientMethods => {
                include_str!("../templates/transcribe_client_methods.py.tmpl")
            }
            Self::CloneClientMethods => include_str!("../templates/clone_client_methods.py.tmpl"),
            Self::ServerSkeleton => include_str!("../templates/grpc_server_skeleton.py.tmpl"),
            Self::TranscribeServerMethods => {
                include_str!("../templates/transcribe_server_methods.py.tmpl")
            }
            Self::CloneServerMethods => include_str!("../templates/clone_server_methods.py.tmpl"),
            Self::ServerLauncher => include_str!("../templates/grpc_server_launcher.py.tmpl"),
            Self::ServerExample => {
                include_str!("../templates/server_with_launcher_example.py.tmpl")
            }
            Self::MessagesInit => include_str!("../templates/messages_package_init.py.tmpl"),
            Self::PackageManifest => include_str!("../templates/python_package_config.toml.tmpl"),
            Self::PackageReadme => include_str!("../templates/package_readme.md.tmpl"),
            Self::MessagesUsage => include_str!("../templates/messages_usage_example.md.tmpl"),
            Self::ClientUsage => include_str!("../templates/client_usage_example.md.tmpl"),
            Self::ServerUsage => include_str!("../templates/server_usage_example.md.tmpl"),
        }
    }

    /// Client method-set template for a service family
    pub fn client_methods(family: ServiceFamily) -> Self {
        match family {
            ServiceFamily::Transcription => Self::TranscribeClientMethods,
            ServiceFamily::Cloning => Self::CloneClientMethods,
        }
    }

    /// Server method-set template for a service family
    pub fn server_methods(family: ServiceFamily) -> Self {
        match family {
            ServiceFamily::Transcription => Self::TranscribeServerMethods,
            ServiceFamily::Cloning => Self::CloneServerMethods,
        }
    }

    /// README usage template for a package role
    pub fn usage(role: PackageRole) -> Self {
        match role {
            PackageRole::Messages => Self::MessagesUsage,
            PackageRole::Client => Self::ClientUsage,
            PackageRole::Server => Self::ServerUsage,
        }
    }

    /// Templates needed to build a package of the given role and family
    pub fn required_for(role: PackageRole, family: Option<ServiceFamily>) -> Vec<Self> {
        let mut ids = match (role, family) {
            (PackageRole::Messages, _) => vec![Self::MessagesInit],
            (PackageRole::Client, Some(family)) => {
                vec![Self::ClientWrapper, Self::client_methods(family)]
            }
            (PackageRole::Server, Some(family)) => vec![
                Self::ServerSkeleton,
                Self::server_methods(family),
                Self::ServerLauncher,
                Self::ServerExample,
            ],
            (_, None) => Vec::new(),
        };
        ids.extend([Self::PackageManifest, Self::PackageReadme, Self::usage(role)]);
        ids
    }
}

impl std::fmt::Display for TemplateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.file_name())
    }
}

/// A parameter value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// Inserted verbatim
    Str(String),
    /// One quoted string per line, indented four spaces, each followed by a comma
    List(Vec<String>),
}

impl ParamValue {
    fn render(&self) -> String {
        match self {
            Self::Str(s) => s.clone(),
            Self::List(items) => items
                .iter()
                .map(|item| format!("    {},", quote(item)))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

/// Quote a string so it is valid in both TOML and Python source
pub fn quote(value: &str) -> String {
    toml::Value::String(value.to_string()).to_string()
}

/// Indent every non-blank line by `width` spaces
pub fn indent(text: &str, width: usize) -> String {
    let pad = " ".repeat(width);
    text.split('\n')
        .map(|line| {
            if line.trim().is_empty() {
                line.to_string()
            } else {
                format!("{pad}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parameters for the client wrapper
#[derive(Debug, Clone)]
pub struct ClientWrapperParams {
    pub description: String,
    pub module_name: String,
    pub package_name: String,
    pub service_name: String,
    /// Rendered method set, already indented
    pub service_methods: String,
    pub proto_module: String,
}

/// Parameters for the server skeleton
#[derive(Debug, Clone)]
pub struct ServerSkeletonParams {
    pub description: String,
    pub module_name: String,
    pub service_name: String,
    /// Rendered method stubs, already indented
    pub service_methods: String,
    pub proto_module: String,
}

/// Parameters for a method-set template
#[derive(Debug, Clone)]
pub struct MethodsParams {
    pub service_name: String,
}

/// Parameters for the server example
#[derive(Debug, Clone)]
pub struct ServerExampleParams {
    pub description: String,
    pub module_name: String,
    pub package_name: String,
    pub service_name: String,
    pub proto_module: String,
}

/// Parameters for the messages package initializer
#[derive(Debug, Clone)]
pub struct MessagesInitParams {
    pub description: String,
    /// One import line per generated message module
    pub message_imports: String,
}

/// Parameters for `pyproject.toml`
#[derive(Debug, Clone)]
pub struct ManifestParams {
    pub module_name: String,
    pub version: String,
    /// Inserted as a quoted TOML string
    pub description: String,
    pub requires_python: String,
    pub dependencies: Vec<String>,
}

/// Parameters for the README
#[derive(Debug, Clone)]
pub struct ReadmeParams {
    pub package_name: String,
    pub description: String,
    /// Rendered usage section
    pub usage_examples: String,
}

/// Parameters shared by the README usage sections
#[derive(Debug, Clone, Default)]
pub struct UsageParams {
    pub package_name: String,
    pub module_name: String,
    pub service_name: String,
    /// Primary generated message module (messages packages)
    pub message_module: String,
}

/// A template together with its parameters
#[derive(Debug, Clone)]
pub enum Template {
    ClientWrapper(ClientWrapperParams),
    ClientMethods(ServiceFamily, MethodsParams),
    ServerSkeleton(ServerSkeletonParams),
    ServerMethods(ServiceFamily, MethodsParams),
    ServerLauncher,
    ServerExample(ServerExampleParams),
    MessagesInit(MessagesInitParams),
    Manifest(ManifestParams),
    Readme(ReadmeParams),
    Usage(PackageRole, UsageParams),
}

impl Template {
    /// Template identifier
    pub fn id(&self) -> TemplateId {
        match self {
            Self::ClientWrapper(_) => TemplateId::ClientWrapper,
            Self::ClientMethods(family, _) => TemplateId::client_methods(*family),
            Self::ServerSkeleton(_) => TemplateId::ServerSkeleton,
            Self::ServerMethods(family, _) => TemplateId::server_methods(*family),
            Self::ServerLauncher => TemplateId::ServerLauncher,
            Self::ServerExample(_) => TemplateId::ServerExample,
            Self::MessagesInit(_) => TemplateId::MessagesInit,
            Self::Manifest(_) => TemplateId::PackageManifest,
            Self::Readme(_) => TemplateId::PackageReadme,
            Self::Usage(role, _) => TemplateId::usage(*role),
        }
    }

    /// Parameter values by name
    pub fn params(&self) -> Vec<(&'static str, ParamValue)> {
        match self {
            Self::ClientWrapper(p) => vec![
                ("description", p.description.as_str().into()),
                ("module_name", p.module_name.as_str().into()),
                ("package_name", p.package_name.as_str().into()),
                ("service_name", p.service_name.as_str().into()),
                ("service_methods", p.service_methods.as_str().into()),
                ("proto_module", p.proto_module.as_str().into()),
            ],
            Self::ClientMethods(_, p) | Self::ServerMethods(_, p) => {
                vec![("service_name", p.service_name.as_str().into())]
            }
            Self::ServerSkeleton(p) => vec![
                ("description", p.description.as_str().into()),
                ("module_name", p.module_name.as_str().into()),
                ("service_name", p.service_name.as_str().into()),
                ("service_methods", p.service_methods.as_str().into()),
                ("proto_module", p.proto_module.as_str().into()),
            ],
            Self::ServerLauncher => Vec::new(),
            Self::ServerExample(p) => vec![
                ("description", p.description.as_str().into()),
                ("module_name", p.module_name.as_str().into()),
                ("package_name", p.package_name.as_str().into()),
                ("service_name", p.service_name.as_str().into()),
                ("proto_module", p.proto_module.as_str().into()),
            ],
            Self::MessagesInit(p) => vec![
                ("description", p.description.as_str().into()),
                ("message_imports", p.message_imports.as_str().into()),
            ],
            Self::Manifest(p) => vec![
                ("module_name", p.module_name.as_str().into()),
                ("version", p.version.as_str().into()),
                ("description", quote(&p.description).into()),
                ("requires_python", p.requires_python.as_str().into()),
                ("dependencies", ParamValue::List(p.dependencies.clone())),
            ],
            Self::Readme(p) => vec![
                ("package_name", p.package_name.as_str().into()),
                ("description", p.description.as_str().into()),
                ("usage_examples", p.usage_examples.as_str().into()),
            ],
            Self::Usage(_, p) => vec![
                ("package_name", p.package_name.as_str().into()),
                ("module_name", p.module_name.as_str().into()),
                ("service_name", p.service_name.as_str().into()),
                ("message_module", p.message_module.as_str().into()),
            ],
        }
    }
}

/// Renders templates to text
pub trait TemplateRenderer {
    /// Render a template with its parameters
    fn render(&self, template: &Template) -> Result<String, RenderError>;

    /// Check that every listed template exists and references only
    /// parameters it declares
    fn verify(&self, ids: &[TemplateId]) -> Result<(), RenderError>;
}

/// Template engine backed by the built-in set or an override directory
#[derive(Debug, Clone, Default)]
pub struct TemplateEngine {
    override_dir: Option<PathBuf>,
}

impl TemplateEngine {
    /// Engine using only the built-in templates
    pub fn builtin() -> Self {
        Self::default()
    }

    /// Engine reading templates from `dir` instead of the built-in set
    pub fn with_override_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            override_dir: Some(dir.into()),
        }
    }

    /// Engine for an optional override directory
    pub fn new(override_dir: Option<PathBuf>) -> Self {
        Self { override_dir }
    }

    /// Override directory, if any
    pub fn override_dir(&self) -> Option<&Path> {
        self.override_dir.as_deref()
    }

    /// Template text for an id
    pub fn source(&self, id: TemplateId) -> Result<String, RenderError> {
        let Some(dir) = &self.override_dir else {
            return Ok(id.builtin().to_string());
        };

        let path = dir.join(id.file_name());
        if !path.is_file() {
            return Err(RenderError::TemplateNotFound {
                template: id.file_name().to_string(),
                path,
            });
        }
        std::fs::read_to_string(&path).map_err(|e| RenderError::ReadError {
            template: id.file_name().to_string(),
            error: e.to_string(),
        })
    }
}

impl TemplateRenderer for TemplateEngine {
    fn render(&self, template: &Template) -> Result<String, RenderError> {
        let id = template.id();
        let source = self.source(id)?;
        tracing::debug!("Rendering template {id}");
        substitute(id, &source, &template.params())
    }

    fn verify(&self, ids: &[TemplateId]) -> Result<(), RenderError> {
        for &id in ids {
            let source = self.source(id)?;
            placeholders(id, &source)?;
        }
        Ok(())
    }
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("placeholder pattern is valid")
    })
}

/// Names referenced by a template, checked against its declared parameters
fn placeholders(id: TemplateId, source: &str) -> Result<Vec<String>, RenderError> {
    let mut names = Vec::new();
    for caps in placeholder_pattern().captures_iter(source) {
        let name = &caps[1];
        if !id.parameters().contains(&name) {
            return Err(RenderError::UnknownParameter {
                template: id.file_name().to_string(),
                parameter: name.to_string(),
            });
        }
        names.push(name.to_string());
    }
    Ok(names)
}

fn substitute(
    id: TemplateId,
    source: &str,
    params: &[(&'static str, ParamValue)],
) -> Result<String, RenderError> {
    placeholders(id, source)?;

    let rendered = placeholder_pattern().replace_all(source, |caps: &regex::Captures<'_>| {
        params
            .iter()
            .find(|(name, _)| *name == &caps[1])
            .map(|(_, value)| value.render())
            .unwrap_or_default()
    });
    Ok(rendered.into_owned())
}

/// Write the built-in templates to `dir`
///
/// Existing files are left alone unless `force` is set. Returns the paths
/// written.
pub fn export_builtin(dir: &Path, force: bool) -> Result<Vec<PathBuf>, RenderError> {
    filesystem::create_dir_all(dir)?;

    let mut written = Vec::new();
    for id in TemplateId::ALL {
        let path = dir.join(id.file_name());
        if path.exists() && !force {
            tracing::debug!("Keeping existing template {}", path.display());
            continue;
        }
        filesystem::write_file(&path, id.builtin())?;
        written.push(path);
    }
    Ok(written)
}
