//! Project configuration (protopack.toml)
//!
//! The config file names the proto directory, the output root, an optional
//! template override directory, the compiler command line and the package
//! table. Every setting has a default, so running without a config file
//! builds the built-in five-package table.
//!
//! String values support `${VAR}` environment substitution.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::config::defaults::{
    default_packages, DEFAULT_COMPILER, DEFAULT_OUTPUT_DIR, DEFAULT_PROTO_DIR, PACKAGES_SUBDIR,
};
use crate::core::package::PackageSpec;
use crate::core::resolver::DependencyGraph;
use crate::error::{ConfigError, ProtopackError};
use crate::infra::filesystem;

/// Contents of protopack.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectConfig {
    /// Build settings
    #[serde(default)]
    pub build: BuildSection,

    /// Package table, in declaration order
    #[serde(default = "default_packages")]
    pub packages: Vec<PackageSpec>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            build: BuildSection::default(),
            packages: default_packages(),
        }
    }
}

/// `[build]` section
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BuildSection {
    /// Directory containing the proto files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proto_dir: Option<PathBuf>,

    /// Output root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,

    /// Template override directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub templates_dir: Option<PathBuf>,

    /// Compiler command line (program followed by fixed arguments)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compiler: Option<Vec<String>>,
}

/// Settings supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Proto directory override
    pub proto_dir: Option<PathBuf>,
    /// Output root override
    pub output_dir: Option<PathBuf>,
    /// Template directory override
    pub templates_dir: Option<PathBuf>,
}

/// Fully resolved settings for one run
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory containing the proto files
    pub proto_dir: PathBuf,
    /// Absolute output root
    pub output_dir: PathBuf,
    /// Template override directory, if any
    pub templates_dir: Option<PathBuf>,
    /// Compiler command line
    pub compiler: Vec<String>,
    /// Package table
    pub packages: Vec<PackageSpec>,
}

/// Substitute environment variables in a string using ${VAR} syntax.
///
/// Unset variables expand to an empty string.
///
/// # Examples
/// ```
/// use protopack::core::config::substitute_env_vars;
///
/// std::env::set_var("PROTOPACK_DOC_VAR", "hello");
/// let result = substitute_env_vars("prefix_${PROTOPACK_DOC_VAR}_suffix");
/// assert_eq!(result, "prefix_hello_suffix");
/// std::env::remove_var("PROTOPACK_DOC_VAR");
/// ```
pub fn substitute_env_vars(input: &str) -> String {
    let re = env_var_pattern();
    re.replace_all(input, |caps: &regex::Captures<'_>| {
        std::env::var(&caps[1]).unwrap_or_default()
    })
    .into_owned()
}

fn env_var_pattern() -> Regex {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("env var pattern is valid")
}

/// Recursively substitute environment variables in a TOML value
fn substitute_in_value(value: &mut toml::Value) {
    match value {
        toml::Value::String(s) => {
            *s = substitute_env_vars(s);
        }
        toml::Value::Array(arr) => {
            for item in arr.iter_mut() {
                substitute_in_value(item);
            }
        }
        toml::Value::Table(table) => {
            for (_, v) in table.iter_mut() {
                substitute_in_value(v);
            }
        }
        _ => {}
    }
}

impl ProjectConfig {
    /// Load configuration from a TOML file, substituting `${VAR}` patterns
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::from_toml(&content).map_err(|error| ConfigError::ParseError {
            path: path.to_path_buf(),
            error,
        })
    }

    /// Parse configuration from TOML text, substituting `${VAR}` patterns
    pub fn from_toml(content: &str) -> Result<Self, String> {
        let mut value: toml::Value = toml::from_str(content).map_err(|e| e.to_string())?;
        substitute_in_value(&mut value);
        value.try_into().map_err(|e: toml::de::Error| e.to_string())
    }

    /// Serialize configuration to TOML text
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Load the config file if present, otherwise use defaults
    ///
    /// Relative paths in the file are later resolved against the directory
    /// containing it, which is returned alongside the config.
    pub fn discover(explicit: Option<&Path>, cwd: &Path) -> Result<(Self, PathBuf), ConfigError> {
        let path = match explicit {
            Some(path) => {
                let path = if path.is_absolute() {
                    path.to_path_buf()
                } else {
                    cwd.join(path)
                };
                if !path.exists() {
                    return Err(ConfigError::ReadError {
                        path,
                        error: "file does not exist".to_string(),
                    });
                }
                path
            }
            None => cwd.join(crate::config::defaults::CONFIG_FILE_NAME),
        };

        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok((Self::default(), cwd.to_path_buf()));
        }

        tracing::info!("Loading config from {}", path.display());
        let config = Self::load(&path)?;
        let base_dir = path.parent().map_or_else(|| cwd.to_path_buf(), Path::to_path_buf);
        Ok((config, base_dir))
    }

    /// Resolve into run settings, applying overrides
    ///
    /// `base_dir` anchors relative paths from the config file; override
    /// paths are anchored at `cwd`.
    pub fn resolve(
        self,
        base_dir: &Path,
        cwd: &Path,
        overrides: &Overrides,
    ) -> Result<Settings, ConfigError> {
        let pick = |over: &Option<PathBuf>, file: Option<PathBuf>, default: Option<&str>| {
            over.as_ref()
                .map(|p| anchor(cwd, p))
                .or_else(|| file.map(|p| anchor(base_dir, &p)))
                .or_else(|| default.map(|d| base_dir.join(d)))
        };

        let proto_dir = pick(
            &overrides.proto_dir,
            self.build.proto_dir,
            Some(DEFAULT_PROTO_DIR),
        )
        .unwrap_or_else(|| base_dir.join(DEFAULT_PROTO_DIR));

        let output_dir = pick(
            &overrides.output_dir,
            self.build.output_dir,
            Some(DEFAULT_OUTPUT_DIR),
        )
        .unwrap_or_else(|| base_dir.join(DEFAULT_OUTPUT_DIR));
        let output_dir =
            filesystem::absolutize(&output_dir).map_err(|e| ConfigError::ReadError {
                path: output_dir.clone(),
                error: e.to_string(),
            })?;

        let templates_dir = pick(&overrides.templates_dir, self.build.templates_dir, None);

        let compiler = self
            .build
            .compiler
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_COMPILER.iter().map(|s| (*s).to_string()).collect());

        Ok(Settings {
            proto_dir,
            output_dir,
            templates_dir,
            compiler,
            packages: self.packages,
        })
    }
}

fn anchor(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

impl Settings {
    /// Directory holding one subdirectory per package
    pub fn packages_dir(&self) -> PathBuf {
        self.output_dir.join(PACKAGES_SUBDIR)
    }

    /// Validate the package table, stopping at the first problem
    ///
    /// Checks per-spec fields, unique names and the dependency graph.
    /// Proto file existence is not checked here; a missing file fails only
    /// the package that needs it.
    pub fn validate(&self) -> Result<(), ProtopackError> {
        match self.check().into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Collect every configuration problem in the package table
    pub fn check(&self) -> Vec<ProtopackError> {
        let mut errors: Vec<ProtopackError> = Vec::new();

        if self.packages.is_empty() {
            errors.push(ConfigError::NoPackages.into());
            return errors;
        }

        let mut seen = HashSet::new();
        for spec in &self.packages {
            if let Err(e) = spec.validate() {
                errors.push(e.into());
            }
            if !seen.insert(spec.name.as_str()) {
                errors.push(
                    ConfigError::DuplicatePackage {
                        name: spec.name.clone(),
                    }
                    .into(),
                );
            }
        }

        if let Err(e) = DependencyGraph::from_specs(&self.packages).topological_sort() {
            errors.push(e.into());
        }

        errors
    }

    /// Proto files referenced by the table that do not exist
    pub fn missing_proto_files(&self) -> Vec<ConfigError> {
        self.packages
            .iter()
            .flat_map(|spec| {
                spec.proto_files.iter().filter_map(move |file| {
                    let path = self.proto_dir.join(file);
                    (!path.is_file()).then(|| ConfigError::MissingProtoFile {
                        package: spec.name.clone(),
                        path,
                    })
                })
            })
            .collect()
    }
}
