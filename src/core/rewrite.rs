//! Cross-package reference rewriting
//!
//! A dependent package is compiled together with the definitions it imports,
//! so its module directory briefly holds copies of modules owned by the base
//! package. The rewriter deletes those copies and qualifies the imports that
//! pointed at them, so `import audio_message_pb2 as audio__message__pb2`
//! becomes `import audiomessages.audio_message_pb2 as audio__message__pb2`.
//!
//! Only compiler output (`*_pb2.py`, `*_pb2_grpc.py`) is touched.

use regex::Regex;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::defaults::GENERATED_SUFFIXES;
use crate::core::package::PackageSpec;
use crate::error::RewriteError;
use crate::infra::filesystem;

/// Whether a file name belongs to compiler output
pub fn is_generated(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| GENERATED_SUFFIXES.iter().any(|s| name.ends_with(s)))
}

/// Alias the compiler gives an imported module (`_` doubled)
pub fn module_alias(module: &str) -> String {
    module.replace('_', "__")
}

/// Compiler output under a module directory, sorted by path
pub fn generated_files(module_dir: &Path) -> Result<Vec<PathBuf>, RewriteError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(module_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| RewriteError::Scan {
            path: module_dir.to_path_buf(),
            error: e.to_string(),
        })?;
        if entry.file_type().is_file() && is_generated(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// What a rewrite pass changed
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RewriteSummary {
    /// Base-owned files deleted from the dependent package
    pub removed: Vec<PathBuf>,
    /// Files whose imports were qualified
    pub rewritten: Vec<PathBuf>,
}

/// Qualifies references to one base package
#[derive(Debug)]
pub struct ReferenceRewriter {
    base_module: String,
    rules: Vec<SymbolRule>,
}

#[derive(Debug)]
struct SymbolRule {
    symbol: String,
    import_line: Regex,
    unqualified: Regex,
    replacement: String,
}

impl SymbolRule {
    fn new(base_module: &str, symbol: &str) -> Result<Self, regex::Error> {
        let module = format!("{symbol}_pb2");
        let alias = module_alias(&module);
        let import_line = Regex::new(&format!(
            r"(?m)^import {} as {}$",
            regex::escape(&module),
            regex::escape(&alias)
        ))?;
        let unqualified = Regex::new(&format!(r"(?m)(^|[^\w.]){}", regex::escape(&module)))?;

        Ok(Self {
            symbol: symbol.to_string(),
            import_line,
            unqualified,
            replacement: format!("import {base_module}.{module} as {alias}"),
        })
    }
}

impl ReferenceRewriter {
    /// Create a rewriter for a base module and the symbols it owns
    ///
    /// Symbols are logical module names such as `audio_message`.
    pub fn new(base_module: &str, symbols: &[String]) -> Result<Self, RewriteError> {
        let rules = symbols
            .iter()
            .map(|symbol| {
                SymbolRule::new(base_module, symbol).map_err(|e| RewriteError::Pattern {
                    symbol: symbol.clone(),
                    error: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            base_module: base_module.to_string(),
            rules,
        })
    }

    /// Rewriter for a dependency, derived from its configuration
    pub fn for_dependency(dependency: &PackageSpec) -> Result<Self, RewriteError> {
        Self::new(&dependency.module_name(), &dependency.proto_modules())
    }

    /// Module name of the base package
    pub fn base_module(&self) -> &str {
        &self.base_module
    }

    /// Symbols owned by the base package
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.symbol.as_str())
    }

    /// File names the base package owns
    pub fn owned_files(&self) -> Vec<String> {
        self.symbols()
            .flat_map(|symbol| {
                GENERATED_SUFFIXES
                    .iter()
                    .map(move |suffix| format!("{symbol}{suffix}"))
            })
            .collect()
    }

    /// Qualify base imports in one file's text
    ///
    /// Returns the new text and the number of lines replaced. Text that is
    /// already qualified is returned unchanged.
    pub fn rewrite_text(&self, content: &str) -> (String, usize) {
        let mut text = content.to_string();
        let mut count = 0;
        for rule in &self.rules {
            let matches = rule.import_line.find_iter(&text).count();
            if matches > 0 {
                text = rule
                    .import_line
                    .replace_all(&text, regex::NoExpand(&rule.replacement))
                    .into_owned();
                count += matches;
            }
        }
        (text, count)
    }

    /// First unqualified reference to a base symbol, as (symbol, 1-based line)
    pub fn find_unqualified(&self, content: &str) -> Option<(String, usize)> {
        content.lines().enumerate().find_map(|(index, line)| {
            self.rules
                .iter()
                .find(|rule| rule.unqualified.is_match(line))
                .map(|rule| (rule.symbol.clone(), index + 1))
        })
    }

    /// Delete base-owned compiler output from a module directory
    pub fn prune(&self, module_dir: &Path) -> Result<Vec<PathBuf>, RewriteError> {
        let mut removed = Vec::new();
        for file in self.owned_files() {
            let path = module_dir.join(&file);
            if filesystem::remove_file_if_exists(&path)? {
                tracing::debug!(
                    "Pruned {} (owned by {})",
                    path.display(),
                    self.base_module
                );
                removed.push(path);
            }
        }
        Ok(removed)
    }

    /// Prune, qualify and verify a dependent package's module directory
    pub fn apply(&self, module_dir: &Path) -> Result<RewriteSummary, RewriteError> {
        let removed = self.prune(module_dir)?;

        let mut rewritten = Vec::new();
        for path in generated_files(module_dir)? {
            let content = filesystem::read_file(&path)?;
            let (updated, count) = self.rewrite_text(&content);
            if count > 0 {
                filesystem::write_file(&path, &updated)?;
                tracing::debug!(
                    "Qualified {count} import(s) of {} in {}",
                    self.base_module,
                    path.display()
                );
                rewritten.push(path.clone());
            }

            if let Some((symbol, line)) = self.find_unqualified(&updated) {
                return Err(RewriteError::UnqualifiedReference {
                    path,
                    symbol,
                    line,
                });
            }
        }

        Ok(RewriteSummary { removed, rewritten })
    }
}
