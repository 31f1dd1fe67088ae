//! Git operations
//!
//! Prepares local repositories for generated packages by running the `git`
//! executable. Nothing is ever pushed.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::GitError;
use crate::infra::filesystem;

/// Message of the first commit in a generated package
pub const INITIAL_COMMIT_MESSAGE: &str = "Initial commit - generated from proto files";

/// `.gitignore` written into every generated package
pub const PYTHON_GITIGNORE: &str = "\
# Python
__pycache__/
*.py[cod]
*$py.class
*.so
.Python
build/
develop-eggs/
dist/
downloads/
eggs/
.eggs/
lib/
lib64/
parts/
sdist/
var/
wheels/
*.egg-info/
.installed.cfg
*.egg

# uv
.venv/
uv.lock

# Virtual environments
venv/
env/
ENV/

# IDE
.vscode/
.idea/
*.swp
*.swo

# OS
.DS_Store
Thumbs.db
";

/// Check that git is installed
pub fn ensure_git() -> Result<PathBuf, GitError> {
    which::which("git").map_err(|_| GitError::NotInstalled)
}

/// A working tree driven through the git CLI
#[derive(Debug, Clone)]
pub struct GitRepository {
    path: PathBuf,
    identity: Option<(String, String)>,
}

impl GitRepository {
    /// Open (or prepare to create) a repository at `path`
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            identity: None,
        }
    }

    /// Commit as the given author instead of the configured identity
    #[must_use]
    pub fn with_identity(mut self, name: &str, email: &str) -> Self {
        self.identity = Some((name.to_string(), email.to_string()));
        self
    }

    /// Working tree path
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn run(&self, args: &[&str]) -> Result<String, GitError> {
        let mut command = Command::new("git");
        if let Some((name, email)) = &self.identity {
            command
                .arg("-c")
                .arg(format!("user.name={name}"))
                .arg("-c")
                .arg(format!("user.email={email}"));
        }
        tracing::debug!("Running: git {} in {}", args.join(" "), self.path.display());

        let output = command
            .args(args)
            .current_dir(&self.path)
            .output()
            .map_err(|e| self.failed(args, e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(self.failed(args, stderr));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn failed(&self, args: &[&str], error: String) -> GitError {
        GitError::CommandFailed {
            command: args.join(" "),
            path: self.path.clone(),
            error,
        }
    }

    /// `git init`
    pub fn init(&self) -> Result<(), GitError> {
        self.run(&["init"]).map(drop)
    }

    /// `git add .`
    pub fn add_all(&self) -> Result<(), GitError> {
        self.run(&["add", "."]).map(drop)
    }

    /// Whether the index differs from HEAD (or there is no HEAD yet)
    pub fn has_staged_changes(&self) -> Result<bool, GitError> {
        if self.run(&["rev-parse", "--verify", "HEAD"]).is_err() {
            return Ok(true);
        }
        let status = self.run(&["status", "--porcelain"])?;
        Ok(!status.is_empty())
    }

    /// `git commit -m <message>`
    pub fn commit(&self, message: &str) -> Result<(), GitError> {
        self.run(&["commit", "-m", message]).map(drop)
    }

    /// URL of a remote, if it exists
    pub fn remote_url(&self, name: &str) -> Option<String> {
        self.run(&["remote", "get-url", name]).ok()
    }

    /// Point a remote at `url`, adding it if missing
    pub fn set_remote(&self, name: &str, url: &str) -> Result<(), GitError> {
        match self.remote_url(name) {
            Some(existing) if existing == url => Ok(()),
            Some(_) => self.run(&["remote", "set-url", name, url]).map(drop),
            None => self.run(&["remote", "add", name, url]).map(drop),
        }
    }
}

/// Turn a package directory into a repository with an `origin` remote
///
/// Writes `.gitignore`, initializes, stages everything, commits when there
/// is something to commit and sets `origin`. Safe to run again.
pub fn bootstrap_package(repo: &GitRepository, remote_url: &str) -> Result<(), GitError> {
    if !repo.path().is_dir() {
        return Err(GitError::MissingPackage {
            path: repo.path().to_path_buf(),
        });
    }

    filesystem::write_file(&repo.path().join(".gitignore"), PYTHON_GITIGNORE)?;
    repo.init()?;
    repo.add_all()?;
    if repo.has_staged_changes()? {
        repo.commit(INITIAL_COMMIT_MESSAGE)?;
    } else {
        tracing::info!("Nothing to commit in {}", repo.path().display());
    }
    repo.set_remote("origin", remote_url)?;
    Ok(())
}
