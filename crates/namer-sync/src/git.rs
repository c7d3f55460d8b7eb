//! [`RepoSync`] backed by the `git` executable.
//!
//! Commands are spawned directly (no shell), one argument per element,
//! with the repository root as working directory.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::RepoSync;

#[derive(Debug, Clone)]
pub struct GitSync {
    repo: PathBuf,
    push: bool,
}

impl GitSync {
    #[must_use]
    pub fn new(repo: &Path) -> Self {
        Self {
            repo: repo.to_path_buf(),
            push: true,
        }
    }

    /// First of `candidates` that holds a `.git` entry.
    #[must_use]
    pub fn discover(candidates: &[&Path]) -> Option<Self> {
        candidates
            .iter()
            .copied()
            .find(|dir| dir.join(".git").exists())
            .map(Self::new)
    }

    /// Commit without pushing when `push` is false.
    #[must_use]
    pub fn with_push(mut self, push: bool) -> Self {
        self.push = push;
        self
    }

    #[must_use]
    pub fn repo(&self) -> &Path {
        &self.repo
    }

    /// `path` as a pathspec relative to the repository root. The root
    /// itself becomes `.`; git rejects an empty pathspec.
    fn pathspec(&self, path: &Path) -> String {
        match path.strip_prefix(&self.repo) {
            Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
            Ok(rel) => rel.to_string_lossy().into_owned(),
            Err(_) => path.to_string_lossy().into_owned(),
        }
    }

    fn git(&self, args: &[&str]) -> bool {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo)
            .stdin(Stdio::null())
            .output();

        match output {
            Ok(out) if out.status.success() => {
                tracing::debug!(?args, "git ok");
                true
            }
            Ok(out) => {
                tracing::warn!(
                    ?args,
                    status = %out.status,
                    stderr = %String::from_utf8_lossy(&out.stderr).trim(),
                    "git failed"
                );
                false
            }
            Err(e) => {
                tracing::warn!(?args, error = %e, "could not run git");
                false
            }
        }
    }
}

impl RepoSync for GitSync {
    fn has_repo(&self) -> bool {
        self.repo.join(".git").exists()
    }

    fn has_upstream(&self) -> bool {
        self.git(&["rev-parse", "--abbrev-ref", "--symbolic-full-name", "@{u}"])
    }

    fn pull(&self) -> bool {
        self.git(&["pull", "--rebase"])
    }

    fn stage_commit_push(&self, paths: &[PathBuf], message: &str) -> bool {
        let paths: Vec<String> = paths.iter().map(|p| self.pathspec(p)).collect();

        let mut add = vec!["add", "-A", "--"];
        add.extend(paths.iter().map(String::as_str));
        if !self.git(&add) {
            return false;
        }
        if !self.git(&["commit", "-m", message]) {
            return false;
        }
        !self.push || self.git(&["push"])
    }
}
