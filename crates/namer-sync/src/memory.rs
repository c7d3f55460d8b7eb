//! In-process [`RepoSync`] that records calls instead of running anything.

use std::cell::RefCell;
use std::path::PathBuf;

use crate::RepoSync;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncCall {
    Pull,
    StageCommitPush { paths: Vec<PathBuf>, message: String },
}

/// Recording fake, useful for testing callers of [`RepoSync`].
#[derive(Debug, Default)]
pub struct MemorySync {
    repo: bool,
    upstream: bool,
    fail: bool,
    calls: RefCell<Vec<SyncCall>>,
}

impl MemorySync {
    #[must_use]
    pub fn new(repo: bool, upstream: bool) -> Self {
        Self {
            repo,
            upstream,
            ..Self::default()
        }
    }

    /// Make every pull and push report failure.
    #[must_use]
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    #[must_use]
    pub fn calls(&self) -> Vec<SyncCall> {
        self.calls.borrow().clone()
    }
}

impl RepoSync for MemorySync {
    fn has_repo(&self) -> bool {
        self.repo
    }

    fn has_upstream(&self) -> bool {
        self.upstream
    }

    fn pull(&self) -> bool {
        self.calls.borrow_mut().push(SyncCall::Pull);
        !self.fail
    }

    fn stage_commit_push(&self, paths: &[PathBuf], message: &str) -> bool {
        self.calls.borrow_mut().push(SyncCall::StageCommitPush {
            paths: paths.to_vec(),
            message: message.to_string(),
        });
        !self.fail
    }
}
