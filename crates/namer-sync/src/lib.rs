//! # namer-sync
//!
//! Post-commit synchronisation of the dataset repository.
//!
//! Everything here is best-effort: a failed pull or push is logged and
//! reported as `false`, never turned into an error, and never undoes a
//! committed add or remove.

pub mod git;
pub mod memory;

use std::path::PathBuf;

pub use git::GitSync;
pub use memory::{MemorySync, SyncCall};

/// Narrow view of a version-controlled dataset root.
pub trait RepoSync {
    /// Whether the root is under version control at all.
    fn has_repo(&self) -> bool;

    /// Whether the current branch tracks a remote branch.
    fn has_upstream(&self) -> bool;

    /// Rebase onto the upstream. Returns `false` on failure.
    fn pull(&self) -> bool;

    /// Stage `paths` (including deletions), commit with `message` and push.
    /// Returns `false` if any of the steps failed.
    fn stage_commit_push(&self, paths: &[PathBuf], message: &str) -> bool;
}

/// Pull before minting a new name, when there is something to pull from.
pub fn refresh(sync: &dyn RepoSync) -> bool {
    if !sync.has_repo() {
        tracing::debug!("no repository, skipping pull");
        return false;
    }
    if !sync.has_upstream() {
        tracing::info!("no upstream branch, skipping pull");
        return false;
    }
    let ok = sync.pull();
    if !ok {
        tracing::warn!("pull failed, continuing with local state");
    }
    ok
}

/// Record a committed change in the repository.
pub fn publish(sync: &dyn RepoSync, paths: &[PathBuf], message: &str) -> bool {
    if !sync.has_repo() {
        tracing::debug!("no repository, nothing to publish");
        return false;
    }
    let ok = sync.stage_commit_push(paths, message);
    if ok {
        tracing::info!(message, "published");
    } else {
        tracing::warn!(message, "publishing failed; files on disk are unaffected");
    }
    ok
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_pulls_only_with_upstream() {
        let no_repo = MemorySync::new(false, false);
        assert!(!refresh(&no_repo));
        assert!(no_repo.calls().is_empty());

        let no_upstream = MemorySync::new(true, false);
        assert!(!refresh(&no_upstream));
        assert!(no_upstream.calls().is_empty());

        let tracked = MemorySync::new(true, true);
        assert!(refresh(&tracked));
        assert_eq!(tracked.calls(), vec![SyncCall::Pull]);
    }

    #[test]
    fn publish_skips_without_repo() {
        let sync = MemorySync::new(false, false);
        assert!(!publish(&sync, &[PathBuf::from("a.tex")], "msg"));
        assert!(sync.calls().is_empty());
    }

    #[test]
    fn publish_reports_failure_without_panicking() {
        let sync = MemorySync::new(true, true).failing();
        assert!(!publish(&sync, &[PathBuf::from("a.tex")], "New file data: a.tex"));
        assert_eq!(
            sync.calls(),
            vec![SyncCall::StageCommitPush {
                paths: vec![PathBuf::from("a.tex")],
                message: "New file data: a.tex".to_string(),
            }]
        );
    }
}
