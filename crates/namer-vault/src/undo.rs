//! In-memory undo log of compensating filesystem actions.

use std::io;
use std::path::PathBuf;

use namer_core::{CounterStore, Counters, RollbackReport};

/// How to compensate for one step that has already happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoAction {
    /// A file this operation created; delete it.
    DeleteFile(PathBuf),
    /// A file renamed to `from`; move it back to `to`.
    RenameBack { from: PathBuf, to: PathBuf },
    /// A file this operation deleted; its content is gone.
    Irreversible(PathBuf),
    /// The counter file about to be rewritten. `Some` restores the old
    /// values; `None` means there was no file before, so it is deleted.
    RestoreCounter {
        path: PathBuf,
        snapshot: Option<Counters>,
    },
}

/// Ordered compensations, replayed newest first.
#[derive(Debug, Default)]
pub struct UndoLog {
    actions: Vec<UndoAction>,
}

impl UndoLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: UndoAction) {
        tracing::debug!(?action, "undo logged");
        self.actions.push(action);
    }

    /// Replace the newest action, e.g. once a temporary file has been
    /// renamed to its final name.
    pub fn amend_last(&mut self, action: UndoAction) {
        match self.actions.last_mut() {
            Some(last) => *last = action,
            None => self.actions.push(action),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    #[must_use]
    pub fn actions(&self) -> &[UndoAction] {
        &self.actions
    }

    /// Forget every action. Called at commit.
    pub fn clear(&mut self) {
        self.actions.clear();
    }

    /// Run every compensation newest first and empty the log.
    ///
    /// A second call finds the log empty and does nothing.
    pub fn replay(&mut self) -> RollbackReport {
        let mut report = RollbackReport::default();

        while let Some(action) = self.actions.pop() {
            match action {
                UndoAction::DeleteFile(path) => match std::fs::remove_file(&path) {
                    Ok(()) => report.removed.push(path),
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => report
                        .failed
                        .push(format!("delete {}: {e}", path.display())),
                },
                UndoAction::RenameBack { from, to } => {
                    if !from.exists() {
                        report
                            .failed
                            .push(format!("{} is missing, cannot move it back", from.display()));
                        continue;
                    }
                    match std::fs::rename(&from, &to) {
                        Ok(()) => report.restored.push((from, to)),
                        Err(e) => report.failed.push(format!(
                            "rename {} -> {}: {e}",
                            from.display(),
                            to.display()
                        )),
                    }
                }
                UndoAction::Irreversible(path) => report.lost.push(path),
                UndoAction::RestoreCounter { path, snapshot } => {
                    let restored = match snapshot {
                        Some(counters) => CounterStore::save(&path, &counters),
                        None => match std::fs::remove_file(&path) {
                            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                            other => other,
                        },
                    };
                    match restored {
                        Ok(()) => report.counter_restored = true,
                        Err(e) => report
                            .failed
                            .push(format!("restore counter {}: {e}", path.display())),
                    }
                }
            }
        }

        if report.is_complete() {
            tracing::warn!(
                removed = report.removed.len(),
                restored = report.restored.len(),
                "rolled back"
            );
        } else {
            tracing::error!(
                lost = report.lost.len(),
                failed = report.failed.len(),
                "rollback could not restore everything"
            );
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn replay_runs_newest_first() {
        let tmp = tempfile::tempdir().unwrap();
        let a = tmp.path().join("a");
        let b = tmp.path().join("b");
        let c = tmp.path().join("c");
        fs::write(&c, "c").unwrap();

        // a -> b, then b -> c; undoing must go c -> b -> a.
        let mut log = UndoLog::new();
        log.push(UndoAction::RenameBack {
            from: b.clone(),
            to: a.clone(),
        });
        log.push(UndoAction::RenameBack {
            from: c.clone(),
            to: b.clone(),
        });

        let report = log.replay();
        assert!(a.exists());
        assert!(!b.exists() && !c.exists());
        assert_eq!(report.restored, vec![(c, b.clone()), (b, a)]);
        assert!(report.is_complete());
        assert!(log.is_empty());
    }

    #[test]
    fn replay_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let created = tmp.path().join("new.tex");
        fs::write(&created, "x").unwrap();

        let mut log = UndoLog::new();
        log.push(UndoAction::DeleteFile(created.clone()));

        assert_eq!(log.replay().removed, vec![created.clone()]);
        assert!(!created.exists());
        assert!(log.replay().is_empty());
    }

    #[test]
    fn replay_reports_lost_content_and_restores_counter() {
        let tmp = tempfile::tempdir().unwrap();
        let counter = tmp.path().join(".cache");
        fs::write(&counter, "WS=9\nNS=9\n").unwrap();

        let mut log = UndoLog::new();
        log.push(UndoAction::Irreversible(tmp.path().join("gone.tex")));
        log.push(UndoAction::RestoreCounter {
            path: counter.clone(),
            snapshot: Some(Counters { ws: 1, ns: 0 }),
        });

        let report = log.replay();
        assert!(report.counter_restored);
        assert_eq!(report.lost, vec![tmp.path().join("gone.tex")]);
        assert!(!report.is_complete());
        assert_eq!(fs::read_to_string(&counter).unwrap(), "WS=1\nNS=0\n");
    }

    #[test]
    fn amend_last_retargets_newest_action() {
        let mut log = UndoLog::new();
        log.push(UndoAction::DeleteFile(PathBuf::from("tmp")));
        log.amend_last(UndoAction::DeleteFile(PathBuf::from("final")));
        assert_eq!(log.actions(), &[UndoAction::DeleteFile(PathBuf::from("final"))]);
        log.clear();
        assert_eq!(log.len(), 0);
    }

    #[test]
    fn missing_files_are_not_failures_for_delete() {
        let tmp = tempfile::tempdir().unwrap();
        let mut log = UndoLog::new();
        log.push(UndoAction::DeleteFile(tmp.path().join("never-written")));
        let report = log.replay();
        assert!(report.is_empty());
    }

    #[test]
    fn counter_created_by_the_operation_is_removed() {
        let tmp = tempfile::tempdir().unwrap();
        let counter = tmp.path().join(".cache");
        fs::write(&counter, "WS=1\nNS=0\n").unwrap();

        let mut log = UndoLog::new();
        log.push(UndoAction::RestoreCounter {
            path: counter.clone(),
            snapshot: None,
        });

        let report = log.replay();
        assert!(report.counter_restored);
        assert!(report.is_complete());
        assert!(!counter.exists());
    }
}
