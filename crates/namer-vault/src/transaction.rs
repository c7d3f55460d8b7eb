//! Transactional add and remove.
//!
//! A [`Transaction`] performs exactly one operation as a series of
//! filesystem steps. Each step that changes the disk first records its
//! compensation in an [`UndoLog`]. On an I/O error, an interruption, or a
//! drop before commit, the log is replayed newest first so the directory
//! and the counter file return to their state when the transaction began.
//! The one exception is the delete at the start of a removal: its content
//! is gone and the rollback can only report it.
//!
//! ```text
//! Idle ──add/remove──▶ Staged ──commit──▶ Committed
//!                        │
//!                        └──error/interrupt/drop──▶ RolledBack
//! ```

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use namer_core::{
    Chapter, CounterStore, Counters, Difficulty, FileName, Kind, NamerError, Result,
    RollbackReport, Series,
};

use crate::contributor::Contributor;
use crate::series::SeriesDirectory;
use crate::undo::{UndoAction, UndoLog};

/// Source of asynchronous interruption, polled between steps.
pub trait Interrupt {
    /// Name of the pending interruption, if one has arrived.
    fn pending(&self) -> Option<String>;
}

/// Never interrupts.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInterrupt;

impl Interrupt for NoInterrupt {
    fn pending(&self) -> Option<String> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TxState {
    Idle,
    Staged,
    Committed,
    RolledBack,
}

/// Everything an add needs besides the contributor.
#[derive(Debug, Clone)]
pub struct AddRequest {
    pub series: Series,
    pub chapter: Chapter,
    pub difficulty: Difficulty,
    pub kind: Kind,
    pub content: Vec<u8>,
}

/// Outcome of a committed add.
#[derive(Debug, Clone, Serialize)]
pub struct Added {
    pub path: PathBuf,
    pub name: FileName,
    pub counters: Counters,
}

/// Outcome of a committed remove.
#[derive(Debug, Clone, Serialize)]
pub struct Removed {
    pub path: PathBuf,
    pub name: FileName,
    /// Renames applied, as `(old, new)`, in the order performed.
    pub renamed: Vec<(PathBuf, PathBuf)>,
    pub counters: Counters,
}

/// One add or one remove against a contributor directory.
pub struct Transaction<'a> {
    creator_dir: &'a Contributor,
    series: SeriesDirectory,
    counter_path: PathBuf,
    snapshot: Counters,
    counter_existed: bool,
    counters: Counters,
    undo: UndoLog,
    state: TxState,
    interrupt: &'a dyn Interrupt,
}

impl<'a> Transaction<'a> {
    /// Load the counter file and keep it as the rollback baseline.
    ///
    /// # Errors
    ///
    /// Returns [`NamerError::Io`] if the counter file exists but cannot be read.
    pub fn begin(creator_dir: &'a Contributor, interrupt: &'a dyn Interrupt) -> Result<Self> {
        let counter_path = creator_dir.counter_path();
        let counter_existed = counter_path.try_exists()?;
        let snapshot = CounterStore::load(&counter_path)?;
        tracing::debug!(dir = %creator_dir.dir().display(), ?snapshot, "transaction begins");

        Ok(Self {
            creator_dir,
            series: creator_dir.series(),
            counter_path,
            snapshot,
            counter_existed,
            counters: snapshot,
            undo: UndoLog::new(),
            state: TxState::Idle,
            interrupt,
        })
    }

    #[must_use]
    pub fn state(&self) -> TxState {
        self.state
    }

    /// Counters as loaded when the transaction began.
    #[must_use]
    pub fn snapshot(&self) -> Counters {
        self.snapshot
    }

    /// Mint the next free name in `request.series` and write the content
    /// under it.
    ///
    /// Sequences already present on disk are skipped, so files added by
    /// hand never get overwritten.
    ///
    /// # Errors
    ///
    /// [`NamerError::IoFailure`] if writing or renaming fails,
    /// [`NamerError::CounterPersistFailure`] if the counter cannot be saved,
    /// [`NamerError::Interrupted`] if interrupted between steps, and
    /// [`NamerError::SequenceExhausted`] if the series is full. Every one of
    /// them is returned after the undo log has been replayed.
    pub fn add(mut self, request: AddRequest) -> Result<Added> {
        self.state = TxState::Staged;
        let series = request.series;
        let template = FileName {
            series,
            creator: self.creator_dir.creator(),
            sequence: 0,
            chapter: request.chapter,
            difficulty: request.difficulty,
            kind: request.kind,
        };

        let occupied = match self.series.sequences(template.creator, series) {
            Ok(occupied) => occupied,
            Err(e) => return Err(self.abort(e)),
        };
        let mut start = self.counters.get(series).saturating_add(1);
        let first = match template.next_candidate(start, |c| occupied.contains(&c.sequence)) {
            Ok(name) => name,
            Err(e) => return Err(self.abort(e)),
        };

        let temp = self.series.dir().join(format!("{first}.tmp"));
        self.write_temp(&temp, &request.content)?;
        self.checkpoint()?;

        let mut candidate = first;
        let target = loop {
            let target = self.series.dir().join(candidate.encode());
            match target.try_exists() {
                Ok(false) => break target,
                Ok(true) => {
                    tracing::debug!(name = %candidate, "target appeared on disk, probing further");
                    start = candidate.sequence.saturating_add(1);
                    candidate = match template
                        .next_candidate(start, |c| occupied.contains(&c.sequence))
                    {
                        Ok(name) => name,
                        Err(e) => return Err(self.abort(e)),
                    };
                }
                Err(e) => return Err(self.abort_io("check target", e)),
            }
        };

        if let Err(e) = std::fs::rename(&temp, &target) {
            return Err(self.abort_io("rename temporary file", e));
        }
        self.undo.amend_last(UndoAction::DeleteFile(target.clone()));
        tracing::debug!(path = %target.display(), "materialised");
        self.checkpoint()?;

        self.counters.set(series, candidate.sequence);
        self.persist_counters()?;
        self.checkpoint()?;

        self.commit();
        tracing::info!(name = %candidate, "added");
        Ok(Added {
            path: target,
            name: candidate,
            counters: self.counters,
        })
    }

    /// Delete `file_name` and shift every later file of its series down by one.
    ///
    /// # Errors
    ///
    /// [`NamerError::NotAPattern`] and [`NamerError::NotFound`] are returned
    /// before anything changes. After the delete, a failed rename yields
    /// [`NamerError::PartialRenumberFailure`], a failed counter write
    /// [`NamerError::CounterPersistFailure`] and an interruption
    /// [`NamerError::Interrupted`]; renames are reverted in each case but
    /// the deleted content is reported as lost.
    pub fn remove(mut self, file_name: &str) -> Result<Removed> {
        let file_name = file_name.trim();
        let name = FileName::decode(file_name)?;
        let canonical = self.series.dir().join(name.encode());
        let path = if canonical.is_file() {
            canonical
        } else {
            self.series.dir().join(file_name)
        };
        if !path.is_file() {
            return Err(NamerError::NotFound(path));
        }

        self.state = TxState::Staged;
        if let Err(e) = std::fs::remove_file(&path) {
            return Err(self.abort_io("delete", e));
        }
        self.undo.push(UndoAction::Irreversible(path.clone()));
        tracing::debug!(path = %path.display(), "deleted");
        self.checkpoint()?;

        let later = match self
            .series
            .entries_after(name.creator, name.series, name.sequence)
        {
            Ok(later) => later,
            Err(NamerError::Io(e)) => return Err(self.abort_renumber(&path, e)),
            Err(e) => return Err(self.abort(e)),
        };

        let mut renamed = Vec::with_capacity(later.len());
        for entry in later {
            let new_path = self
                .series
                .dir()
                .join(entry.name.with_sequence(entry.name.sequence - 1).encode());
            if let Err(e) = rename_no_clobber(&entry.path, &new_path) {
                return Err(self.abort_renumber(&path, e));
            }
            self.undo.push(UndoAction::RenameBack {
                from: new_path.clone(),
                to: entry.path.clone(),
            });
            tracing::debug!(from = %entry.path.display(), to = %new_path.display(), "renumbered");
            renamed.push((entry.path, new_path));
            self.checkpoint()?;
        }

        // Decrementing is only right because the pass above keeps the series dense.
        self.counters
            .set(name.series, self.counters.get(name.series).saturating_sub(1));
        self.persist_counters()?;
        self.checkpoint()?;

        self.commit();
        tracing::info!(name = %name, renamed = renamed.len(), "removed");
        Ok(Removed {
            path,
            name,
            renamed,
            counters: self.counters,
        })
    }

    /// Replay the undo log. Safe to call more than once.
    pub fn rollback(&mut self) -> RollbackReport {
        let report = self.undo.replay();
        if self.state == TxState::Staged {
            self.state = TxState::RolledBack;
        }
        report
    }

    fn write_temp(&mut self, temp: &Path, content: &[u8]) -> Result<()> {
        let mut file = match File::create(temp) {
            Ok(file) => file,
            Err(e) => return Err(self.abort_io("create temporary file", e)),
        };
        self.undo.push(UndoAction::DeleteFile(temp.to_path_buf()));

        if let Err(e) = file.write_all(content).and_then(|()| file.sync_all()) {
            drop(file);
            return Err(self.abort_io("write temporary file", e));
        }
        tracing::debug!(path = %temp.display(), bytes = content.len(), "temporary file written");
        Ok(())
    }

    fn persist_counters(&mut self) -> Result<()> {
        self.undo.push(UndoAction::RestoreCounter {
            path: self.counter_path.clone(),
            snapshot: self.counter_existed.then_some(self.snapshot),
        });
        if let Err(source) = CounterStore::save(&self.counter_path, &self.counters) {
            tracing::error!(path = %self.counter_path.display(), %source, "counter file not written");
            let report = self.rollback();
            return Err(NamerError::CounterPersistFailure {
                path: self.counter_path.clone(),
                source,
                report,
            });
        }
        Ok(())
    }

    fn checkpoint(&mut self) -> Result<()> {
        match self.interrupt.pending() {
            None => Ok(()),
            Some(signal) => {
                tracing::warn!(%signal, "interrupted, reverting changes");
                let report = self.rollback();
                Err(NamerError::Interrupted { signal, report })
            }
        }
    }

    fn commit(&mut self) {
        self.undo.clear();
        self.state = TxState::Committed;
    }

    fn abort(&mut self, err: NamerError) -> NamerError {
        let report = self.rollback();
        match err {
            NamerError::Io(source) => NamerError::IoFailure {
                action: "scan directory".to_string(),
                source,
                report,
            },
            other => other,
        }
    }

    fn abort_io(&mut self, action: &str, source: io::Error) -> NamerError {
        tracing::error!(action, %source, "step failed, reverting changes");
        let report = self.rollback();
        NamerError::IoFailure {
            action: action.to_string(),
            source,
            report,
        }
    }

    fn abort_renumber(&mut self, removed: &Path, source: io::Error) -> NamerError {
        tracing::error!(%source, "renumbering failed, reverting renames");
        let report = self.rollback();
        NamerError::PartialRenumberFailure {
            removed: removed.to_path_buf(),
            source,
            report,
        }
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if self.state == TxState::Staged {
            let report = self.rollback();
            tracing::warn!(%report, "uncommitted transaction dropped, changes reverted");
        }
    }
}

fn rename_no_clobber(from: &Path, to: &Path) -> io::Result<()> {
    if to.try_exists()? {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already exists", to.display()),
        ));
    }
    std::fs::rename(from, to)
}
