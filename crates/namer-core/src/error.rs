//! Error types for namer.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::name::Series;

/// Top-level result type for namer operations.
pub type Result<T> = std::result::Result<T, NamerError>;

/// Top-level error type for namer.
///
/// Validation errors (`NotAPattern`, `NotFound`, `CreatorNotFound`,
/// `InvalidInput`) are raised before anything on disk changes. The
/// remaining transactional variants carry the [`RollbackReport`] produced
/// while compensating for the steps that had already run.
#[derive(Debug, Error)]
pub enum NamerError {
    #[error("filename does not match pattern: {0}")]
    NotAPattern(String),

    #[error("file does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("cannot find a contributor folder starting with {0}_")]
    CreatorNotFound(String),

    #[error("invalid {field}: '{value}'")]
    InvalidInput { field: &'static str, value: String },

    #[error("series {0} has no free sequence number left")]
    SequenceExhausted(Series),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{action} failed: {source}")]
    IoFailure {
        action: String,
        source: std::io::Error,
        report: RollbackReport,
    },

    #[error("renumbering after removing {} failed: {source}", removed.display())]
    PartialRenumberFailure {
        removed: PathBuf,
        source: std::io::Error,
        report: RollbackReport,
    },

    #[error(
        "counter file {} could not be written: {source}; files on disk and counter may disagree",
        path.display()
    )]
    CounterPersistFailure {
        path: PathBuf,
        source: std::io::Error,
        report: RollbackReport,
    },

    #[error("interrupted by {signal}")]
    Interrupted {
        signal: String,
        report: RollbackReport,
    },
}

impl NamerError {
    /// The compensation record for errors raised mid-transaction.
    #[must_use]
    pub fn rollback_report(&self) -> Option<&RollbackReport> {
        match self {
            Self::IoFailure { report, .. }
            | Self::PartialRenumberFailure { report, .. }
            | Self::CounterPersistFailure { report, .. }
            | Self::Interrupted { report, .. } => Some(report),
            _ => None,
        }
    }

    /// Whether the operator can simply retry with different input.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::NotAPattern(_)
                | Self::NotFound(_)
                | Self::CreatorNotFound(_)
                | Self::InvalidInput { .. }
        )
    }
}

/// What a rollback did, step by step, so the operator can verify the
/// directory by hand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RollbackReport {
    /// Files created by the operation and deleted again.
    pub removed: Vec<PathBuf>,
    /// Renames reverted, as `(renamed_to, restored_as)`.
    pub restored: Vec<(PathBuf, PathBuf)>,
    /// Files whose content was deleted and cannot be brought back.
    pub lost: Vec<PathBuf>,
    /// Whether the counter file was rewritten from the pre-operation snapshot.
    pub counter_restored: bool,
    /// Compensation steps that themselves failed.
    pub failed: Vec<String>,
}

impl RollbackReport {
    /// True when the directory and counter are back to their snapshot.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.lost.is_empty() && self.failed.is_empty()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty()
            && self.restored.is_empty()
            && self.lost.is_empty()
            && !self.counter_restored
            && self.failed.is_empty()
    }
}

impl fmt::Display for RollbackReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for path in &self.removed {
            writeln!(f, "Removed: {}", path.display())?;
        }
        for (from, to) in &self.restored {
            writeln!(f, "Restored: {} -> {}", file_label(from), file_label(to))?;
        }
        for path in &self.lost {
            writeln!(
                f,
                "Deleted file: {} (cannot restore automatically)",
                file_label(path)
            )?;
        }
        if self.counter_restored {
            writeln!(f, "Cache restored.")?;
        }
        for failure in &self.failed {
            writeln!(f, "Could not revert: {failure}")?;
        }
        Ok(())
    }
}

fn file_label(path: &std::path::Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}
