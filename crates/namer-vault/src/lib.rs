//! # namer-vault
//!
//! Filesystem side of namer.
//!
//! Contributor directories are the source of truth. Every mutation runs
//! inside a [`Transaction`] that keeps an in-memory undo log, so a failed
//! or interrupted add/remove leaves the files and the counter file
//! consistent with each other.

pub mod contributor;
pub mod series;
pub mod signal;
pub mod transaction;
pub mod undo;

pub use contributor::{Contributor, COUNTER_FILE, CREATOR_FILE};
pub use series::{SeriesDirectory, SeriesEntry};
pub use signal::{ShutdownGuard, ShutdownSignal, INTERRUPTED_EXIT_CODE};
pub use transaction::{
    AddRequest, Added, Interrupt, NoInterrupt, Removed, Transaction, TxState,
};
pub use undo::{UndoAction, UndoLog};
