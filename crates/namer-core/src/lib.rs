//! # namer-core
//!
//! Core types for minting dataset filenames.
//!
//! This crate defines the foundational types used across all other namer crates:
//! - [`FileName`]: the structured filename record and its codec
//! - Field types ([`Series`], [`CreatorId`], [`Chapter`], [`Difficulty`], [`Kind`])
//! - [`Counters`] and [`CounterStore`]: the per-contributor sequence counter file
//! - Error hierarchy ([`NamerError`]) and [`RollbackReport`]

pub mod counter;
pub mod error;
pub mod name;

pub use counter::{CounterStore, Counters};
pub use error::{NamerError, Result, RollbackReport};
pub use name::{Chapter, CreatorId, Difficulty, FileName, Kind, Series, MAX_SEQUENCE};
