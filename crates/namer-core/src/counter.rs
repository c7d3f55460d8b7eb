//! Per-contributor sequence counters.
//!
//! The counter file holds the highest allocated sequence of each series:
//! ```text
//! WS=12
//! NS=3
//! ```
//! Unknown keys and malformed lines are ignored on read.

use std::fs;
use std::io;
use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::name::Series;

/// Highest allocated sequence per series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counters {
    #[serde(rename = "WS")]
    pub ws: u32,
    #[serde(rename = "NS")]
    pub ns: u32,
}

impl Counters {
    #[must_use]
    pub fn get(&self, series: Series) -> u32 {
        match series {
            Series::Ws => self.ws,
            Series::Ns => self.ns,
        }
    }

    pub fn set(&mut self, series: Series, value: u32) {
        match series {
            Series::Ws => self.ws = value,
            Series::Ns => self.ns = value,
        }
    }

    /// Parse counter file contents. Never fails.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut counters = Self::default();
        for line in text.lines() {
            let line = line.trim();
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let series = match key.trim() {
                "WS" => Series::Ws,
                "NS" => Series::Ns,
                _ => continue,
            };
            match value.trim().parse::<u32>() {
                Ok(value) => counters.set(series, value),
                Err(_) => tracing::debug!(line, "skipping malformed counter line"),
            }
        }
        counters
    }

    /// Render the two-line counter file.
    #[must_use]
    pub fn render(&self) -> String {
        format!("WS={}\nNS={}\n", self.ws, self.ns)
    }
}

/// Load and save [`Counters`] files.
pub struct CounterStore;

impl CounterStore {
    /// Read the counter file at `path`.
    ///
    /// A missing or empty file yields all-zero counters. The returned value
    /// is a fresh copy; keep it as the rollback snapshot before mutating.
    ///
    /// # Errors
    ///
    /// Returns [`crate::NamerError::Io`] if the file exists but cannot be read.
    pub fn load(path: &Path) -> Result<Counters> {
        match fs::read_to_string(path) {
            Ok(text) => Ok(Counters::parse(&text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Counters::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Truncate and rewrite the counter file at `path`.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error; callers decide how to surface it.
    pub fn save(path: &Path, counters: &Counters) -> io::Result<()> {
        fs::write(path, counters.render())
    }
}
