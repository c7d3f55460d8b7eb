//! Dataset-level settings from `<root>/.namer.toml`.
//!
//! ```toml
//! [sync]
//! enabled = true
//! pull_before_add = true
//! push = true
//! ```

use std::fs;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

pub const CONFIG_FILE: &str = ".namer.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// Commit (and push) after every successful add or remove.
    pub enabled: bool,
    /// Pull with rebase before an add when an upstream is configured.
    pub pull_before_add: bool,
    /// Push after committing.
    pub push: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            pull_before_add: true,
            push: true,
        }
    }
}

impl Config {
    /// Load the config file under `root`; a missing file means defaults.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
        };
        toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }
}
