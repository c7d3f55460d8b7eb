//! Enumeration of dataset files in a contributor directory.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use namer_core::{CreatorId, FileName, Result, Series};

/// A directory entry whose name decodes as a [`FileName`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesEntry {
    pub path: PathBuf,
    pub name: FileName,
}

/// Read-only view of the dataset files in one directory.
#[derive(Debug, Clone)]
pub struct SeriesDirectory {
    dir: PathBuf,
}

impl SeriesDirectory {
    #[must_use]
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Every regular file whose name matches the dataset grammar, in
    /// filesystem order. Call again to enumerate afresh.
    ///
    /// # Errors
    ///
    /// Returns [`namer_core::NamerError::Io`] if the directory cannot be read.
    pub fn list_matching(&self) -> Result<impl Iterator<Item = SeriesEntry>> {
        let entries = fs::read_dir(&self.dir)?;
        Ok(entries.filter_map(|entry| {
            let entry = entry.ok()?;
            if !entry.file_type().ok()?.is_file() {
                return None;
            }
            let file_name = entry.file_name();
            let name = FileName::decode(file_name.to_str()?).ok()?;
            Some(SeriesEntry {
                path: entry.path(),
                name,
            })
        }))
    }

    /// Whether `name` exists in the directory, matched byte for byte.
    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        self.dir.join(name).try_exists().unwrap_or(false)
    }

    /// Entries numbered by `creator` in `series`. Files carrying another
    /// creator id are someone else's numbering and never match.
    ///
    /// # Errors
    ///
    /// Returns [`namer_core::NamerError::Io`] if the directory cannot be read.
    pub fn in_series(
        &self,
        creator: CreatorId,
        series: Series,
    ) -> Result<impl Iterator<Item = SeriesEntry>> {
        Ok(self
            .list_matching()?
            .filter(move |e| e.name.creator == creator && e.name.series == series))
    }

    /// Sorted, de-duplicated sequences `creator` occupies in `series`.
    ///
    /// # Errors
    ///
    /// Returns [`namer_core::NamerError::Io`] if the directory cannot be read.
    pub fn sequences(&self, creator: CreatorId, series: Series) -> Result<BTreeSet<u32>> {
        Ok(self
            .in_series(creator, series)?
            .map(|e| e.name.sequence)
            .collect())
    }

    /// Highest sequence `creator` occupies on disk in `series`.
    ///
    /// # Errors
    ///
    /// Returns [`namer_core::NamerError::Io`] if the directory cannot be read.
    pub fn highest(&self, creator: CreatorId, series: Series) -> Result<Option<u32>> {
        Ok(self.sequences(creator, series)?.last().copied())
    }

    /// Entries of `creator` in `series` with a sequence above `sequence`,
    /// ascending.
    ///
    /// Renaming each one down by one in this order always targets a name
    /// that has just been vacated.
    ///
    /// # Errors
    ///
    /// Returns [`namer_core::NamerError::Io`] if the directory cannot be read.
    pub fn entries_after(
        &self,
        creator: CreatorId,
        series: Series,
        sequence: u32,
    ) -> Result<Vec<SeriesEntry>> {
        let mut entries: Vec<SeriesEntry> = self
            .in_series(creator, series)?
            .filter(|e| e.name.sequence > sequence)
            .collect();
        entries.sort_by(|a, b| {
            a.name
                .sequence
                .cmp(&b.name.sequence)
                .then_with(|| a.path.cmp(&b.path))
        });
        Ok(entries)
    }
}
