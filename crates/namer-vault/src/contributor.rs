//! Contributor directories.
//!
//! Each creator owns one directory under the dataset root named
//! `<id:02>_<name>`. It holds the creator's dataset files, the counter
//! file and a one-line cache of the creator's name.

use std::fs;
use std::path::{Path, PathBuf};

use namer_core::{CreatorId, NamerError, Result};

use crate::series::SeriesDirectory;

/// Counter file name inside a contributor directory.
pub const COUNTER_FILE: &str = ".cache";

/// Creator-name cache file name inside a contributor directory.
pub const CREATOR_FILE: &str = ".creator.cfg";

/// A creator's directory on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contributor {
    creator: CreatorId,
    name: String,
    dir: PathBuf,
}

impl Contributor {
    /// Look for the directory of `creator` under `root`.
    ///
    /// The first directory (by name) starting with `<id>_` wins. The name
    /// comes from the cache file, falling back to the directory suffix.
    ///
    /// # Errors
    ///
    /// Returns [`NamerError::Io`] if `root` cannot be listed.
    pub fn find(root: &Path, creator: CreatorId) -> Result<Option<Self>> {
        let prefix = format!("{creator}_");
        let mut candidates: Vec<PathBuf> = fs::read_dir(root)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_ok_and(|t| t.is_dir()))
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(&prefix))
            .map(|entry| entry.path())
            .collect();
        candidates.sort();

        let Some(dir) = candidates.into_iter().next() else {
            return Ok(None);
        };

        let name = read_cached_name(&dir).unwrap_or_else(|| {
            dir.file_name()
                .map(|n| n.to_string_lossy()[prefix.len()..].to_string())
                .unwrap_or_default()
        });

        Ok(Some(Self { creator, name, dir }))
    }

    /// Like [`Contributor::find`], but a missing directory is an error.
    ///
    /// # Errors
    ///
    /// Returns [`NamerError::CreatorNotFound`] if no directory matches.
    pub fn open(root: &Path, creator: CreatorId) -> Result<Self> {
        Self::find(root, creator)?.ok_or_else(|| NamerError::CreatorNotFound(creator.to_string()))
    }

    /// Create `<root>/<id>_<name>` and cache the name inside it.
    ///
    /// # Errors
    ///
    /// Returns [`NamerError::InvalidInput`] for an empty name or one that
    /// would escape the dataset root, and [`NamerError::Io`] on write errors.
    pub fn create(root: &Path, creator: CreatorId, name: &str) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(NamerError::InvalidInput {
                field: "creator name",
                value: name.to_string(),
            });
        }

        let dir = root.join(format!("{creator}_{name}"));
        fs::create_dir_all(&dir)?;
        fs::write(dir.join(CREATOR_FILE), name)?;
        tracing::info!(dir = %dir.display(), "created contributor directory");

        Ok(Self {
            creator,
            name: name.to_string(),
            dir,
        })
    }

    /// Find the directory, or create it with the name produced by `ask_name`.
    ///
    /// `ask_name` runs only when the directory does not exist yet.
    ///
    /// # Errors
    ///
    /// Propagates errors from `ask_name`, [`Contributor::find`] and
    /// [`Contributor::create`].
    pub fn open_or_create<E: From<NamerError>>(
        root: &Path,
        creator: CreatorId,
        ask_name: impl FnOnce() -> std::result::Result<String, E>,
    ) -> std::result::Result<Self, E> {
        match Self::find(root, creator)? {
            Some(found) => {
                if read_cached_name(&found.dir).is_none() {
                    fs::write(found.dir.join(CREATOR_FILE), &found.name).map_err(NamerError::from)?;
                }
                Ok(found)
            }
            None => Ok(Self::create(root, creator, &ask_name()?)?),
        }
    }

    #[must_use]
    pub fn creator(&self) -> CreatorId {
        self.creator
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn counter_path(&self) -> PathBuf {
        self.dir.join(COUNTER_FILE)
    }

    #[must_use]
    pub fn series(&self) -> SeriesDirectory {
        SeriesDirectory::new(&self.dir)
    }
}

fn read_cached_name(dir: &Path) -> Option<String> {
    let text = fs::read_to_string(dir.join(CREATOR_FILE)).ok()?;
    let name = text.lines().next()?.trim();
    (!name.is_empty()).then(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u32) -> CreatorId {
        CreatorId::new(n).unwrap()
    }

    #[test]
    fn create_makes_directory_and_name_cache() {
        let root = tempfile::tempdir().unwrap();
        let c = Contributor::create(root.path(), id(7), "  Ada Lovelace ").unwrap();

        assert_eq!(c.dir(), root.path().join("07_Ada Lovelace"));
        assert_eq!(c.name(), "Ada Lovelace");
        assert_eq!(
            fs::read_to_string(c.dir().join(CREATOR_FILE)).unwrap(),
            "Ada Lovelace"
        );
        assert_eq!(c.counter_path(), c.dir().join(COUNTER_FILE));
    }

    #[test]
    fn create_rejects_unsafe_names() {
        let root = tempfile::tempdir().unwrap();
        for bad in ["", "   ", "../evil", "a/b", ".."] {
            assert!(matches!(
                Contributor::create(root.path(), id(1), bad),
                Err(NamerError::InvalidInput { .. })
            ));
        }
    }

    #[test]
    fn find_matches_on_id_prefix() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join("17_Other")).unwrap();
        fs::create_dir(root.path().join("07_Ada")).unwrap();
        fs::write(root.path().join("07_file"), "not a dir").unwrap();

        let found = Contributor::find(root.path(), id(7)).unwrap().unwrap();
        assert_eq!(found.dir(), root.path().join("07_Ada"));
        assert_eq!(found.name(), "Ada");

        assert!(Contributor::find(root.path(), id(8)).unwrap().is_none());
        assert!(matches!(
            Contributor::open(root.path(), id(8)),
            Err(NamerError::CreatorNotFound(id)) if id == "08"
        ));
    }

    #[test]
    fn find_prefers_cached_name() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("03_grace");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join(CREATOR_FILE), "Grace Hopper\n").unwrap();

        let found = Contributor::open(root.path(), id(3)).unwrap();
        assert_eq!(found.name(), "Grace Hopper");
    }

    #[test]
    fn open_or_create_only_asks_when_missing() {
        let root = tempfile::tempdir().unwrap();
        let created = Contributor::open_or_create(root.path(), id(5), || {
            Ok::<_, NamerError>("Emmy".to_string())
        })
        .unwrap();
        assert_eq!(created.name(), "Emmy");

        let reopened = Contributor::open_or_create(root.path(), id(5), || -> Result<String> {
            panic!("name must not be asked for an existing contributor")
        })
        .unwrap();
        assert_eq!(reopened, created);
    }

    #[test]
    fn open_or_create_backfills_missing_cache() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join("09_Noether")).unwrap();

        let found =
            Contributor::open_or_create(root.path(), id(9), || -> Result<String> { unreachable!() })
                .unwrap();
        assert_eq!(found.name(), "Noether");
        assert_eq!(
            fs::read_to_string(found.dir().join(CREATOR_FILE)).unwrap(),
            "Noether"
        );
    }
}
