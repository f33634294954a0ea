//! In-memory filesystem for testing and dry runs.

use super::{FileStat, FileSystem};
use crate::error::FsError;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::SystemTime;

/// One rename as it was applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameRecord {
    pub from: PathBuf,
    pub to: PathBuf,
}

#[derive(Debug, Default)]
struct MemoryState {
    files: BTreeMap<PathBuf, FileStat>,
    journal: Vec<RenameRecord>,
    overwrites: usize,
    fail_to: HashSet<PathBuf>,
    fail_from: HashSet<PathBuf>,
}

/// In-memory filesystem
///
/// Renames onto an occupied path replace it (as POSIX `rename` does) but
/// are counted, so tests can assert that a batch never clobbered a file.
/// Renames can be made to fail by source or destination.
#[derive(Debug)]
pub struct InMemoryFileSystem {
    state: RwLock<MemoryState>,
    listing: bool,
}

impl InMemoryFileSystem {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(MemoryState::default()),
            listing: true,
        }
    }

    /// Create a filesystem holding the given files
    pub fn with_files<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let fs = Self::new();
        for path in paths {
            fs.add_file(path, None);
        }
        fs
    }

    /// Behave like a host that cannot enumerate directories
    pub fn without_listing(mut self) -> Self {
        self.listing = false;
        self
    }

    pub fn add_file(&self, path: impl Into<PathBuf>, modified: Option<SystemTime>) {
        self.write().files.insert(
            path.into(),
            FileStat {
                size: 0,
                modified,
                created: None,
                is_file: true,
            },
        );
    }

    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.read().files.contains_key(path.as_ref())
    }

    /// All paths currently present, sorted
    pub fn paths(&self) -> Vec<PathBuf> {
        self.read().files.keys().cloned().collect()
    }

    /// Every rename applied so far, in order
    pub fn journal(&self) -> Vec<RenameRecord> {
        self.read().journal.clone()
    }

    /// Number of renames that replaced an existing file
    pub fn overwrites(&self) -> usize {
        self.read().overwrites
    }

    /// Make every rename whose destination is `path` fail
    pub fn fail_renames_to(&self, path: impl Into<PathBuf>) {
        self.write().fail_to.insert(path.into());
    }

    /// Make every rename whose source is `path` fail
    pub fn fail_renames_from(&self, path: impl Into<PathBuf>) {
        self.write().fail_from.insert(path.into());
    }

    pub fn clear_failures(&self) {
        let mut state = self.write();
        state.fail_to.clear();
        state.fail_from.clear();
    }

    fn read(&self) -> RwLockReadGuard<'_, MemoryState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, MemoryState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for InMemoryFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for InMemoryFileSystem {
    fn rename(&self, from: &Path, to: &Path) -> Result<(), FsError> {
        let mut state = self.write();

        if state.fail_from.contains(from) || state.fail_to.contains(to) {
            return Err(FsError::Injected {
                path: from.to_path_buf(),
                message: format!("rename to {} rejected", to.display()),
            });
        }

        let stat = state.files.remove(from).ok_or_else(|| FsError::NotFound {
            path: from.to_path_buf(),
        })?;

        if state.files.insert(to.to_path_buf(), stat).is_some() {
            state.overwrites += 1;
        }
        state.journal.push(RenameRecord {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
        });
        Ok(())
    }

    fn list_dir(&self, dir: &Path) -> Result<Vec<PathBuf>, FsError> {
        if !self.listing {
            return Err(FsError::Unsupported {
                operation: "list_dir",
            });
        }
        Ok(self
            .read()
            .files
            .keys()
            .filter(|path| path.parent() == Some(dir))
            .cloned()
            .collect())
    }

    fn stat(&self, path: &Path) -> Result<FileStat, FsError> {
        self.read()
            .files
            .get(path)
            .copied()
            .ok_or_else(|| FsError::NotFound {
                path: path.to_path_buf(),
            })
    }

    fn walk_files(&self, root: &Path) -> Result<Vec<PathBuf>, FsError> {
        Ok(self
            .read()
            .files
            .keys()
            .filter(|path| path.starts_with(root))
            .cloned()
            .collect())
    }

    fn supports_listing(&self) -> bool {
        self.listing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rename_moves_entry_and_journals_it() {
        let fs = InMemoryFileSystem::with_files(["/d/a.txt"]);

        fs.rename(Path::new("/d/a.txt"), Path::new("/d/b.txt")).unwrap();

        assert!(!fs.contains("/d/a.txt"));
        assert!(fs.contains("/d/b.txt"));
        assert_eq!(fs.journal().len(), 1);
        assert_eq!(fs.overwrites(), 0);
    }

    #[test]
    fn rename_onto_existing_counts_overwrite() {
        let fs = InMemoryFileSystem::with_files(["/d/a.txt", "/d/b.txt"]);

        fs.rename(Path::new("/d/a.txt"), Path::new("/d/b.txt")).unwrap();

        assert_eq!(fs.overwrites(), 1);
        assert_eq!(fs.paths(), vec![PathBuf::from("/d/b.txt")]);
    }

    #[test]
    fn injected_failure_leaves_state_untouched() {
        let fs = InMemoryFileSystem::with_files(["/d/a.txt"]);
        fs.fail_renames_to("/d/b.txt");

        let result = fs.rename(Path::new("/d/a.txt"), Path::new("/d/b.txt"));

        assert!(matches!(result, Err(FsError::Injected { .. })));
        assert!(fs.contains("/d/a.txt"));
        assert!(fs.journal().is_empty());
    }

    #[test]
    fn list_dir_is_not_recursive() {
        let fs = InMemoryFileSystem::with_files(["/d/a.txt", "/d/sub/b.txt"]);
        let files = fs.list_dir(Path::new("/d")).unwrap();
        assert_eq!(files, vec![PathBuf::from("/d/a.txt")]);
        assert_eq!(fs.walk_files(Path::new("/d")).unwrap().len(), 2);
    }

    #[test]
    fn listing_can_be_disabled() {
        let fs = InMemoryFileSystem::with_files(["/d/a.txt"]).without_listing();
        assert!(!fs.supports_listing());
        assert!(fs.list_dir(Path::new("/d")).is_err());
    }
}
