//! Filesystem capability trait definition.

use crate::error::FsError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// What `stat` reports about a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStat {
    pub size: u64,
    pub modified: Option<SystemTime>,
    pub created: Option<SystemTime>,
    pub is_file: bool,
}

impl FileStat {
    /// Unix timestamp in seconds: modification time, then creation time
    pub fn timestamp(&self) -> Option<i64> {
        self.modified
            .or(self.created)
            .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
            .map(|duration| duration.as_secs() as i64)
    }
}

/// The host filesystem as seen by the rename engine.
///
/// Implement this trait to run the engine against something other than
/// the local disk (e.g., an in-memory tree for tests or dry runs).
pub trait FileSystem: Send + Sync {
    /// Rename `from` to `to`.
    ///
    /// Implementations should be atomic for a single file.
    fn rename(&self, from: &Path, to: &Path) -> Result<(), FsError>;

    /// Files directly inside `dir`
    fn list_dir(&self, dir: &Path) -> Result<Vec<PathBuf>, FsError>;

    /// Metadata for a single path
    fn stat(&self, path: &Path) -> Result<FileStat, FsError>;

    /// Whether anything currently occupies `path`
    fn exists(&self, path: &Path) -> bool {
        self.stat(path).is_ok()
    }

    /// Every file below `root`, recursively.
    ///
    /// Used for folder re-scan after a batch. The default only looks at
    /// the top level.
    fn walk_files(&self, root: &Path) -> Result<Vec<PathBuf>, FsError> {
        self.list_dir(root)
    }

    /// Whether `list_dir` can be relied on for conflict detection
    fn supports_listing(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn timestamp_prefers_modified_time() {
        let stat = FileStat {
            size: 1,
            modified: Some(UNIX_EPOCH + Duration::from_secs(200)),
            created: Some(UNIX_EPOCH + Duration::from_secs(100)),
            is_file: true,
        };
        assert_eq!(stat.timestamp(), Some(200));
    }

    #[test]
    fn timestamp_falls_back_to_created_time() {
        let stat = FileStat {
            size: 1,
            modified: None,
            created: Some(UNIX_EPOCH + Duration::from_secs(100)),
            is_file: true,
        };
        assert_eq!(stat.timestamp(), Some(100));
    }
}
