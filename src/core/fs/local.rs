//! Local disk implementation using std::fs and walkdir.

use super::{FileStat, FileSystem};
use crate::error::FsError;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Filesystem capability backed by the local disk
#[derive(Debug, Clone, Default)]
pub struct LocalFileSystem {
    follow_symlinks: bool,
}

impl LocalFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Follow symbolic links while re-scanning folders
    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }
}

impl FileSystem for LocalFileSystem {
    fn rename(&self, from: &Path, to: &Path) -> Result<(), FsError> {
        // std::fs::rename silently replaces the destination on Unix
        if from != to && to.symlink_metadata().is_ok() {
            return Err(FsError::AlreadyExists {
                path: to.to_path_buf(),
            });
        }
        fs::rename(from, to).map_err(|e| FsError::from_io(from, e))
    }

    fn list_dir(&self, dir: &Path) -> Result<Vec<PathBuf>, FsError> {
        let entries = fs::read_dir(dir).map_err(|e| FsError::from_io(dir, e))?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| FsError::from_io(dir, e))?;
            let file_type = entry.file_type().map_err(|e| FsError::from_io(entry.path(), e))?;
            if !file_type.is_dir() {
                files.push(entry.path());
            }
        }
        files.sort();
        Ok(files)
    }

    fn stat(&self, path: &Path) -> Result<FileStat, FsError> {
        let metadata = fs::metadata(path).map_err(|e| FsError::from_io(path, e))?;
        Ok(FileStat {
            size: metadata.len(),
            modified: metadata.modified().ok(),
            created: metadata.created().ok(),
            is_file: metadata.is_file(),
        })
    }

    fn exists(&self, path: &Path) -> bool {
        path.symlink_metadata().is_ok()
    }

    fn walk_files(&self, root: &Path) -> Result<Vec<PathBuf>, FsError> {
        if !root.is_dir() {
            return Err(FsError::NotFound {
                path: root.to_path_buf(),
            });
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(root).follow_links(self.follow_symlinks) {
            let entry = entry.map_err(|err| {
                let path = err
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.to_path_buf());
                let source = err
                    .into_io_error()
                    .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "filesystem loop"));
                FsError::from_io(path, source)
            })?;

            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
        files.sort();
        Ok(files)
    }
}
