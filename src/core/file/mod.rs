//! # File Module
//!
//! Derives the name/extension/time view of a file that rules operate on.
//!
//! `FileInfo` is never cached: it is recomputed from the path (or from a
//! hypothetical name between pipeline steps) whenever it is needed.

use crate::core::fs::FileSystem;
use crate::error::FsError;
use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};
use std::path::Path;

const IMAGE_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".webp", ".tiff", ".tif", ".svg", ".avif",
];

const VIDEO_EXTENSIONS: &[&str] = &[
    ".mp4", ".avi", ".mov", ".wmv", ".flv", ".webm", ".mkv", ".m4v", ".3gp", ".ogv",
];

/// The view of a file that rules see
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    /// File name without extension
    pub name: String,
    /// Extension including the leading dot, or empty
    pub ext: String,
    /// `name` followed by `ext`
    pub full_name: String,
    /// Unix timestamp in seconds (modified, else created)
    pub timestamp: Option<i64>,
    /// Local-time rendering of `timestamp`
    pub time_string: Option<String>,
    pub is_image: bool,
    pub is_video: bool,
}

impl FileInfo {
    /// Build from a bare file name, with no time information
    pub fn from_name(full_name: &str) -> Self {
        let (name, ext) = split_name(full_name);
        let lower = ext.to_lowercase();
        Self {
            is_image: IMAGE_EXTENSIONS.contains(&lower.as_str()),
            is_video: VIDEO_EXTENSIONS.contains(&lower.as_str()),
            full_name: format!("{}{}", name, ext),
            name,
            ext,
            timestamp: None,
            time_string: None,
        }
    }

    /// Build from a real path, reading its timestamp through `fs`
    pub fn from_path(fs: &dyn FileSystem, path: &Path) -> Result<Self, FsError> {
        let full_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stat = fs.stat(path)?;
        Ok(Self::from_name(&full_name).with_timestamp(stat.timestamp()))
    }

    /// Attach a timestamp and its display string
    pub fn with_timestamp(mut self, timestamp: Option<i64>) -> Self {
        self.time_string = timestamp.and_then(format_timestamp);
        self.timestamp = timestamp;
        self
    }

    /// The same file under a hypothetical new name.
    ///
    /// Time information belongs to the file, not the name, so it is kept.
    pub fn renamed(&self, full_name: &str) -> Self {
        let mut info = Self::from_name(full_name);
        info.timestamp = self.timestamp;
        info.time_string = self.time_string.clone();
        info
    }
}

/// Split a file name into stem and dotted extension.
///
/// A leading dot (".bashrc") or a trailing dot ("notes.") does not start
/// an extension.
pub fn split_name(full_name: &str) -> (String, String) {
    match full_name.rfind('.') {
        Some(pos) if pos > 0 && pos + 1 < full_name.len() => (
            full_name[..pos].to_string(),
            full_name[pos..].to_string(),
        ),
        _ => (full_name.to_string(), String::new()),
    }
}

/// Format a Unix timestamp in local time
pub fn format_timestamp(timestamp: i64) -> Option<String> {
    Local
        .timestamp_opt(timestamp, 0)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fs::InMemoryFileSystem;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn split_regular_name() {
        assert_eq!(split_name("photo.jpg"), ("photo".into(), ".jpg".into()));
        assert_eq!(
            split_name("archive.tar.gz"),
            ("archive.tar".into(), ".gz".into())
        );
    }

    #[test]
    fn split_without_extension() {
        assert_eq!(split_name("README"), ("README".into(), "".into()));
        assert_eq!(split_name(".bashrc"), (".bashrc".into(), "".into()));
        assert_eq!(split_name("notes."), ("notes.".into(), "".into()));
    }

    #[test]
    fn media_flags_ignore_case() {
        assert!(FileInfo::from_name("IMG_0001.JPG").is_image);
        assert!(FileInfo::from_name("clip.MkV").is_video);
        assert!(!FileInfo::from_name("doc.pdf").is_image);
    }

    #[test]
    fn from_path_reads_timestamp() {
        let fs = InMemoryFileSystem::new();
        fs.add_file("/d/a.png", Some(UNIX_EPOCH + Duration::from_secs(1_700_000_000)));

        let info = FileInfo::from_path(&fs, Path::new("/d/a.png")).unwrap();

        assert_eq!(info.full_name, "a.png");
        assert_eq!(info.timestamp, Some(1_700_000_000));
        assert!(info.time_string.is_some());
    }

    #[test]
    fn renamed_keeps_time() {
        let info = FileInfo::from_name("a.png").with_timestamp(Some(42));
        let next = info.renamed("b.txt");
        assert_eq!(next.name, "b");
        assert_eq!(next.ext, ".txt");
        assert_eq!(next.timestamp, Some(42));
        assert!(!next.is_image);
    }
}
