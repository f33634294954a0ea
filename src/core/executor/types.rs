//! Types for the rename executor.

use crate::core::history::UndoBatch;
use crate::error::RuleError;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::path::{Path, PathBuf};

/// What to do when some commits of a batch fail
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CommitPolicy {
    /// Keep every rename that succeeded
    #[default]
    BestEffort,
    /// Revert committed renames when any commit fails
    AllOrNothing,
}

/// Executor settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Temp names look like `.{temp_prefix}-{batch}-{seq}{ext}`
    pub temp_prefix: String,
    pub commit_policy: CommitPolicy,
    /// How many failed files `BatchOutcome::summary` lists by name
    pub max_failed_listed: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            temp_prefix: "renaming".to_string(),
            commit_policy: CommitPolicy::BestEffort,
            max_failed_listed: 10,
        }
    }
}

/// A requested rename: `source_path` gets the file name `target_name`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RenameRequest {
    pub source_path: PathBuf,
    pub target_name: String,
}

impl RenameRequest {
    pub fn new(source_path: impl Into<PathBuf>, target_name: impl Into<String>) -> Self {
        Self {
            source_path: source_path.into(),
            target_name: target_name.into(),
        }
    }
}

/// One rename of a batch, alive only while the batch runs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RenameOperation {
    /// Index of the file in the loaded set
    pub original_index: usize,
    pub source_path: PathBuf,
    pub target_name: String,
    /// `target_name` in the source's directory
    pub target_path: PathBuf,
    /// Set once a staging name has been chosen
    pub temp_path: Option<PathBuf>,
}

impl RenameOperation {
    pub fn new(
        original_index: usize,
        source_path: PathBuf,
        target_name: impl Into<String>,
    ) -> Self {
        let target_name = target_name.into();
        let target_path = source_path
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(&target_name);
        Self {
            original_index,
            source_path,
            target_name,
            target_path,
            temp_path: None,
        }
    }

    pub fn source_name(&self) -> String {
        file_name(&self.source_path)
    }
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Pipeline result for one file of the loaded set
#[derive(Debug, Clone, PartialEq)]
pub struct FilePreview {
    pub original_index: usize,
    /// Position in the display order
    pub display_index: usize,
    pub path: PathBuf,
    pub current_name: String,
    pub preview: Result<String, RuleError>,
}

impl FilePreview {
    pub fn preview_name(&self) -> Option<&str> {
        self.preview.as_deref().ok()
    }

    pub fn is_changed(&self) -> bool {
        self.preview_name()
            .is_some_and(|name| name != self.current_name)
    }
}

/// Where a file failed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Its rule pipeline failed; it was never scheduled
    Preview,
    /// Moving it to its temp name failed; it was not touched
    Stage,
    /// Moving it to its target failed and it was put back
    Commit,
    /// It is left at its temp name
    Stranded,
    /// It was renamed, then reverted because another commit failed
    Reverted,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FailedFile {
    pub source: PathBuf,
    pub target_name: String,
    pub kind: FailureKind,
    pub message: String,
}

/// A file that could be neither committed nor put back
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StrandedFile {
    pub source: PathBuf,
    pub temp_path: PathBuf,
    pub target_name: String,
    pub message: String,
}

/// Operations ready to execute, plus what was filtered out on the way
#[derive(Debug, Clone, Default)]
pub struct RenamePlan {
    pub operations: Vec<RenameOperation>,
    /// Files whose pipeline failed
    pub failures: Vec<FailedFile>,
    /// Files whose new name equals the current one
    pub skipped: usize,
}

impl RenamePlan {
    pub fn from_operations(operations: Vec<RenameOperation>) -> Self {
        Self {
            operations,
            ..Self::default()
        }
    }
}

/// Result of one batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub batch_id: String,
    pub success_count: usize,
    pub failed_count: usize,
    pub skipped_count: usize,
    /// Every failed file, stranded ones included
    pub failures: Vec<FailedFile>,
    pub stranded: Vec<StrandedFile>,
    /// Present when at least one rename was committed
    pub undo_batch: Option<UndoBatch>,
    pub duration_ms: u64,
}

impl BatchOutcome {
    pub fn is_success(&self) -> bool {
        self.failed_count == 0
    }

    /// Human summary listing at most `max_listed` failed files
    pub fn summary(&self, max_listed: usize) -> String {
        let mut text = format!(
            "Renamed {} file(s), {} failed, {} unchanged.",
            self.success_count, self.failed_count, self.skipped_count
        );

        if !self.failures.is_empty() {
            text.push_str("\nFailed:");
            for failure in self.failures.iter().take(max_listed) {
                let _ = write!(
                    text,
                    "\n  {} -> {}: {}",
                    file_name(&failure.source),
                    failure.target_name,
                    failure.message
                );
            }
            if self.failures.len() > max_listed {
                let _ = write!(text, "\n  ... and {} more", self.failures.len() - max_listed);
            }
        }

        for stranded in &self.stranded {
            let _ = write!(
                text,
                "\nLeft at temporary name {} (was {}); rename it by hand.",
                stranded.temp_path.display(),
                stranded.source.display()
            );
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(name: &str) -> FailedFile {
        FailedFile {
            source: PathBuf::from(format!("/d/{}", name)),
            target_name: format!("new_{}", name),
            kind: FailureKind::Commit,
            message: "denied".to_string(),
        }
    }

    fn outcome(failures: Vec<FailedFile>) -> BatchOutcome {
        BatchOutcome {
            batch_id: "b".to_string(),
            success_count: 2,
            failed_count: failures.len(),
            skipped_count: 1,
            failures,
            stranded: Vec::new(),
            undo_batch: None,
            duration_ms: 0,
        }
    }

    #[test]
    fn operation_targets_source_directory() {
        let op = RenameOperation::new(0, PathBuf::from("/photos/a.jpg"), "b.jpg");
        assert_eq!(op.target_path, PathBuf::from("/photos/b.jpg"));
        assert_eq!(op.source_name(), "a.jpg");
    }

    #[test]
    fn summary_counts() {
        let text = outcome(Vec::new()).summary(5);
        assert_eq!(text, "Renamed 2 file(s), 0 failed, 1 unchanged.");
    }

    #[test]
    fn summary_truncates_failed_list() {
        let failures = (0..4).map(|i| failed(&format!("f{}.txt", i))).collect();
        let text = outcome(failures).summary(2);
        assert!(text.contains("f0.txt -> new_f0.txt: denied"));
        assert!(text.contains("f1.txt"));
        assert!(!text.contains("f2.txt"));
        assert!(text.contains("... and 2 more"));
    }

    #[test]
    fn summary_mentions_stranded_files() {
        let mut result = outcome(vec![failed("a.txt")]);
        result.stranded.push(StrandedFile {
            source: PathBuf::from("/d/a.txt"),
            temp_path: PathBuf::from("/d/.renaming-1-0.txt"),
            target_name: "b.txt".to_string(),
            message: "stuck".to_string(),
        });
        assert!(result.summary(10).contains(".renaming-1-0.txt"));
    }

    #[test]
    fn preview_change_detection() {
        let preview = FilePreview {
            original_index: 0,
            display_index: 0,
            path: PathBuf::from("/d/a.txt"),
            current_name: "a.txt".to_string(),
            preview: Ok("a.txt".to_string()),
        };
        assert!(!preview.is_changed());
    }
}
