//! Types for the undo history.

use crate::core::executor::FailedFile;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// One committed rename, as recorded for undo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoOperation {
    pub old_path: PathBuf,
    pub new_path: PathBuf,
}

/// The committed renames of one batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoBatch {
    pub id: String,
    /// Unix timestamp in seconds
    pub timestamp: i64,
    /// In commit order
    pub operations: Vec<UndoOperation>,
}

impl UndoBatch {
    pub fn new(operations: Vec<UndoOperation>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), operations)
    }

    pub fn with_id(id: impl Into<String>, operations: Vec<UndoOperation>) -> Self {
        Self {
            id: id.into(),
            timestamp: Utc::now().timestamp(),
            operations,
        }
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// How an undo moves files back
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UndoMode {
    /// Rename each file straight back, refusing to overwrite anything
    #[default]
    Direct,
    /// Go through temp names, so swaps and cycles can be undone
    Staged,
}

/// Result of undoing one batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoOutcome {
    pub batch_id: String,
    /// False when the batch was not in the history (already undone or evicted)
    pub found: bool,
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<FailedFile>,
}

impl UndoOutcome {
    pub fn not_found(batch_id: impl Into<String>) -> Self {
        Self {
            batch_id: batch_id.into(),
            ..Self::default()
        }
    }
}
