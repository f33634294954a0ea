//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by the renamer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Rename batch events
    Batch(BatchEvent),
    /// Undo events
    Undo(UndoEvent),
}

/// Events during a rename batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BatchEvent {
    /// A batch has been accepted for execution
    Started { batch_id: String, operations: usize },
    /// Moving to a new phase
    PhaseChanged { phase: BatchPhase },
    /// Pre-flight validation blocked the batch
    ConflictsFound { count: usize },
    /// A file was moved to its temporary name
    Staged { source: PathBuf, temp_path: PathBuf },
    /// A file reached its final name
    Committed { source: PathBuf, target: PathBuf },
    /// A file could not be renamed; it keeps (or regained) its original name
    Failed {
        source: PathBuf,
        phase: BatchPhase,
        message: String,
    },
    /// A failed commit was rolled back to the original name
    RolledBack { source: PathBuf },
    /// Commit and rollback both failed; the file sits at its temporary name
    Stranded { source: PathBuf, temp_path: PathBuf },
    /// Batch finished
    Completed { summary: BatchSummary },
}

/// Phases of a rename batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchPhase {
    Collecting,
    Validating,
    Staging,
    Committing,
}

/// Summary of a finished batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub batch_id: String,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub stranded: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

/// Events while undoing a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum UndoEvent {
    Started { batch_id: String, operations: usize },
    /// A file was moved back to its pre-batch path
    Reverted { from: PathBuf, to: PathBuf },
    Failed { path: PathBuf, message: String },
    Completed {
        batch_id: String,
        succeeded: usize,
        failed: usize,
    },
}

impl Event {
    /// True for the last event a batch or undo run emits.
    ///
    /// A batch blocked by conflicts ends at `ConflictsFound`; every other
    /// run ends with a `Completed` event.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Event::Batch(BatchEvent::Completed { .. })
                | Event::Batch(BatchEvent::ConflictsFound { .. })
                | Event::Undo(UndoEvent::Completed { .. })
        )
    }
}

impl std::fmt::Display for BatchPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchPhase::Collecting => write!(f, "Collecting"),
            BatchPhase::Validating => write!(f, "Validating"),
            BatchPhase::Staging => write!(f, "Staging"),
            BatchPhase::Committing => write!(f, "Committing"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_serializable() {
        let event = Event::Batch(BatchEvent::Stranded {
            source: PathBuf::from("/photos/a.jpg"),
            temp_path: PathBuf::from("/photos/.rename-tmp-1a2b-0.jpg"),
        });

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: Event = serde_json::from_str(&json).unwrap();

        match deserialized {
            Event::Batch(BatchEvent::Stranded { temp_path, .. }) => {
                assert_eq!(temp_path, PathBuf::from("/photos/.rename-tmp-1a2b-0.jpg"));
            }
            _ => panic!("Wrong event type"),
        }
    }

    #[test]
    fn only_completion_and_conflicts_end_a_run() {
        let conflicts = Event::Batch(BatchEvent::ConflictsFound { count: 2 });
        let undo_done = Event::Undo(UndoEvent::Completed {
            batch_id: "b1".into(),
            succeeded: 1,
            failed: 0,
        });
        let committed = Event::Batch(BatchEvent::Committed {
            source: PathBuf::from("/a"),
            target: PathBuf::from("/b"),
        });

        assert!(conflicts.is_terminal());
        assert!(undo_done.is_terminal());
        assert!(!committed.is_terminal());
    }

    #[test]
    fn phase_displays_human_name() {
        assert_eq!(BatchPhase::Committing.to_string(), "Committing");
    }
}
