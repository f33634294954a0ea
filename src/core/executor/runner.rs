//! Two-phase rename execution.
//!
//! Phase 1 moves every source to a unique temp name in its own directory,
//! which vacates all source names at once. Phase 2 moves each temp name
//! to its target. Swaps and rotations therefore never touch an occupied
//! name.
//!
//! Phase 2 runs in dependency order: an operation whose target is the
//! source of another operation commits only after that operation has
//! finished, so a rollback never finds its source name taken. Cycles
//! cannot be ordered; a failure inside one strands the file instead of
//! overwriting its neighbour.

use super::types::*;
use crate::core::conflict::{detect_conflicts, CheckStatus};
use crate::core::file::split_name;
use crate::core::fs::FileSystem;
use crate::core::history::{UndoBatch, UndoOperation, UndoOutcome};
use crate::error::{FsError, RenamerError};
use crate::events::{
    null_sender, BatchEvent, BatchPhase, BatchSummary, Event, EventSender, UndoEvent,
};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

type StagedOp = (RenameOperation, PathBuf);

enum StageResult {
    Staged(RenameOperation, PathBuf),
    Failed(RenameOperation, FsError),
}

enum CommitResult {
    Committed(RenameOperation),
    RolledBack(RenameOperation, FsError),
    Stranded {
        op: RenameOperation,
        temp_path: PathBuf,
        commit_error: FsError,
        rollback_error: FsError,
    },
}

/// What the two phases did to a set of operations
#[derive(Default)]
struct PhaseOutcome {
    committed: Vec<RenameOperation>,
    failures: Vec<FailedFile>,
    stranded: Vec<StrandedFile>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum RevertState {
    Committed,
    Reverted,
    Stranded,
}

/// Runs rename plans against a host filesystem
pub struct RenameExecutor {
    fs: Arc<dyn FileSystem>,
    config: ExecutorConfig,
}

impl RenameExecutor {
    pub fn new(fs: Arc<dyn FileSystem>, config: ExecutorConfig) -> Self {
        Self { fs, config }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Execute a plan.
    ///
    /// Returns `RenamerError::Conflict` without touching any file when
    /// pre-flight validation fails. Otherwise per-file failures are
    /// reported in the outcome.
    pub fn execute(
        &self,
        plan: RenamePlan,
        events: &EventSender,
    ) -> Result<BatchOutcome, RenamerError> {
        let start = Instant::now();
        let batch_id = Uuid::new_v4().to_string();
        let RenamePlan {
            operations,
            mut failures,
            skipped,
        } = plan;

        info!(batch = %batch_id, operations = operations.len(), "Starting rename batch");
        events.send(Event::Batch(BatchEvent::Started {
            batch_id: batch_id.clone(),
            operations: operations.len(),
        }));

        // Validation
        events.send(Event::Batch(BatchEvent::PhaseChanged {
            phase: BatchPhase::Validating,
        }));
        let report = detect_conflicts(self.fs.as_ref(), &operations);
        if report.existing_file_check == CheckStatus::Skipped {
            warn!(batch = %batch_id, "Existing-file check was skipped");
        }
        if report.is_blocking() {
            warn!(
                batch = %batch_id,
                conflicts = report.conflicts.len(),
                "Batch blocked by conflicts"
            );
            events.send(Event::Batch(BatchEvent::ConflictsFound {
                count: report.conflicts.len(),
            }));
            return Err(RenamerError::Conflict(report));
        }

        let PhaseOutcome {
            mut committed,
            failures: phase_failures,
            mut stranded,
        } = self.run_phases(&batch_id, operations, events);
        failures.extend(phase_failures);

        let commit_failed = failures
            .iter()
            .any(|f| matches!(f.kind, FailureKind::Commit | FailureKind::Stranded));
        if commit_failed
            && self.config.commit_policy == CommitPolicy::AllOrNothing
            && !committed.is_empty()
        {
            committed =
                self.revert_committed(&batch_id, committed, &mut failures, &mut stranded, events);
        }

        let undo_batch = if committed.is_empty() {
            None
        } else {
            Some(UndoBatch::with_id(
                batch_id.clone(),
                committed
                    .iter()
                    .map(|op| UndoOperation {
                        old_path: op.source_path.clone(),
                        new_path: op.target_path.clone(),
                    })
                    .collect(),
            ))
        };

        let outcome = BatchOutcome {
            batch_id: batch_id.clone(),
            success_count: committed.len(),
            failed_count: failures.len(),
            skipped_count: skipped,
            failures,
            stranded,
            undo_batch,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            batch = %batch_id,
            succeeded = outcome.success_count,
            failed = outcome.failed_count,
            skipped = outcome.skipped_count,
            "Rename batch finished"
        );
        events.send(Event::Batch(BatchEvent::Completed {
            summary: BatchSummary {
                batch_id,
                succeeded: outcome.success_count,
                failed: outcome.failed_count,
                skipped: outcome.skipped_count,
                stranded: outcome.stranded.len(),
                duration_ms: outcome.duration_ms,
            },
        }));
        Ok(outcome)
    }

    /// Move the files of `batch` back to their pre-batch paths, newest
    /// rename first, never overwriting an existing file.
    pub fn undo_direct(&self, batch: &UndoBatch, events: &EventSender) -> UndoOutcome {
        events.send(Event::Undo(UndoEvent::Started {
            batch_id: batch.id.clone(),
            operations: batch.len(),
        }));

        let mut outcome = UndoOutcome {
            batch_id: batch.id.clone(),
            found: true,
            ..UndoOutcome::default()
        };

        for op in batch.operations.iter().rev() {
            let result = if self.fs.exists(&op.old_path) {
                Err(FsError::AlreadyExists {
                    path: op.old_path.clone(),
                })
            } else {
                self.fs.rename(&op.new_path, &op.old_path)
            };

            match result {
                Ok(()) => {
                    outcome.succeeded += 1;
                    events.send(Event::Undo(UndoEvent::Reverted {
                        from: op.new_path.clone(),
                        to: op.old_path.clone(),
                    }));
                }
                Err(e) => {
                    warn!(path = %op.new_path.display(), error = %e, "Undo failed for file");
                    events.send(Event::Undo(UndoEvent::Failed {
                        path: op.new_path.clone(),
                        message: e.to_string(),
                    }));
                    outcome.failures.push(FailedFile {
                        source: op.new_path.clone(),
                        target_name: file_name(&op.old_path),
                        kind: FailureKind::Commit,
                        message: e.to_string(),
                    });
                }
            }
        }
        outcome.failed = outcome.failures.len();
        self.finish_undo(&outcome, events);
        outcome
    }

    /// Undo through the two-phase algorithm, so swaps can be reversed
    pub fn undo_staged(&self, batch: &UndoBatch, events: &EventSender) -> UndoOutcome {
        events.send(Event::Undo(UndoEvent::Started {
            batch_id: batch.id.clone(),
            operations: batch.len(),
        }));

        let operations = batch
            .operations
            .iter()
            .rev()
            .enumerate()
            .map(|(index, op)| {
                RenameOperation::new(index, op.new_path.clone(), file_name(&op.old_path))
            })
            .collect::<Vec<_>>();

        let mut outcome = UndoOutcome {
            batch_id: batch.id.clone(),
            found: true,
            ..UndoOutcome::default()
        };

        match self.execute(RenamePlan::from_operations(operations.clone()), events) {
            Ok(result) => {
                if let Some(reverted) = &result.undo_batch {
                    for op in &reverted.operations {
                        events.send(Event::Undo(UndoEvent::Reverted {
                            from: op.old_path.clone(),
                            to: op.new_path.clone(),
                        }));
                    }
                }
                outcome.succeeded = result.success_count;
                outcome.failures = result.failures;
            }
            Err(e) => {
                warn!(batch = %batch.id, error = %e, "Staged undo blocked");
                outcome.failures = operations
                    .into_iter()
                    .map(|op| FailedFile {
                        source: op.source_path,
                        target_name: op.target_name,
                        kind: FailureKind::Stage,
                        message: e.to_string(),
                    })
                    .collect();
            }
        }
        for failure in &outcome.failures {
            events.send(Event::Undo(UndoEvent::Failed {
                path: failure.source.clone(),
                message: failure.message.clone(),
            }));
        }
        outcome.failed = outcome.failures.len();
        self.finish_undo(&outcome, events);
        outcome
    }

    fn finish_undo(&self, outcome: &UndoOutcome, events: &EventSender) {
        info!(
            batch = %outcome.batch_id,
            succeeded = outcome.succeeded,
            failed = outcome.failed,
            "Undo finished"
        );
        events.send(Event::Undo(UndoEvent::Completed {
            batch_id: outcome.batch_id.clone(),
            succeeded: outcome.succeeded,
            failed: outcome.failed,
        }));
    }

    /// Stage every operation, then commit the staged ones
    fn run_phases(
        &self,
        batch_id: &str,
        operations: Vec<RenameOperation>,
        events: &EventSender,
    ) -> PhaseOutcome {
        let mut outcome = PhaseOutcome::default();
        let scheduled = self.assign_temp_paths(batch_id, operations);

        // Phase 1: stage
        events.send(Event::Batch(BatchEvent::PhaseChanged {
            phase: BatchPhase::Staging,
        }));
        let stage_results: Vec<StageResult> = scheduled
            .into_par_iter()
            .map(|(op, temp_path)| match self.fs.rename(&op.source_path, &temp_path) {
                Ok(()) => {
                    debug!(
                        source = %op.source_path.display(),
                        temp = %temp_path.display(),
                        "Staged"
                    );
                    events.send(Event::Batch(BatchEvent::Staged {
                        source: op.source_path.clone(),
                        temp_path: temp_path.clone(),
                    }));
                    StageResult::Staged(op, temp_path)
                }
                Err(e) => StageResult::Failed(op, e),
            })
            .collect();

        let mut staged = Vec::new();
        for result in stage_results {
            match result {
                StageResult::Staged(op, temp_path) => staged.push((op, temp_path)),
                StageResult::Failed(op, e) => {
                    warn!(source = %op.source_path.display(), error = %e, "Staging failed");
                    outcome.failures.push(self.report_failure(
                        events,
                        &op,
                        FailureKind::Stage,
                        BatchPhase::Staging,
                        &e,
                    ));
                }
            }
        }

        // Phase 2: commit
        events.send(Event::Batch(BatchEvent::PhaseChanged {
            phase: BatchPhase::Committing,
        }));
        for result in self.commit_in_order(staged, events) {
            match result {
                CommitResult::Committed(op) => outcome.committed.push(op),
                CommitResult::RolledBack(op, e) => {
                    outcome.failures.push(self.report_failure(
                        events,
                        &op,
                        FailureKind::Commit,
                        BatchPhase::Committing,
                        &e,
                    ));
                }
                CommitResult::Stranded {
                    op,
                    temp_path,
                    commit_error,
                    rollback_error,
                } => {
                    let message = format!(
                        "{}; restoring the original name also failed: {}",
                        commit_error, rollback_error
                    );
                    error!(
                        source = %op.source_path.display(),
                        temp = %temp_path.display(),
                        "File stranded at temporary name"
                    );
                    events.send(Event::Batch(BatchEvent::Stranded {
                        source: op.source_path.clone(),
                        temp_path: temp_path.clone(),
                    }));
                    outcome.failures.push(FailedFile {
                        source: op.source_path.clone(),
                        target_name: op.target_name.clone(),
                        kind: FailureKind::Stranded,
                        message: message.clone(),
                    });
                    outcome.stranded.push(StrandedFile {
                        source: op.source_path,
                        temp_path,
                        target_name: op.target_name,
                        message,
                    });
                }
            }
        }
        outcome
    }

    /// Pick a unique temp path for every operation.
    ///
    /// Runs sequentially before any rename so the parallel phases never
    /// race for a name.
    fn assign_temp_paths(&self, batch_id: &str, operations: Vec<RenameOperation>) -> Vec<StagedOp> {
        let short_id: String = batch_id.chars().filter(|c| *c != '-').take(8).collect();
        let mut taken: HashSet<PathBuf> = HashSet::new();
        let mut seq = 0usize;

        operations
            .into_iter()
            .map(|mut op| {
                let dir = op
                    .source_path
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_default();
                let (_, ext) = split_name(&op.source_name());
                let temp_path = loop {
                    let candidate = dir.join(format!(
                        ".{}-{}-{}{}",
                        self.config.temp_prefix, short_id, seq, ext
                    ));
                    seq += 1;
                    if !taken.contains(&candidate) && !self.fs.exists(&candidate) {
                        break candidate;
                    }
                };
                taken.insert(temp_path.clone());
                op.temp_path = Some(temp_path.clone());
                (op, temp_path)
            })
            .collect()
    }

    /// Commit staged operations in waves.
    ///
    /// Free waves have distinct targets that no pending operation needs
    /// for its rollback, so they run in parallel. Cycle waves run one
    /// operation at a time.
    fn commit_in_order(&self, staged: Vec<StagedOp>, events: &EventSender) -> Vec<CommitResult> {
        let mut results = Vec::with_capacity(staged.len());
        let mut pending = staged;
        while !pending.is_empty() {
            let wave = split_ready(pending);
            debug!(
                ready = wave.ready.len(),
                waiting = wave.waiting.len(),
                cyclic = wave.cyclic,
                "Commit wave"
            );
            if wave.cyclic {
                results.extend(
                    wave.ready
                        .into_iter()
                        .map(|(op, temp_path)| self.commit(op, temp_path, events)),
                );
            } else {
                let committed: Vec<CommitResult> = wave
                    .ready
                    .into_par_iter()
                    .map(|(op, temp_path)| self.commit(op, temp_path, events))
                    .collect();
                results.extend(committed);
            }
            pending = wave.waiting;
        }
        results
    }

    fn commit(
        &self,
        op: RenameOperation,
        temp_path: PathBuf,
        events: &EventSender,
    ) -> CommitResult {
        let result = if self.fs.exists(&op.target_path) {
            Err(FsError::AlreadyExists {
                path: op.target_path.clone(),
            })
        } else {
            self.fs.rename(&temp_path, &op.target_path)
        };

        let commit_error = match result {
            Ok(()) => {
                debug!(
                    source = %op.source_path.display(),
                    to = %op.target_path.display(),
                    "Committed"
                );
                events.send(Event::Batch(BatchEvent::Committed {
                    source: op.source_path.clone(),
                    target: op.target_path.clone(),
                }));
                return CommitResult::Committed(op);
            }
            Err(e) => e,
        };

        let rollback = if self.fs.exists(&op.source_path) {
            Err(FsError::AlreadyExists {
                path: op.source_path.clone(),
            })
        } else {
            self.fs.rename(&temp_path, &op.source_path)
        };

        match rollback {
            Ok(()) => {
                warn!(
                    source = %op.source_path.display(),
                    error = %commit_error,
                    "Commit failed, rolled back"
                );
                events.send(Event::Batch(BatchEvent::RolledBack {
                    source: op.source_path.clone(),
                }));
                CommitResult::RolledBack(op, commit_error)
            }
            Err(rollback_error) => CommitResult::Stranded {
                op,
                temp_path,
                commit_error,
                rollback_error,
            },
        }
    }

    /// Put committed files back after a failed all-or-nothing batch.
    ///
    /// The reverse renames go through both phases, so reverting a swap
    /// never overwrites. Returns the operations that could not be
    /// reverted; they stay committed and undoable.
    fn revert_committed(
        &self,
        batch_id: &str,
        committed: Vec<RenameOperation>,
        failures: &mut Vec<FailedFile>,
        stranded: &mut Vec<StrandedFile>,
        events: &EventSender,
    ) -> Vec<RenameOperation> {
        warn!(count = committed.len(), "Reverting committed renames");
        let reverse = committed
            .iter()
            .enumerate()
            .map(|(index, op)| {
                RenameOperation::new(index, op.target_path.clone(), op.source_name())
            })
            .collect();
        let result = self.run_phases(batch_id, reverse, &null_sender());

        let mut states = vec![RevertState::Committed; committed.len()];
        for op in &result.committed {
            states[op.original_index] = RevertState::Reverted;
        }
        let by_target: HashMap<&Path, usize> = committed
            .iter()
            .enumerate()
            .map(|(index, op)| (op.target_path.as_path(), index))
            .collect();
        for lost in &result.stranded {
            if let Some(&index) = by_target.get(lost.source.as_path()) {
                states[index] = RevertState::Stranded;
                let op = &committed[index];
                error!(
                    source = %op.source_path.display(),
                    temp = %lost.temp_path.display(),
                    "File stranded while reverting"
                );
                events.send(Event::Batch(BatchEvent::Stranded {
                    source: op.source_path.clone(),
                    temp_path: lost.temp_path.clone(),
                }));
                failures.push(FailedFile {
                    source: op.source_path.clone(),
                    target_name: op.target_name.clone(),
                    kind: FailureKind::Stranded,
                    message: lost.message.clone(),
                });
                stranded.push(StrandedFile {
                    source: op.source_path.clone(),
                    temp_path: lost.temp_path.clone(),
                    target_name: op.target_name.clone(),
                    message: lost.message.clone(),
                });
            }
        }

        let mut still_committed = Vec::new();
        for (op, state) in committed.into_iter().zip(states) {
            match state {
                RevertState::Reverted => {
                    events.send(Event::Batch(BatchEvent::RolledBack {
                        source: op.source_path.clone(),
                    }));
                    failures.push(FailedFile {
                        source: op.source_path.clone(),
                        target_name: op.target_name.clone(),
                        kind: FailureKind::Reverted,
                        message: "reverted because another file in the batch failed".to_string(),
                    });
                }
                RevertState::Committed => {
                    error!(
                        path = %op.target_path.display(),
                        "Revert failed, rename stays committed"
                    );
                    still_committed.push(op);
                }
                RevertState::Stranded => {}
            }
        }
        still_committed
    }

    fn report_failure(
        &self,
        events: &EventSender,
        op: &RenameOperation,
        kind: FailureKind,
        phase: BatchPhase,
        error: &FsError,
    ) -> FailedFile {
        events.send(Event::Batch(BatchEvent::Failed {
            source: op.source_path.clone(),
            phase,
            message: error.to_string(),
        }));
        FailedFile {
            source: op.source_path.clone(),
            target_name: op.target_name.clone(),
            kind,
            message: error.to_string(),
        }
    }
}

struct CommitWave {
    ready: Vec<StagedOp>,
    waiting: Vec<StagedOp>,
    /// `ready` holds cycle members only
    cyclic: bool,
}

/// Split `pending` into the operations that may commit now and the rest.
///
/// An operation is free when its target is not the source of another
/// pending operation. When nothing is free only cycles remain, and the
/// members of every cycle are released together.
fn split_ready(pending: Vec<StagedOp>) -> CommitWave {
    let (release, cyclic) = {
        let sources: HashMap<&Path, usize> = pending
            .iter()
            .enumerate()
            .map(|(index, (op, _))| (op.source_path.as_path(), index))
            .collect();
        let next: Vec<Option<usize>> = pending
            .iter()
            .map(|(op, _)| sources.get(op.target_path.as_path()).copied())
            .collect();

        if next.iter().any(Option::is_none) {
            (next.iter().map(Option::is_none).collect::<Vec<_>>(), false)
        } else {
            let members = (0..next.len()).map(|index| in_cycle(&next, index)).collect();
            (members, true)
        }
    };

    let (ready, waiting): (Vec<_>, Vec<_>) = pending
        .into_iter()
        .zip(release)
        .partition(|(_, release)| *release);
    CommitWave {
        ready: ready.into_iter().map(|(staged, _)| staged).collect(),
        waiting: waiting.into_iter().map(|(staged, _)| staged).collect(),
        cyclic,
    }
}

fn in_cycle(next: &[Option<usize>], start: usize) -> bool {
    let mut current = next[start];
    for _ in 0..next.len() {
        match current {
            Some(index) if index == start => return true,
            Some(index) => current = next[index],
            None => return false,
        }
    }
    false
}
