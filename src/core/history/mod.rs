//! # History Module
//!
//! Undo history of completed rename batches.
//!
//! ## Features
//! - Bounded LIFO (default 10 batches, oldest evicted)
//! - Lookup and removal by batch id
//! - Only committed renames are recorded

mod log;
mod types;

pub use log::{UndoLog, DEFAULT_HISTORY_CAPACITY};
pub use types::{UndoBatch, UndoMode, UndoOperation, UndoOutcome};
