//! # Executor Module
//!
//! Safe batch renaming.
//!
//! ## Stages
//! 1. **Collect** - previews and manual overrides become rename operations
//! 2. **Validate** - the whole batch is checked for conflicts
//! 3. **Stage** - every source moves to a unique temp name
//! 4. **Commit** - every temp name moves to its target, with rollback
//!
//! ## Parallelism
//! Uses rayon for the renames inside each phase.

mod planner;
mod runner;
mod types;

pub use planner::RenamePlanner;
pub use runner::RenameExecutor;
pub use types::*;
