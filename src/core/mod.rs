//! # Core Module
//!
//! The GUI-agnostic batch renaming engine.
//!
//! ## Modules
//! - `rules` - Rule kinds, their parameters and the registry that runs them
//! - `pipeline` - Runs an ordered rule list over one file name
//! - `sort` - Display order of the loaded files
//! - `conflict` - Pre-flight validation of a batch
//! - `executor` - Two-phase staged rename execution with rollback
//! - `history` - Bounded undo log
//! - `lists` - Shared name-list templates for the map rule
//! - `fs` - The host filesystem capability
//! - `engine` - The `Renamer` facade

pub mod conflict;
pub mod engine;
pub mod executor;
pub mod file;
pub mod fs;
pub mod history;
pub mod lists;
pub mod pipeline;
pub mod rules;
pub mod sort;

// Re-export commonly used types
pub use conflict::{Conflict, ConflictKind, ConflictReport};
pub use engine::{Renamer, RenamerBuilder, RenamerConfig};
pub use executor::{BatchOutcome, CommitPolicy, FilePreview, RenamePlan, RenameRequest};
pub use file::FileInfo;
pub use fs::{FileSystem, InMemoryFileSystem, LocalFileSystem};
pub use history::{UndoBatch, UndoMode, UndoOutcome};
pub use rules::{Profile, Rule, RuleInfo, RuleKind, RuleRegistry};
pub use sort::{SortConfig, SortKey, SortOrder};
