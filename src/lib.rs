//! # Batch Renamer
//!
//! A rule-driven batch file renamer that never loses a file.
//!
//! ## Core Philosophy
//! - **Preview first** - Every new name is computed and shown before anything moves
//! - **Never overwrite** - Batches are validated, then staged through temporary names
//! - **Always undoable** - Committed batches are kept in a bounded undo history
//!
//! ## Architecture
//! The library is split into a core engine (GUI-agnostic) and presentation hooks:
//! - `core` - Rules, preview pipeline, conflict detection, execution and undo
//! - `events` - Event-driven progress reporting (GUI-ready)
//! - `error` - User-friendly error types

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use crate::core::{Renamer, RenamerBuilder, RenamerConfig};
pub use error::{RenamerError, Result};

/// Initialize tracing for the library
///
/// This should be called by the application entry point. Calling it twice
/// keeps the first subscriber.
pub fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}
