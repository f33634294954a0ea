//! # Engine Module
//!
//! The `Renamer` facade tying rules, sorting, planning, execution and undo
//! history together, plus its configuration.

mod config;
mod renamer;

pub use config::RenamerConfig;
pub use renamer::{Renamer, RenamerBuilder};
