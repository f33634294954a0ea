//! # Filesystem Module
//!
//! The host filesystem as an abstract capability.
//!
//! ## Backends
//! - `LocalFileSystem` - the local disk (never overwrites on rename)
//! - `InMemoryFileSystem` - a journaled in-memory tree with failure injection

mod local;
mod memory;
mod traits;

pub use local::LocalFileSystem;
pub use memory::{InMemoryFileSystem, RenameRecord};
pub use traits::{FileStat, FileSystem};
