//! # Rules Module
//!
//! The closed set of rule kinds and the registry that maps each kind to
//! its behavior.
//!
//! ## Rule kinds
//! - `replace` - Literal or regex replacement
//! - `delete` - Remove text or a character range
//! - `format` - Case conversion and padding
//! - `template` - Placeholder templates (`{name}`, `{index:3}`, `{date}`)
//! - `insert` - Insert text or a counter at a position
//! - `map` - Take the name at the file's position in a list
//! - `script` - Sandboxed user script

pub mod delete;
pub mod format;
pub mod insert;
pub mod map;
pub mod registry;
pub mod replace;
pub mod script;
pub mod template;
mod types;

pub use delete::{DeleteInfo, DeleteTarget};
pub use format::{CaseStyle, FormatInfo, PadSide, PadSpec};
pub use insert::{InsertContent, InsertInfo, InsertPosition};
pub use map::MapInfo;
pub use registry::{RuleDefinition, RuleRegistry};
pub use replace::ReplaceInfo;
pub use script::{ScriptInfo, ScriptLimits};
pub use template::TemplateInfo;
pub use types::{ExecArgs, Profile, Rule, RuleInfo, RuleKind, MAX_PAD_WIDTH};
