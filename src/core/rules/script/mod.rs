//! User-authored renaming logic in a small sandboxed s-expression language.
//!
//! ```text
//! (if image?
//!     (str (pad-start (str (+ index 1)) 3 "0") "_" name)
//!     name)
//! ```

mod eval;
mod reader;

pub use eval::{run, Value};
pub use reader::{parse, parse_with_depth, Expr};

use super::registry::{info_mismatch, RuleDefinition};
use super::types::{ExecArgs, RuleInfo, RuleKind};
use crate::error::RuleError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SCRIPT: &str = r#"(str (pad-start (str (+ index 1)) 3 "0") "_" name)"#;

/// Evaluation budget for one script run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptLimits {
    pub max_steps: usize,
    /// Bounds both list nesting in the source and evaluation depth
    pub max_depth: usize,
    /// Longest string, in characters, a primitive may build
    pub max_output_len: usize,
}

impl Default for ScriptLimits {
    fn default() -> Self {
        Self {
            max_steps: 10_000,
            max_depth: 64,
            max_output_len: 4096,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptInfo {
    pub script: String,
    pub include_ext: bool,
}

impl Default for ScriptInfo {
    fn default() -> Self {
        Self::new(DEFAULT_SCRIPT)
    }
}

impl ScriptInfo {
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            include_ext: false,
        }
    }
}

pub struct ScriptDefinition {
    limits: ScriptLimits,
}

impl ScriptDefinition {
    pub fn new(limits: ScriptLimits) -> Self {
        Self { limits }
    }
}

impl RuleDefinition for ScriptDefinition {
    fn kind(&self) -> RuleKind {
        RuleKind::Script
    }

    fn label(&self) -> &'static str {
        "Script"
    }

    fn default_info(&self) -> RuleInfo {
        RuleInfo::Script(ScriptInfo::default())
    }

    fn describe(&self, info: &RuleInfo) -> String {
        let RuleInfo::Script(info) = info else {
            return String::new();
        };
        let first_line = info
            .script
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty() && !line.starts_with(';'))
            .unwrap_or("");
        format!("Script: {}", first_line)
    }

    fn exec(&self, info: &RuleInfo, args: &ExecArgs<'_>) -> Result<String, RuleError> {
        let RuleInfo::Script(info) = info else {
            return Err(info_mismatch(RuleKind::Script, info));
        };
        Ok(run(&info.script, args, self.limits)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::file::FileInfo;
    use crate::error::ScriptError;

    #[test]
    fn default_script_runs() {
        let file = FileInfo::from_name("beach.png");
        let definition = ScriptDefinition::new(ScriptLimits::default());
        let out = definition
            .exec(&definition.default_info(), &ExecArgs::new(&file, 0, 3))
            .unwrap();
        assert_eq!(out, "001_beach");
    }

    #[test]
    fn include_ext_does_not_change_bindings() {
        let file = FileInfo::from_name("beach.png");
        let info = RuleInfo::Script(ScriptInfo {
            script: "full-name".into(),
            include_ext: true,
        });
        let out = ScriptDefinition::new(ScriptLimits::default())
            .exec(&info, &ExecArgs::new(&file, 0, 1))
            .unwrap();
        assert_eq!(out, "beach.png");
    }

    #[test]
    fn script_errors_are_wrapped() {
        let file = FileInfo::from_name("a.txt");
        let info = RuleInfo::Script(ScriptInfo::new("(/ 1 0)"));
        let result = ScriptDefinition::new(ScriptLimits::default())
            .exec(&info, &ExecArgs::new(&file, 0, 1));
        assert_eq!(result, Err(RuleError::Script(ScriptError::DivisionByZero)));
    }

    #[test]
    fn describe_skips_comments() {
        let info = RuleInfo::Script(ScriptInfo::new("; numbering\n(str name)"));
        let text = ScriptDefinition::new(ScriptLimits::default()).describe(&info);
        assert_eq!(text, "Script: (str name)");
    }
}
