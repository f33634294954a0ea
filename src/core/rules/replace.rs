//! Substring / pattern replacement.

use super::registry::{info_mismatch, RuleDefinition};
use super::types::{ExecArgs, RuleInfo, RuleKind};
use crate::error::RuleError;
use regex::{NoExpand, Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplaceInfo {
    pub pattern: String,
    pub replacement: String,
    /// Treat `pattern` as a regular expression; `replacement` may use `$1`
    pub use_regex: bool,
    pub case_sensitive: bool,
    /// Replace every match instead of the first one
    pub replace_all: bool,
    pub include_ext: bool,
}

impl Default for ReplaceInfo {
    fn default() -> Self {
        Self {
            pattern: String::new(),
            replacement: String::new(),
            use_regex: false,
            case_sensitive: true,
            replace_all: true,
            include_ext: false,
        }
    }
}

impl ReplaceInfo {
    pub fn literal(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
            ..Self::default()
        }
    }

    pub fn regex(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            use_regex: true,
            ..Self::literal(pattern, replacement)
        }
    }

    fn compile(&self) -> Result<Regex, RuleError> {
        let source = if self.use_regex {
            self.pattern.clone()
        } else {
            regex::escape(&self.pattern)
        };
        RegexBuilder::new(&source)
            .case_insensitive(!self.case_sensitive)
            .build()
            .map_err(|e| RuleError::InvalidPattern {
                pattern: self.pattern.clone(),
                reason: e.to_string(),
            })
    }

    pub fn apply(&self, input: &str) -> Result<String, RuleError> {
        if self.pattern.is_empty() {
            return Ok(input.to_string());
        }
        let re = self.compile()?;
        let limit = if self.replace_all { 0 } else { 1 };
        let out = if self.use_regex {
            re.replacen(input, limit, self.replacement.as_str())
        } else {
            re.replacen(input, limit, NoExpand(&self.replacement))
        };
        Ok(out.into_owned())
    }
}

pub struct ReplaceDefinition;

impl RuleDefinition for ReplaceDefinition {
    fn kind(&self) -> RuleKind {
        RuleKind::Replace
    }

    fn label(&self) -> &'static str {
        "Replace"
    }

    fn default_info(&self) -> RuleInfo {
        RuleInfo::Replace(ReplaceInfo::default())
    }

    fn describe(&self, info: &RuleInfo) -> String {
        let RuleInfo::Replace(info) = info else {
            return String::new();
        };
        let mut text = format!("Replace \"{}\" with \"{}\"", info.pattern, info.replacement);
        if info.use_regex {
            text.push_str(" (regex)");
        }
        if !info.replace_all {
            text.push_str(" (first match)");
        }
        text
    }

    fn exec(&self, info: &RuleInfo, args: &ExecArgs<'_>) -> Result<String, RuleError> {
        let RuleInfo::Replace(info) = info else {
            return Err(info_mismatch(RuleKind::Replace, info));
        };
        info.apply(args.input(info.include_ext))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_replaces_all_by_default() {
        let info = ReplaceInfo::literal("o", "0");
        assert_eq!(info.apply("foo boo").unwrap(), "f00 b00");
    }

    #[test]
    fn literal_treats_metacharacters_plainly() {
        let info = ReplaceInfo::literal("a.b", "$1");
        assert_eq!(info.apply("a.b axb").unwrap(), "$1 axb");
    }

    #[test]
    fn first_match_only() {
        let info = ReplaceInfo {
            replace_all: false,
            ..ReplaceInfo::literal("x", "y")
        };
        assert_eq!(info.apply("xxx").unwrap(), "yxx");
    }

    #[test]
    fn case_insensitive_match() {
        let info = ReplaceInfo {
            case_sensitive: false,
            ..ReplaceInfo::literal("IMG", "photo")
        };
        assert_eq!(info.apply("img_001").unwrap(), "photo_001");
    }

    #[test]
    fn regex_uses_capture_groups() {
        let info = ReplaceInfo::regex(r"(\d+)-(\d+)", "$2-$1");
        assert_eq!(info.apply("shot 12-34").unwrap(), "shot 34-12");
    }

    #[test]
    fn invalid_regex_is_configuration_error() {
        let info = ReplaceInfo::regex("(unclosed", "");
        assert!(matches!(
            info.apply("x"),
            Err(RuleError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn empty_pattern_is_identity() {
        assert_eq!(ReplaceInfo::default().apply("same").unwrap(), "same");
    }
}
