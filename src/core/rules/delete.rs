//! Removal of text or a character range.

use super::registry::{info_mismatch, RuleDefinition};
use super::types::{ExecArgs, RuleInfo, RuleKind};
use crate::error::RuleError;
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};

/// What to remove
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DeleteTarget {
    /// Occurrences of `text`
    Text {
        text: String,
        #[serde(default)]
        all: bool,
        #[serde(default = "case_sensitive_by_default")]
        case_sensitive: bool,
    },
    /// `count` characters starting `start` characters in. With `from_end`,
    /// the range ends `start` characters before the end instead.
    Range {
        start: usize,
        count: usize,
        #[serde(default)]
        from_end: bool,
    },
}

fn case_sensitive_by_default() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteInfo {
    pub target: DeleteTarget,
    #[serde(default)]
    pub include_ext: bool,
}

impl Default for DeleteInfo {
    fn default() -> Self {
        Self::text("")
    }
}

impl DeleteInfo {
    /// Remove the first occurrence of `text`
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            target: DeleteTarget::Text {
                text: text.into(),
                all: false,
                case_sensitive: true,
            },
            include_ext: false,
        }
    }

    pub fn range(start: usize, count: usize) -> Self {
        Self {
            target: DeleteTarget::Range {
                start,
                count,
                from_end: false,
            },
            include_ext: false,
        }
    }

    pub fn apply(&self, input: &str) -> Result<String, RuleError> {
        match &self.target {
            DeleteTarget::Text {
                text,
                all,
                case_sensitive,
            } => {
                if text.is_empty() {
                    return Ok(input.to_string());
                }
                let re = RegexBuilder::new(&regex::escape(text))
                    .case_insensitive(!case_sensitive)
                    .build()
                    .map_err(|e| RuleError::InvalidPattern {
                        pattern: text.clone(),
                        reason: e.to_string(),
                    })?;
                let limit = if *all { 0 } else { 1 };
                Ok(re.replacen(input, limit, "").into_owned())
            }
            DeleteTarget::Range {
                start,
                count,
                from_end,
            } => {
                let chars: Vec<char> = input.chars().collect();
                let len = chars.len();
                let (begin, end) = if *from_end {
                    let end = len.saturating_sub(*start);
                    (end.saturating_sub(*count), end)
                } else {
                    let begin = (*start).min(len);
                    (begin, begin.saturating_add(*count).min(len))
                };
                Ok(chars[..begin].iter().chain(&chars[end..]).collect())
            }
        }
    }
}

pub struct DeleteDefinition;

impl RuleDefinition for DeleteDefinition {
    fn kind(&self) -> RuleKind {
        RuleKind::Delete
    }

    fn label(&self) -> &'static str {
        "Delete"
    }

    fn default_info(&self) -> RuleInfo {
        RuleInfo::Delete(DeleteInfo::default())
    }

    fn describe(&self, info: &RuleInfo) -> String {
        let RuleInfo::Delete(info) = info else {
            return String::new();
        };
        match &info.target {
            DeleteTarget::Text { text, all, .. } => {
                let scope = if *all { "every" } else { "first" };
                format!("Delete {} \"{}\"", scope, text)
            }
            DeleteTarget::Range {
                start,
                count,
                from_end,
            } => {
                let anchor = if *from_end { "from the end" } else { "from the start" };
                format!("Delete {} character(s), {} {}", count, start, anchor)
            }
        }
    }

    fn exec(&self, info: &RuleInfo, args: &ExecArgs<'_>) -> Result<String, RuleError> {
        let RuleInfo::Delete(info) = info else {
            return Err(info_mismatch(RuleKind::Delete, info));
        };
        info.apply(args.input(info.include_ext))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deletes_first_occurrence() {
        assert_eq!(DeleteInfo::text("-").apply("a-b-c").unwrap(), "ab-c");
    }

    #[test]
    fn deletes_every_occurrence_ignoring_case() {
        let info = DeleteInfo {
            target: DeleteTarget::Text {
                text: "copy".into(),
                all: true,
                case_sensitive: false,
            },
            include_ext: false,
        };
        assert_eq!(info.apply("a Copy b COPY").unwrap(), "a  b ");
    }

    #[test]
    fn deletes_range_from_start() {
        assert_eq!(DeleteInfo::range(0, 4).apply("IMG_0042").unwrap(), "0042");
    }

    #[test]
    fn deletes_range_from_end() {
        let info = DeleteInfo {
            target: DeleteTarget::Range {
                start: 0,
                count: 5,
                from_end: true,
            },
            include_ext: false,
        };
        assert_eq!(info.apply("report_final").unwrap(), "report_");
    }

    #[test]
    fn range_clamps_and_counts_characters() {
        assert_eq!(DeleteInfo::range(10, 3).apply("short").unwrap(), "short");
        assert_eq!(DeleteInfo::range(1, 100).apply("日本語").unwrap(), "日");
    }
}
