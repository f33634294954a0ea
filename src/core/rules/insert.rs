//! Insertion of fixed text or a counter.

use super::registry::{info_mismatch, RuleDefinition};
use super::types::{ExecArgs, RuleInfo, RuleKind, MAX_PAD_WIDTH};
use crate::error::RuleError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InsertContent {
    Text { text: String },
    /// `start + index * step`, zero-padded to `width`
    Counter {
        #[serde(default)]
        start: i64,
        #[serde(default = "default_step")]
        step: i64,
        #[serde(default)]
        width: usize,
    },
}

fn default_step() -> i64 {
    1
}

/// Where the content goes; positions count characters and clamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertPosition {
    Start,
    End,
    At(usize),
    FromEnd(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertInfo {
    pub content: InsertContent,
    pub position: InsertPosition,
    #[serde(default)]
    pub include_ext: bool,
}

impl Default for InsertInfo {
    fn default() -> Self {
        Self::text("", InsertPosition::Start)
    }
}

impl InsertInfo {
    pub fn text(text: impl Into<String>, position: InsertPosition) -> Self {
        Self {
            content: InsertContent::Text { text: text.into() },
            position,
            include_ext: false,
        }
    }

    pub fn counter(start: i64, step: i64, width: usize, position: InsertPosition) -> Self {
        Self {
            content: InsertContent::Counter { start, step, width },
            position,
            include_ext: false,
        }
    }

    pub fn apply(&self, input: &str, index: usize) -> String {
        let content = match &self.content {
            InsertContent::Text { text } => text.clone(),
            InsertContent::Counter { start, step, width } => {
                let index = i64::try_from(index).unwrap_or(i64::MAX);
                let value = start.saturating_add(step.saturating_mul(index));
                let width = (*width).min(MAX_PAD_WIDTH);
                if value < 0 {
                    let digits = width.saturating_sub(1);
                    format!("-{:0digits$}", value.unsigned_abs())
                } else {
                    format!("{:0width$}", value)
                }
            }
        };

        let len = input.chars().count();
        let at = match self.position {
            InsertPosition::Start => 0,
            InsertPosition::End => len,
            InsertPosition::At(n) => n.min(len),
            InsertPosition::FromEnd(n) => len.saturating_sub(n),
        };
        let byte = input
            .char_indices()
            .nth(at)
            .map(|(i, _)| i)
            .unwrap_or(input.len());

        let mut out = String::with_capacity(input.len() + content.len());
        out.push_str(&input[..byte]);
        out.push_str(&content);
        out.push_str(&input[byte..]);
        out
    }
}

pub struct InsertDefinition;

impl RuleDefinition for InsertDefinition {
    fn kind(&self) -> RuleKind {
        RuleKind::Insert
    }

    fn label(&self) -> &'static str {
        "Insert"
    }

    fn default_info(&self) -> RuleInfo {
        RuleInfo::Insert(InsertInfo::default())
    }

    fn describe(&self, info: &RuleInfo) -> String {
        let RuleInfo::Insert(info) = info else {
            return String::new();
        };
        let what = match &info.content {
            InsertContent::Text { text } => format!("\"{}\"", text),
            InsertContent::Counter { start, step, .. } => {
                format!("counter from {} step {}", start, step)
            }
        };
        let place = match info.position {
            InsertPosition::Start => "at the start".to_string(),
            InsertPosition::End => "at the end".to_string(),
            InsertPosition::At(n) => format!("at position {}", n),
            InsertPosition::FromEnd(n) => format!("{} from the end", n),
        };
        format!("Insert {} {}", what, place)
    }

    fn exec(&self, info: &RuleInfo, args: &ExecArgs<'_>) -> Result<String, RuleError> {
        let RuleInfo::Insert(info) = info else {
            return Err(info_mismatch(RuleKind::Insert, info));
        };
        Ok(info.apply(args.input(info.include_ext), args.index))
    }
}
