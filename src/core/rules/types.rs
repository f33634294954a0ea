//! Types shared by every rule kind.

use super::delete::DeleteInfo;
use super::format::FormatInfo;
use super::insert::InsertInfo;
use super::map::MapInfo;
use super::replace::ReplaceInfo;
use super::script::ScriptInfo;
use super::template::TemplateInfo;
use crate::core::file::FileInfo;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// The closed set of rule kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Replace,
    Delete,
    Format,
    Template,
    Insert,
    Map,
    Script,
}

impl RuleKind {
    pub const ALL: [RuleKind; 7] = [
        RuleKind::Replace,
        RuleKind::Delete,
        RuleKind::Format,
        RuleKind::Template,
        RuleKind::Insert,
        RuleKind::Map,
        RuleKind::Script,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Replace => "replace",
            Self::Delete => "delete",
            Self::Format => "format",
            Self::Template => "template",
            Self::Insert => "insert",
            Self::Map => "map",
            Self::Script => "script",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific rule settings; the variant is the rule's type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleInfo {
    Replace(ReplaceInfo),
    Delete(DeleteInfo),
    Format(FormatInfo),
    Template(TemplateInfo),
    Insert(InsertInfo),
    Map(MapInfo),
    Script(ScriptInfo),
}

impl RuleInfo {
    pub fn kind(&self) -> RuleKind {
        match self {
            Self::Replace(_) => RuleKind::Replace,
            Self::Delete(_) => RuleKind::Delete,
            Self::Format(_) => RuleKind::Format,
            Self::Template(_) => RuleKind::Template,
            Self::Insert(_) => RuleKind::Insert,
            Self::Map(_) => RuleKind::Map,
            Self::Script(_) => RuleKind::Script,
        }
    }

    /// When true the rule produces the complete file name itself;
    /// otherwise it works on the stem and the pipeline re-attaches the
    /// original extension.
    pub fn include_ext(&self) -> bool {
        match self {
            Self::Replace(i) => i.include_ext,
            Self::Delete(i) => i.include_ext,
            Self::Format(i) => i.include_ext,
            Self::Template(i) => i.include_ext,
            Self::Insert(i) => i.include_ext,
            Self::Map(i) => i.include_ext,
            Self::Script(i) => i.include_ext,
        }
    }
}

/// Widest padding a rule will produce, in characters
pub const MAX_PAD_WIDTH: usize = 255;

/// One step of a renaming pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    pub info: RuleInfo,
}

fn enabled_by_default() -> bool {
    true
}

impl Rule {
    /// A new enabled, unnamed rule with a fresh id
    pub fn new(info: RuleInfo) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: String::new(),
            enabled: true,
            info,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn kind(&self) -> RuleKind {
        self.info.kind()
    }
}

/// An ordered rule list, as the UI manages it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl Profile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            rules: Vec::new(),
        }
    }

    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Enabled rules in pipeline order
    pub fn enabled_rules(&self) -> Vec<Rule> {
        self.rules.iter().filter(|r| r.enabled).cloned().collect()
    }

    /// Move the rule at `from` so it ends up at `to`
    pub fn move_rule(&mut self, from: usize, to: usize) -> bool {
        if from >= self.rules.len() || to >= self.rules.len() {
            return false;
        }
        let rule = self.rules.remove(from);
        self.rules.insert(to, rule);
        true
    }
}

/// What a rule's `exec` receives for one file
#[derive(Debug, Clone, Copy)]
pub struct ExecArgs<'a> {
    pub file_info: &'a FileInfo,
    /// Position of the file in the current display order
    pub index: usize,
    /// Number of files in the display order
    pub total: usize,
}

impl<'a> ExecArgs<'a> {
    pub fn new(file_info: &'a FileInfo, index: usize, total: usize) -> Self {
        Self {
            file_info,
            index,
            total,
        }
    }

    /// The text a rule edits: the full name or just the stem
    pub fn input(&self, include_ext: bool) -> &'a str {
        if include_ext {
            &self.file_info.full_name
        } else {
            &self.file_info.name
        }
    }
}
