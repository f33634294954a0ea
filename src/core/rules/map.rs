//! Positional lookup into a list of target names.

use super::registry::{info_mismatch, RuleDefinition};
use super::types::{ExecArgs, RuleInfo, RuleKind};
use crate::core::lists::{ListConfig, ListLibrary};
use crate::error::RuleError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// The file at display position `i` takes `target_names[i]` of the active list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapInfo {
    /// Embedded copies, independent of the library templates
    pub lists: Vec<ListConfig>,
    pub active_list_index: usize,
    pub include_ext: bool,
}

impl MapInfo {
    pub fn with_list(list: ListConfig) -> Self {
        Self {
            lists: vec![list],
            ..Self::default()
        }
    }

    pub fn active_list(&self) -> Option<&ListConfig> {
        self.lists.get(self.active_list_index)
    }

    /// The mapped name, or `None` when the position has no target
    pub fn target_for(&self, index: usize) -> Option<&str> {
        let name = self.active_list()?.target_names.get(index)?;
        if name.trim().is_empty() {
            None
        } else {
            Some(name)
        }
    }

    pub fn add_list(&mut self, list: ListConfig) {
        self.lists.push(list);
    }

    /// Remove a list, keeping the active index pointing at a valid entry
    pub fn remove_list(&mut self, index: usize) -> Option<ListConfig> {
        if index >= self.lists.len() {
            return None;
        }
        let removed = self.lists.remove(index);
        if self.active_list_index > index || self.active_list_index >= self.lists.len() {
            self.active_list_index = self.active_list_index.saturating_sub(1);
        }
        Some(removed)
    }

    /// Copy a library template into this rule and make it active
    pub fn adopt_template(&mut self, library: &ListLibrary, name: &str) -> bool {
        let Some(template) = library.template(name) else {
            return false;
        };
        match self.lists.iter().position(|l| l.name == template.name) {
            Some(pos) => {
                self.lists[pos] = template;
                self.active_list_index = pos;
            }
            None => {
                self.lists.push(template);
                self.active_list_index = self.lists.len() - 1;
            }
        }
        true
    }

    /// Copy the active list out to the library, replacing the same-named template
    pub fn publish_active(&self, library: &ListLibrary) -> bool {
        match self.active_list() {
            Some(list) => {
                library.overwrite_template(list);
                true
            }
            None => false,
        }
    }
}

pub struct MapDefinition {
    library: Arc<ListLibrary>,
}

impl MapDefinition {
    pub fn new(library: Arc<ListLibrary>) -> Self {
        Self { library }
    }
}

impl RuleDefinition for MapDefinition {
    fn kind(&self) -> RuleKind {
        RuleKind::Map
    }

    fn label(&self) -> &'static str {
        "Map"
    }

    /// Seeded with a copy of the first library template when there is one
    fn default_info(&self) -> RuleInfo {
        let info = match self.library.first() {
            Some(list) => MapInfo::with_list(list),
            None => MapInfo::default(),
        };
        RuleInfo::Map(info)
    }

    fn describe(&self, info: &RuleInfo) -> String {
        let RuleInfo::Map(info) = info else {
            return String::new();
        };
        match info.active_list() {
            Some(list) => format!("Map to list \"{}\" ({} names)", list.name, list.len()),
            None => "Map (no list selected)".to_string(),
        }
    }

    fn exec(&self, info: &RuleInfo, args: &ExecArgs<'_>) -> Result<String, RuleError> {
        let RuleInfo::Map(info) = info else {
            return Err(info_mismatch(RuleKind::Map, info));
        };
        let input = args.input(info.include_ext);
        match info.target_for(args.index) {
            Some(target) => Ok(target.to_string()),
            None => {
                debug!(index = args.index, "No map target, keeping name");
                Ok(input.to_string())
            }
        }
    }
}
