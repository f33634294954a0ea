//! # Lists Module
//!
//! Named target-name lists consumed by the map rule.
//!
//! Lists live in two places: as reusable templates in a `ListLibrary`, and
//! as copies embedded in individual map rules. Every crossing between the
//! two is a value copy, so editing a rule's list never touches the
//! template and vice versa, except through `ListLibrary::overwrite_template`.

use serde::{Deserialize, Serialize};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// An ordered list of target names
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListConfig {
    pub name: String,
    pub target_names: Vec<String>,
}

impl ListConfig {
    pub fn new<I, S>(name: impl Into<String>, target_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            target_names: target_names.into_iter().map(Into::into).collect(),
        }
    }

    /// Build from pasted text: one name per line, blank lines dropped
    pub fn from_lines(name: impl Into<String>, text: &str) -> Self {
        Self::new(
            name,
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty()),
        )
    }

    pub fn len(&self) -> usize {
        self.target_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.target_names.is_empty()
    }
}

/// Shared library of list templates
#[derive(Debug, Default)]
pub struct ListLibrary {
    templates: RwLock<Vec<ListConfig>>,
}

impl ListLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_templates(templates: Vec<ListConfig>) -> Self {
        Self {
            templates: RwLock::new(templates),
        }
    }

    /// A copy of the named template
    pub fn template(&self, name: &str) -> Option<ListConfig> {
        self.read().iter().find(|t| t.name == name).cloned()
    }

    /// A copy of the first template, used to seed new map rules
    pub fn first(&self) -> Option<ListConfig> {
        self.read().first().cloned()
    }

    /// Copies of every template
    pub fn templates(&self) -> Vec<ListConfig> {
        self.read().clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.read().iter().map(|t| t.name.clone()).collect()
    }

    /// Store a copy of `list`, replacing any template with the same name.
    ///
    /// Returns true when an existing template was replaced.
    pub fn overwrite_template(&self, list: &ListConfig) -> bool {
        let mut templates = self.write();
        match templates.iter_mut().find(|t| t.name == list.name) {
            Some(existing) => {
                *existing = list.clone();
                true
            }
            None => {
                templates.push(list.clone());
                false
            }
        }
    }

    pub fn remove_template(&self, name: &str) -> bool {
        let mut templates = self.write();
        let before = templates.len();
        templates.retain(|t| t.name != name);
        templates.len() != before
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<ListConfig>> {
        self.templates.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<ListConfig>> {
        self.templates.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
