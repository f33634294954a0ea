//! Renamer configuration.

use crate::core::executor::ExecutorConfig;
use crate::core::history::{UndoMode, DEFAULT_HISTORY_CAPACITY};
use crate::core::rules::ScriptLimits;
use crate::core::sort::SortConfig;
use crate::error::{RenamerError, Result};
use serde::{Deserialize, Serialize};

/// Everything a host can tune; every field has a default
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenamerConfig {
    pub executor: ExecutorConfig,
    /// Number of batches kept for undo
    pub history_capacity: usize,
    pub undo_mode: UndoMode,
    /// Order used when the caller does not pass one
    pub default_sort: SortConfig,
    pub script_limits: ScriptLimits,
}

impl Default for RenamerConfig {
    fn default() -> Self {
        Self {
            executor: ExecutorConfig::default(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            undo_mode: UndoMode::Direct,
            default_sort: SortConfig::default(),
            script_limits: ScriptLimits::default(),
        }
    }
}

impl RenamerConfig {
    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| RenamerError::Config(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| RenamerError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::executor::CommitPolicy;
    use crate::core::sort::{SortKey, SortOrder};

    #[test]
    fn empty_json_gives_defaults() {
        assert_eq!(RenamerConfig::from_json("{}").unwrap(), RenamerConfig::default());
    }

    #[test]
    fn partial_json_overrides_fields() {
        let config = RenamerConfig::from_json(
            r#"{
                "executor": { "commit_policy": "all_or_nothing" },
                "history_capacity": 3,
                "undo_mode": "staged",
                "default_sort": { "key": "name", "order": "desc" },
                "script_limits": { "max_steps": 50 }
            }"#,
        )
        .unwrap();

        assert_eq!(config.executor.commit_policy, CommitPolicy::AllOrNothing);
        assert_eq!(config.executor.temp_prefix, ExecutorConfig::default().temp_prefix);
        assert_eq!(config.history_capacity, 3);
        assert_eq!(config.undo_mode, UndoMode::Staged);
        assert_eq!(config.default_sort, SortConfig::new(SortKey::Name, SortOrder::Desc));
        assert_eq!(config.script_limits.max_steps, 50);
        assert_eq!(config.script_limits.max_depth, 64);
    }

    #[test]
    fn invalid_json_is_config_error() {
        assert!(matches!(
            RenamerConfig::from_json(r#"{"undo_mode": "sideways"}"#),
            Err(RenamerError::Config(_))
        ));
    }

    #[test]
    fn json_roundtrip() {
        let config = RenamerConfig {
            history_capacity: 4,
            ..RenamerConfig::default()
        };
        let back = RenamerConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(back, config);
    }
}
