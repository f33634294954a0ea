//! Rule definition registry.

use super::delete::DeleteDefinition;
use super::format::FormatDefinition;
use super::insert::InsertDefinition;
use super::map::MapDefinition;
use super::replace::ReplaceDefinition;
use super::script::{ScriptDefinition, ScriptLimits};
use super::template::TemplateDefinition;
use super::types::{ExecArgs, Rule, RuleInfo, RuleKind};
use crate::core::lists::ListLibrary;
use crate::error::{RegistryError, RuleError};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Behavior contract of one rule kind
pub trait RuleDefinition: Send + Sync {
    fn kind(&self) -> RuleKind;

    /// Static display name
    fn label(&self) -> &'static str;

    /// Settings for a freshly added rule. Never fails; falls back to a
    /// minimal default when its inputs are unavailable.
    fn default_info(&self) -> RuleInfo;

    /// One-line, side-effect-free summary of `info`
    fn describe(&self, info: &RuleInfo) -> String;

    /// Compute the new name (without extension handling) for one file
    fn exec(&self, info: &RuleInfo, args: &ExecArgs<'_>) -> Result<String, RuleError>;
}

/// Mapping from rule kind to its definition.
///
/// Built once at startup, then shared read-only behind an `Arc`.
#[derive(Default)]
pub struct RuleRegistry {
    definitions: BTreeMap<RuleKind, Box<dyn RuleDefinition>>,
}

impl RuleRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in rule kind
    pub fn with_builtin_rules(library: Arc<ListLibrary>, limits: ScriptLimits) -> Self {
        let builtins: [Box<dyn RuleDefinition>; 7] = [
            Box::new(ReplaceDefinition),
            Box::new(DeleteDefinition),
            Box::new(FormatDefinition),
            Box::new(TemplateDefinition),
            Box::new(InsertDefinition),
            Box::new(MapDefinition::new(library)),
            Box::new(ScriptDefinition::new(limits)),
        ];

        let mut registry = Self::new();
        for definition in builtins {
            registry.definitions.insert(definition.kind(), definition);
        }
        registry
    }

    /// Add a definition. Each kind can be registered once.
    pub fn register(&mut self, definition: Box<dyn RuleDefinition>) -> Result<(), RegistryError> {
        let kind = definition.kind();
        if self.definitions.contains_key(&kind) {
            return Err(RegistryError::DuplicateDefinition { kind });
        }
        self.definitions.insert(kind, definition);
        Ok(())
    }

    pub fn lookup(&self, kind: RuleKind) -> Result<&dyn RuleDefinition, RuleError> {
        self.definitions
            .get(&kind)
            .map(|definition| definition.as_ref())
            .ok_or(RuleError::NotRegistered { kind })
    }

    pub fn contains(&self, kind: RuleKind) -> bool {
        self.definitions.contains_key(&kind)
    }

    /// All definitions in canonical kind order
    pub fn definitions(&self) -> impl Iterator<Item = &dyn RuleDefinition> + '_ {
        self.definitions.values().map(|definition| definition.as_ref())
    }

    /// A new enabled rule of `kind` with its default settings
    pub fn default_rule(&self, kind: RuleKind) -> Result<Rule, RuleError> {
        Ok(Rule::new(self.lookup(kind)?.default_info()))
    }

    /// Summary of a rule for read-only listings
    pub fn describe(&self, rule: &Rule) -> Result<String, RuleError> {
        Ok(self.lookup(rule.kind())?.describe(&rule.info))
    }
}

/// The settings-variant mismatch error for definitions
pub(crate) fn info_mismatch(expected: RuleKind, found: &RuleInfo) -> RuleError {
    RuleError::InfoMismatch {
        expected,
        found: found.kind(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::file::FileInfo;

    struct Shout;

    impl RuleDefinition for Shout {
        fn kind(&self) -> RuleKind {
            RuleKind::Format
        }

        fn label(&self) -> &'static str {
            "Shout"
        }

        fn default_info(&self) -> RuleInfo {
            RuleInfo::Format(Default::default())
        }

        fn describe(&self, _info: &RuleInfo) -> String {
            "Shout the name".to_string()
        }

        fn exec(&self, _info: &RuleInfo, args: &ExecArgs<'_>) -> Result<String, RuleError> {
            Ok(args.file_info.name.to_uppercase())
        }
    }

    fn builtin() -> RuleRegistry {
        RuleRegistry::with_builtin_rules(Arc::new(ListLibrary::new()), ScriptLimits::default())
    }

    #[test]
    fn builtin_registry_has_every_kind() {
        let registry = builtin();
        for kind in RuleKind::ALL {
            assert!(registry.contains(kind), "missing {}", kind);
        }
        let kinds: Vec<_> = registry.definitions().map(|d| d.kind()).collect();
        assert_eq!(kinds, RuleKind::ALL.to_vec());
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut registry = builtin();
        let result = registry.register(Box::new(Shout));
        assert_eq!(
            result,
            Err(RegistryError::DuplicateDefinition {
                kind: RuleKind::Format
            })
        );
    }

    #[test]
    fn custom_registry_resolves_fake_rules() {
        let mut registry = RuleRegistry::new();
        registry.register(Box::new(Shout)).unwrap();

        let info = FileInfo::from_name("quiet.txt");
        let definition = registry.lookup(RuleKind::Format).unwrap();
        let out = definition
            .exec(&definition.default_info(), &ExecArgs::new(&info, 0, 1))
            .unwrap();

        assert_eq!(out, "QUIET");
        assert!(matches!(
            registry.lookup(RuleKind::Script),
            Err(RuleError::NotRegistered { .. })
        ));
    }

    #[test]
    fn default_rule_is_enabled_with_fresh_id() {
        let registry = builtin();
        let a = registry.default_rule(RuleKind::Insert).unwrap();
        let b = registry.default_rule(RuleKind::Insert).unwrap();
        assert!(a.enabled);
        assert_ne!(a.id, b.id);
        assert_eq!(a.kind(), RuleKind::Insert);
    }

    #[test]
    fn every_builtin_describes_its_default() {
        let registry = builtin();
        for definition in registry.definitions() {
            let info = definition.default_info();
            assert_eq!(info.kind(), definition.kind());
            assert!(!definition.describe(&info).is_empty());
            assert!(!definition.label().is_empty());
        }
    }
}
