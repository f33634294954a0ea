//! # Pipeline Module
//!
//! Applies an ordered list of rules to one file name.
//!
//! ## Steps
//! 1. Look up the rule's definition and run it on the current name
//! 2. Trim the result and re-attach the original extension unless the rule
//!    produces the full name itself (`include_ext`)
//! 3. Feed the new name to the next rule, keeping the file's time data
//!
//! The pipeline knows nothing about enabled/disabled rules; callers pass
//! only the rules that should run.

use crate::core::file::FileInfo;
use crate::core::rules::{ExecArgs, Rule, RuleRegistry};
use crate::error::RuleError;

/// Run one rule and apply the extension contract to its output
pub fn exec_rule(
    registry: &RuleRegistry,
    rule: &Rule,
    args: &ExecArgs<'_>,
) -> Result<String, RuleError> {
    let definition = registry.lookup(rule.kind())?;
    let output = definition.exec(&rule.info, args)?;
    let output = output.trim();

    if rule.info.include_ext() {
        Ok(output.to_string())
    } else {
        Ok(format!("{}{}", output, args.file_info.ext))
    }
}

/// Run `rules` in order, each on the previous rule's output.
///
/// No rules means the name is unchanged. The first failing rule fails the
/// whole pipeline; there is no partial result.
pub fn execute_rules(
    registry: &RuleRegistry,
    rules: &[Rule],
    args: &ExecArgs<'_>,
) -> Result<String, RuleError> {
    let mut current: Option<FileInfo> = None;
    let mut name = args.file_info.full_name.clone();

    for rule in rules {
        let file_info = current.as_ref().unwrap_or(args.file_info);
        let step_args = ExecArgs::new(file_info, args.index, args.total);
        name = exec_rule(registry, rule, &step_args)?;
        current = Some(file_info.renamed(&name));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lists::{ListConfig, ListLibrary};
    use crate::core::rules::{
        CaseStyle, FormatInfo, InsertInfo, InsertPosition, MapInfo, ReplaceInfo, RuleInfo,
        ScriptInfo, ScriptLimits, TemplateInfo,
    };
    use crate::error::ScriptError;
    use std::sync::Arc;

    fn registry() -> RuleRegistry {
        RuleRegistry::with_builtin_rules(Arc::new(ListLibrary::new()), ScriptLimits::default())
    }

    fn run(rules: &[Rule], name: &str, index: usize) -> Result<String, RuleError> {
        let file = FileInfo::from_name(name);
        execute_rules(&registry(), rules, &ExecArgs::new(&file, index, 10))
    }

    #[test]
    fn no_rules_is_identity() {
        assert_eq!(run(&[], "photo.jpg", 0).unwrap(), "photo.jpg");
    }

    #[test]
    fn replace_then_insert() {
        let rules = vec![
            Rule::new(RuleInfo::Replace(ReplaceInfo::literal("foo", "bar"))),
            Rule::new(RuleInfo::Insert(InsertInfo::text("001_", InsertPosition::At(0)))),
        ];
        assert_eq!(run(&rules, "foo.txt", 0).unwrap(), "001_bar.txt");
    }

    #[test]
    fn map_takes_positional_name() {
        let rules = vec![Rule::new(RuleInfo::Map(MapInfo::with_list(ListConfig::new(
            "l",
            ["x", "y"],
        ))))];
        assert_eq!(run(&rules, "orig.png", 1).unwrap(), "y.png");
    }

    #[test]
    fn extension_is_reattached_after_every_step() {
        let rules = vec![
            Rule::new(RuleInfo::Format(FormatInfo::case(CaseStyle::Upper))),
            Rule::new(RuleInfo::Template(TemplateInfo::new("{name}-{ext}"))),
        ];
        assert_eq!(run(&rules, "beach.Png", 0).unwrap(), "BEACH-Png.Png");
    }

    #[test]
    fn include_ext_output_is_the_full_name() {
        let rule = Rule::new(RuleInfo::Replace(ReplaceInfo {
            include_ext: true,
            ..ReplaceInfo::literal(".jpeg", ".jpg")
        }));
        assert_eq!(run(&[rule], "a.jpeg", 0).unwrap(), "a.jpg");
    }

    #[test]
    fn output_is_trimmed() {
        let rule = Rule::new(RuleInfo::Insert(InsertInfo::text("  ", InsertPosition::End)));
        assert_eq!(run(&[rule], "name.txt", 0).unwrap(), "name.txt");
    }

    #[test]
    fn failing_rule_fails_the_pipeline() {
        let rules = vec![
            Rule::new(RuleInfo::Replace(ReplaceInfo::literal("a", "b"))),
            Rule::new(RuleInfo::Script(ScriptInfo::new("(/ 1 0)"))),
        ];
        assert_eq!(
            run(&rules, "a.txt", 0),
            Err(RuleError::Script(ScriptError::DivisionByZero))
        );
    }

    #[test]
    fn unregistered_kind_fails_closed() {
        let file = FileInfo::from_name("a.txt");
        let rules = vec![Rule::new(RuleInfo::Replace(ReplaceInfo::literal("a", "b")))];
        let result = execute_rules(&RuleRegistry::new(), &rules, &ExecArgs::new(&file, 0, 1));
        assert!(matches!(result, Err(RuleError::NotRegistered { .. })));
    }

    #[test]
    fn later_steps_keep_time_data() {
        let file = FileInfo::from_name("a.txt").with_timestamp(Some(1_700_000_000));
        let rules = vec![
            Rule::new(RuleInfo::Replace(ReplaceInfo::literal("a", "b"))),
            Rule::new(RuleInfo::Script(ScriptInfo::new("(str name \"-\" timestamp)"))),
        ];
        let out = execute_rules(&registry(), &rules, &ExecArgs::new(&file, 0, 1)).unwrap();
        assert_eq!(out, "b-1700000000.txt");
    }
}
