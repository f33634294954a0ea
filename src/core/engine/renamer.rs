//! The `Renamer` facade used by GUI shells.

use super::config::RenamerConfig;
use crate::core::executor::{
    BatchOutcome, CommitPolicy, FilePreview, RenameExecutor, RenamePlan, RenamePlanner,
    RenameRequest,
};
use crate::core::file::FileInfo;
use crate::core::fs::{FileSystem, LocalFileSystem};
use crate::core::history::{UndoBatch, UndoLog, UndoMode, UndoOutcome};
use crate::core::lists::ListLibrary;
use crate::core::pipeline::execute_rules;
use crate::core::rules::{ExecArgs, Profile, Rule, RuleRegistry, ScriptLimits};
use crate::core::sort::{display_positions, get_sorted_file_indices, SortConfig};
use crate::error::{FsError, Result, RuleError};
use crate::events::{null_sender, EventSender};
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Builder for a `Renamer`
pub struct RenamerBuilder {
    config: RenamerConfig,
    fs: Option<Arc<dyn FileSystem>>,
    library: Option<Arc<ListLibrary>>,
    registry: Option<Arc<RuleRegistry>>,
    events: Option<EventSender>,
}

impl RenamerBuilder {
    /// Create a new renamer builder
    pub fn new() -> Self {
        Self {
            config: RenamerConfig::default(),
            fs: None,
            library: None,
            registry: None,
            events: None,
        }
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: RenamerConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the host filesystem (local disk by default)
    pub fn filesystem(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = Some(fs);
        self
    }

    /// Share a list library with the map rule
    pub fn list_library(mut self, library: Arc<ListLibrary>) -> Self {
        self.library = Some(library);
        self
    }

    /// Use a custom registry instead of the built-in rules
    pub fn registry(mut self, registry: Arc<RuleRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Send batch and undo events to `events`
    pub fn events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    pub fn temp_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.executor.temp_prefix = prefix.into();
        self
    }

    pub fn commit_policy(mut self, policy: CommitPolicy) -> Self {
        self.config.executor.commit_policy = policy;
        self
    }

    pub fn history_capacity(mut self, capacity: usize) -> Self {
        self.config.history_capacity = capacity;
        self
    }

    pub fn undo_mode(mut self, mode: UndoMode) -> Self {
        self.config.undo_mode = mode;
        self
    }

    pub fn default_sort(mut self, sort: SortConfig) -> Self {
        self.config.default_sort = sort;
        self
    }

    pub fn script_limits(mut self, limits: ScriptLimits) -> Self {
        self.config.script_limits = limits;
        self
    }

    /// Build the renamer
    pub fn build(self) -> Renamer {
        let fs = self
            .fs
            .unwrap_or_else(|| Arc::new(LocalFileSystem::new()));
        let library = self.library.unwrap_or_default();
        let registry = self.registry.unwrap_or_else(|| {
            Arc::new(RuleRegistry::with_builtin_rules(
                library.clone(),
                self.config.script_limits,
            ))
        });

        Renamer {
            executor: RenameExecutor::new(fs.clone(), self.config.executor.clone()),
            history: Mutex::new(UndoLog::new(self.config.history_capacity)),
            events: self.events.unwrap_or_else(null_sender),
            config: self.config,
            fs,
            library,
            registry,
        }
    }
}

impl Default for RenamerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Entry point for previewing, executing and undoing renames
pub struct Renamer {
    config: RenamerConfig,
    fs: Arc<dyn FileSystem>,
    library: Arc<ListLibrary>,
    registry: Arc<RuleRegistry>,
    executor: RenameExecutor,
    history: Mutex<UndoLog>,
    events: EventSender,
}

impl Renamer {
    /// Create a new renamer builder
    pub fn builder() -> RenamerBuilder {
        RenamerBuilder::new()
    }

    pub fn config(&self) -> &RenamerConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<RuleRegistry> {
        &self.registry
    }

    pub fn lists(&self) -> &Arc<ListLibrary> {
        &self.library
    }

    /// New name of one file under `rules`; disabled rules are ignored
    pub fn compute_preview(
        &self,
        rules: &[Rule],
        file_info: &FileInfo,
        index: usize,
        total: usize,
    ) -> std::result::Result<String, RuleError> {
        let enabled: Vec<Rule> = rules.iter().filter(|r| r.enabled).cloned().collect();
        execute_rules(&self.registry, &enabled, &ExecArgs::new(file_info, index, total))
    }

    /// Rule view of every path, read in parallel
    pub fn file_infos(&self, paths: &[PathBuf]) -> std::result::Result<Vec<FileInfo>, FsError> {
        paths
            .par_iter()
            .map(|path| FileInfo::from_path(self.fs.as_ref(), path))
            .collect()
    }

    /// Display order of `paths`; the load order when any file cannot be read
    pub fn resolve_display_order(&self, paths: &[PathBuf], sort: SortConfig) -> Vec<usize> {
        match self.file_infos(paths) {
            Ok(infos) => get_sorted_file_indices(&infos, sort),
            Err(e) => {
                warn!(error = %e, "Cannot read file metadata, using load order");
                (0..paths.len()).collect()
            }
        }
    }

    /// `resolve_display_order` with the configured default sort
    pub fn resolve_display_order_default(&self, paths: &[PathBuf]) -> Vec<usize> {
        self.resolve_display_order(paths, self.config.default_sort)
    }

    /// Previews of every file, in display order
    pub fn preview_batch(
        &self,
        rules: &[Rule],
        paths: &[PathBuf],
        sort: SortConfig,
    ) -> Vec<FilePreview> {
        let (infos, order) = match self.file_infos(paths) {
            Ok(infos) => {
                let order = get_sorted_file_indices(&infos, sort);
                (infos, order)
            }
            Err(e) => {
                warn!(error = %e, "Cannot read file metadata, using load order");
                let infos = paths
                    .iter()
                    .map(|path| FileInfo::from_name(&file_name(path)))
                    .collect();
                (infos, (0..paths.len()).collect())
            }
        };

        let positions = display_positions(&order);
        let total = paths.len();
        let mut previews: Vec<FilePreview> = order
            .par_iter()
            .map(|&original| {
                let info = &infos[original];
                let display_index = positions[original];
                FilePreview {
                    original_index: original,
                    display_index,
                    path: paths[original].clone(),
                    current_name: info.full_name.clone(),
                    preview: self.compute_preview(rules, info, display_index, total),
                }
            })
            .collect();
        previews.sort_by_key(|p| p.display_index);
        debug!(files = previews.len(), "Computed previews");
        previews
    }

    /// `preview_batch` with the configured default sort
    pub fn preview_batch_default(&self, rules: &[Rule], paths: &[PathBuf]) -> Vec<FilePreview> {
        self.preview_batch(rules, paths, self.config.default_sort)
    }

    /// Operations for `previews`, with manual names keyed by original index
    pub fn plan_batch(
        &self,
        previews: &[FilePreview],
        overrides: &HashMap<usize, String>,
    ) -> RenamePlan {
        RenamePlanner::plan(previews, overrides)
    }

    /// Validate and run explicit rename requests
    pub fn plan_and_execute_batch(&self, requests: &[RenameRequest]) -> Result<BatchOutcome> {
        self.execute_plan(RenamePlanner::from_requests(requests))
    }

    /// Run a plan and record its committed renames for undo
    pub fn execute_plan(&self, plan: RenamePlan) -> Result<BatchOutcome> {
        let outcome = self.executor.execute(plan, &self.events)?;
        if let Some(batch) = &outcome.undo_batch {
            self.log().push(batch.clone());
        }
        Ok(outcome)
    }

    /// Preview, plan and execute the enabled rules of `profile`
    pub fn execute_profile(
        &self,
        profile: &Profile,
        paths: &[PathBuf],
        sort: SortConfig,
        overrides: &HashMap<usize, String>,
    ) -> Result<BatchOutcome> {
        info!(profile = %profile.name, files = paths.len(), "Executing profile");
        let previews = self.preview_batch(&profile.enabled_rules(), paths, sort);
        self.execute_plan(self.plan_batch(&previews, overrides))
    }

    /// User-facing summary of `outcome`, listing at most
    /// `max_failed_listed` failed files
    pub fn summary(&self, outcome: &BatchOutcome) -> String {
        outcome.summary(self.config.executor.max_failed_listed)
    }

    /// Undo a recorded batch. Unknown ids are a no-op.
    pub fn undo(&self, batch_id: &str) -> UndoOutcome {
        let Some(batch) = self.log().pop(batch_id) else {
            debug!(batch = %batch_id, "Nothing to undo");
            return UndoOutcome::not_found(batch_id);
        };
        match self.config.undo_mode {
            UndoMode::Direct => self.executor.undo_direct(&batch, &self.events),
            UndoMode::Staged => self.executor.undo_staged(&batch, &self.events),
        }
    }

    /// Undo the most recent batch, if any
    pub fn undo_latest(&self) -> Option<UndoOutcome> {
        let latest = self.log().peek_latest().map(|b| b.id.clone())?;
        Some(self.undo(&latest))
    }

    /// Recorded batches, newest first
    pub fn history(&self) -> Vec<UndoBatch> {
        self.log().batches()
    }

    pub fn clear_history(&self) {
        self.log().clear();
    }

    /// Every file under `folder`, sorted, without this renamer's temp files
    pub fn rescan(&self, folder: &Path) -> std::result::Result<Vec<PathBuf>, FsError> {
        let temp_marker = format!(".{}-", self.config.executor.temp_prefix);
        let mut files: Vec<PathBuf> = self
            .fs
            .walk_files(folder)?
            .into_iter()
            .filter(|path| !file_name(path).starts_with(&temp_marker))
            .collect();
        files.sort();
        Ok(files)
    }

    fn log(&self) -> MutexGuard<'_, UndoLog> {
        self.history.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fs::InMemoryFileSystem;
    use crate::core::rules::{InsertInfo, InsertPosition, ReplaceInfo, RuleInfo};
    use crate::core::sort::{SortKey, SortOrder};
    use std::time::{Duration, UNIX_EPOCH};

    fn renamer_with(paths: &[&str]) -> (Arc<InMemoryFileSystem>, Renamer) {
        let fs = Arc::new(InMemoryFileSystem::with_files(paths.iter().copied()));
        let renamer = Renamer::builder().filesystem(fs.clone()).build();
        (fs, renamer)
    }

    fn paths(list: &[&str]) -> Vec<PathBuf> {
        list.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn compute_preview_skips_disabled_rules() {
        let (_fs, renamer) = renamer_with(&[]);
        let rules = vec![
            Rule::new(RuleInfo::Replace(ReplaceInfo::literal("foo", "bar"))),
            Rule::new(RuleInfo::Insert(InsertInfo::text("x", InsertPosition::Start))).disabled(),
        ];
        let info = FileInfo::from_name("foo.txt");
        assert_eq!(renamer.compute_preview(&rules, &info, 0, 1).unwrap(), "bar.txt");
    }

    #[test]
    fn display_order_falls_back_to_load_order() {
        let (fs, renamer) = renamer_with(&["/d/b.txt"]);
        fs.add_file("/d/a.txt", Some(UNIX_EPOCH + Duration::from_secs(5)));
        let sort = SortConfig::new(SortKey::Name, SortOrder::Asc);

        let loaded = paths(&["/d/b.txt", "/d/a.txt"]);
        assert_eq!(renamer.resolve_display_order(&loaded, sort), vec![1, 0]);
        let with_missing = paths(&["/d/b.txt", "/d/missing.txt", "/d/a.txt"]);
        assert_eq!(renamer.resolve_display_order(&with_missing, sort), vec![0, 1, 2]);
    }

    #[test]
    fn preview_batch_indexes_by_display_position() {
        let (_fs, renamer) = renamer_with(&["/d/b.txt", "/d/a.txt"]);
        let rules = vec![Rule::new(RuleInfo::Insert(InsertInfo::counter(
            1,
            1,
            2,
            InsertPosition::Start,
        )))];

        let previews = renamer.preview_batch(
            &rules,
            &paths(&["/d/b.txt", "/d/a.txt"]),
            SortConfig::new(SortKey::Name, SortOrder::Asc),
        );

        assert_eq!(previews[0].current_name, "a.txt");
        assert_eq!(previews[0].preview_name(), Some("01a.txt"));
        assert_eq!(previews[1].preview_name(), Some("02b.txt"));
        assert_eq!(previews[1].original_index, 0);
    }

    #[test]
    fn execute_records_history_and_undo_restores() {
        let (fs, renamer) = renamer_with(&["/d/a.txt"]);

        let outcome = renamer
            .plan_and_execute_batch(&[RenameRequest::new("/d/a.txt", "b.txt")])
            .unwrap();
        assert_eq!(renamer.history().len(), 1);
        assert!(fs.contains("/d/b.txt"));

        let undo = renamer.undo(&outcome.batch_id);
        assert!(undo.found);
        assert_eq!(undo.succeeded, 1);
        assert!(fs.contains("/d/a.txt"));

        let again = renamer.undo(&outcome.batch_id);
        assert!(!again.found);
        assert_eq!(again.succeeded, 0);
        assert!(renamer.undo_latest().is_none());
    }

    #[test]
    fn default_sort_comes_from_config() {
        let fs = Arc::new(InMemoryFileSystem::with_files(["/d/b.txt", "/d/a.txt"]));
        let renamer = Renamer::builder()
            .filesystem(fs)
            .default_sort(SortConfig::new(SortKey::Name, SortOrder::Desc))
            .build();
        let loaded = paths(&["/d/a.txt", "/d/b.txt"]);

        assert_eq!(renamer.resolve_display_order_default(&loaded), vec![1, 0]);
        let previews = renamer.preview_batch_default(&[], &loaded);
        assert_eq!(previews[0].current_name, "b.txt");
    }

    #[test]
    fn summary_uses_configured_failure_limit() {
        let fs = Arc::new(InMemoryFileSystem::with_files(["/d/a.txt", "/d/b.txt", "/d/c.txt"]));
        fs.fail_renames_from("/d/a.txt");
        fs.fail_renames_from("/d/b.txt");
        fs.fail_renames_from("/d/c.txt");
        let mut config = RenamerConfig::default();
        config.executor.max_failed_listed = 1;
        let renamer = Renamer::builder().filesystem(fs).config(config).build();

        let outcome = renamer
            .plan_and_execute_batch(&[
                RenameRequest::new("/d/a.txt", "x.txt"),
                RenameRequest::new("/d/b.txt", "y.txt"),
                RenameRequest::new("/d/c.txt", "z.txt"),
            ])
            .unwrap();

        let text = renamer.summary(&outcome);
        assert!(text.starts_with("Renamed 0 file(s), 3 failed"));
        assert!(text.contains("... and 2 more"));
    }

    #[test]
    fn rescan_hides_temp_files() {
        let (_fs, renamer) =
            renamer_with(&["/d/a.txt", "/d/.renaming-abcd-0.txt", "/d/sub/b.txt"]);
        let found = renamer.rescan(Path::new("/d")).unwrap();
        assert_eq!(found, paths(&["/d/a.txt", "/d/sub/b.txt"]));
    }
}
