//! # Conflict Module
//!
//! Pre-flight validation of a whole batch before anything is renamed.
//!
//! ## Checks
//! - `duplicate_rename` - several sources would end up at the same path
//! - `existing_file` - the target exists and is not itself being renamed
//! - `invalid_name` - the target is not a usable file name
//!
//! Every check runs to completion so the user sees all problems at once.

use crate::core::executor::RenameOperation;
use crate::core::fs::FileSystem;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    DuplicateRename,
    ExistingFile,
    InvalidName,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::DuplicateRename => "duplicate_rename",
            Self::ExistingFile => "existing_file",
            Self::InvalidName => "invalid_name",
        })
    }
}

/// One blocking problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub kind: ConflictKind,
    pub target_path: PathBuf,
    /// Every source involved
    pub sources: Vec<PathBuf>,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sources: Vec<String> = self
            .sources
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        match self.kind {
            ConflictKind::DuplicateRename => write!(
                f,
                "{} files would be renamed to {}: {}",
                self.sources.len(),
                self.target_path.display(),
                sources.join(", ")
            ),
            ConflictKind::ExistingFile => write!(
                f,
                "{} already exists (wanted by {})",
                self.target_path.display(),
                sources.join(", ")
            ),
            ConflictKind::InvalidName => write!(
                f,
                "'{}' is not a valid file name (wanted by {})",
                self.target_path.display(),
                sources.join(", ")
            ),
        }
    }
}

/// Whether the existing-file check could actually run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Performed,
    /// The host cannot list directories, or listing failed
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictReport {
    pub conflicts: Vec<Conflict>,
    pub existing_file_check: CheckStatus,
}

impl ConflictReport {
    pub fn is_blocking(&self) -> bool {
        !self.conflicts.is_empty()
    }

    pub fn count(&self, kind: ConflictKind) -> usize {
        self.conflicts.iter().filter(|c| c.kind == kind).count()
    }
}

/// Reasons a name can never be a file name in a directory
pub fn invalid_name_reason(name: &str) -> Option<&'static str> {
    if name.is_empty() {
        Some("empty name")
    } else if name == "." || name == ".." {
        Some("reserved name")
    } else if name.contains('/') || name.contains('\\') {
        Some("contains a path separator")
    } else if name.contains('\0') {
        Some("contains a NUL character")
    } else {
        None
    }
}

/// Validate every operation of a batch
pub fn detect_conflicts(fs: &dyn FileSystem, operations: &[RenameOperation]) -> ConflictReport {
    let mut conflicts = Vec::new();

    for op in operations {
        if let Some(reason) = invalid_name_reason(&op.target_name) {
            debug!(source = %op.source_path.display(), reason, "Invalid target name");
            conflicts.push(Conflict {
                kind: ConflictKind::InvalidName,
                target_path: PathBuf::from(&op.target_name),
                sources: vec![op.source_path.clone()],
            });
        }
    }

    // BTreeMap keeps the report order deterministic
    let mut by_target: BTreeMap<&Path, Vec<&Path>> = BTreeMap::new();
    for op in operations {
        by_target
            .entry(op.target_path.as_path())
            .or_default()
            .push(op.source_path.as_path());
    }
    for (target, sources) in &by_target {
        let distinct: HashSet<&Path> = sources.iter().copied().collect();
        if distinct.len() > 1 {
            conflicts.push(Conflict {
                kind: ConflictKind::DuplicateRename,
                target_path: target.to_path_buf(),
                sources: sources.iter().map(|p| p.to_path_buf()).collect(),
            });
        }
    }

    let existing_file_check = if fs.supports_listing() {
        check_existing(fs, operations, &mut conflicts)
    } else {
        debug!("Host cannot list directories, skipping existing-file check");
        CheckStatus::Skipped
    };

    ConflictReport {
        conflicts,
        existing_file_check,
    }
}

fn check_existing(
    fs: &dyn FileSystem,
    operations: &[RenameOperation],
    conflicts: &mut Vec<Conflict>,
) -> CheckStatus {
    let sources: HashSet<&Path> = operations.iter().map(|op| op.source_path.as_path()).collect();
    let mut listings: HashMap<PathBuf, HashSet<PathBuf>> = HashMap::new();
    let mut status = CheckStatus::Performed;
    let mut reported: HashSet<&Path> = HashSet::new();

    for op in operations {
        if invalid_name_reason(&op.target_name).is_some() {
            continue;
        }
        let dir = op
            .target_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        if !listings.contains_key(&dir) {
            match fs.list_dir(&dir) {
                Ok(entries) => {
                    listings.insert(dir.clone(), entries.into_iter().collect());
                }
                Err(e) => {
                    warn!(
                        dir = %dir.display(),
                        error = %e,
                        "Cannot list directory, existing-file check skipped"
                    );
                    status = CheckStatus::Skipped;
                    continue;
                }
            }
        }

        let exists = listings
            .get(&dir)
            .is_some_and(|entries| entries.contains(&op.target_path));
        if exists
            && !sources.contains(op.target_path.as_path())
            && reported.insert(op.target_path.as_path())
        {
            conflicts.push(Conflict {
                kind: ConflictKind::ExistingFile,
                target_path: op.target_path.clone(),
                sources: operations
                    .iter()
                    .filter(|other| other.target_path == op.target_path)
                    .map(|other| other.source_path.clone())
                    .collect(),
            });
        }
    }
    status
}
