//! # Error Module
//!
//! User-friendly error types for the batch renamer.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, rule types, script positions
//! - **Per-file errors stay per-file** - only conflicts block a whole batch
//! - **Recovery hints** - say what the user must fix by hand when we can't

use crate::core::conflict::ConflictReport;
use crate::core::rules::RuleKind;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum RenamerError {
    #[error("Rule error: {0}")]
    Rule(#[from] RuleError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Filesystem error: {0}")]
    Filesystem(#[from] FsError),

    #[error("Batch blocked by {} naming conflict(s); nothing was renamed", .0.conflicts.len())]
    Conflict(ConflictReport),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors raised while building the rule registry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Rule type '{kind}' is already registered")]
    DuplicateDefinition { kind: RuleKind },
}

/// Errors that occur while evaluating a rule for one file
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuleError {
    #[error("No definition registered for rule type '{kind}'")]
    NotRegistered { kind: RuleKind },

    #[error("Rule definition for '{expected}' received '{found}' settings")]
    InfoMismatch { expected: RuleKind, found: RuleKind },

    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Malformed template '{template}': {reason}")]
    MalformedTemplate { template: String, reason: String },

    #[error("Script failed: {0}")]
    Script(#[from] ScriptError),
}

/// Errors raised by the sandboxed script interpreter
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScriptError {
    #[error("Syntax error at {line}:{column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Unknown name '{name}'")]
    UnknownName { name: String },

    #[error("Unknown function '{name}'")]
    UnknownFunction { name: String },

    #[error("'{operation}' expected {expected}, got {found}")]
    TypeMismatch {
        operation: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("'{operation}' expects {expected} argument(s), got {found}")]
    Arity {
        operation: String,
        expected: String,
        found: usize,
    },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Script exceeded the limit of {limit} evaluation steps")]
    StepLimit { limit: usize },

    #[error("Script nesting exceeded the limit of {limit} levels")]
    DepthLimit { limit: usize },

    #[error("Script string exceeded the limit of {limit} characters")]
    OutputLimit { limit: usize },

    #[error("Script must return a string, got {found}")]
    NotAString { found: &'static str },

    #[error("Invalid form: {message}")]
    InvalidForm { message: String },
}

/// Errors reported by the host filesystem capability
#[derive(Error, Debug)]
pub enum FsError {
    #[error("File not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Refusing to overwrite existing file: {path}")]
    AlreadyExists { path: PathBuf },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Operation not supported by this filesystem: {operation}")]
    Unsupported { operation: &'static str },

    #[error("Simulated failure on {path}: {message}")]
    Injected { path: PathBuf, message: String },
}

impl FsError {
    /// Map an I/O error onto the most specific variant for `path`
    pub fn from_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            io::ErrorKind::NotFound => FsError::NotFound { path },
            io::ErrorKind::AlreadyExists => FsError::AlreadyExists { path },
            _ => FsError::Io { path, source },
        }
    }
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, RenamerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_error_includes_path() {
        let error = FsError::NotFound {
            path: PathBuf::from("/photos/holiday.jpg"),
        };
        assert!(error.to_string().contains("/photos/holiday.jpg"));
    }

    #[test]
    fn from_io_maps_not_found() {
        let error = FsError::from_io(
            "/missing.txt",
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(error, FsError::NotFound { .. }));

        let error = FsError::from_io(
            "/locked.txt",
            io::Error::new(io::ErrorKind::PermissionDenied, "nope"),
        );
        assert!(matches!(error, FsError::Io { .. }));
    }

    #[test]
    fn script_parse_error_includes_position() {
        let error = ScriptError::Parse {
            line: 3,
            column: 7,
            message: "unterminated string".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("3:7"));
        assert!(message.contains("unterminated string"));
    }

    #[test]
    fn rule_error_names_the_rule_type() {
        let error = RuleError::NotRegistered {
            kind: RuleKind::Script,
        };
        assert!(error.to_string().contains("script"));
    }
}
