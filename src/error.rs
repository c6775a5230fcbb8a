//! Error types for tsgen
//!
//! This module defines the error types used throughout tsgen, following
//! a hierarchical structure with specific error variants for different
//! error categories. Non-fatal outcomes of a run (match conflicts,
//! unresolved or ambiguous symbols) are not errors: they are collected as
//! diagnostics in the run result.

use crate::types::RuleKind;
use std::path::PathBuf;

/// Configuration-related errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid TOML syntax or shape
    #[error("Invalid configuration syntax: {0}")]
    Parse(#[from] toml::de::Error),

    /// Semantically invalid configuration value
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Inconsistencies in the static kind policy or load tables
///
/// These are detected at startup, before any generation happens.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    /// An attribute is listed under two mutually exclusive policy sets
    #[error("Attribute '{attr}' of kind '{kind}' is both {first} and {second}")]
    OverlappingCategories {
        kind: RuleKind,
        attr: String,
        first: &'static str,
        second: &'static str,
    },

    /// A kind has no policy entry
    #[error("No policy registered for kind '{0}'")]
    MissingPolicy(RuleKind),

    /// A kind has more than one policy entry
    #[error("Duplicate policy for kind '{0}'")]
    DuplicatePolicy(RuleKind),

    /// A kind has neither a load entry nor a no-import marker
    #[error("Kind '{0}' has no load entry and is not marked as needing no import")]
    MissingLoad(RuleKind),

    /// A kind is exported by more than one load entry, or is both loaded and no-import
    #[error("Kind '{0}' is mapped to more than one load source")]
    DuplicateLoad(RuleKind),
}

/// Errors reading or writing generation snapshots
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid snapshot {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to serialize snapshot output: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors from invoking the external build tool's shutdown operation
#[derive(Debug, thiserror::Error)]
pub enum ShutdownError {
    /// The build tool could not be started
    #[error("Failed to run '{program}': {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    /// The build tool exited with a non-zero exit code
    #[error("'{program} shutdown' exited with code {code}")]
    ExitCode { program: String, code: i32 },

    /// The build tool was terminated without an exit code
    #[error("'{program} shutdown' was terminated by a signal")]
    Terminated { program: String },
}

impl ShutdownError {
    /// Exit code to propagate to the caller's own process
    pub fn exit_code(&self) -> i32 {
        match self {
            ShutdownError::ExitCode { code, .. } => *code,
            ShutdownError::Spawn { .. } | ShutdownError::Terminated { .. } => 1,
        }
    }
}

/// Errors that abort a generation run
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// The run was cancelled between locations; partial state was discarded
    #[error("Generation run cancelled after {completed} of {total} locations")]
    Cancelled { completed: usize, total: usize },
}

/// Top-level error type for tsgen
#[derive(Debug, thiserror::Error)]
pub enum TsgenError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Policy inconsistency: {0}")]
    Policy(#[from] PolicyError),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("Shutdown failed: {0}")]
    Shutdown(#[from] ShutdownError),

    #[error("Run error: {0}")]
    Run(#[from] RunError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
