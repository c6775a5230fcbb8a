#![forbid(unsafe_code)]

//! tsgen: build rule reconciliation for TypeScript and JavaScript workspaces
//!
//! tsgen merges freshly generated build rules into hand-edited BUILD files
//! without clobbering manual edits, then resolves import tokens into
//! concrete labels using an index built over the whole tree.

pub mod build_tool;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod kinds;
pub mod output;
pub mod rules;
pub mod types;

// Re-export error types for convenient access
pub use error::{ConfigError, PolicyError, RunError, ShutdownError, SnapshotError, TsgenError};

// Re-export core domain types for convenient access
pub use types::{GlobPattern, Label, Location, RuleKind};
