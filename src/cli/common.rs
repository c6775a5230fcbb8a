//! Common helper functions shared across CLI commands
//!
//! This module provides exit codes and configuration loading.

use crate::config::Config;
use crate::error::ConfigError;
use std::path::Path;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_EXCEEDED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;
pub const EXIT_PARSE_ERROR: i32 = 3;

/// Load tsgen.toml configuration
///
/// A missing file is not an error: defaults are used and a warning is logged.
///
/// # Errors
///
/// Returns `ConfigError::Io` if the file exists but cannot be read.
/// Returns `ConfigError::Parse` or `ConfigError::Validation` if it is invalid.
pub(crate) fn load_config(path: &Path) -> Result<Config, ConfigError> {
    Config::load_or_default(path)
}
