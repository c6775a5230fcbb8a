//! Shutdown command implementation
//!
//! This module implements the `tsgen shutdown` command, which runs
//! `<build tool> shutdown [ARGS]...` once and exits with the tool's code.

use crate::build_tool::BuildTool;
use crate::cli::common::{EXIT_ERROR, EXIT_PARSE_ERROR, EXIT_SUCCESS};
use crate::error::ConfigError;
use std::path::Path;

/// Run the shutdown command
///
/// The program is taken from `build_tool`, then `[tool] build_tool` in the
/// configuration, which defaults to `bazel`.
///
/// # Returns
///
/// The build tool's exit code, 1 when it could not be run or was killed,
/// or the usual configuration error codes.
pub fn run_shutdown(build_tool: Option<&str>, args: &[String], config_path: &Path) -> i32 {
    let program = match build_tool {
        Some(program) => program.to_string(),
        None => match super::common::load_config(config_path) {
            Ok(config) => config.tool.build_tool,
            Err(e) => {
                eprintln!("Error: Configuration error: {}", e);
                return match e {
                    ConfigError::Parse(_) => EXIT_PARSE_ERROR,
                    _ => EXIT_ERROR,
                };
            }
        },
    };

    match BuildTool::new(program).shutdown(args) {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    }
}
