//! Reconcile command implementation
//!
//! This module implements the `tsgen reconcile` command, which:
//! - Loads configuration from tsgen.toml
//! - Validates the built-in kind and load tables
//! - Reads a snapshot of generated and existing rules
//! - Runs discovery and resolution over every location
//! - Writes the reconciled rules and prints a summary (human or JSONL)
//! - Returns an exit code reflecting the unresolved-symbol policy

use crate::cli::args::OutputFormat;
use crate::cli::common::{EXIT_ERROR, EXIT_EXCEEDED, EXIT_PARSE_ERROR, EXIT_SUCCESS};
use crate::engine::GenerationEngine;
use crate::engine::snapshot::{self, Snapshot};
use crate::error::{ConfigError, PolicyError, RunError, SnapshotError};
use crate::kinds::Schema;
use crate::output::{HumanFormatter, JsonlFormatter};
use std::path::Path;

/// Error type specific to reconcile command
#[derive(Debug, thiserror::Error)]
enum ReconcileError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Policy inconsistency: {0}")]
    Policy(#[from] PolicyError),

    #[error("{0}")]
    Snapshot(#[from] SnapshotError),

    #[error("{0}")]
    Run(#[from] RunError),
}

/// Run the reconcile command
///
/// # Returns
///
/// Exit code:
/// - 0: Success (unresolved symbols within policy)
/// - 1: Exceeded (unresolved symbols violate policy)
/// - 2: Error (I/O, policy or cancelled run)
/// - 3: Parse error (invalid tsgen.toml or snapshot)
pub fn run_reconcile(
    input: &Path,
    output: Option<&Path>,
    format: Option<OutputFormat>,
    config_path: &Path,
) -> i32 {
    match run_reconcile_inner(input, output, format, config_path) {
        Ok(true) => EXIT_SUCCESS,
        Ok(false) => EXIT_EXCEEDED,
        Err(e) => {
            eprintln!("Error: {}", e);
            match e {
                ReconcileError::Config(ConfigError::Parse(_)) => EXIT_PARSE_ERROR,
                ReconcileError::Snapshot(SnapshotError::Parse { .. }) => EXIT_PARSE_ERROR,
                _ => EXIT_ERROR,
            }
        }
    }
}

/// Internal implementation of reconcile command
fn run_reconcile_inner(
    input: &Path,
    output: Option<&Path>,
    format: Option<OutputFormat>,
    config_path: &Path,
) -> Result<bool, ReconcileError> {
    let config = super::common::load_config(config_path)?;
    let format = format.unwrap_or_else(|| config.output.format.into());

    let schema = Schema::builtin()?;
    let inputs = Snapshot::load(input)?.into_inputs();

    if format == OutputFormat::Human {
        eprintln!("Reconciling {} locations...", inputs.len());
    }

    let engine = GenerationEngine::from_config(schema, &config)?;
    let result = engine.run(&inputs)?;
    let passed = result.passed(&config.resolve);

    if let Some(output) = output {
        snapshot::write_result(output, &result)?;
    }

    match format {
        OutputFormat::Human => HumanFormatter::new().write_to_stderr(&result, passed),
        OutputFormat::Jsonl => JsonlFormatter::new().write_to_stdout(&result, passed),
    }

    Ok(passed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const SNAPSHOT: &str = r#"{"locations":[
        {"location":"app","generated":[
            {"kind":"ts_project","name":"app","attrs":{"srcs":["main.ts"],"deps":["left-pad"]}}
        ]}
    ]}"#;

    fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_reconcile_success_with_default_config() {
        let dir = TempDir::new().unwrap();
        let input = write(&dir, "snapshot.json", SNAPSHOT);
        let output = dir.path().join("out.json");

        let code = run_reconcile(
            &input,
            Some(&output),
            Some(OutputFormat::Jsonl),
            &dir.path().join("tsgen.toml"),
        );
        assert_eq!(code, EXIT_SUCCESS);
        assert!(output.exists());
    }

    #[test]
    fn test_reconcile_fails_on_unresolved() {
        let dir = TempDir::new().unwrap();
        let input = write(&dir, "snapshot.json", SNAPSHOT);
        let config = write(&dir, "tsgen.toml", "[resolve]\nfail_on_unresolved = true\n");

        let code = run_reconcile(&input, None, Some(OutputFormat::Jsonl), &config);
        assert_eq!(code, EXIT_EXCEEDED);
    }

    #[test]
    fn test_reconcile_invalid_snapshot() {
        let dir = TempDir::new().unwrap();
        let input = write(&dir, "snapshot.json", "{\"locations\": [");
        let code = run_reconcile(&input, None, None, &dir.path().join("tsgen.toml"));
        assert_eq!(code, EXIT_PARSE_ERROR);
    }

    #[test]
    fn test_reconcile_missing_snapshot() {
        let dir = TempDir::new().unwrap();
        let code = run_reconcile(
            &dir.path().join("missing.json"),
            None,
            None,
            &dir.path().join("tsgen.toml"),
        );
        assert_eq!(code, EXIT_ERROR);
    }

    #[test]
    fn test_reconcile_invalid_config() {
        let dir = TempDir::new().unwrap();
        let input = write(&dir, "snapshot.json", SNAPSHOT);
        let config = write(&dir, "tsgen.toml", "[tsgen]\nversion = \"9\"\n");
        let code = run_reconcile(&input, None, None, &config);
        assert_eq!(code, EXIT_ERROR);
    }
}
