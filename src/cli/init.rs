//! Initialize a tsgen project
//!
//! Writes a commented default tsgen.toml.

use std::fs;
use std::path::Path;

/// Name of the configuration file
pub const CONFIG_FILE: &str = "tsgen.toml";

/// Default content for tsgen.toml
const DEFAULT_TSGEN_TOML: &str = r#"[tsgen]
version = "1"

# Locations to skip entirely
# exclude = ["**/node_modules/**", "vendor/**"]

[resolve]
# What to do when several rules provide the same import: "report" or "closest"
ambiguity = "report"

# Fail when any import is left unresolved
fail_on_unresolved = false

# Fail when more than this many imports are unresolved
# max_unresolved = 0

[resolve.overrides]
# "some-import" = "//third_party:some_import"

[npm]
# Packages linked by npm_link_all_packages
packages = []
link_location = "."

[tool]
build_tool = "bazel"

[output]
format = "human"
"#;

/// Error type for init command
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Path error
    #[error("Path error: {0}")]
    Path(String),
}

/// Whether the config file was written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    Created,
    Skipped,
    Overwritten,
}

/// Run the init command in the current directory
pub fn run_init(force: bool) -> Result<InitOutcome, InitError> {
    run_init_in(Path::new("."), force)
}

/// Writes tsgen.toml into `dir`
///
/// An existing file is kept unless `force` is set.
pub fn run_init_in(dir: &Path, force: bool) -> Result<InitOutcome, InitError> {
    if !dir.is_dir() {
        return Err(InitError::Path(format!(
            "'{}' is not a directory",
            dir.display()
        )));
    }

    let path = dir.join(CONFIG_FILE);
    let outcome = if path.exists() {
        if !force {
            return Ok(InitOutcome::Skipped);
        }
        InitOutcome::Overwritten
    } else {
        InitOutcome::Created
    };

    fs::write(&path, DEFAULT_TSGEN_TOML)?;
    Ok(outcome)
}
