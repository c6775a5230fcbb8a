#![forbid(unsafe_code)]

//! External build tool invocation
//!
//! Only the `shutdown` operation is exposed: it stops the build tool's
//! background server so the next build starts from a clean state.

use crate::error::ShutdownError;
use std::ffi::OsStr;
use std::process::{Command, Stdio};
use tracing::debug;

/// Name of the build tool used when neither the CLI nor the config sets one
pub const DEFAULT_BUILD_TOOL: &str = "bazel";

/// Handle on the external build tool executable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTool {
    program: String,
}

impl BuildTool {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Runs `<program> shutdown <args...>` and waits for it to exit
    ///
    /// Output streams are inherited. A single attempt is made.
    pub fn shutdown<I, S>(&self, args: I) -> Result<(), ShutdownError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        debug!("Running {} shutdown", self.program);

        let status = Command::new(&self.program)
            .arg("shutdown")
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|source| ShutdownError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        match status.code() {
            Some(0) => Ok(()),
            Some(code) => Err(ShutdownError::ExitCode {
                program: self.program.clone(),
                code,
            }),
            None => Err(ShutdownError::Terminated {
                program: self.program.clone(),
            }),
        }
    }
}

impl Default for BuildTool {
    fn default() -> Self {
        BuildTool::new(DEFAULT_BUILD_TOOL)
    }
}
