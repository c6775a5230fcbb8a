//! CLI argument parsing and command dispatch

pub mod args;
pub mod common;
pub mod init;
pub mod kinds;
pub mod reconcile;
pub mod shutdown;

// Re-export types for convenient access
pub use args::{Cli, Command, OutputFormat};
