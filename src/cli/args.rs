//! CLI argument parsing using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for tsgen commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON Lines format (one JSON object per line)
    Jsonl,
}

impl From<crate::config::OutputFormat> for OutputFormat {
    fn from(format: crate::config::OutputFormat) -> Self {
        match format {
            crate::config::OutputFormat::Human => OutputFormat::Human,
            crate::config::OutputFormat::Jsonl => OutputFormat::Jsonl,
        }
    }
}

/// tsgen CLI main entry point
#[derive(Parser, Debug)]
#[command(name = "tsgen")]
#[command(about = "Reconcile generated TypeScript build rules with hand-edited BUILD files")]
#[command(version)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available tsgen subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a default tsgen.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Reconcile a snapshot of generated and existing rules
    Reconcile {
        /// Snapshot file (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Write the reconciled rules to this file (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format (defaults to [output] format in tsgen.toml)
        #[arg(short, long)]
        format: Option<OutputFormat>,

        /// Configuration file
        #[arg(short, long, default_value = "tsgen.toml")]
        config: PathBuf,
    },

    /// List registered rule kinds and their attribute policies
    Kinds {
        /// Output format
        #[arg(short, long, default_value = "human")]
        format: OutputFormat,
    },

    /// Stop the build tool's background server
    Shutdown {
        /// Build tool executable (defaults to [tool] build_tool in tsgen.toml)
        #[arg(long)]
        build_tool: Option<String>,

        /// Configuration file
        #[arg(short, long, default_value = "tsgen.toml")]
        config: PathBuf,

        /// Extra arguments passed after `shutdown`
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}
