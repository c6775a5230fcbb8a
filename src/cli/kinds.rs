//! Kinds command implementation
//!
//! This module implements the `tsgen kinds` command, which validates the
//! built-in kind and load tables and lists every registered kind with its
//! attribute policy.

use crate::cli::args::OutputFormat;
use crate::cli::common::{EXIT_ERROR, EXIT_SUCCESS};
use crate::kinds::Schema;
use crate::output::{KindHumanFormatter, KindInfo, KindJsonlFormatter};

/// Run the kinds command
///
/// # Returns
///
/// Exit code:
/// - 0: Success
/// - 2: The built-in tables are inconsistent
pub fn run_kinds(format: OutputFormat) -> i32 {
    let schema = match Schema::builtin() {
        Ok(schema) => schema,
        Err(e) => {
            eprintln!("Error: Policy inconsistency: {}", e);
            return EXIT_ERROR;
        }
    };

    let kinds = KindInfo::collect(&schema);
    match format {
        OutputFormat::Human => KindHumanFormatter::new().write_to_stdout(&kinds),
        OutputFormat::Jsonl => KindJsonlFormatter::new().write_to_stdout(&kinds),
    }

    EXIT_SUCCESS
}
