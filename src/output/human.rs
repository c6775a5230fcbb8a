#![forbid(unsafe_code)]

//! Human-readable run summary
//!
//! Lists suppressed rules, conflicts and symbol problems, then totals and a
//! final pass/fail line.

use crate::engine::{GenerationResult, SymbolProblem};

/// Human-readable formatter for generation results
pub struct HumanFormatter;

impl HumanFormatter {
    /// Creates a new HumanFormatter
    pub fn new() -> Self {
        HumanFormatter
    }

    /// Format the generation result for human consumption
    pub fn format(&self, result: &GenerationResult, passed: bool) -> String {
        let mut output = String::new();

        let suppressed: Vec<String> = result
            .locations
            .iter()
            .flat_map(|location| {
                location
                    .suppressed
                    .iter()
                    .map(move |rule| format!("{} {}:{}", rule.kind, location.location, rule.name))
            })
            .collect();

        if !suppressed.is_empty() {
            output.push_str("Suppressed rules:\n");
            for rule in &suppressed {
                output.push_str(&format!("  {}\n", rule));
            }
            output.push('\n');
        }

        if !result.conflicts.is_empty() {
            output.push_str("Conflicts:\n");
            for conflict in &result.conflicts {
                output.push_str(&format!("  {}\n", conflict));
            }
            output.push('\n');
        }

        if !result.diagnostics.is_empty() {
            output.push_str("Unresolved symbols:\n");
            for diagnostic in &result.diagnostics {
                match &diagnostic.problem {
                    SymbolProblem::Unresolved => output.push_str(&format!(
                        "  {} {}: '{}' not found\n",
                        diagnostic.rule, diagnostic.attr, diagnostic.token
                    )),
                    SymbolProblem::Ambiguous { candidates } => {
                        let candidates: Vec<String> =
                            candidates.iter().map(ToString::to_string).collect();
                        output.push_str(&format!(
                            "  {} {}: '{}' is ambiguous ({})\n",
                            diagnostic.rule,
                            diagnostic.attr,
                            diagnostic.token,
                            candidates.join(", ")
                        ));
                    }
                }
            }
            output.push('\n');
        }

        output.push_str("Results:\n");
        output.push_str(&format!(
            "  Locations: {} ({} skipped)\n",
            result.locations.len(),
            result.locations_skipped
        ));
        output.push_str(&format!("  Rules emitted: {}\n", result.rules_emitted()));
        output.push_str(&format!("  Rules suppressed: {}\n", result.rules_suppressed()));
        output.push_str(&format!("  Conflicts: {}\n", result.conflicts.len()));
        output.push_str(&format!(
            "  Unresolved: {} ({} ambiguous)\n",
            result.diagnostics.len(),
            result.ambiguous_count()
        ));
        output.push('\n');

        if passed {
            output.push_str("Reconcile PASSED\n");
        } else {
            output.push_str(&format!(
                "Reconcile FAILED: {} unresolved symbol(s) exceed policy\n",
                result.diagnostics.len()
            ));
        }

        output
    }

    /// Write the formatted output to stderr
    pub fn write_to_stderr(&self, result: &GenerationResult, passed: bool) {
        eprint!("{}", self.format(result, passed));
    }
}

impl Default for HumanFormatter {
    fn default() -> Self {
        Self::new()
    }
}
