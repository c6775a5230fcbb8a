#![forbid(unsafe_code)]

//! Kind listing formatters
//!
//! This module provides formatters for the `tsgen kinds` command, which
//! prints every registered rule kind with its attribute policy and the
//! load statement it needs.

use crate::kinds::{KindPolicy, Schema};
use crate::types::RuleKind;
use serde::Serialize;

/// One row of the kind listing
#[derive(Debug, Clone)]
pub struct KindInfo {
    pub kind: RuleKind,
    pub module: Option<&'static str>,
    pub policy: KindPolicy,
}

impl KindInfo {
    /// Collects the listing for every kind in registry order
    pub fn collect(schema: &Schema) -> Vec<KindInfo> {
        schema
            .registry
            .all_kinds()
            .map(|kind| KindInfo {
                kind,
                module: schema.loads.loads_for(kind).map(|entry| entry.module),
                policy: *schema.registry.policy_for(kind),
            })
            .collect()
    }
}

fn join_or_dash(attrs: &[&str]) -> String {
    if attrs.is_empty() {
        "-".to_string()
    } else {
        attrs.join(", ")
    }
}

/// Human-readable formatter for the kind listing
pub struct KindHumanFormatter;

impl KindHumanFormatter {
    /// Create a new human formatter
    pub fn new() -> Self {
        KindHumanFormatter
    }

    /// Format the kind listing for human consumption
    pub fn format(&self, kinds: &[KindInfo]) -> String {
        let mut output = String::new();

        output.push_str(&format!("Kinds ({} registered):\n", kinds.len()));
        output.push('\n');

        for info in kinds {
            output.push_str(&format!("{}\n", info.kind));
            output.push_str(&format!(
                "  Load: {}\n",
                info.module.unwrap_or("(no import needed)")
            ));
            output.push_str(&format!("  Match any name: {}\n", info.policy.match_any));
            output.push_str(&format!(
                "  Required: {}\n",
                join_or_dash(info.policy.required_non_empty)
            ));
            output.push_str(&format!(
                "  Substitutable: {}\n",
                join_or_dash(info.policy.substitutable)
            ));
            output.push_str(&format!(
                "  Mergeable: {}\n",
                join_or_dash(info.policy.mergeable)
            ));
            output.push_str(&format!(
                "  Resolvable: {}\n",
                join_or_dash(info.policy.resolvable)
            ));
            output.push('\n');
        }

        output
    }

    /// Write the formatted output to stdout
    pub fn write_to_stdout(&self, kinds: &[KindInfo]) {
        print!("{}", self.format(kinds));
    }
}

impl Default for KindHumanFormatter {
    fn default() -> Self {
        Self::new()
    }
}

/// JSONL output structure for one kind
#[derive(Debug, Serialize)]
struct JsonlKind<'a> {
    kind: RuleKind,
    module: Option<&'static str>,
    match_any: bool,
    required_non_empty: &'a [&'static str],
    substitutable: &'a [&'static str],
    mergeable: &'a [&'static str],
    resolvable: &'a [&'static str],
}

/// JSONL formatter for the kind listing
pub struct KindJsonlFormatter;

impl KindJsonlFormatter {
    /// Create a new JSONL formatter
    pub fn new() -> Self {
        KindJsonlFormatter
    }

    /// Format the kind listing as JSONL, one object per kind
    pub fn format(&self, kinds: &[KindInfo]) -> String {
        let mut output = String::new();

        for info in kinds {
            let record = JsonlKind {
                kind: info.kind,
                module: info.module,
                match_any: info.policy.match_any,
                required_non_empty: info.policy.required_non_empty,
                substitutable: info.policy.substitutable,
                mergeable: info.policy.mergeable,
                resolvable: info.policy.resolvable,
            };

            if let Ok(json) = serde_json::to_string(&record) {
                output.push_str(&json);
                output.push('\n');
            }
        }

        output
    }

    /// Write the formatted output to stdout
    pub fn write_to_stdout(&self, kinds: &[KindInfo]) {
        print!("{}", self.format(kinds));
    }
}

impl Default for KindJsonlFormatter {
    fn default() -> Self {
        Self::new()
    }
}
