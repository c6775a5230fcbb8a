#![forbid(unsafe_code)]

//! JSONL output formatter for machine-readable output
//!
//! Outputs one JSON object per line in a deterministic order:
//! 1. All rule records (by location, then generation order)
//! 2. All suppressed records
//! 3. All conflict records
//! 4. All unresolved and ambiguous records (by location, then rule)
//! 5. One status record

use crate::engine::{GenerationResult, SymbolProblem};
use crate::rules::AttrValue;
use crate::types::{Label, Location, RuleKind};
use indexmap::IndexMap;
use serde::Serialize;

/// JSONL output formatter
///
/// Formats generation results as JSON Lines (one JSON object per line).
pub struct JsonlFormatter;

impl JsonlFormatter {
    /// Creates a new JsonlFormatter
    pub fn new() -> Self {
        JsonlFormatter
    }

    /// Format the generation result as JSONL
    ///
    /// `passed` is the outcome of the unresolved-symbol policy.
    pub fn format(&self, result: &GenerationResult, passed: bool) -> String {
        let mut output = String::new();

        for location in &result.locations {
            for resolved in &location.rules {
                push_record(
                    &mut output,
                    &RuleRecord {
                        record_type: "rule",
                        location: &location.location,
                        kind: resolved.rule.kind,
                        name: &resolved.rule.name,
                        is_new: resolved.is_new,
                        attrs: &resolved.rule.attrs,
                        unresolved: &resolved.unresolved,
                    },
                );
            }
        }

        for location in &result.locations {
            for suppressed in &location.suppressed {
                push_record(
                    &mut output,
                    &SuppressedRecord {
                        record_type: "suppressed",
                        location: &location.location,
                        kind: suppressed.kind,
                        name: &suppressed.name,
                    },
                );
            }
        }

        for conflict in &result.conflicts {
            push_record(
                &mut output,
                &ConflictRecord {
                    record_type: "conflict",
                    location: &conflict.location,
                    name: &conflict.name,
                    expected: conflict.expected,
                    found: &conflict.found,
                },
            );
        }

        for diagnostic in &result.diagnostics {
            let (record_type, candidates) = match &diagnostic.problem {
                SymbolProblem::Unresolved => ("unresolved", None),
                SymbolProblem::Ambiguous { candidates } => ("ambiguous", Some(candidates)),
            };
            push_record(
                &mut output,
                &SymbolRecord {
                    record_type,
                    rule: &diagnostic.rule,
                    attr: &diagnostic.attr,
                    token: &diagnostic.token,
                    candidates,
                },
            );
        }

        push_record(
            &mut output,
            &StatusRecord {
                record_type: "status",
                passed,
                locations: result.locations.len() as u64,
                locations_skipped: result.locations_skipped as u64,
                rules_emitted: result.rules_emitted() as u64,
                rules_suppressed: result.rules_suppressed() as u64,
                conflicts: result.conflicts.len() as u64,
                unresolved: result.unresolved_count() as u64,
                ambiguous: result.ambiguous_count() as u64,
            },
        );

        output
    }

    /// Write the formatted output to stdout
    pub fn write_to_stdout(&self, result: &GenerationResult, passed: bool) {
        print!("{}", self.format(result, passed));
    }
}

impl Default for JsonlFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn push_record(output: &mut String, record: &impl Serialize) {
    if let Ok(json) = serde_json::to_string(record) {
        output.push_str(&json);
        output.push('\n');
    }
}

/// Emitted rule record for JSONL output
#[derive(Debug, Serialize)]
struct RuleRecord<'a> {
    #[serde(rename = "type")]
    record_type: &'static str,
    location: &'a Location,
    kind: RuleKind,
    name: &'a str,
    is_new: bool,
    attrs: &'a IndexMap<String, AttrValue>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    unresolved: &'a IndexMap<String, Vec<String>>,
}

/// Suppressed rule record for JSONL output
#[derive(Debug, Serialize)]
struct SuppressedRecord<'a> {
    #[serde(rename = "type")]
    record_type: &'static str,
    location: &'a Location,
    kind: RuleKind,
    name: &'a str,
}

/// Match conflict record for JSONL output
#[derive(Debug, Serialize)]
struct ConflictRecord<'a> {
    #[serde(rename = "type")]
    record_type: &'static str,
    location: &'a Location,
    name: &'a str,
    expected: RuleKind,
    found: &'a str,
}

/// Unresolved or ambiguous token record for JSONL output
#[derive(Debug, Serialize)]
struct SymbolRecord<'a> {
    #[serde(rename = "type")]
    record_type: &'static str,
    rule: &'a Label,
    attr: &'a str,
    token: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    candidates: Option<&'a Vec<Label>>,
}

/// Final status record for JSONL output
#[derive(Debug, Serialize)]
struct StatusRecord {
    #[serde(rename = "type")]
    record_type: &'static str,
    passed: bool,
    locations: u64,
    locations_skipped: u64,
    rules_emitted: u64,
    rules_suppressed: u64,
    conflicts: u64,
    unresolved: u64,
    ambiguous: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{GenerationEngine, LocationInput};
    use crate::kinds::Schema;
    use crate::rules::Rule;
    use serde_json::Value;

    fn parse_lines(output: &str) -> Vec<Value> {
        output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    fn sample_result() -> GenerationResult {
        let engine = GenerationEngine::new(Schema::builtin().unwrap());
        let inputs = vec![
            LocationInput::new(Location::new("app"))
                .generate(
                    Rule::new(RuleKind::TsProject, "app", Location::root())
                        .with_attr("srcs", vec!["main.ts"])
                        .with_attr("deps", vec!["../lib/util", "left-pad"]),
                )
                .generate(Rule::new(RuleKind::JsLibrary, "empty", Location::root())),
            LocationInput::new(Location::new("lib")).generate(
                Rule::new(RuleKind::TsProject, "lib", Location::root())
                    .with_attr("srcs", vec!["util.ts"]),
            ),
        ];
        engine.run(&inputs).unwrap()
    }

    #[test]
    fn test_empty_result() {
        let output = JsonlFormatter::new().format(&GenerationResult::default(), true);
        let records = parse_lines(&output);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["type"], "status");
        assert_eq!(records[0]["passed"], true);
        assert_eq!(records[0]["rules_emitted"], 0);
    }

    #[test]
    fn test_record_order() {
        let result = sample_result();
        let output = JsonlFormatter::new().format(&result, false);
        let types: Vec<String> = parse_lines(&output)
            .iter()
            .map(|r| r["type"].as_str().unwrap().to_string())
            .collect();

        assert_eq!(
            types,
            vec!["rule", "rule", "suppressed", "unresolved", "status"]
        );
    }

    #[test]
    fn test_rule_record_fields() {
        let result = sample_result();
        let records = parse_lines(&JsonlFormatter::new().format(&result, false));

        let app = &records[0];
        assert_eq!(app["location"], "app");
        assert_eq!(app["kind"], "ts_project");
        assert_eq!(app["name"], "app");
        assert_eq!(app["is_new"], true);
        assert_eq!(app["attrs"]["deps"], serde_json::json!(["//lib:lib"]));
        assert_eq!(app["unresolved"]["deps"], serde_json::json!(["left-pad"]));

        let lib = &records[1];
        assert!(lib.get("unresolved").is_none());
    }

    #[test]
    fn test_unresolved_and_status_records() {
        let result = sample_result();
        let records = parse_lines(&JsonlFormatter::new().format(&result, false));

        let unresolved = &records[3];
        assert_eq!(unresolved["rule"], "//app:app");
        assert_eq!(unresolved["attr"], "deps");
        assert_eq!(unresolved["token"], "left-pad");
        assert!(unresolved.get("candidates").is_none());

        let status = records.last().unwrap();
        assert_eq!(status["passed"], false);
        assert_eq!(status["rules_emitted"], 2);
        assert_eq!(status["rules_suppressed"], 1);
        assert_eq!(status["unresolved"], 1);
        assert_eq!(status["ambiguous"], 0);
    }
}
