#![forbid(unsafe_code)]

//! Load-statement catalog
//!
//! Maps each rule kind to the `.bzl` module it must be loaded from when a
//! generated BUILD file references it. Every kind the registry can produce is
//! either exported by exactly one load entry or explicitly marked as needing
//! no import.

use crate::error::PolicyError;
use crate::types::RuleKind;
use serde::Serialize;
use std::fmt;

/// A `.bzl` module and the rule kinds it exports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadEntry {
    pub module: &'static str,
    pub symbols: &'static [RuleKind],
}

/// Built-in load table
pub const BUILTIN_LOADS: &[LoadEntry] = &[
    LoadEntry {
        module: "@aspect_rules_ts//ts:defs.bzl",
        symbols: &[RuleKind::TsProject, RuleKind::TsConfig],
    },
    LoadEntry {
        module: "@aspect_rules_ts//ts:proto.bzl",
        symbols: &[RuleKind::TsProtoLibrary],
    },
    LoadEntry {
        module: "@aspect_rules_js//npm:defs.bzl",
        symbols: &[RuleKind::NpmPackage],
    },
    LoadEntry {
        module: "@aspect_rules_js//js:defs.bzl",
        symbols: &[RuleKind::JsLibrary],
    },
    LoadEntry {
        module: "@npm//:defs.bzl",
        symbols: &[RuleKind::NpmLinkAllPackages],
    },
];

/// A rendered `load(...)` statement for a BUILD file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadStatement {
    pub module: String,
    pub symbols: Vec<RuleKind>,
}

impl fmt::Display for LoadStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "load(\"{}\"", self.module)?;
        for symbol in &self.symbols {
            write!(f, ", \"{}\"", symbol)?;
        }
        write!(f, ")")
    }
}

/// Validated kind → load entry mapping
#[derive(Debug, Clone)]
pub struct LoadCatalog {
    entries: Vec<LoadEntry>,
    /// Indexed by [`RuleKind::index`]; None means no import is needed
    by_kind: Vec<Option<usize>>,
}

impl LoadCatalog {
    /// Builds a catalog from load entries and the kinds needing no import
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::MissingLoad` if a kind is in neither list and
    /// `PolicyError::DuplicateLoad` if a kind is mapped more than once.
    pub fn new(entries: &[LoadEntry], no_import: &[RuleKind]) -> Result<Self, PolicyError> {
        let mut seen = vec![false; RuleKind::ALL.len()];
        let mut by_kind = vec![None; RuleKind::ALL.len()];

        for (position, entry) in entries.iter().enumerate() {
            for kind in entry.symbols {
                if seen[kind.index()] {
                    return Err(PolicyError::DuplicateLoad(*kind));
                }
                seen[kind.index()] = true;
                by_kind[kind.index()] = Some(position);
            }
        }

        for kind in no_import {
            if seen[kind.index()] {
                return Err(PolicyError::DuplicateLoad(*kind));
            }
            seen[kind.index()] = true;
        }

        if let Some(kind) = RuleKind::ALL.iter().find(|kind| !seen[kind.index()]) {
            return Err(PolicyError::MissingLoad(*kind));
        }

        Ok(Self {
            entries: entries.to_vec(),
            by_kind,
        })
    }

    /// Builds the catalog from [`BUILTIN_LOADS`]
    pub fn builtin() -> Result<Self, PolicyError> {
        Self::new(BUILTIN_LOADS, &[])
    }

    /// Returns the load entry for a kind, or None if it needs no import
    pub fn loads_for(&self, kind: RuleKind) -> Option<&LoadEntry> {
        self.by_kind[kind.index()].map(|position| &self.entries[position])
    }

    /// All load entries in catalog order
    pub fn entries(&self) -> &[LoadEntry] {
        &self.entries
    }

    /// Groups kinds into load statements
    ///
    /// Produces one statement per module in catalog order, each listing only
    /// the requested kinds in the order the module exports them.
    pub fn statements_for<I>(&self, kinds: I) -> Vec<LoadStatement>
    where
        I: IntoIterator<Item = RuleKind>,
    {
        let mut wanted = vec![false; RuleKind::ALL.len()];
        for kind in kinds {
            wanted[kind.index()] = true;
        }

        self.entries
            .iter()
            .filter_map(|entry| {
                let symbols: Vec<RuleKind> = entry
                    .symbols
                    .iter()
                    .copied()
                    .filter(|kind| wanted[kind.index()])
                    .collect();
                (!symbols.is_empty()).then(|| LoadStatement {
                    module: entry.module.to_string(),
                    symbols,
                })
            })
            .collect()
    }
}
