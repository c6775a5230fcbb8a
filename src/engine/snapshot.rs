#![forbid(unsafe_code)]

//! JSON snapshots of the tree handed to a generation run
//!
//! A snapshot lists, per location, the rules the language generator produced,
//! the rules already on disk and optionally the files present. Existing
//! rules of kinds tsgen does not manage are kept by name only, so clashing
//! target names are still reported.

use crate::engine::generator::{Candidate, GenerationResult, LocationInput};
use crate::engine::reconciler::FileInventory;
use crate::error::SnapshotError;
use crate::rules::{AttrValue, Rule};
use crate::types::{Location, RuleKind};
use indexmap::IndexMap;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Root of a snapshot document
#[derive(Debug, Clone, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub locations: Vec<SnapshotLocation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotLocation {
    pub location: Location,

    #[serde(default)]
    pub files: Option<Vec<String>>,

    #[serde(default)]
    pub generated: Vec<SnapshotCandidate>,

    #[serde(default)]
    pub existing: Vec<SnapshotRule>,
}

/// A generated rule; its kind must be one tsgen generates
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotCandidate {
    pub kind: RuleKind,
    pub name: String,

    #[serde(default)]
    pub attrs: IndexMap<String, AttrValue>,

    #[serde(default)]
    pub provides: Vec<String>,
}

/// A rule read from a BUILD file; any kind may appear
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotRule {
    pub kind: String,
    pub name: String,

    #[serde(default)]
    pub attrs: IndexMap<String, AttrValue>,
}

impl Snapshot {
    /// Reads and parses a snapshot file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| SnapshotError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Converts the snapshot into engine input
    pub fn into_inputs(self) -> Vec<LocationInput> {
        self.locations
            .into_iter()
            .map(SnapshotLocation::into_input)
            .collect()
    }
}

impl SnapshotLocation {
    fn into_input(self) -> LocationInput {
        let mut input = LocationInput::new(self.location);
        if let Some(files) = self.files {
            input = input.with_files(FileInventory::new(files));
        }

        for candidate in self.generated {
            let rule = Rule {
                kind: candidate.kind,
                name: candidate.name,
                location: Location::root(),
                attrs: candidate.attrs,
            };
            input = input.generate(Candidate::new(rule).providing(candidate.provides));
        }

        for existing in self.existing {
            let Ok(kind) = existing.kind.parse::<RuleKind>() else {
                debug!(
                    "Keeping {} rule {} at {} by name only: not a managed kind",
                    existing.kind, existing.name, input.location
                );
                input = input.foreign(existing.kind, existing.name);
                continue;
            };
            input = input.existing(Rule {
                kind,
                name: existing.name,
                location: Location::root(),
                attrs: existing.attrs,
            });
        }

        input
    }
}

/// Writes the result of a run as pretty-printed JSON
pub fn write_result(path: impl AsRef<Path>, result: &GenerationResult) -> Result<(), SnapshotError> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(result)?;
    fs::write(path, json + "\n").map_err(|source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    })
}
