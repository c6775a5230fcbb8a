#![forbid(unsafe_code)]

//! Core domain types for tsgen
//!
//! This module defines the fundamental types shared by the registry, the
//! reconciler and the resolver: rule kinds, tree locations and labels.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of rule kinds tsgen knows how to generate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RuleKind {
    TsProject,
    JsLibrary,
    TsConfig,
    TsProtoLibrary,
    NpmPackage,
    NpmLinkAllPackages,
}

impl RuleKind {
    /// All kinds, in registry order
    pub const ALL: [RuleKind; 6] = [
        RuleKind::TsProject,
        RuleKind::JsLibrary,
        RuleKind::TsConfig,
        RuleKind::TsProtoLibrary,
        RuleKind::NpmPackage,
        RuleKind::NpmLinkAllPackages,
    ];

    /// Returns the kind name as written in BUILD files
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::TsProject => "ts_project",
            RuleKind::JsLibrary => "js_library",
            RuleKind::TsConfig => "ts_config",
            RuleKind::TsProtoLibrary => "ts_proto_library",
            RuleKind::NpmPackage => "npm_package",
            RuleKind::NpmLinkAllPackages => "npm_link_all_packages",
        }
    }

    /// Position of this kind in [`RuleKind::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Kinds whose `srcs` hold source files that other rules can import
    pub fn is_source_kind(&self) -> bool {
        matches!(
            self,
            RuleKind::TsProject | RuleKind::JsLibrary | RuleKind::TsProtoLibrary
        )
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RuleKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("Unknown rule kind: {}", s))
    }
}

impl TryFrom<String> for RuleKind {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RuleKind> for String {
    fn from(kind: RuleKind) -> Self {
        kind.as_str().to_string()
    }
}

/// A normalized package path in the source tree
///
/// Paths use forward slashes, have no leading or trailing slash, and the
/// workspace root is represented as ".".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Location(String);

impl Location {
    /// Creates a new Location with normalization
    pub fn new(path: impl Into<String>) -> Self {
        Location(Self::normalize(path.into()))
    }

    /// The workspace root
    pub fn root() -> Self {
        Location(".".to_string())
    }

    /// Normalizes a path:
    /// - Convert backslashes to forward slashes
    /// - Drop empty and "." segments, fold ".." segments
    /// - Empty result becomes "."
    fn normalize(path: String) -> String {
        let path = path.replace('\\', "/");
        let mut segments: Vec<&str> = Vec::new();
        for segment in path.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                other => segments.push(other),
            }
        }

        if segments.is_empty() {
            ".".to_string()
        } else {
            segments.join("/")
        }
    }

    /// Returns the location as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == "."
    }

    /// Joins a relative path onto this location, folding `.` and `..`
    pub fn join(&self, relative: &str) -> Location {
        if self.is_root() {
            Location::new(relative)
        } else {
            Location::new(format!("{}/{}", self.0, relative))
        }
    }

    /// Path segments of this location; empty for the root
    pub fn segments(&self) -> Vec<&str> {
        if self.is_root() {
            Vec::new()
        } else {
            self.0.split('/').collect()
        }
    }

    /// Number of leading path segments shared with `other`
    pub fn common_prefix_len(&self, other: &Location) -> usize {
        self.segments()
            .iter()
            .zip(other.segments().iter())
            .take_while(|(a, b)| a == b)
            .count()
    }

    /// Package part of a label (`//lib/a`, or `//` for the root)
    fn package(&self) -> &str {
        if self.is_root() { "" } else { &self.0 }
    }
}

impl Default for Location {
    fn default() -> Self {
        Location::root()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Location {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Ok(Location::new(value))
    }
}

impl From<Location> for String {
    fn from(location: Location) -> Self {
        location.0
    }
}

/// A concrete rule label: `//<location>:<name>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Label {
    location: Location,
    name: String,
}

impl Label {
    pub fn new(location: Location, name: impl Into<String>) -> Self {
        Self {
            location,
            name: name.into(),
        }
    }

    /// Parses an absolute label such as `//lib/a:a` or `//lib/a`
    ///
    /// Returns None for relative labels and external repository labels.
    pub fn parse(s: &str) -> Option<Self> {
        let rest = s.strip_prefix("//")?;
        let (package, name) = match rest.split_once(':') {
            Some((package, name)) => (package, name.to_string()),
            None => {
                let name = rest.rsplit('/').next().unwrap_or(rest).to_string();
                (rest, name)
            }
        };
        if name.is_empty() || package.contains(':') {
            return None;
        }
        Some(Label::new(Location::new(package), name))
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renders the label as seen from `from`: `:name` within the same location
    pub fn relative_to(&self, from: &Location) -> String {
        if &self.location == from {
            format!(":{}", self.name)
        } else {
            self.to_string()
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "//{}:{}", self.location.package(), self.name)
    }
}

impl TryFrom<String> for Label {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Label::parse(&value).ok_or_else(|| format!("Invalid label: {}", value))
    }
}

impl From<Label> for String {
    fn from(label: Label) -> Self {
        label.to_string()
    }
}

/// A glob pattern for location matching
///
/// This is a simple wrapper around a string that will be used with the `globset` crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GlobPattern(String);

impl GlobPattern {
    /// Creates a new GlobPattern
    pub fn new(pattern: impl Into<String>) -> Self {
        GlobPattern(pattern.into())
    }

    /// Returns the pattern as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GlobPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for GlobPattern {
    fn from(pattern: &str) -> Self {
        GlobPattern(pattern.to_string())
    }
}
