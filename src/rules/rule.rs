#![forbid(unsafe_code)]

//! Rule records exchanged between the generator, the reconciler and the
//! resolver

use crate::kinds::LoadEntry;
use crate::rules::AttrValue;
use crate::types::{Label, Location, RuleKind};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A build rule: kind, name, location and an ordered attribute map
///
/// The same shape is used for freshly generated rules, rules read from
/// existing BUILD files, and merged results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub kind: RuleKind,
    pub name: String,

    #[serde(default)]
    pub location: Location,

    #[serde(default)]
    pub attrs: IndexMap<String, AttrValue>,
}

/// Rule produced by the discovery collaborator for one generation pass
pub type GeneratedRule = Rule;

/// Rule read from on-disk state
pub type ExistingRule = Rule;

impl Rule {
    pub fn new(kind: RuleKind, name: impl Into<String>, location: Location) -> Self {
        Self {
            kind,
            name: name.into(),
            location,
            attrs: IndexMap::new(),
        }
    }

    /// Builder-style attribute setter
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }

    /// The concrete label of this rule
    pub fn label(&self) -> Label {
        Label::new(self.location.clone(), self.name.clone())
    }
}

/// Whether a merged rule should be written out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleStatus {
    Emit,
    /// Every required attribute is empty: nothing justifies the rule
    Suppress,
}

/// Result of reconciling a generated rule with its on-disk counterpart
///
/// Resolvable attributes still hold symbolic tokens at this point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedRule {
    pub rule: Rule,
    pub status: RuleStatus,
    /// Set when no existing rule matched; the writer must add `load`
    pub load: Option<LoadEntry>,
    pub is_new: bool,
}

impl MergedRule {
    pub fn is_suppressed(&self) -> bool {
        self.status == RuleStatus::Suppress
    }
}
