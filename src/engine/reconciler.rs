#![forbid(unsafe_code)]

//! Attribute reconciler
//!
//! Merges a freshly generated rule with the rule of the same kind and name
//! already present on disk, following the kind's policy:
//! - substitutable attributes take the generated value
//! - mergeable attributes are unioned, keeping hand-added entries
//! - resolvable attributes carry the generated symbolic tokens forward
//! - attributes without a policy keep their on-disk value
//!
//! The reconciler is a pure function of its inputs and holds no shared
//! state, so it can run in parallel across rules.

use crate::kinds::{AttrCategory, KindPolicy, Schema};
use crate::rules::{AttrValue, ExistingRule, GeneratedRule, MergedRule, Rule, RuleStatus};
use crate::types::{Location, RuleKind};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, warn};

/// An existing rule found where a match was expected, but of another kind
///
/// Reported as a warning; reconciliation proceeds as if nothing matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchConflict {
    pub location: Location,
    pub name: String,
    pub expected: RuleKind,
    /// Kind on disk; may be a kind tsgen does not manage
    pub found: String,
}

impl fmt::Display for MatchConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} exists as {} but {} was generated",
            self.location, self.name, self.found, self.expected
        )
    }
}

/// Outcome of reconciling one generated rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    pub merged: MergedRule,
    pub conflict: Option<MatchConflict>,
}

/// An on-disk rule of a kind without a policy
///
/// Only its name takes part in matching, to catch target name clashes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignRule {
    pub kind: String,
    pub name: String,
}

impl ForeignRule {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
        }
    }
}

/// Files present at a location, as reported by the discovery walk
///
/// Paths are relative to the location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileInventory {
    files: HashSet<String>,
}

impl FileInventory {
    pub fn new<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            files: files.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, file: &str) -> bool {
        self.files.contains(file.trim_start_matches("./"))
    }
}

/// Labels (`:x`, `//pkg:x`, `@repo//...`) are never treated as files
fn looks_like_file(entry: &str) -> bool {
    !(entry.starts_with(':') || entry.starts_with("//") || entry.starts_with('@'))
}

/// Reconciles generated rules against on-disk rules using a [`Schema`]
#[derive(Debug, Clone, Copy)]
pub struct Reconciler<'a> {
    schema: &'a Schema,
}

impl<'a> Reconciler<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    fn policy(&self, kind: RuleKind) -> &'a KindPolicy {
        self.schema.registry.policy_for(kind)
    }

    /// Picks the existing rule a generated rule should merge into
    ///
    /// With `match_any`, the first rule of the same kind at the location
    /// matches regardless of its name. Otherwise only a rule with the same
    /// name matches; a same-named rule of another kind is a conflict and
    /// yields no match.
    pub fn find_match<'r>(
        &self,
        generated: &GeneratedRule,
        existing: &'r [ExistingRule],
    ) -> (Option<&'r ExistingRule>, Option<MatchConflict>) {
        let at_location = existing
            .iter()
            .filter(|rule| rule.location == generated.location);

        if self.policy(generated.kind).match_any {
            let found = at_location
                .clone()
                .find(|rule| rule.kind == generated.kind);
            return (found, None);
        }

        match at_location.clone().find(|rule| rule.name == generated.name) {
            Some(rule) if rule.kind == generated.kind => (Some(rule), None),
            Some(rule) => (None, Some(conflict(generated, rule))),
            None => (None, None),
        }
    }

    /// Like [`Reconciler::find_match`], also checking rules of unmanaged kinds
    ///
    /// When nothing managed matches, a foreign rule with the generated
    /// rule's name is a conflict.
    pub fn find_match_with<'r>(
        &self,
        generated: &GeneratedRule,
        existing: &'r [ExistingRule],
        foreign: &[ForeignRule],
    ) -> (Option<&'r ExistingRule>, Option<MatchConflict>) {
        let (found, conflict) = self.find_match(generated, existing);
        if found.is_some() || conflict.is_some() {
            return (found, conflict);
        }

        let clash = foreign
            .iter()
            .find(|rule| rule.name == generated.name)
            .map(|rule| MatchConflict {
                location: generated.location.clone(),
                name: generated.name.clone(),
                expected: generated.kind,
                found: rule.kind.clone(),
            });
        (None, clash)
    }

    /// Reconciles without a file inventory; nothing is pruned as stale
    pub fn reconcile(
        &self,
        generated: &GeneratedRule,
        existing: Option<&ExistingRule>,
    ) -> Reconciled {
        self.reconcile_with(generated, existing, None)
    }

    /// Reconciles a generated rule with an optional existing rule
    ///
    /// When `inventory` is given, existing mergeable entries naming files
    /// that are no longer present (and no longer generated) are dropped
    /// before the union.
    pub fn reconcile_with(
        &self,
        generated: &GeneratedRule,
        existing: Option<&ExistingRule>,
        inventory: Option<&FileInventory>,
    ) -> Reconciled {
        let policy = self.policy(generated.kind);

        let (existing, conflict) = match existing {
            Some(rule) if rule.kind != generated.kind => {
                (None, Some(conflict(generated, rule)))
            }
            Some(rule) if rule.location != generated.location => {
                debug!(
                    "Ignoring {} at {}: generated rule lives at {}",
                    rule.name, rule.location, generated.location
                );
                (None, None)
            }
            Some(rule) if !policy.match_any && rule.name != generated.name => (None, None),
            other => (other, None),
        };

        if let Some(conflict) = &conflict {
            warn!("Match conflict: {}", conflict);
        }

        let rule = match existing {
            Some(existing) => merge(policy, generated, existing, inventory),
            None => generated.clone(),
        };

        let status = if is_empty_rule(policy, &rule) {
            RuleStatus::Suppress
        } else {
            RuleStatus::Emit
        };

        let is_new = existing.is_none();
        let load = if is_new {
            self.schema.loads.loads_for(rule.kind).copied()
        } else {
            None
        };

        Reconciled {
            merged: MergedRule {
                rule,
                status,
                load,
                is_new,
            },
            conflict,
        }
    }
}

fn conflict(generated: &GeneratedRule, found: &ExistingRule) -> MatchConflict {
    MatchConflict {
        location: generated.location.clone(),
        name: generated.name.clone(),
        expected: generated.kind,
        found: found.kind.to_string(),
    }
}

/// True when the kind requires attributes and every one of them is empty
fn is_empty_rule(policy: &KindPolicy, rule: &Rule) -> bool {
    !policy.required_non_empty.is_empty()
        && policy
            .required_non_empty
            .iter()
            .all(|attr| rule.attr(attr).is_none_or(AttrValue::is_empty))
}

fn merge(
    policy: &KindPolicy,
    generated: &GeneratedRule,
    existing: &ExistingRule,
    inventory: Option<&FileInventory>,
) -> Rule {
    let mut attrs: IndexMap<String, AttrValue> = IndexMap::new();

    for (name, existing_value) in &existing.attrs {
        let generated_value = generated.attrs.get(name);
        let value = match policy.category(name) {
            AttrCategory::Substitutable | AttrCategory::Resolvable => generated_value.cloned(),
            AttrCategory::Mergeable => {
                let kept = prune_stale(existing_value, generated_value, inventory);
                Some(match generated_value {
                    Some(generated_value) => AttrValue::union(&kept, generated_value),
                    None => kept,
                })
            }
            AttrCategory::Unmanaged => Some(existing_value.clone()),
        };

        if let Some(value) = value {
            attrs.insert(name.clone(), value);
        }
    }

    for (name, value) in &generated.attrs {
        if !existing.attrs.contains_key(name) {
            attrs.insert(name.clone(), value.clone());
        }
    }

    let name = if policy.match_any {
        existing.name.clone()
    } else {
        generated.name.clone()
    };

    Rule {
        kind: generated.kind,
        name,
        location: generated.location.clone(),
        attrs,
    }
}

/// Drops existing file entries that are neither present nor generated
fn prune_stale(
    existing: &AttrValue,
    generated: Option<&AttrValue>,
    inventory: Option<&FileInventory>,
) -> AttrValue {
    let Some(inventory) = inventory else {
        return existing.clone();
    };

    let generated_entries: Vec<&str> = generated.map(AttrValue::entries).unwrap_or_default();

    existing.retain(|entry| {
        !looks_like_file(entry) || inventory.contains(entry) || generated_entries.contains(&entry)
    })
}
