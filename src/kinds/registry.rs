#![forbid(unsafe_code)]

//! Rule-kind registry: the per-kind matching and merge policy
//!
//! The registry is built once at startup from a static table and is
//! read-only afterwards. Construction validates the table, so every lookup
//! through [`KindRegistry::policy_for`] is total over [`RuleKind`].

use crate::error::PolicyError;
use crate::types::RuleKind;

/// How the reconciler treats a single attribute of a kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrCategory {
    /// Generated value replaces the existing one
    Substitutable,
    /// Generated and existing values are unioned
    Mergeable,
    /// Holds symbolic tokens that the resolver turns into labels
    Resolvable,
    /// No policy: the existing value is authoritative
    Unmanaged,
}

impl AttrCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttrCategory::Substitutable => "substitutable",
            AttrCategory::Mergeable => "mergeable",
            AttrCategory::Resolvable => "resolvable",
            AttrCategory::Unmanaged => "unmanaged",
        }
    }
}

/// Matching and merge policy for one rule kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindPolicy {
    /// Any existing rule of this kind at the same location matches, whatever its name
    pub match_any: bool,
    /// The rule is suppressed when all of these are empty after merging
    pub required_non_empty: &'static [&'static str],
    pub substitutable: &'static [&'static str],
    pub mergeable: &'static [&'static str],
    pub resolvable: &'static [&'static str],
}

impl KindPolicy {
    /// A policy with no attributes and no match-any behavior
    pub const EMPTY: KindPolicy = KindPolicy {
        match_any: false,
        required_non_empty: &[],
        substitutable: &[],
        mergeable: &[],
        resolvable: &[],
    };

    /// Returns the category an attribute belongs to under this policy
    pub fn category(&self, attr: &str) -> AttrCategory {
        if self.substitutable.contains(&attr) {
            AttrCategory::Substitutable
        } else if self.mergeable.contains(&attr) {
            AttrCategory::Mergeable
        } else if self.resolvable.contains(&attr) {
            AttrCategory::Resolvable
        } else {
            AttrCategory::Unmanaged
        }
    }

    /// Checks that the three policy categories are disjoint
    fn validate(&self, kind: RuleKind) -> Result<(), PolicyError> {
        let categories = [
            (AttrCategory::Substitutable, self.substitutable),
            (AttrCategory::Mergeable, self.mergeable),
            (AttrCategory::Resolvable, self.resolvable),
        ];

        for (i, (first, attrs)) in categories.iter().enumerate() {
            for (second, others) in &categories[i + 1..] {
                if let Some(attr) = attrs.iter().find(|attr| others.contains(*attr)) {
                    return Err(PolicyError::OverlappingCategories {
                        kind,
                        attr: attr.to_string(),
                        first: first.as_str(),
                        second: second.as_str(),
                    });
                }
            }
        }

        Ok(())
    }
}

/// Built-in policy table for the TypeScript/JavaScript rule kinds
///
/// `npm_package.srcs` is resolvable only: its entries are references to the
/// rules that make up the package.
pub const BUILTIN_POLICIES: &[(RuleKind, KindPolicy)] = &[
    (
        RuleKind::TsProject,
        KindPolicy {
            match_any: false,
            required_non_empty: &["srcs"],
            substitutable: &[],
            mergeable: &["srcs"],
            resolvable: &["deps"],
        },
    ),
    (
        RuleKind::JsLibrary,
        KindPolicy {
            match_any: false,
            required_non_empty: &["srcs"],
            substitutable: &[],
            mergeable: &["srcs"],
            resolvable: &["deps"],
        },
    ),
    (
        RuleKind::TsConfig,
        KindPolicy {
            match_any: false,
            required_non_empty: &["src"],
            substitutable: &[],
            mergeable: &[],
            resolvable: &["deps"],
        },
    ),
    (
        RuleKind::TsProtoLibrary,
        KindPolicy {
            match_any: false,
            required_non_empty: &["proto"],
            substitutable: &[],
            mergeable: &[],
            resolvable: &["deps", "proto"],
        },
    ),
    (
        RuleKind::NpmPackage,
        KindPolicy {
            match_any: false,
            required_non_empty: &["srcs"],
            substitutable: &[],
            mergeable: &[],
            resolvable: &["srcs"],
        },
    ),
    (
        RuleKind::NpmLinkAllPackages,
        KindPolicy {
            match_any: true,
            ..KindPolicy::EMPTY
        },
    ),
];

/// Registry holding one validated policy per rule kind
#[derive(Debug, Clone)]
pub struct KindRegistry {
    /// Indexed by [`RuleKind::index`]
    policies: Vec<KindPolicy>,
}

impl KindRegistry {
    /// Builds a registry from a policy table
    ///
    /// # Errors
    ///
    /// Returns `PolicyError` if a kind is missing from the table, appears more
    /// than once, or lists an attribute under two exclusive categories.
    pub fn new(entries: &[(RuleKind, KindPolicy)]) -> Result<Self, PolicyError> {
        let mut slots: Vec<Option<KindPolicy>> = vec![None; RuleKind::ALL.len()];

        for (kind, policy) in entries {
            policy.validate(*kind)?;
            let slot = &mut slots[kind.index()];
            if slot.is_some() {
                return Err(PolicyError::DuplicatePolicy(*kind));
            }
            *slot = Some(*policy);
        }

        let policies = RuleKind::ALL
            .iter()
            .zip(slots)
            .map(|(kind, slot)| slot.ok_or(PolicyError::MissingPolicy(*kind)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { policies })
    }

    /// Builds the registry from [`BUILTIN_POLICIES`]
    pub fn builtin() -> Result<Self, PolicyError> {
        Self::new(BUILTIN_POLICIES)
    }

    /// Returns the policy for a kind
    pub fn policy_for(&self, kind: RuleKind) -> &KindPolicy {
        &self.policies[kind.index()]
    }

    /// Iterates over all kinds in registry order
    pub fn all_kinds(&self) -> impl Iterator<Item = RuleKind> + '_ {
        RuleKind::ALL.into_iter()
    }
}
