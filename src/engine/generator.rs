#![forbid(unsafe_code)]

//! Parallel generation engine
//!
//! This module provides the GenerationEngine, which drives one generation run
//! over every location in the tree using rayon. The run has two strictly
//! ordered phases:
//! - discovery: each location reconciles its generated rules against the
//!   rules on disk and registers the symbols its emitted rules provide
//! - resolution: once every location has finished discovery and the index is
//!   frozen, symbolic tokens in resolvable attributes become labels

use crate::config::{AmbiguityPolicy, Config, ResolveConfig};
use crate::engine::reconciler::{FileInventory, ForeignRule, MatchConflict, Reconciler};
use crate::engine::resolver::{
    IndexBuilder, NpmPackages, PackageIndex, Resolution, ResolutionIndex, Resolver,
    is_node_builtin,
};
use crate::error::{ConfigError, RunError};
use crate::kinds::{LoadStatement, Schema};
use crate::rules::{AttrValue, ExistingRule, GeneratedRule, MergedRule, Rule};
use crate::types::{Label, Location, RuleKind};
use globset::GlobSet;
use indexmap::IndexMap;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::{debug, info, warn};

/// A generated rule plus any extra symbols it provides
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub rule: GeneratedRule,
    /// Symbols beyond those derived from `srcs`, such as an npm package name
    pub provides: Vec<String>,
}

impl Candidate {
    pub fn new(rule: GeneratedRule) -> Self {
        Self {
            rule,
            provides: Vec::new(),
        }
    }

    pub fn providing<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.provides.extend(symbols.into_iter().map(Into::into));
        self
    }
}

impl From<GeneratedRule> for Candidate {
    fn from(rule: GeneratedRule) -> Self {
        Candidate::new(rule)
    }
}

/// Everything the engine needs to know about one location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationInput {
    pub location: Location,
    /// Files present at the location; enables stale entry pruning
    pub files: Option<FileInventory>,
    pub generated: Vec<Candidate>,
    pub existing: Vec<ExistingRule>,
    /// On-disk rules of unmanaged kinds
    pub foreign: Vec<ForeignRule>,
}

impl LocationInput {
    pub fn new(location: Location) -> Self {
        Self {
            location,
            files: None,
            generated: Vec::new(),
            existing: Vec::new(),
            foreign: Vec::new(),
        }
    }

    pub fn with_files(mut self, files: FileInventory) -> Self {
        self.files = Some(files);
        self
    }

    /// Adds a generated candidate, placing its rule at this location
    pub fn generate(mut self, candidate: impl Into<Candidate>) -> Self {
        let mut candidate = candidate.into();
        candidate.rule.location = self.location.clone();
        self.generated.push(candidate);
        self
    }

    /// Adds an on-disk rule, placing it at this location
    pub fn existing(mut self, mut rule: ExistingRule) -> Self {
        rule.location = self.location.clone();
        self.existing.push(rule);
        self
    }

    /// Adds an on-disk rule of a kind tsgen does not manage
    pub fn foreign(mut self, kind: impl Into<String>, name: impl Into<String>) -> Self {
        self.foreign.push(ForeignRule::new(kind, name));
        self
    }
}

/// Flag checked between locations to abandon a run
///
/// Once cancelled a token stays cancelled; use a fresh one per run.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// An emitted rule after symbol resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedRule {
    #[serde(flatten)]
    pub rule: Rule,
    pub is_new: bool,
    /// Tokens left unresolved, per attribute
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub unresolved: IndexMap<String, Vec<String>>,
}

/// A generated rule that was not written because it has nothing to build
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuppressedRule {
    pub kind: RuleKind,
    pub name: String,
}

/// Output of the run for one location
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationResult {
    pub location: Location,
    /// Load statements needed by kinds new to this location
    pub loads: Vec<LoadStatement>,
    pub rules: Vec<ResolvedRule>,
    pub suppressed: Vec<SuppressedRule>,
}

/// Why a token could not be turned into a label
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "problem", rename_all = "lowercase")]
pub enum SymbolProblem {
    Unresolved,
    Ambiguous { candidates: Vec<Label> },
}

/// A token left unresolved in a resolvable attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolDiagnostic {
    pub rule: Label,
    pub attr: String,
    pub token: String,
    #[serde(flatten)]
    pub problem: SymbolProblem,
}

/// Result of a complete generation run
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerationResult {
    /// Per-location output, in input order
    pub locations: Vec<LocationResult>,
    pub conflicts: Vec<MatchConflict>,
    pub diagnostics: Vec<SymbolDiagnostic>,
    /// Locations skipped by exclude patterns
    pub locations_skipped: usize,
}

impl GenerationResult {
    pub fn rules_emitted(&self) -> usize {
        self.locations.iter().map(|l| l.rules.len()).sum()
    }

    pub fn rules_suppressed(&self) -> usize {
        self.locations.iter().map(|l| l.suppressed.len()).sum()
    }

    pub fn unresolved_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.problem == SymbolProblem::Unresolved)
            .count()
    }

    pub fn ambiguous_count(&self) -> usize {
        self.diagnostics.len() - self.unresolved_count()
    }

    /// Applies the unresolved-symbol policy
    ///
    /// Ambiguous tokens count as unresolved.
    pub fn passed(&self, policy: &ResolveConfig) -> bool {
        let unresolved = self.diagnostics.len();
        if policy.fail_on_unresolved && unresolved > 0 {
            return false;
        }
        policy.max_unresolved.is_none_or(|max| unresolved <= max)
    }
}

/// Discovery output for one location
struct Discovered<'a> {
    input: &'a LocationInput,
    merged: Vec<MergedRule>,
    conflicts: Vec<MatchConflict>,
}

enum TokenOutcome {
    Label(Label),
    Skip,
    Problem(SymbolProblem),
}

/// Generation engine that coordinates parallel discovery and resolution
///
/// The engine:
/// - Skips locations matched by exclude patterns
/// - Reconciles every location in parallel, filling a shared index
/// - Freezes the index once all locations are done
/// - Resolves symbolic tokens in parallel against the frozen index
pub struct GenerationEngine {
    schema: Arc<Schema>,
    packages: Box<dyn PackageIndex>,
    exclude: GlobSet,
    ambiguity: AmbiguityPolicy,
    overrides: HashMap<String, Label>,
}

impl GenerationEngine {
    /// Creates an engine with no exclusions, no packages and no overrides
    pub fn new(schema: Schema) -> Self {
        Self {
            schema: Arc::new(schema),
            packages: Box::new(NpmPackages::default()),
            exclude: GlobSet::empty(),
            ambiguity: AmbiguityPolicy::default(),
            overrides: HashMap::new(),
        }
    }

    /// Creates an engine configured from tsgen.toml
    pub fn from_config(schema: Schema, config: &Config) -> Result<Self, ConfigError> {
        let packages = NpmPackages::new(
            config.npm.link_location.clone(),
            config.npm.packages.iter().cloned(),
        );

        Ok(Self::new(schema)
            .with_exclude(config.exclude_matcher()?)
            .with_ambiguity(config.resolve.ambiguity)
            .with_overrides(config.override_labels())
            .with_packages(packages))
    }

    pub fn with_packages(mut self, packages: impl PackageIndex + 'static) -> Self {
        self.packages = Box::new(packages);
        self
    }

    pub fn with_exclude(mut self, exclude: GlobSet) -> Self {
        self.exclude = exclude;
        self
    }

    pub fn with_ambiguity(mut self, ambiguity: AmbiguityPolicy) -> Self {
        self.ambiguity = ambiguity;
        self
    }

    pub fn with_overrides(mut self, overrides: HashMap<String, Label>) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Runs discovery and resolution over all locations
    pub fn run(&self, inputs: &[LocationInput]) -> Result<GenerationResult, RunError> {
        self.run_with_cancel(inputs, &CancellationToken::new())
    }

    /// Runs discovery and resolution, checking `cancel` before each location
    ///
    /// A cancelled run discards everything discovered so far; the partial
    /// index is never queried.
    pub fn run_with_cancel(
        &self,
        inputs: &[LocationInput],
        cancel: &CancellationToken,
    ) -> Result<GenerationResult, RunError> {
        let (included, excluded): (Vec<&LocationInput>, Vec<&LocationInput>) = inputs
            .iter()
            .partition(|input| !self.exclude.is_match(input.location.as_str()));

        for input in &excluded {
            debug!("Skipping excluded location {}", input.location);
        }

        let builder = IndexBuilder::new();
        let completed = AtomicUsize::new(0);

        let discovered: Vec<Option<Discovered<'_>>> = included
            .par_iter()
            .map(|input| {
                if cancel.is_cancelled() {
                    return None;
                }
                let discovered = self.discover(input, &builder);
                completed.fetch_add(1, Ordering::Relaxed);
                Some(discovered)
            })
            .collect();

        if cancel.is_cancelled() || discovered.iter().any(Option::is_none) {
            let completed = completed.load(Ordering::Relaxed);
            warn!(
                "Generation cancelled after {} of {} locations",
                completed,
                included.len()
            );
            return Err(RunError::Cancelled {
                completed,
                total: included.len(),
            });
        }

        let discovered: Vec<Discovered<'_>> = discovered.into_iter().flatten().collect();
        let index = builder.freeze();
        info!(
            "Discovery finished: {} locations, {} symbols indexed",
            discovered.len(),
            index.len()
        );

        let resolved: Vec<(LocationResult, Vec<SymbolDiagnostic>)> = discovered
            .par_iter()
            .map(|discovered| self.resolve_location(discovered, &index))
            .collect();

        let mut result = GenerationResult {
            locations_skipped: excluded.len(),
            ..GenerationResult::default()
        };
        for discovered in discovered {
            result.conflicts.extend(discovered.conflicts);
        }
        for (location, diagnostics) in resolved {
            result.locations.push(location);
            result.diagnostics.extend(diagnostics);
        }

        info!(
            "Generation finished: {} rules emitted, {} suppressed, {} unresolved, {} ambiguous",
            result.rules_emitted(),
            result.rules_suppressed(),
            result.unresolved_count(),
            result.ambiguous_count()
        );

        Ok(result)
    }

    /// Reconciles one location and registers the symbols it provides
    fn discover<'i>(&self, input: &'i LocationInput, index: &IndexBuilder) -> Discovered<'i> {
        let reconciler = Reconciler::new(&self.schema);
        let mut merged = Vec::with_capacity(input.generated.len());
        let mut conflicts = Vec::new();

        for candidate in &input.generated {
            let (found, conflict) =
                reconciler.find_match_with(&candidate.rule, &input.existing, &input.foreign);
            if let Some(conflict) = conflict {
                warn!("Match conflict: {}", conflict);
                conflicts.push(conflict);
            }

            let reconciled = reconciler.reconcile_with(&candidate.rule, found, input.files.as_ref());
            conflicts.extend(reconciled.conflict);

            let rule = reconciled.merged;
            if rule.is_suppressed() {
                debug!(
                    "Suppressing {} {} at {}: required attributes are empty",
                    rule.rule.kind, rule.rule.name, input.location
                );
            } else {
                index.insert_rule(&rule.rule, &candidate.provides);
            }
            merged.push(rule);
        }

        debug!(
            "Discovered {} rules at {}",
            merged.len(),
            input.location
        );

        Discovered {
            input,
            merged,
            conflicts,
        }
    }

    fn resolve_location(
        &self,
        discovered: &Discovered<'_>,
        index: &ResolutionIndex,
    ) -> (LocationResult, Vec<SymbolDiagnostic>) {
        let location = &discovered.input.location;
        let resolver = Resolver::new(index, self.packages.as_ref());

        let suppressed = discovered
            .merged
            .iter()
            .filter(|merged| merged.is_suppressed())
            .map(|merged| SuppressedRule {
                kind: merged.rule.kind,
                name: merged.rule.name.clone(),
            })
            .collect();

        let (rules, diagnostics): (Vec<ResolvedRule>, Vec<Vec<SymbolDiagnostic>>) = discovered
            .merged
            .par_iter()
            .filter(|merged| !merged.is_suppressed())
            .map(|merged| self.resolve_rule(merged, &resolver))
            .unzip();

        let loaded: HashSet<RuleKind> = discovered
            .input
            .existing
            .iter()
            .map(|rule| rule.kind)
            .collect();
        let new_kinds: BTreeSet<RuleKind> = rules
            .iter()
            .filter(|resolved| resolved.is_new && !loaded.contains(&resolved.rule.kind))
            .map(|resolved| resolved.rule.kind)
            .collect();

        let result = LocationResult {
            location: location.clone(),
            loads: self.schema.loads.statements_for(new_kinds),
            rules,
            suppressed,
        };

        (result, diagnostics.into_iter().flatten().collect())
    }

    /// Replaces the tokens of every resolvable attribute with labels
    fn resolve_rule(
        &self,
        merged: &MergedRule,
        resolver: &Resolver<'_>,
    ) -> (ResolvedRule, Vec<SymbolDiagnostic>) {
        let policy = self.schema.registry.policy_for(merged.rule.kind);
        let mut rule = merged.rule.clone();
        let own = rule.label();
        let mut unresolved = IndexMap::new();
        let mut diagnostics = Vec::new();

        for attr in policy.resolvable {
            let (tokens, single) = match rule.attr(attr) {
                None | Some(AttrValue::Bool(_)) => continue,
                Some(value) => (
                    value
                        .entries()
                        .into_iter()
                        .map(str::to_string)
                        .collect::<Vec<_>>(),
                    matches!(value, AttrValue::Str(_)),
                ),
            };

            let mut labels = BTreeSet::new();
            let mut missing = Vec::new();
            for token in tokens {
                match self.resolve_token(&token, &rule.location, resolver) {
                    TokenOutcome::Label(label) if label == own => {}
                    TokenOutcome::Label(label) => {
                        labels.insert(label);
                    }
                    TokenOutcome::Skip => {}
                    TokenOutcome::Problem(problem) => {
                        warn!("Could not resolve '{}' in {} of {}", token, attr, own);
                        diagnostics.push(SymbolDiagnostic {
                            rule: own.clone(),
                            attr: attr.to_string(),
                            token: token.clone(),
                            problem,
                        });
                        missing.push(token);
                    }
                }
            }

            let rendered: Vec<String> = labels
                .iter()
                .map(|label| label.relative_to(&rule.location))
                .collect();

            if single {
                // An unresolved token stays in place so the rule keeps its value
                match rendered.into_iter().next().or_else(|| missing.first().cloned()) {
                    Some(value) => {
                        rule.attrs.insert(attr.to_string(), AttrValue::Str(value));
                    }
                    None => {
                        rule.attrs.shift_remove(*attr);
                    }
                }
            } else {
                rule.attrs
                    .insert(attr.to_string(), AttrValue::List(rendered));
            }

            if !missing.is_empty() {
                unresolved.insert(attr.to_string(), missing);
            }
        }

        let resolved = ResolvedRule {
            rule,
            is_new: merged.is_new,
            unresolved,
        };
        (resolved, diagnostics)
    }

    /// Overrides, then explicit labels, then the index and package lookup
    fn resolve_token(&self, token: &str, from: &Location, resolver: &Resolver<'_>) -> TokenOutcome {
        if let Some(label) = self.overrides.get(token) {
            return TokenOutcome::Label(label.clone());
        }

        if let Some(name) = token.strip_prefix(':') {
            if name.is_empty() {
                return TokenOutcome::Problem(SymbolProblem::Unresolved);
            }
            return TokenOutcome::Label(Label::new(from.clone(), name));
        }
        if token.starts_with("//") {
            return match Label::parse(token) {
                Some(label) => TokenOutcome::Label(label),
                None => TokenOutcome::Problem(SymbolProblem::Unresolved),
            };
        }

        if is_node_builtin(token) {
            return TokenOutcome::Skip;
        }

        match resolver.resolve(token, from) {
            Resolution::Resolved(label) => TokenOutcome::Label(label),
            Resolution::NotFound => TokenOutcome::Problem(SymbolProblem::Unresolved),
            Resolution::Ambiguous(candidates) => match self.ambiguity {
                AmbiguityPolicy::Report => {
                    TokenOutcome::Problem(SymbolProblem::Ambiguous { candidates })
                }
                AmbiguityPolicy::Closest => {
                    let picked = closest(&candidates, from);
                    info!(
                        "Picked {} for '{}' from {} candidates",
                        picked,
                        token,
                        candidates.len()
                    );
                    TokenOutcome::Label(picked)
                }
            },
        }
    }
}

/// Candidate sharing the longest location prefix with `from`
///
/// Candidates arrive sorted, so the first best match wins ties.
fn closest(candidates: &[Label], from: &Location) -> Label {
    let mut best = &candidates[0];
    let mut best_len = best.location().common_prefix_len(from);
    for candidate in &candidates[1..] {
        let len = candidate.location().common_prefix_len(from);
        if len > best_len {
            best = candidate;
            best_len = len;
        }
    }
    best.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RuleKind;
    use pretty_assertions::assert_eq;

    fn engine() -> GenerationEngine {
        GenerationEngine::new(Schema::builtin().unwrap())
    }

    fn ts_project(name: &str, srcs: &[&str], deps: &[&str]) -> Rule {
        Rule::new(RuleKind::TsProject, name, Location::root())
            .with_attr("srcs", srcs.to_vec())
            .with_attr("deps", deps.to_vec())
    }

    fn label(s: &str) -> Label {
        Label::parse(s).unwrap()
    }

    #[test]
    fn test_resolves_against_later_location() {
        let inputs = vec![
            LocationInput::new(Location::new("lib/a"))
                .generate(ts_project("a", &["a.ts"], &["../b/util"])),
            LocationInput::new(Location::new("lib/b"))
                .generate(ts_project("b", &["util.ts"], &[])),
        ];

        let result = engine().run(&inputs).unwrap();
        let a = &result.locations[0].rules[0];
        assert_eq!(a.rule.attr("deps"), Some(&AttrValue::list(["//lib/b:b"])));
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_same_location_labels_render_relative() {
        let inputs = vec![
            LocationInput::new(Location::new("lib"))
                .generate(ts_project("a", &["a.ts"], &["./b"]))
                .generate(ts_project("b", &["b.ts"], &[])),
        ];

        let result = engine().run(&inputs).unwrap();
        assert_eq!(
            result.locations[0].rules[0].rule.attr("deps"),
            Some(&AttrValue::list([":b"]))
        );
    }

    #[test]
    fn test_self_dependency_dropped() {
        let inputs = vec![
            LocationInput::new(Location::new("lib"))
                .generate(ts_project("lib", &["a.ts", "b.ts"], &["./b"])),
        ];

        let result = engine().run(&inputs).unwrap();
        assert_eq!(
            result.locations[0].rules[0].rule.attr("deps"),
            Some(&AttrValue::List(vec![]))
        );
    }

    #[test]
    fn test_labels_sorted_and_deduplicated() {
        let inputs = vec![
            LocationInput::new(Location::new("app"))
                .generate(ts_project("app", &["main.ts"], &["lodash", "../z/z", "../a/a", "lodash/fp", "fs"])),
            LocationInput::new(Location::new("a")).generate(ts_project("a", &["a.ts"], &[])),
            LocationInput::new(Location::new("z")).generate(ts_project("z", &["z.ts"], &[])),
        ];

        let engine = engine().with_packages(NpmPackages::new(Location::root(), ["lodash"]));
        let result = engine.run(&inputs).unwrap();
        assert_eq!(
            result.locations[0].rules[0].rule.attr("deps"),
            Some(&AttrValue::list(["//:node_modules/lodash", "//a:a", "//z:z"]))
        );
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_unresolved_token_is_reported_and_marked() {
        let inputs = vec![
            LocationInput::new(Location::new("app"))
                .generate(ts_project("app", &["main.ts"], &["left-pad"])),
        ];

        let result = engine().run(&inputs).unwrap();
        let rule = &result.locations[0].rules[0];
        assert_eq!(rule.rule.attr("deps"), Some(&AttrValue::List(vec![])));
        assert_eq!(
            rule.unresolved.get("deps"),
            Some(&vec!["left-pad".to_string()])
        );
        assert_eq!(result.unresolved_count(), 1);
        assert_eq!(result.diagnostics[0].rule, label("//app:app"));
    }

    #[test]
    fn test_ambiguity_report_and_closest() {
        let inputs = vec![
            LocationInput::new(Location::new("apps/web"))
                .generate(ts_project("web", &["main.ts"], &["shared"])),
            LocationInput::new(Location::new("apps/web/shared"))
                .generate(Candidate::new(ts_project("near", &["x.ts"], &[])).providing(["shared"])),
            LocationInput::new(Location::new("libs/shared"))
                .generate(Candidate::new(ts_project("far", &["y.ts"], &[])).providing(["shared"])),
        ];

        let report = engine().run(&inputs).unwrap();
        assert_eq!(report.ambiguous_count(), 1);
        assert_eq!(
            report.diagnostics[0].problem,
            SymbolProblem::Ambiguous {
                candidates: vec![label("//apps/web/shared:near"), label("//libs/shared:far")]
            }
        );

        let closest = engine()
            .with_ambiguity(AmbiguityPolicy::Closest)
            .run(&inputs)
            .unwrap();
        assert!(closest.diagnostics.is_empty());
        assert_eq!(
            closest.locations[0].rules[0].rule.attr("deps"),
            Some(&AttrValue::list(["//apps/web/shared:near"]))
        );
    }

    #[test]
    fn test_override_applied_before_index() {
        let inputs = vec![
            LocationInput::new(Location::new("app"))
                .generate(ts_project("app", &["main.ts"], &["react"])),
        ];
        let overrides = HashMap::from([("react".to_string(), label("//third_party:react"))]);

        let result = engine().with_overrides(overrides).run(&inputs).unwrap();
        assert_eq!(
            result.locations[0].rules[0].rule.attr("deps"),
            Some(&AttrValue::list(["//third_party:react"]))
        );
    }

    #[test]
    fn test_suppressed_rule_provides_nothing() {
        let existing = ts_project("b", &["gone.ts"], &[]);
        let inputs = vec![
            LocationInput::new(Location::new("app"))
                .generate(ts_project("app", &["main.ts"], &["../b/gone"])),
            LocationInput::new(Location::new("b"))
                .with_files(FileInventory::new(Vec::<String>::new()))
                .generate(ts_project("b", &[], &[]))
                .existing(existing),
        ];

        let result = engine().run(&inputs).unwrap();
        assert_eq!(
            result.locations[1].suppressed,
            vec![SuppressedRule {
                kind: RuleKind::TsProject,
                name: "b".to_string()
            }]
        );
        assert!(result.locations[1].rules.is_empty());
        assert_eq!(result.unresolved_count(), 1);
    }

    #[test]
    fn test_loads_only_for_new_kinds() {
        let inputs = vec![
            LocationInput::new(Location::new("lib"))
                .generate(ts_project("lib", &["a.ts"], &[]))
                .generate(Rule::new(RuleKind::TsConfig, "tsconfig", Location::root()).with_attr("src", "tsconfig.json"))
                .generate(Rule::new(RuleKind::JsLibrary, "js", Location::root()).with_attr("srcs", vec!["x.js"]))
                .existing(ts_project("lib", &["a.ts"], &[])),
        ];

        let result = engine().run(&inputs).unwrap();
        let loads: Vec<String> = result.locations[0]
            .loads
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            loads,
            vec![
                r#"load("@aspect_rules_ts//ts:defs.bzl", "ts_config")"#.to_string(),
                r#"load("@aspect_rules_js//js:defs.bzl", "js_library")"#.to_string(),
            ]
        );
    }

    #[test]
    fn test_kind_conflict_collected() {
        let inputs = vec![
            LocationInput::new(Location::new("lib"))
                .generate(ts_project("lib", &["a.ts"], &[]))
                .existing(Rule::new(RuleKind::JsLibrary, "lib", Location::root())),
        ];

        let result = engine().run(&inputs).unwrap();
        assert_eq!(result.conflicts.len(), 1);
        assert_eq!(result.conflicts[0].found, "js_library");
        assert!(result.locations[0].rules[0].is_new);
    }

    #[test]
    fn test_excluded_locations_skipped() {
        let mut builder = globset::GlobSetBuilder::new();
        builder.add(globset::Glob::new("vendor/**").unwrap());
        let engine = engine().with_exclude(builder.build().unwrap());

        let inputs = vec![
            LocationInput::new(Location::new("vendor/x"))
                .generate(ts_project("x", &["x.ts"], &[])),
            LocationInput::new(Location::new("app"))
                .generate(ts_project("app", &["main.ts"], &["../vendor/x/x"])),
        ];

        let result = engine.run(&inputs).unwrap();
        assert_eq!(result.locations_skipped, 1);
        assert_eq!(result.locations.len(), 1);
        assert_eq!(result.unresolved_count(), 1);
    }

    #[test]
    fn test_cancelled_run_discards_state() {
        let engine = engine();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let inputs = vec![
            LocationInput::new(Location::new("a")).generate(ts_project("a", &["a.ts"], &[])),
        ];

        match engine.run_with_cancel(&inputs, &cancel) {
            Err(RunError::Cancelled { completed, total }) => {
                assert_eq!(completed, 0);
                assert_eq!(total, 1);
            }
            other => panic!("Expected cancellation, got {:?}", other),
        }

        // The engine itself is unaffected by a cancelled run
        assert!(engine.run(&inputs).is_ok());
    }

    #[test]
    fn test_passed_policy() {
        let inputs = vec![
            LocationInput::new(Location::new("app"))
                .generate(ts_project("app", &["main.ts"], &["left-pad", "right-pad"])),
        ];
        let result = engine().run(&inputs).unwrap();

        assert!(result.passed(&ResolveConfig::default()));
        assert!(!result.passed(&ResolveConfig {
            fail_on_unresolved: true,
            ..ResolveConfig::default()
        }));
        assert!(result.passed(&ResolveConfig {
            max_unresolved: Some(2),
            ..ResolveConfig::default()
        }));
        assert!(!result.passed(&ResolveConfig {
            max_unresolved: Some(1),
            ..ResolveConfig::default()
        }));
    }

    #[test]
    fn test_unmanaged_kind_with_same_name_conflicts() {
        let inputs = vec![
            LocationInput::new(Location::new("lib"))
                .generate(ts_project("lib", &["a.ts"], &[]))
                .foreign("genrule", "lib")
                .foreign("filegroup", "assets"),
        ];

        let result = engine().run(&inputs).unwrap();
        assert_eq!(result.conflicts.len(), 1);
        assert_eq!(result.conflicts[0].found, "genrule");
        assert_eq!(result.conflicts[0].expected, RuleKind::TsProject);
        assert!(result.locations[0].rules[0].is_new);
    }

    #[test]
    fn test_unresolved_single_value_keeps_token() {
        let inputs = vec![
            LocationInput::new(Location::new("api")).generate(
                Rule::new(RuleKind::TsProtoLibrary, "api_ts", Location::root())
                    .with_attr("proto", "api_proto_typo"),
            ),
        ];

        let result = engine().run(&inputs).unwrap();
        let location = &result.locations[0];
        assert!(location.suppressed.is_empty());
        let rule = &location.rules[0];
        assert_eq!(
            rule.rule.attr("proto"),
            Some(&AttrValue::Str("api_proto_typo".to_string()))
        );
        assert_eq!(
            rule.unresolved.get("proto"),
            Some(&vec!["api_proto_typo".to_string()])
        );
    }

    #[test]
    fn test_resolved_single_value_becomes_label() {
        let inputs = vec![
            LocationInput::new(Location::new("api")).generate(
                Rule::new(RuleKind::TsProtoLibrary, "api_ts", Location::root())
                    .with_attr("proto", ":api_proto"),
            ),
        ];

        let result = engine().run(&inputs).unwrap();
        let rule = &result.locations[0].rules[0];
        assert_eq!(
            rule.rule.attr("proto"),
            Some(&AttrValue::Str(":api_proto".to_string()))
        );
        assert!(rule.unresolved.is_empty());
    }

    #[test]
    fn test_bare_colon_is_unresolved() {
        let inputs = vec![
            LocationInput::new(Location::new("app"))
                .generate(ts_project("app", &["main.ts"], &[":", ":util"])),
        ];

        let result = engine().run(&inputs).unwrap();
        let rule = &result.locations[0].rules[0];
        assert_eq!(rule.rule.attr("deps"), Some(&AttrValue::list([":util"])));
        assert_eq!(rule.unresolved.get("deps"), Some(&vec![":".to_string()]));
        assert_eq!(result.unresolved_count(), 1);
    }

    #[test]
    fn test_closest_tie_uses_label_order() {
        let from = Location::new("app");
        let candidates = vec![label("//x:a"), label("//y:b")];
        assert_eq!(closest(&candidates, &from), label("//x:a"));
    }
}
