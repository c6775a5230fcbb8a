#![forbid(unsafe_code)]

//! Symbol index and resolver
//!
//! Resolution is two-phase. During discovery every location inserts the
//! symbols its rules provide into an [`IndexBuilder`], possibly from many
//! threads at once. Once discovery has finished, the builder is consumed by
//! [`IndexBuilder::freeze`] into a read-only [`ResolutionIndex`]; no insert
//! can happen after that point and no lookup can happen before it.

use crate::rules::Rule;
use crate::types::{Label, Location};
use indexmap::IndexSet;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

/// Source file extensions that make a file importable, longest first
pub const SOURCE_EXTENSIONS: &[&str] = &[
    ".d.ts", ".ts", ".tsx", ".mts", ".cts", ".js", ".jsx", ".mjs", ".cjs",
];

/// Node.js core modules; imports of these need no dependency
const NODE_BUILTINS: &[&str] = &[
    "assert",
    "buffer",
    "child_process",
    "crypto",
    "events",
    "fs",
    "http",
    "https",
    "module",
    "net",
    "os",
    "path",
    "process",
    "querystring",
    "readline",
    "stream",
    "string_decoder",
    "timers",
    "tty",
    "url",
    "util",
    "vm",
    "worker_threads",
    "zlib",
];

/// Result of resolving one symbolic token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(Label),
    /// More than one rule provides the symbol; candidates are sorted
    Ambiguous(Vec<Label>),
    NotFound,
}

/// Strips a recognised source extension
fn strip_source_extension(path: &str) -> Option<&str> {
    SOURCE_EXTENSIONS
        .iter()
        .find_map(|extension| path.strip_suffix(extension))
}

/// Symbols a source file provides: its extension-less path, plus the
/// directory for `index` files
pub fn file_symbols(location: &Location, file: &str) -> Vec<String> {
    let Some(stem) = strip_source_extension(file) else {
        return Vec::new();
    };

    let module = location.join(stem);
    let mut symbols = vec![module.as_str().to_string()];

    if let Some(dir) = module.as_str().strip_suffix("/index") {
        symbols.push(dir.to_string());
    }

    symbols
}

/// True for Node.js core modules, with or without the `node:` scheme
pub fn is_node_builtin(token: &str) -> bool {
    if token.starts_with("node:") {
        return true;
    }
    let root = token.split('/').next().unwrap_or(token);
    NODE_BUILTINS.contains(&root)
}

fn is_relative(token: &str) -> bool {
    token == "." || token == ".." || token.starts_with("./") || token.starts_with("../")
}

/// External package index queried when no workspace rule provides a token
pub trait PackageIndex: Send + Sync {
    fn lookup(&self, token: &str) -> Option<Label>;
}

/// npm packages linked by `npm_link_all_packages` at `link_location`
#[derive(Debug, Clone, Default)]
pub struct NpmPackages {
    link_location: Location,
    packages: HashSet<String>,
}

impl NpmPackages {
    pub fn new<I, S>(link_location: Location, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            link_location,
            packages: packages.into_iter().map(Into::into).collect(),
        }
    }

    /// Package part of an import: `@scope/name` or `name`
    pub fn package_name(token: &str) -> Option<&str> {
        if is_relative(token) || token.is_empty() {
            return None;
        }

        let end = if token.starts_with('@') {
            let first = token.find('/')?;
            token[first + 1..]
                .find('/')
                .map_or(token.len(), |second| first + 1 + second)
        } else {
            token.find('/').unwrap_or(token.len())
        };

        Some(&token[..end])
    }
}

impl PackageIndex for NpmPackages {
    fn lookup(&self, token: &str) -> Option<Label> {
        let package = Self::package_name(token)?;
        self.packages.contains(package).then(|| {
            Label::new(
                self.link_location.clone(),
                format!("node_modules/{}", package),
            )
        })
    }
}

/// Index under construction during the discovery phase
///
/// Inserts take `&self` and may come from any thread. Inserting the same
/// (symbol, label) pair twice has no effect; distinct labels for one
/// symbol are all kept and later reported as ambiguous.
#[derive(Debug, Default)]
pub struct IndexBuilder {
    entries: Mutex<HashMap<String, IndexSet<Label>>>,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, symbol: impl Into<String>, label: Label) {
        self.entries
            .lock()
            .entry(symbol.into())
            .or_default()
            .insert(label);
    }

    /// Registers every symbol a rule provides
    ///
    /// Source kinds provide their `srcs` files; `extra` holds any symbols
    /// declared by the generator (for example an npm package name).
    pub fn insert_rule(&self, rule: &Rule, extra: &[String]) {
        let label = rule.label();
        let mut symbols: Vec<String> = extra.to_vec();

        if rule.kind.is_source_kind()
            && let Some(srcs) = rule.attr("srcs")
        {
            for file in srcs.entries() {
                symbols.extend(file_symbols(&rule.location, file));
            }
        }

        let mut entries = self.entries.lock();
        for symbol in symbols {
            entries.entry(symbol).or_default().insert(label.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Ends the discovery phase
    pub fn freeze(self) -> ResolutionIndex {
        let entries = self
            .entries
            .into_inner()
            .into_iter()
            .map(|(symbol, labels)| {
                let mut labels: Vec<Label> = labels.into_iter().collect();
                labels.sort();
                (symbol, labels)
            })
            .collect();

        ResolutionIndex { entries }
    }
}

/// Frozen, read-only symbol index
#[derive(Debug, Clone, Default)]
pub struct ResolutionIndex {
    entries: HashMap<String, Vec<Label>>,
}

impl ResolutionIndex {
    /// Labels providing a symbol, sorted; empty when unknown
    pub fn lookup(&self, symbol: &str) -> &[Label] {
        self.entries.get(symbol).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolves symbolic tokens against the frozen index and the package index
pub struct Resolver<'a> {
    index: &'a ResolutionIndex,
    packages: &'a dyn PackageIndex,
}

impl<'a> Resolver<'a> {
    pub fn new(index: &'a ResolutionIndex, packages: &'a dyn PackageIndex) -> Self {
        Self { index, packages }
    }

    /// Resolves `token` as imported from `from`
    ///
    /// Relative tokens are joined to the importing location. Bare tokens are
    /// tried as workspace paths first, then as external packages. The
    /// resolver never picks between several candidates.
    pub fn resolve(&self, token: &str, from: &Location) -> Resolution {
        let symbol = if is_relative(token) {
            from.join(token).as_str().to_string()
        } else {
            token.to_string()
        };
        let symbol = strip_source_extension(&symbol).unwrap_or(&symbol);

        match self.index.lookup(symbol) {
            [] => {}
            [label] => return Resolution::Resolved(label.clone()),
            candidates => return Resolution::Ambiguous(candidates.to_vec()),
        }

        if is_relative(token) {
            return Resolution::NotFound;
        }

        self.packages
            .lookup(token)
            .map_or(Resolution::NotFound, Resolution::Resolved)
    }
}
