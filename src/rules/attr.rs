#![forbid(unsafe_code)]

//! Attribute values carried by rules

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Value of a single rule attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Str(String),
    List(Vec<String>),
}

impl AttrValue {
    /// Builds a list value from anything yielding strings
    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AttrValue::List(items.into_iter().map(Into::into).collect())
    }

    pub fn str(value: impl Into<String>) -> Self {
        AttrValue::Str(value.into())
    }

    /// An empty string or an empty list; booleans are never empty
    pub fn is_empty(&self) -> bool {
        match self {
            AttrValue::Bool(_) => false,
            AttrValue::Str(s) => s.is_empty(),
            AttrValue::List(items) => items.is_empty(),
        }
    }

    /// String entries of this value: a non-empty string is one entry
    pub fn entries(&self) -> Vec<&str> {
        match self {
            AttrValue::Bool(_) => Vec::new(),
            AttrValue::Str(s) if s.is_empty() => Vec::new(),
            AttrValue::Str(s) => vec![s.as_str()],
            AttrValue::List(items) => items.iter().map(String::as_str).collect(),
        }
    }

    /// Keeps only the string entries accepted by `keep`
    ///
    /// Booleans pass through unchanged; a rejected string becomes empty.
    pub fn retain(&self, mut keep: impl FnMut(&str) -> bool) -> AttrValue {
        match self {
            AttrValue::Bool(b) => AttrValue::Bool(*b),
            AttrValue::Str(s) if keep(s) => AttrValue::Str(s.clone()),
            AttrValue::Str(_) => AttrValue::Str(String::new()),
            AttrValue::List(items) => AttrValue::List(
                items.iter().filter(|item| keep(item)).cloned().collect(),
            ),
        }
    }

    /// Ordered, deduplicated union of `existing` and `generated`
    ///
    /// Existing entries keep their order; generated entries not already
    /// present are appended in generation order. Two equal strings stay a
    /// string; every other combination becomes a list. Booleans have no
    /// entries, so a boolean side contributes nothing to the union.
    pub fn union(existing: &AttrValue, generated: &AttrValue) -> AttrValue {
        if let (AttrValue::Str(a), AttrValue::Str(b)) = (existing, generated)
            && a == b
        {
            return existing.clone();
        }

        let merged: IndexSet<&str> = existing
            .entries()
            .into_iter()
            .chain(generated.entries())
            .collect();

        AttrValue::list(merged)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Str(value.to_string())
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl From<Vec<String>> for AttrValue {
    fn from(value: Vec<String>) -> Self {
        AttrValue::List(value)
    }
}

impl From<Vec<&str>> for AttrValue {
    fn from(value: Vec<&str>) -> Self {
        AttrValue::list(value)
    }
}
