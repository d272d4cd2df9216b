//! Resolved Assignment
//!
//! The only artifact handed from the data mapper to the value writer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which resolution step produced an assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    /// Composite rules (choice groups, split dates, totals, years)
    Derived,
    /// Per-form alias table
    Alias,
    /// Substring pattern match
    Pattern,
    /// Token overlap match
    Fuzzy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub value: String,
    pub source: ResolutionSource,
    /// Fact key the value came from
    pub fact: String,
}

/// Field identifier to value, first writer wins
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedAssignment {
    entries: BTreeMap<String, Assignment>,
}

impl ResolvedAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a value for `identifier`; returns false if it was already assigned
    pub fn assign(
        &mut self,
        identifier: impl Into<String>,
        value: impl Into<String>,
        source: ResolutionSource,
        fact: &str,
    ) -> bool {
        let identifier = identifier.into();
        if self.entries.contains_key(&identifier) {
            return false;
        }

        self.entries.insert(
            identifier,
            Assignment {
                value: value.into(),
                source,
                fact: fact.to_string(),
            },
        );
        true
    }

    pub fn get(&self, identifier: &str) -> Option<&Assignment> {
        self.entries.get(identifier)
    }

    pub fn value(&self, identifier: &str) -> Option<&str> {
        self.entries.get(identifier).map(|assignment| assignment.value.as_str())
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.entries.contains_key(identifier)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Assignment)> {
        self.entries.iter().map(|(identifier, assignment)| (identifier.as_str(), assignment))
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
