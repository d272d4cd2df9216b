//! Data Mapper
//!
//! Resolves collected facts onto template field identifiers. Composite
//! rules run first, then the alias table, substring patterns and finally
//! token overlap. The first strategy to claim a field wins and nothing
//! here ever fails: unmatched facts are dropped and unmatched fields keep
//! their template value.

mod derived;
mod strategies;

pub use derived::normalize_choice;
pub use strategies::{pattern_matches, tokenize, tokens_overlap};

use tracing::{debug, info};

use complymate_models::{FactDictionary, FieldKind, FormType, ResolutionSource, ResolvedAssignment};

use crate::catalog::{FormCatalog, FormMapping};
use crate::field_index::FieldIndex;

pub struct DataMapper<'a> {
    catalog: &'a FormCatalog,
}

impl<'a> DataMapper<'a> {
    pub fn new(catalog: &'a FormCatalog) -> Self {
        Self { catalog }
    }

    pub fn resolve(&self, form_type: FormType, facts: &FactDictionary, index: &FieldIndex) -> ResolvedAssignment {
        let fallback = FormMapping::default();
        let mapping = self.catalog.mapping(form_type).unwrap_or(&fallback);

        let mut assignment = ResolvedAssignment::new();
        derived::apply(mapping, facts, index, &mut assignment);
        let derived_count = assignment.len();

        let mut pending: Vec<(&str, String)> = facts
            .iter()
            .filter(|(key, _)| !mapping.is_composite_fact(key))
            .filter_map(|(key, value)| value.render().map(|rendered| (key, rendered)))
            .collect();

        pending.retain(|(key, value)| !assign_alias(mapping, index, &mut assignment, key, value));
        pending.retain(|(key, value)| !assign_pattern(mapping, index, &mut assignment, key, value));
        pending.retain(|(key, value)| !assign_fuzzy(index, &mut assignment, key, value));

        for (key, _) in &pending {
            debug!(fact = %key, "No field matched fact");
        }
        info!(
            form_type = %form_type,
            assigned = assignment.len(),
            derived = derived_count,
            unmatched = pending.len(),
            "Facts resolved"
        );

        assignment
    }
}

fn assign_alias(
    mapping: &FormMapping,
    index: &FieldIndex,
    assignment: &mut ResolvedAssignment,
    key: &str,
    value: &str,
) -> bool {
    match mapping.aliases.get(key) {
        Some(target) if index.contains(target) => assignment.assign(target.as_str(), value, ResolutionSource::Alias, key),
        Some(target) => {
            debug!(fact = %key, field = %target, "Alias target not in template");
            false
        }
        None => false,
    }
}

/// First unassigned text field, in template order, containing one of the fact's patterns
fn assign_pattern(
    mapping: &FormMapping,
    index: &FieldIndex,
    assignment: &mut ResolvedAssignment,
    key: &str,
    value: &str,
) -> bool {
    let Some(patterns) = mapping.patterns.get(key) else {
        return false;
    };

    let target = open_text_fields(index, assignment).find(|identifier| pattern_matches(identifier, patterns));
    match target {
        Some(identifier) => {
            let identifier = identifier.to_string();
            assignment.assign(identifier, value, ResolutionSource::Pattern, key)
        }
        None => false,
    }
}

fn assign_fuzzy(index: &FieldIndex, assignment: &mut ResolvedAssignment, key: &str, value: &str) -> bool {
    let key_tokens = tokenize(key);
    if key_tokens.is_empty() {
        return false;
    }

    let target = open_text_fields(index, assignment)
        .find(|identifier| tokens_overlap(&key_tokens, &tokenize(identifier)));
    match target {
        Some(identifier) => {
            let identifier = identifier.to_string();
            assignment.assign(identifier, value, ResolutionSource::Fuzzy, key)
        }
        None => false,
    }
}

fn open_text_fields<'i>(
    index: &'i FieldIndex,
    assignment: &'i ResolvedAssignment,
) -> impl Iterator<Item = &'i str> + 'i {
    index
        .iter()
        .filter(|descriptor| descriptor.kind == FieldKind::Text)
        .map(|descriptor| descriptor.identifier.as_str())
        .filter(move |identifier| !assignment.contains(identifier))
}
