//! Form Catalog
//!
//! Per-form mapping tables: alias targets, substring patterns, composite
//! rules and the ordered list of facts a collection flow asks for. Loaded
//! once and shared read-only.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use complymate_models::{FactDictionary, FormType};
use complymate_utils::{FormFillError, FormResult};

const BUILTIN_CATALOG: &str = include_str!("../catalog/osha_forms.yaml");

/// A fact the collection flow asks for, with its question text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactPrompt {
    pub key: String,
    pub prompt: String,
}

/// One selectable option of a choice rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceOption {
    /// Canonical fact value, e.g. `days_away`
    pub value: String,
    /// Export value of the widget to switch on
    pub export: String,
    /// Text field flagged `1` for this option and `0` otherwise
    #[serde(default)]
    pub total: Option<String>,
}

/// Fact that selects one option of a radio group plus per-option flags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceRule {
    pub fact: String,
    pub group: String,
    pub options: Vec<ChoiceOption>,
}

/// `MM/DD` fact written into separate month and day fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateRule {
    pub fact: String,
    pub month: String,
    pub day: String,
}

/// Fact mirrored verbatim into an extra field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalRule {
    pub fact: String,
    pub field: String,
}

/// Four digit year written as its last two digits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearRule {
    pub fact: String,
    pub field: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormMapping {
    #[serde(default)]
    pub facts: Vec<FactPrompt>,
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
    #[serde(default)]
    pub patterns: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub choices: Vec<ChoiceRule>,
    #[serde(default)]
    pub dates: Vec<DateRule>,
    #[serde(default)]
    pub totals: Vec<TotalRule>,
    #[serde(default)]
    pub years: Vec<YearRule>,
}

impl FormMapping {
    /// Facts consumed by composite rules and kept away from the generic strategies
    pub fn is_composite_fact(&self, key: &str) -> bool {
        self.choices.iter().any(|rule| rule.fact == key)
            || self.dates.iter().any(|rule| rule.fact == key)
            || self.years.iter().any(|rule| rule.fact == key)
    }

    /// Every field identifier some rule or alias writes to
    pub fn referenced_fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = self.aliases.values().map(String::as_str).collect();

        for rule in &self.choices {
            fields.push(rule.group.as_str());
            fields.extend(rule.options.iter().filter_map(|option| option.total.as_deref()));
        }
        for rule in &self.dates {
            fields.push(rule.month.as_str());
            fields.push(rule.day.as_str());
        }
        fields.extend(self.totals.iter().map(|rule| rule.field.as_str()));
        fields.extend(self.years.iter().map(|rule| rule.field.as_str()));

        fields.sort_unstable();
        fields.dedup();
        fields
    }

    /// Prompts for facts not yet present, in asking order
    pub fn missing_facts(&self, facts: &FactDictionary) -> Vec<FactPrompt> {
        self.facts
            .iter()
            .filter(|prompt| !facts.contains(&prompt.key))
            .cloned()
            .collect()
    }

    pub fn completion_percentage(&self, facts: &FactDictionary) -> f64 {
        if self.facts.is_empty() {
            return 0.0;
        }

        let filled = self.facts.iter().filter(|prompt| facts.contains(&prompt.key)).count();
        let percentage = 100.0 * filled as f64 / self.facts.len() as f64;
        (percentage * 100.0).round() / 100.0
    }
}

/// Mapping tables for every supported form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormCatalog {
    forms: HashMap<FormType, FormMapping>,
}

impl FormCatalog {
    /// Catalog compiled into the binary
    pub fn builtin() -> FormResult<Self> {
        Self::from_yaml(BUILTIN_CATALOG)
    }

    pub fn from_yaml(source: &str) -> FormResult<Self> {
        let catalog: Self = serde_yaml::from_str(source)?;
        catalog.check()?;
        Ok(catalog)
    }

    pub fn from_file(path: &Path) -> FormResult<Self> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| FormFillError::configuration(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml(&source)
    }

    /// Load the configured catalog, falling back to the built-in one
    pub fn load(path: Option<&str>) -> FormResult<Self> {
        match path {
            Some(path) => Self::from_file(Path::new(path)),
            None => Self::builtin(),
        }
    }

    pub fn mapping(&self, form_type: FormType) -> Option<&FormMapping> {
        self.forms.get(&form_type)
    }

    pub fn form_types(&self) -> Vec<FormType> {
        let mut forms: Vec<FormType> = self.forms.keys().copied().collect();
        forms.sort();
        forms
    }

    fn check(&self) -> FormResult<()> {
        for (form_type, mapping) in &self.forms {
            for rule in &mapping.choices {
                if rule.options.is_empty() {
                    return Err(FormFillError::configuration(format!(
                        "{}: choice rule for '{}' has no options",
                        form_type, rule.fact
                    )));
                }
            }
            for (key, patterns) in &mapping.patterns {
                if patterns.iter().any(|pattern| pattern.trim().is_empty()) {
                    return Err(FormFillError::configuration(format!(
                        "{}: empty pattern for '{}'",
                        form_type, key
                    )));
                }
            }
        }
        Ok(())
    }
}
