//! Fact Dictionary
//!
//! Flat key/value facts collected for a form. Keys are chosen by the
//! collecting side and rarely match template field names verbatim.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FactError {
    #[error("Unknown form type: {0}")]
    UnknownFormType(String),

    #[error("Fact '{key}' is not a scalar value")]
    NotScalar { key: String },

    #[error("Fact payload must be a flat JSON object")]
    NotAnObject,
}

/// A single collected fact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactValue {
    Absent,
    Boolean(bool),
    Integer(i64),
    /// Whole numbers above `i64::MAX`
    Unsigned(u64),
    Decimal(f64),
    Text(String),
}

impl FactValue {
    /// String written into a form field, `None` when there is nothing to write
    pub fn render(&self) -> Option<String> {
        match self {
            Self::Absent => None,
            Self::Boolean(flag) => Some(flag.to_string()),
            Self::Integer(number) => Some(number.to_string()),
            Self::Unsigned(number) => Some(number.to_string()),
            Self::Decimal(number) => {
                if !number.is_finite() {
                    None
                } else if number.fract() == 0.0 && number.abs() < 1e15 {
                    Some(format!("{}", *number as i64))
                } else {
                    Some(number.to_string())
                }
            }
            Self::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
        }
    }

    fn from_json(key: &str, value: serde_json::Value) -> Result<Self, FactError> {
        match value {
            serde_json::Value::Null => Ok(Self::Absent),
            serde_json::Value::Bool(flag) => Ok(Self::Boolean(flag)),
            serde_json::Value::Number(number) => Ok(if let Some(signed) = number.as_i64() {
                Self::Integer(signed)
            } else if let Some(unsigned) = number.as_u64() {
                Self::Unsigned(unsigned)
            } else {
                Self::Decimal(number.as_f64().unwrap_or(f64::NAN))
            }),
            serde_json::Value::String(text) => Ok(Self::Text(text)),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                Err(FactError::NotScalar { key: key.to_string() })
            }
        }
    }
}

impl From<&str> for FactValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FactValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for FactValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for FactValue {
    fn from(value: f64) -> Self {
        Self::Decimal(value)
    }
}

impl From<bool> for FactValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

/// Facts keyed by name, iterated in key order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactDictionary {
    facts: BTreeMap<String, FactValue>,
}

impl FactDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a flat JSON object, rejecting nested values
    pub fn from_json(value: serde_json::Value) -> Result<Self, FactError> {
        let serde_json::Value::Object(map) = value else {
            return Err(FactError::NotAnObject);
        };

        let mut facts = BTreeMap::new();
        for (key, value) in map {
            let fact = FactValue::from_json(&key, value)?;
            facts.insert(key, fact);
        }

        Ok(Self { facts })
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FactValue>) -> Option<FactValue> {
        self.facts.insert(key.into(), value.into())
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<FactValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&FactValue> {
        self.facts.get(key)
    }

    /// Rendered value of a fact, `None` when missing or blank
    pub fn rendered(&self, key: &str) -> Option<String> {
        self.facts.get(key).and_then(FactValue::render)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.rendered(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FactValue)> {
        self.facts.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.facts.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for FactDictionary
where
    K: Into<String>,
    V: Into<FactValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            facts: iter.into_iter().map(|(key, value)| (key.into(), value.into())).collect(),
        }
    }
}
