use serde::{Deserialize, Serialize};

/// Fillable field kinds the engine knows how to write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Free text (also used for choice lists and combo boxes)
    Text,
    /// Radio group or checkbox, exactly one export value may be on
    ChoiceGroup,
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::ChoiceGroup => write!(f, "choice_group"),
        }
    }
}

/// Introspection view of a template field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSummary {
    pub identifier: String,
    pub kind: FieldKind,
    pub current_value: Option<String>,
    /// Export values of a choice group, empty for text fields
    pub options: Vec<String>,
}
