use serde::{Deserialize, Serialize};

use crate::FactError;

/// OSHA recordkeeping forms with a fillable template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FormType {
    /// Log of Work-Related Injuries and Illnesses
    #[serde(rename = "300")]
    Log300,
    /// Summary of Work-Related Injuries and Illnesses
    #[serde(rename = "300A")]
    Summary300A,
    /// Injury and Illness Incident Report
    #[serde(rename = "301")]
    Incident301,
}

impl FormType {
    pub const ALL: [FormType; 3] = [FormType::Log300, FormType::Summary300A, FormType::Incident301];

    /// Short code used in template and output file names
    pub fn code(&self) -> &'static str {
        match self {
            Self::Log300 => "300",
            Self::Summary300A => "300A",
            Self::Incident301 => "301",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Log300 => "Log of Work-Related Injuries and Illnesses",
            Self::Summary300A => "Summary of Work-Related Injuries and Illnesses",
            Self::Incident301 => "Injury and Illness Incident Report",
        }
    }

    /// Parse a caller supplied code such as `"300a"` or `"OSHA 301"`
    pub fn from_code(code: &str) -> Result<Self, FactError> {
        let normalized = code.trim().to_uppercase();
        let normalized = normalized
            .strip_prefix("OSHA")
            .map(|rest| rest.trim_start_matches(['-', '_', ' ']))
            .unwrap_or(&normalized);

        match normalized {
            "300" => Ok(Self::Log300),
            "300A" => Ok(Self::Summary300A),
            "301" => Ok(Self::Incident301),
            _ => Err(FactError::UnknownFormType(code.trim().to_string())),
        }
    }
}

impl std::str::FromStr for FormType {
    type Err = FactError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s)
    }
}

impl std::fmt::Display for FormType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OSHA {}", self.code())
    }
}
