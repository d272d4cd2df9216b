use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use crate::FormType;

/// A non-fatal problem recorded while filling a form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Field identifier or object the problem concerns
    pub subject: String,
    pub code: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(subject: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            code: code.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.subject, self.message)
    }
}

/// A filled form persisted to the output directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedForm {
    pub id: Uuid,
    pub form_type: FormType,
    pub file_name: String,
    pub path: PathBuf,
    pub created_at: DateTime<Utc>,
    /// SHA-256 of the template bytes the form was filled from
    pub template_sha256: String,
    pub fields_written: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl GeneratedForm {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}
