use serde::{Deserialize, Serialize};
use thiserror::Error;

use complymate_models::FactError;

#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FormFillError {
    #[error("Template not found for form {form_type}: {path}")]
    TemplateNotFound { form_type: String, path: String },

    #[error("Unsupported form type: {code}")]
    UnsupportedFormType { code: String },

    #[error("Template structure error: {message}")]
    TemplateStructure { message: String },

    #[error("Field resolution error: {field} - {message}")]
    FieldResolution { field: String, message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Storage error: {path} - {message}")]
    Storage { path: String, message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl FormFillError {
    pub fn template_not_found(form_type: impl Into<String>, path: impl Into<String>) -> Self {
        Self::TemplateNotFound {
            form_type: form_type.into(),
            path: path.into(),
        }
    }

    pub fn unsupported_form_type(code: impl Into<String>) -> Self {
        Self::UnsupportedFormType { code: code.into() }
    }

    pub fn template_structure(message: impl Into<String>) -> Self {
        Self::TemplateStructure {
            message: message.into(),
        }
    }

    pub fn field_resolution(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FieldResolution {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    pub fn storage(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Storage {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::TemplateNotFound { .. } => "TEMPLATE_NOT_FOUND",
            Self::UnsupportedFormType { .. } => "UNSUPPORTED_FORM_TYPE",
            Self::TemplateStructure { .. } => "TEMPLATE_STRUCTURE_ERROR",
            Self::FieldResolution { .. } => "FIELD_RESOLUTION",
            Self::Serialization { .. } => "SERIALIZATION_ERROR",
            Self::Storage { .. } => "STORAGE_ERROR",
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Fatal errors abort the generation call; the rest are logged and skipped
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::FieldResolution { .. })
    }

    /// Message suitable for showing to the person who asked for the form
    pub fn user_message(&self) -> String {
        match self {
            Self::TemplateNotFound { form_type, .. } => {
                format!("Could not generate form: no template is available for {}", form_type)
            }
            Self::UnsupportedFormType { code } => {
                format!("Could not generate form: '{}' is not a supported OSHA form", code)
            }
            Self::Validation { message, .. } => format!("Could not generate form: {}", message),
            _ => "Could not generate form. Please try again or contact support.".to_string(),
        }
    }
}

pub type FormResult<T> = Result<T, FormFillError>;

// Conversion from common error types
impl From<FactError> for FormFillError {
    fn from(error: FactError) -> Self {
        match error {
            FactError::UnknownFormType(code) => Self::unsupported_form_type(code),
            other => Self::validation("facts", other.to_string()),
        }
    }
}

impl From<serde_json::Error> for FormFillError {
    fn from(error: serde_json::Error) -> Self {
        Self::validation("JSON", error.to_string())
    }
}

impl From<serde_yaml::Error> for FormFillError {
    fn from(error: serde_yaml::Error) -> Self {
        Self::configuration(error.to_string())
    }
}

impl From<config::ConfigError> for FormFillError {
    fn from(error: config::ConfigError) -> Self {
        Self::configuration(error.to_string())
    }
}
