//! Template Store
//!
//! Locates and loads the blank OSHA templates from the configured
//! directory. Templates are never modified in place.

use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use complymate_models::FormType;
use complymate_utils::{FormFillError, FormResult, TemplateConfig};

/// Template bytes as read from disk
#[derive(Debug, Clone)]
pub struct Template {
    pub form_type: FormType,
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

impl Template {
    pub fn sha256(&self) -> String {
        hex::encode(Sha256::digest(&self.bytes))
    }
}

#[derive(Debug, Clone)]
pub struct TemplateStore {
    root: PathBuf,
    file_pattern: String,
}

impl TemplateStore {
    pub fn new(root: impl Into<PathBuf>, file_pattern: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            file_pattern: file_pattern.into(),
        }
    }

    pub fn from_config(config: &TemplateConfig) -> Self {
        Self::new(&config.directory, &config.file_pattern)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `{code}` in the file pattern is replaced by the lower-cased form code
    pub fn path_for(&self, form_type: FormType) -> PathBuf {
        let file_name = self.file_pattern.replace("{code}", &form_type.code().to_lowercase());
        self.root.join(file_name)
    }

    pub fn load(&self, form_type: FormType) -> FormResult<Template> {
        let path = self.path_for(form_type);
        if !path.is_file() {
            warn!(form_type = %form_type, path = %path.display(), "Template not found");
            return Err(FormFillError::template_not_found(form_type.code(), path.display().to_string()));
        }

        let bytes = fs::read(&path).map_err(|e| FormFillError::storage(path.display().to_string(), e.to_string()))?;
        if bytes.is_empty() {
            return Err(FormFillError::template_structure(format!("{} is empty", path.display())));
        }

        debug!(form_type = %form_type, path = %path.display(), bytes = bytes.len(), "Template loaded");
        Ok(Template { form_type, path, bytes })
    }

    /// Form types whose template file exists
    pub fn available(&self) -> Vec<FormType> {
        FormType::ALL
            .iter()
            .copied()
            .filter(|form_type| self.path_for(*form_type).is_file())
            .collect()
    }
}
