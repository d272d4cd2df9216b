//! Form Archive
//!
//! Output directory for generated forms. Names carry a timestamp and a
//! UUID fragment, and files are opened with `create_new` so two
//! generations never write to the same path.

use chrono::{DateTime, Utc};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

use complymate_models::FormType;
use complymate_utils::{validate_output_file_name, FormFillError, FormResult, OutputConfig};

/// A form written to the archive
#[derive(Debug, Clone, PartialEq)]
pub struct StoredForm {
    pub id: Uuid,
    pub file_name: String,
    pub path: PathBuf,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct FormArchive {
    directory: PathBuf,
    file_prefix: String,
}

impl FormArchive {
    pub fn new(directory: impl Into<PathBuf>, file_prefix: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            file_prefix: file_prefix.into(),
        }
    }

    pub fn from_config(config: &OutputConfig) -> Self {
        Self::new(&config.directory, &config.file_prefix)
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// `{prefix}_{code}_{YYYYMMDD_HHMMSS}_{8 hex}.pdf`
    pub fn file_name_for(&self, form_type: FormType, created_at: DateTime<Utc>, id: Uuid) -> String {
        let simple = id.simple().to_string();
        format!(
            "{}_{}_{}_{}.pdf",
            self.file_prefix,
            form_type.code().to_lowercase(),
            created_at.format("%Y%m%d_%H%M%S"),
            &simple[..8]
        )
    }

    pub fn store(&self, form_type: FormType, bytes: &[u8]) -> FormResult<StoredForm> {
        fs::create_dir_all(&self.directory)
            .map_err(|e| FormFillError::storage(self.directory.display().to_string(), e.to_string()))?;

        let id = Uuid::new_v4();
        let created_at = Utc::now();
        let file_name = self.file_name_for(form_type, created_at, id);
        let path = self.directory.join(&file_name);

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| FormFillError::storage(path.display().to_string(), e.to_string()))?;
        file.write_all(bytes)
            .and_then(|_| file.sync_all())
            .map_err(|e| FormFillError::storage(path.display().to_string(), e.to_string()))?;

        info!(form_type = %form_type, file_name = %file_name, bytes = bytes.len(), "Form stored");

        Ok(StoredForm {
            id,
            file_name,
            path,
            created_at,
        })
    }

    /// Read back a generated form by file name
    pub fn read(&self, file_name: &str) -> FormResult<Vec<u8>> {
        validate_output_file_name(file_name)?;

        let path = self.directory.join(file_name);
        fs::read(&path).map_err(|e| FormFillError::storage(path.display().to_string(), e.to_string()))
    }

    /// Generated file names, newest name last
    pub fn list(&self) -> FormResult<Vec<String>> {
        let entries = match fs::read_dir(&self.directory) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(FormFillError::storage(self.directory.display().to_string(), e.to_string())),
        };

        let prefix = format!("{}_", self.file_prefix);
        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.starts_with(&prefix) && name.ends_with(".pdf"))
            .collect();
        names.sort();
        Ok(names)
    }
}
