//! Form Filler Service
//!
//! Entry point for callers: loads a template, resolves facts onto its
//! fields, writes them and archives the result. Holds only immutable
//! state, so one instance can be shared across threads.

use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use complymate_models::{
    Diagnostic, FactDictionary, FieldKind, FieldSummary, FormType, GeneratedForm, ResolvedAssignment,
};
use complymate_utils::{validate_config, AppConfig, FormFillError, FormResult};

use crate::archive::FormArchive;
use crate::catalog::{FactPrompt, FormCatalog, FormMapping};
use crate::degrade::Diagnostics;
use crate::field_index::{build_index, FieldIndex};
use crate::mapper::{pattern_matches, DataMapper};
use crate::serializer::serialize;
use crate::template_store::TemplateStore;
use crate::writer;

/// A form filled in memory
#[derive(Debug, Clone)]
pub struct FilledForm {
    pub form_type: FormType,
    pub bytes: Vec<u8>,
    pub assignment: ResolvedAssignment,
    pub fields_written: usize,
    pub diagnostics: Vec<Diagnostic>,
}

/// How well the catalog covers a template
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappingAudit {
    pub form_type: FormType,
    pub template_fields: usize,
    /// Alias and rule targets the template does not have
    pub missing_targets: Vec<String>,
    /// Template fields no alias, rule or pattern can reach
    pub unmapped_fields: Vec<String>,
}

impl MappingAudit {
    pub fn is_complete(&self) -> bool {
        self.missing_targets.is_empty() && self.unmapped_fields.is_empty()
    }
}

/// A catalogued form and where its template is expected
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateListing {
    pub form_type: FormType,
    pub title: &'static str,
    pub path: PathBuf,
    pub available: bool,
}

#[derive(Debug, Clone)]
pub struct FormFillerService {
    catalog: Arc<FormCatalog>,
    templates: TemplateStore,
    archive: FormArchive,
}

impl FormFillerService {
    pub fn new(catalog: FormCatalog, templates: TemplateStore, archive: FormArchive) -> Self {
        Self {
            catalog: Arc::new(catalog),
            templates,
            archive,
        }
    }

    pub fn from_config(config: &AppConfig) -> FormResult<Self> {
        validate_config(config)?;
        let catalog = FormCatalog::load(config.forms.catalog_path.as_deref())?;

        info!(
            templates = %config.templates.directory,
            output = %config.output.directory,
            forms = catalog.form_types().len(),
            "Form filler configured"
        );

        Ok(Self::new(
            catalog,
            TemplateStore::from_config(&config.templates),
            FormArchive::from_config(&config.output),
        ))
    }

    pub fn templates(&self) -> &TemplateStore {
        &self.templates
    }

    pub fn archive(&self) -> &FormArchive {
        &self.archive
    }

    /// Generate and archive a form, logging any failure
    pub fn generate(&self, form_type_code: &str, facts: &FactDictionary) -> Option<GeneratedForm> {
        match self.try_generate(form_type_code, facts) {
            Ok(form) => Some(form),
            Err(e) => {
                error!(
                    form_type = %form_type_code,
                    code = e.error_code(),
                    error = %e,
                    "{}",
                    e.user_message()
                );
                None
            }
        }
    }

    pub fn try_generate(&self, form_type_code: &str, facts: &FactDictionary) -> FormResult<GeneratedForm> {
        let form_type = FormType::from_code(form_type_code)?;
        let template = self.templates.load(form_type)?;
        let template_sha256 = template.sha256();

        let filled = self.fill(form_type, &template.bytes, facts)?;
        let stored = self.archive.store(form_type, &filled.bytes)?;

        if !filled.diagnostics.is_empty() {
            warn!(
                form_type = %form_type,
                diagnostics = filled.diagnostics.len(),
                "Form generated with skipped fields"
            );
        }
        info!(
            form_type = %form_type,
            file_name = %stored.file_name,
            fields_written = filled.fields_written,
            "Form generated"
        );

        Ok(GeneratedForm {
            id: stored.id,
            form_type,
            file_name: stored.file_name,
            path: stored.path,
            created_at: stored.created_at,
            template_sha256,
            fields_written: filled.fields_written,
            diagnostics: filled.diagnostics,
        })
    }

    /// Fill template bytes without touching the archive
    pub fn fill(&self, form_type: FormType, template_bytes: &[u8], facts: &FactDictionary) -> FormResult<FilledForm> {
        let mut diagnostics = Diagnostics::new();
        let (mut doc, mut index) = FieldIndex::build_from_bytes(template_bytes, &mut diagnostics)?;
        if index.is_empty() {
            warn!(form_type = %form_type, "Template has no fillable fields");
        }

        let assignment = DataMapper::new(&self.catalog).resolve(form_type, facts, &index);
        let summary = writer::apply(&mut doc, &mut index, &assignment, &mut diagnostics);
        let bytes = serialize(&mut doc)?;

        Ok(FilledForm {
            form_type,
            bytes,
            assignment,
            fields_written: summary.fields_written(),
            diagnostics: diagnostics.into_entries(),
        })
    }

    /// Field identifiers of a template, in document order
    pub fn discover_fields(&self, form_type_code: &str) -> FormResult<Vec<String>> {
        let index = self.index_for(form_type_code)?;
        Ok(index.identifiers().map(str::to_string).collect())
    }

    pub fn describe_fields(&self, form_type_code: &str) -> FormResult<Vec<FieldSummary>> {
        Ok(self.index_for(form_type_code)?.summaries())
    }

    pub fn audit_mappings(&self, form_type_code: &str) -> FormResult<MappingAudit> {
        let form_type = FormType::from_code(form_type_code)?;
        let index = self.index_for(form_type_code)?;
        let mapping = self.mapping(form_type)?;
        let referenced = mapping.referenced_fields();

        let missing_targets = referenced
            .iter()
            .filter(|target| !index.contains(target))
            .map(|target| target.to_string())
            .collect();

        let unmapped_fields = index
            .iter()
            .filter(|descriptor| !referenced.contains(&descriptor.identifier.as_str()))
            .filter(|descriptor| {
                descriptor.kind != FieldKind::Text
                    || !mapping
                        .patterns
                        .values()
                        .any(|patterns| pattern_matches(&descriptor.identifier, patterns))
            })
            .map(|descriptor| descriptor.identifier.clone())
            .collect();

        Ok(MappingAudit {
            form_type,
            template_fields: index.len(),
            missing_targets,
            unmapped_fields,
        })
    }

    /// Prompts for the facts still missing, in asking order
    pub fn missing_facts(&self, form_type: FormType, facts: &FactDictionary) -> Vec<FactPrompt> {
        self.catalog
            .mapping(form_type)
            .map(|mapping| mapping.missing_facts(facts))
            .unwrap_or_default()
    }

    pub fn completion_percentage(&self, form_type: FormType, facts: &FactDictionary) -> f64 {
        self.catalog
            .mapping(form_type)
            .map(|mapping| mapping.completion_percentage(facts))
            .unwrap_or(0.0)
    }

    /// Form types whose template is present on disk
    pub fn available_forms(&self) -> Vec<FormType> {
        self.templates.available()
    }

    pub fn list_templates(&self) -> Vec<TemplateListing> {
        self.catalog
            .form_types()
            .into_iter()
            .map(|form_type| {
                let path = self.templates.path_for(form_type);
                TemplateListing {
                    form_type,
                    title: form_type.title(),
                    available: path.is_file(),
                    path,
                }
            })
            .collect()
    }

    fn index_for(&self, form_type_code: &str) -> FormResult<FieldIndex> {
        let form_type = FormType::from_code(form_type_code)?;
        let template = self.templates.load(form_type)?;
        build_index(&template.bytes)
    }

    fn mapping(&self, form_type: FormType) -> FormResult<&FormMapping> {
        self.catalog
            .mapping(form_type)
            .ok_or_else(|| FormFillError::configuration(format!("no mapping tables for {}", form_type)))
    }
}
