//! ComplyMate Forms CLI
//!
//! Lists templates, inspects their fields and generates filled forms from
//! a JSON file of facts. Results are printed to stdout as JSON, logs go to
//! stderr.

use anyhow::{Context, Result};
use serde::Serialize;
use std::env;
use std::fs;
use std::process::ExitCode;
use tracing::{info, warn};

use complymate_form_filler::FormFillerService;
use complymate_models::{FactDictionary, FormType};
use complymate_utils::{init_logging, AppConfig};

const USAGE: &str = "usage: complymate-forms <command>

commands:
  templates                    list catalogued forms and their template files
  discover <code>              list the field identifiers of a template
  describe <code>              field kinds, current values and options
  audit <code>                 catalog targets missing from a template
  generate <code> <facts.json> fill and archive a form";

fn main() -> Result<ExitCode> {
    let config = AppConfig::load().unwrap_or_else(|e| {
        eprintln!("Configuration not loaded ({}), using defaults", e);
        AppConfig::default()
    });
    init_logging(&config.logging)?;

    let service = FormFillerService::from_config(&config)?;
    info!(
        templates = %service.templates().root().display(),
        output = %service.archive().directory().display(),
        "Using form directories"
    );
    let args: Vec<String> = env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    match args.as_slice() {
        ["templates"] => print_json(&service.list_templates())?,
        ["discover", code] => print_json(&service.discover_fields(code)?)?,
        ["describe", code] => print_json(&service.describe_fields(code)?)?,
        ["audit", code] => {
            let audit = service.audit_mappings(code)?;
            if !audit.is_complete() {
                warn!(
                    missing_targets = audit.missing_targets.len(),
                    unmapped_fields = audit.unmapped_fields.len(),
                    "Catalog does not fully cover template"
                );
            }
            print_json(&audit)?;
        }
        ["generate", code, facts_path] => generate(&service, code, facts_path)?,
        _ => {
            eprintln!("{}", USAGE);
            return Ok(ExitCode::from(2));
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn generate(service: &FormFillerService, code: &str, facts_path: &str) -> Result<()> {
    let source = fs::read_to_string(facts_path).with_context(|| format!("Failed to read {}", facts_path))?;
    let value: serde_json::Value =
        serde_json::from_str(&source).with_context(|| format!("Failed to parse {}", facts_path))?;
    let facts = FactDictionary::from_json(value)?;

    let form_type = FormType::from_code(code)?;
    let missing = service.missing_facts(form_type, &facts);
    if !missing.is_empty() {
        info!(
            form_type = %form_type,
            missing = missing.len(),
            completion = service.completion_percentage(form_type, &facts),
            "Generating with incomplete facts"
        );
    }

    let form = service.try_generate(code, &facts)?;
    print_json(&form)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
