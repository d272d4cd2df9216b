//! Value Writer
//!
//! Writes resolved values into the field dictionaries of a loaded
//! template. Text fields receive a text string, choice groups switch one
//! member on and every other member off. Failures are per field.

use lopdf::{text_string, Dictionary, Document, Object, ObjectId};
use serde::Serialize;
use tracing::{debug, info};

use complymate_models::{Diagnostic, FieldKind, ResolvedAssignment};
use complymate_utils::{FormFillError, FormResult};

use crate::degrade::Diagnostics;
use crate::field_index::{FieldDescriptor, FieldIndex};
use crate::pdf_objects::{name, type_name, OFF_STATE};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WriteSummary {
    /// Identifiers whose value was written, in assignment order
    pub written: Vec<String>,
    /// Member widgets switched to the off state
    pub switched_off: usize,
}

impl WriteSummary {
    pub fn fields_written(&self) -> usize {
        self.written.len()
    }
}

pub fn apply(
    doc: &mut Document,
    index: &mut FieldIndex,
    assignment: &ResolvedAssignment,
    diagnostics: &mut Diagnostics,
) -> WriteSummary {
    let mut summary = WriteSummary::default();

    for (identifier, entry) in assignment.iter() {
        let Some(descriptor) = index.get_mut(identifier) else {
            diagnostics.push(Diagnostic::new(
                identifier,
                "FIELD_RESOLUTION",
                "field is not part of the template",
            ));
            continue;
        };

        let outcome = match descriptor.kind {
            FieldKind::Text => write_text(doc, descriptor, &entry.value).map(|_| 0),
            FieldKind::ChoiceGroup => select_choice(doc, descriptor, &entry.value),
        };
        if let Some(switched_off) = diagnostics.absorb(identifier, outcome) {
            debug!(field = %identifier, source = ?entry.source, "Field written");
            summary.written.push(identifier.to_string());
            summary.switched_off += switched_off;
        }
    }

    let outcome = enable_need_appearances(doc);
    diagnostics.absorb("AcroForm", outcome);

    info!(
        written = summary.fields_written(),
        switched_off = summary.switched_off,
        failed = assignment.len() - summary.fields_written(),
        "Values written"
    );
    summary
}

fn write_text(doc: &mut Document, descriptor: &mut FieldDescriptor, value: &str) -> FormResult<()> {
    dictionary_mut(doc, descriptor.node)?.set("V", text_string(value));
    descriptor.current_value = Some(value.to_string());
    Ok(())
}

/// Returns how many members were switched off
fn select_choice(doc: &mut Document, descriptor: &mut FieldDescriptor, value: &str) -> FormResult<usize> {
    let export = match descriptor.member_for(value) {
        Some(member) => member.export_value.clone(),
        None => {
            let options: Vec<&str> = descriptor.export_values().collect();
            return Err(FormFillError::field_resolution(
                descriptor.identifier.as_str(),
                format!("'{}' is not one of [{}]", value, options.join(", ")),
            ));
        }
    };

    let mut switched_off = 0;
    for member in descriptor.members.iter_mut() {
        let selected = member.export_value == export;
        let state = if selected { export.as_str() } else { OFF_STATE };
        dictionary_mut(doc, member.widget)?.set("AS", name(state));
        member.selected = selected;
        if !selected {
            switched_off += 1;
        }
    }

    dictionary_mut(doc, descriptor.node)?.set("V", name(&export));
    descriptor.current_value = Some(export);
    Ok(switched_off)
}

/// Ask viewers to regenerate appearance streams for the new values
fn enable_need_appearances(doc: &mut Document) -> FormResult<()> {
    let root_id = match doc.trailer.get(b"Root") {
        Ok(Object::Reference(id)) => *id,
        _ => return Err(FormFillError::template_structure("catalog is not an indirect object")),
    };

    let indirect_form = match dictionary_mut(doc, root_id)?.get(b"AcroForm") {
        Ok(Object::Reference(id)) => Some(*id),
        Ok(Object::Dictionary(_)) => None,
        Ok(other) => {
            return Err(FormFillError::template_structure(format!(
                "AcroForm is a {}, expected a dictionary",
                type_name(other)
            )))
        }
        Err(_) => return Err(FormFillError::template_structure("document has no AcroForm")),
    };

    let acro_form = match indirect_form {
        Some(id) => dictionary_mut(doc, id)?,
        None => match dictionary_mut(doc, root_id)?.get_mut(b"AcroForm") {
            Ok(Object::Dictionary(form)) => form,
            _ => return Err(FormFillError::template_structure("document has no AcroForm")),
        },
    };
    acro_form.set("NeedAppearances", Object::Boolean(true));
    Ok(())
}

fn dictionary_mut(doc: &mut Document, id: ObjectId) -> FormResult<&mut Dictionary> {
    match doc.get_object_mut(id) {
        Ok(Object::Dictionary(dict)) => Ok(dict),
        Ok(Object::Stream(stream)) => Ok(&mut stream.dict),
        Ok(other) => Err(FormFillError::field_resolution(
            format!("{} {} R", id.0, id.1),
            format!("expected a dictionary, found {}", type_name(other)),
        )),
        Err(e) => Err(FormFillError::field_resolution(
            format!("{} {} R", id.0, id.1),
            format!("missing object: {}", e),
        )),
    }
}
