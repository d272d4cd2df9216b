//! Field Index Builder
//!
//! Walks a template's AcroForm tree into a flat, ordered index of fillable
//! fields. Falls back to page widget annotations when the form dictionary
//! lists no fields of its own.

use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::{HashMap, HashSet};
use tracing::debug;

use complymate_models::{Diagnostic, FieldKind, FieldSummary};
use complymate_utils::{FormFillError, FormResult};

use crate::degrade::Diagnostics;
use crate::pdf_objects::{
    clean_identifier, dictionary, lookup_array, lookup_dictionary, lookup_integer, lookup_name,
    lookup_text, resolve, type_name, OFF_STATE,
};

/// Button field flag: radio group rather than checkbox
const FLAG_RADIO: i64 = 1 << 15;
/// Button field flag: push button, not fillable
const FLAG_PUSHBUTTON: i64 = 1 << 16;
const MAX_FIELD_DEPTH: usize = 16;

/// One selectable widget of a choice group
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceMember {
    pub export_value: String,
    pub widget: ObjectId,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub identifier: String,
    pub kind: FieldKind,
    pub current_value: Option<String>,
    /// Options of a choice group in widget order, empty for text fields
    pub members: Vec<ChoiceMember>,
    /// Field dictionary that receives `/V`
    pub node: ObjectId,
}

impl FieldDescriptor {
    pub fn text(identifier: impl Into<String>, node: ObjectId) -> Self {
        Self {
            identifier: identifier.into(),
            kind: FieldKind::Text,
            current_value: None,
            members: Vec::new(),
            node,
        }
    }

    pub fn choice_group(identifier: impl Into<String>, node: ObjectId, members: Vec<ChoiceMember>) -> Self {
        let current_value = members
            .iter()
            .find(|member| member.selected)
            .map(|member| member.export_value.clone());

        Self {
            identifier: identifier.into(),
            kind: FieldKind::ChoiceGroup,
            current_value,
            members,
            node,
        }
    }

    pub fn with_value(mut self, value: Option<String>) -> Self {
        self.current_value = value;
        self
    }

    pub fn export_values(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|member| member.export_value.as_str())
    }

    /// Member whose export value matches, exactly first and then ignoring case
    pub fn member_for(&self, value: &str) -> Option<&ChoiceMember> {
        self.members
            .iter()
            .find(|member| member.export_value == value)
            .or_else(|| {
                self.members
                    .iter()
                    .find(|member| member.export_value.eq_ignore_ascii_case(value.trim()))
            })
    }

    pub fn selected_members(&self) -> impl Iterator<Item = &ChoiceMember> {
        self.members.iter().filter(|member| member.selected)
    }

    pub fn summary(&self) -> FieldSummary {
        let mut options: Vec<String> = Vec::new();
        for export in self.export_values() {
            if !options.iter().any(|seen| seen == export) {
                options.push(export.to_string());
            }
        }

        FieldSummary {
            identifier: self.identifier.clone(),
            kind: self.kind,
            current_value: self.current_value.clone(),
            options,
        }
    }
}

/// Fillable fields of one template, in document order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldIndex {
    fields: Vec<FieldDescriptor>,
    positions: HashMap<String, usize>,
}

impl FieldIndex {
    /// Parse template bytes and index their fields
    pub fn build_from_bytes(template_bytes: &[u8], diagnostics: &mut Diagnostics) -> FormResult<(Document, Self)> {
        let doc = load_document(template_bytes)?;
        let index = Self::build(&doc, diagnostics)?;
        Ok((doc, index))
    }

    pub fn build(doc: &Document, diagnostics: &mut Diagnostics) -> FormResult<Self> {
        let catalog = catalog_dictionary(doc)?;
        let acro_form = lookup_dictionary(doc, catalog, b"AcroForm")
            .map_err(|e| FormFillError::template_structure(format!("unreadable AcroForm: {}", e)))?
            .ok_or_else(|| FormFillError::template_structure("document has no AcroForm field container"))?;
        let fields = lookup_array(doc, acro_form, b"Fields")
            .map_err(|e| FormFillError::template_structure(format!("unreadable AcroForm fields: {}", e)))?;

        let mut builder = IndexBuilder::new(doc, diagnostics);
        for entry in fields {
            match entry {
                Object::Reference(id) => {
                    let outcome = builder.walk_field(*id, &Inherited::default(), 0);
                    builder.diagnostics.absorb(&object_label(*id), outcome);
                }
                other => builder.diagnostics.push(Diagnostic::new(
                    "AcroForm.Fields",
                    "FIELD_RESOLUTION",
                    format!("field entry is a direct {}, expected an indirect reference", type_name(other)),
                )),
            }
        }

        if builder.index.is_empty() {
            debug!("AcroForm lists no fields, scanning page annotations");
            builder.collect_page_widgets();
        }

        debug!(fields = builder.index.len(), "Field index built");
        Ok(builder.index)
    }

    /// Index built from already known descriptors; later duplicates merge into the first
    pub fn from_descriptors(descriptors: impl IntoIterator<Item = FieldDescriptor>) -> Self {
        let mut index = Self::default();
        for descriptor in descriptors {
            index.insert(descriptor);
        }
        index
    }

    fn insert(&mut self, descriptor: FieldDescriptor) {
        match self.positions.get(&descriptor.identifier) {
            Some(&position) => {
                let existing = &mut self.fields[position];
                if existing.kind == FieldKind::ChoiceGroup && descriptor.kind == FieldKind::ChoiceGroup {
                    existing.members.extend(descriptor.members);
                } else {
                    debug!(identifier = %descriptor.identifier, "Duplicate field name ignored");
                }
            }
            None => {
                self.positions.insert(descriptor.identifier.clone(), self.fields.len());
                self.fields.push(descriptor);
            }
        }
    }

    pub fn get(&self, identifier: &str) -> Option<&FieldDescriptor> {
        self.positions.get(identifier).map(|&position| &self.fields[position])
    }

    pub fn get_mut(&mut self, identifier: &str) -> Option<&mut FieldDescriptor> {
        match self.positions.get(identifier) {
            Some(&position) => Some(&mut self.fields[position]),
            None => None,
        }
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.positions.contains_key(identifier)
    }

    pub fn kind_of(&self, identifier: &str) -> Option<FieldKind> {
        self.get(identifier).map(|descriptor| descriptor.kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter()
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|descriptor| descriptor.identifier.as_str())
    }

    pub fn summaries(&self) -> Vec<FieldSummary> {
        self.fields.iter().map(FieldDescriptor::summary).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Identifiers of a template, in document order
pub fn build_index(template_bytes: &[u8]) -> FormResult<FieldIndex> {
    let mut diagnostics = Diagnostics::new();
    let (_, index) = FieldIndex::build_from_bytes(template_bytes, &mut diagnostics)?;
    Ok(index)
}

/// Parse a template, giving every embedded field dictionary its own object
pub fn load_document(template_bytes: &[u8]) -> FormResult<Document> {
    let mut doc = Document::load_mem(template_bytes)
        .map_err(|e| FormFillError::template_structure(format!("unreadable PDF: {}", e)))?;

    let promoted = promote_direct_fields(&mut doc);
    if promoted > 0 {
        debug!(promoted, "Embedded field dictionaries moved into their own objects");
    }
    Ok(doc)
}

/// Rewrite direct dictionaries in `/Fields` and every `/Kids` below it as
/// references, so each field node has an object id the writer can target.
/// Returns how many dictionaries were moved.
pub fn promote_direct_fields(doc: &mut Document) -> usize {
    let Some(root) = doc.trailer.get(b"Root").ok().and_then(|root| root.as_reference().ok()) else {
        return 0;
    };
    let Some(fields) = locate_array(doc, root, &[b"AcroForm", b"Fields"]) else {
        return 0;
    };

    let mut promoted = 0;
    let mut pending = promote_entries(doc, &fields, None, &mut promoted);
    let mut visited = HashSet::new();
    while let Some(id) = pending.pop() {
        if !visited.insert(id) {
            continue;
        }
        if let Some(kids) = locate_array(doc, id, &[b"Kids"]) {
            pending.extend(promote_entries(doc, &kids, Some(id), &mut promoted));
        }
    }
    promoted
}

/// An array reached from `owner` through direct dictionary keys
struct ArraySlot {
    owner: ObjectId,
    path: Vec<&'static [u8]>,
}

fn locate_array(doc: &Document, owner: ObjectId, keys: &[&'static [u8]]) -> Option<ArraySlot> {
    let mut slot = ArraySlot { owner, path: Vec::new() };
    let mut current = doc.get_object(owner).ok()?;
    for key in keys {
        current = current.as_dict().ok()?.get(key).ok()?;
        slot.path.push(*key);
        if let Object::Reference(id) = current {
            slot = ArraySlot { owner: *id, path: Vec::new() };
            current = doc.get_object(*id).ok()?;
        }
    }

    matches!(current, Object::Array(_)).then_some(slot)
}

fn array_mut<'a>(doc: &'a mut Document, slot: &ArraySlot) -> Option<&'a mut Vec<Object>> {
    let mut current = doc.get_object_mut(slot.owner).ok()?;
    for key in &slot.path {
        current = current.as_dict_mut().ok()?.get_mut(key).ok()?;
    }
    current.as_array_mut().ok()
}

/// Object ids of every dictionary entry in the slot, after promotion
fn promote_entries(
    doc: &mut Document,
    slot: &ArraySlot,
    parent: Option<ObjectId>,
    promoted: &mut usize,
) -> Vec<ObjectId> {
    let Some(entries) = array_mut(doc, slot).map(std::mem::take) else {
        return Vec::new();
    };

    let mut ids = Vec::with_capacity(entries.len());
    let mut rewritten = Vec::with_capacity(entries.len());
    for entry in entries {
        match entry {
            Object::Dictionary(mut field) => {
                if let Some(parent) = parent {
                    if !field.has(b"Parent") {
                        field.set("Parent", parent);
                    }
                }
                let id = doc.add_object(field);
                *promoted += 1;
                ids.push(id);
                rewritten.push(Object::Reference(id));
            }
            Object::Reference(id) => {
                ids.push(id);
                rewritten.push(Object::Reference(id));
            }
            other => rewritten.push(other),
        }
    }

    if let Some(entries) = array_mut(doc, slot) {
        *entries = rewritten;
    }
    ids
}

fn catalog_dictionary(doc: &Document) -> FormResult<&Dictionary> {
    let root = doc
        .trailer
        .get(b"Root")
        .map_err(|_| FormFillError::template_structure("trailer has no /Root catalog"))?;

    match resolve(doc, root) {
        Ok(Object::Dictionary(catalog)) => Ok(catalog),
        Ok(other) => Err(FormFillError::template_structure(format!(
            "catalog is a {}, expected a dictionary",
            type_name(other)
        ))),
        Err(e) => Err(FormFillError::template_structure(format!("unreadable catalog: {}", e))),
    }
}

fn object_label(id: ObjectId) -> String {
    format!("object {} {} R", id.0, id.1)
}

/// Attributes a field inherits from its ancestors
#[derive(Debug, Clone, Default)]
struct Inherited {
    prefix: Option<String>,
    field_type: Option<String>,
    flags: Option<i64>,
}

struct IndexBuilder<'a> {
    doc: &'a Document,
    index: FieldIndex,
    visited: HashSet<ObjectId>,
    diagnostics: &'a mut Diagnostics,
}

impl<'a> IndexBuilder<'a> {
    fn new(doc: &'a Document, diagnostics: &'a mut Diagnostics) -> Self {
        Self {
            doc,
            index: FieldIndex::default(),
            visited: HashSet::new(),
            diagnostics,
        }
    }

    fn walk_field(&mut self, id: ObjectId, inherited: &Inherited, depth: usize) -> FormResult<()> {
        if depth > MAX_FIELD_DEPTH {
            return Err(FormFillError::field_resolution(object_label(id), "field tree too deep"));
        }
        if !self.visited.insert(id) {
            return Ok(());
        }

        let doc = self.doc;
        let dict = dictionary(doc, id)?;

        let partial = lookup_text(doc, dict, b"T")?
            .map(|raw| clean_identifier(&raw))
            .filter(|name| !name.is_empty());
        let name = match (&inherited.prefix, partial) {
            (Some(prefix), Some(partial)) => Some(format!("{}.{}", prefix, partial)),
            (None, Some(partial)) => Some(partial),
            (prefix, None) => prefix.clone(),
        };
        let field_type = lookup_name(doc, dict, b"FT")?.or_else(|| inherited.field_type.clone());
        let flags = lookup_integer(doc, dict, b"Ff")?.or(inherited.flags);

        let mut child_fields = Vec::new();
        let mut widgets = Vec::new();
        for kid in lookup_array(doc, dict, b"Kids")? {
            let Object::Reference(kid_id) = kid else {
                self.diagnostics.push(Diagnostic::new(
                    name.clone().unwrap_or_else(|| object_label(id)),
                    "FIELD_RESOLUTION",
                    format!("kid is a direct {}, expected an indirect reference", type_name(kid)),
                ));
                continue;
            };
            let resolved = dictionary(doc, *kid_id).map(|kid_dict| kid_dict.has(b"T"));
            match self.diagnostics.absorb(&object_label(*kid_id), resolved) {
                Some(true) => child_fields.push(*kid_id),
                Some(false) => widgets.push(*kid_id),
                None => {}
            }
        }

        if !child_fields.is_empty() {
            let next = Inherited {
                prefix: name,
                field_type,
                flags,
            };
            for child in child_fields {
                let outcome = self.walk_field(child, &next, depth + 1);
                self.diagnostics.absorb(&object_label(child), outcome);
            }
            return Ok(());
        }

        let identifier =
            name.ok_or_else(|| FormFillError::field_resolution(object_label(id), "terminal field has no name"))?;
        let Some(kind) = classify(&identifier, field_type.as_deref(), flags.unwrap_or(0))? else {
            debug!(identifier = %identifier, "Skipping non-fillable field");
            return Ok(());
        };

        let descriptor = match kind {
            FieldKind::Text => {
                let value = lookup_text(doc, dict, b"V")?.filter(|value| !value.is_empty());
                FieldDescriptor::text(identifier, id).with_value(value)
            }
            FieldKind::ChoiceGroup => {
                let widget_ids = if widgets.is_empty() { vec![id] } else { widgets };
                let mut members = Vec::with_capacity(widget_ids.len());
                for widget in widget_ids {
                    let member = read_member(doc, &identifier, widget);
                    if let Some(member) = self.diagnostics.absorb(&identifier, member) {
                        members.push(member);
                    }
                }
                FieldDescriptor::choice_group(identifier, id, members)
            }
        };

        self.index.insert(descriptor);
        Ok(())
    }

    fn collect_page_widgets(&mut self) {
        let doc = self.doc;
        for (page_number, page_id) in doc.get_pages() {
            let subject = format!("page {}", page_number);
            let annotations = dictionary(doc, page_id).and_then(|page| lookup_array(doc, page, b"Annots"));
            let Some(annotations) = self.diagnostics.absorb(&subject, annotations) else {
                continue;
            };

            for annotation in annotations {
                if let Object::Reference(annotation_id) = annotation {
                    let outcome = self.collect_widget(*annotation_id);
                    self.diagnostics.absorb(&subject, outcome);
                }
            }
        }
    }

    fn collect_widget(&mut self, id: ObjectId) -> FormResult<()> {
        let doc = self.doc;
        let dict = dictionary(doc, id)?;
        if lookup_name(doc, dict, b"Subtype")?.as_deref() != Some("Widget") {
            return Ok(());
        }

        let node = if dict.has(b"T") {
            id
        } else {
            match dict.get(b"Parent") {
                Ok(Object::Reference(parent)) => *parent,
                _ => {
                    return Err(FormFillError::field_resolution(
                        object_label(id),
                        "widget has neither a name nor a parent field",
                    ))
                }
            }
        };
        if self.visited.contains(&node) {
            return Ok(());
        }

        let inherited = self.ancestry(node)?;
        self.walk_field(node, &inherited, 0)
    }

    /// Name prefix, type and flags contributed by the ancestors of `node`
    fn ancestry(&self, node: ObjectId) -> FormResult<Inherited> {
        let doc = self.doc;
        let mut names = Vec::new();
        let mut inherited = Inherited::default();
        let mut parent = parent_of(dictionary(doc, node)?);

        for _ in 0..MAX_FIELD_DEPTH {
            let Some(parent_id) = parent else {
                break;
            };
            let dict = dictionary(doc, parent_id)?;
            if let Some(partial) = lookup_text(doc, dict, b"T")? {
                names.push(clean_identifier(&partial));
            }
            if inherited.field_type.is_none() {
                inherited.field_type = lookup_name(doc, dict, b"FT")?;
            }
            if inherited.flags.is_none() {
                inherited.flags = lookup_integer(doc, dict, b"Ff")?;
            }
            parent = parent_of(dict);
        }

        names.retain(|name| !name.is_empty());
        names.reverse();
        if !names.is_empty() {
            inherited.prefix = Some(names.join("."));
        }
        Ok(inherited)
    }
}

fn parent_of(dict: &Dictionary) -> Option<ObjectId> {
    match dict.get(b"Parent") {
        Ok(Object::Reference(parent)) => Some(*parent),
        _ => None,
    }
}

/// `None` for fields that exist but cannot be filled (push buttons, signatures)
fn classify(identifier: &str, field_type: Option<&str>, flags: i64) -> FormResult<Option<FieldKind>> {
    match field_type {
        Some("Tx") | Some("Ch") => Ok(Some(FieldKind::Text)),
        Some("Btn") if flags & FLAG_PUSHBUTTON != 0 => Ok(None),
        Some("Btn") => {
            if flags & FLAG_RADIO == 0 {
                debug!(identifier = %identifier, "Checkbox indexed as a single-option choice group");
            }
            Ok(Some(FieldKind::ChoiceGroup))
        }
        Some(_) => Ok(None),
        None => Err(FormFillError::field_resolution(identifier, "field has no /FT type")),
    }
}

/// Export value is the normal appearance state that is not `Off`
fn read_member(doc: &Document, identifier: &str, widget: ObjectId) -> FormResult<ChoiceMember> {
    let dict = dictionary(doc, widget)?;

    let mut export_value = None;
    if let Some(appearances) = lookup_dictionary(doc, dict, b"AP")? {
        if let Some(normal) = lookup_dictionary(doc, appearances, b"N")? {
            export_value = normal
                .iter()
                .map(|(state, _)| String::from_utf8_lossy(state).into_owned())
                .find(|state| state != OFF_STATE);
        }
    }

    let export_value = export_value.ok_or_else(|| {
        FormFillError::field_resolution(
            identifier,
            format!("{} has no on-state appearance", object_label(widget)),
        )
    })?;
    let state = lookup_name(doc, dict, b"AS")?;
    let selected = state.as_deref() == Some(export_value.as_str());

    Ok(ChoiceMember {
        export_value,
        widget,
        selected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    fn group() -> FieldDescriptor {
        FieldDescriptor::choice_group(
            "Group1",
            (10, 0),
            vec![
                ChoiceMember { export_value: "Death".to_string(), widget: (11, 0), selected: false },
                ChoiceMember { export_value: "Days away from work".to_string(), widget: (12, 0), selected: true },
            ],
        )
    }

    #[test]
    fn test_choice_group_reports_selected_value() {
        let descriptor = group();
        assert_eq!(descriptor.current_value.as_deref(), Some("Days away from work"));
        assert_eq!(descriptor.member_for("death").unwrap().widget, (11, 0));
        assert!(descriptor.member_for("Maybe").is_none());
        assert_eq!(descriptor.summary().options, vec!["Death", "Days away from work"]);
    }

    #[test]
    fn test_from_descriptors_merges_duplicate_groups() {
        let mut extra = group();
        extra.members = vec![ChoiceMember {
            export_value: "Other recordable cases".to_string(),
            widget: (13, 0),
            selected: false,
        }];

        let index = FieldIndex::from_descriptors(vec![
            FieldDescriptor::text("Job Title 1", (1, 0)),
            group(),
            extra,
            FieldDescriptor::text("Job Title 1", (2, 0)),
        ]);

        assert_eq!(index.len(), 2);
        assert_eq!(index.get("Group1").unwrap().members.len(), 3);
        assert_eq!(index.get("Job Title 1").unwrap().node, (1, 0));
        assert_eq!(index.identifiers().collect::<Vec<_>>(), vec!["Job Title 1", "Group1"]);
    }

    #[test]
    fn test_classify_field_types() {
        assert_eq!(classify("a", Some("Tx"), 0).unwrap(), Some(FieldKind::Text));
        assert_eq!(classify("a", Some("Ch"), 0).unwrap(), Some(FieldKind::Text));
        assert_eq!(classify("a", Some("Btn"), FLAG_RADIO).unwrap(), Some(FieldKind::ChoiceGroup));
        assert_eq!(classify("a", Some("Btn"), 0).unwrap(), Some(FieldKind::ChoiceGroup));
        assert_eq!(classify("a", Some("Btn"), FLAG_PUSHBUTTON).unwrap(), None);
        assert_eq!(classify("a", Some("Sig"), 0).unwrap(), None);
        assert!(classify("a", None, 0).is_err());
    }

    #[test]
    fn test_unreadable_bytes_are_a_structure_error() {
        let error = build_index(b"not a pdf").unwrap_err();
        assert_eq!(error.error_code(), "TEMPLATE_STRUCTURE_ERROR");
    }

    #[test]
    fn test_embedded_field_dictionaries_are_promoted() {
        let mut doc = Document::with_version("1.5");
        let kid = dictionary! { "FT" => "Tx", "T" => Object::string_literal("Name") };
        let parent = dictionary! {
            "T" => Object::string_literal("Employer"),
            "Kids" => vec![Object::Dictionary(kid)],
        };
        let city = dictionary! { "FT" => "Tx", "T" => Object::string_literal("City") };
        let catalog = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "AcroForm" => dictionary! { "Fields" => vec![Object::Dictionary(parent), Object::Dictionary(city)] },
        });
        doc.trailer.set("Root", catalog);

        assert_eq!(promote_direct_fields(&mut doc), 3);
        assert_eq!(promote_direct_fields(&mut doc), 0);

        let mut diagnostics = Diagnostics::new();
        let index = FieldIndex::build(&doc, &mut diagnostics).unwrap();
        assert!(diagnostics.is_empty());
        assert_eq!(index.identifiers().collect::<Vec<_>>(), vec!["Employer.Name", "City"]);

        let kid = doc.get_object(index.get("Employer.Name").unwrap().node).unwrap();
        let parent = kid.as_dict().unwrap().get(b"Parent").unwrap().as_reference().unwrap();
        let parent_name = doc.get_object(parent).unwrap().as_dict().unwrap().get(b"T").unwrap();
        assert_eq!(parent_name.as_str().unwrap(), b"Employer");
    }
}
