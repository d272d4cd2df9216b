//! Builds small AcroForm templates in memory for integration tests.

#![allow(dead_code)]

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use complymate_form_filler::{build_index, FieldIndex};

const RADIO_FLAG: i64 = 1 << 15;
const PUSHBUTTON_FLAG: i64 = 1 << 16;

pub const CLASSIFICATIONS: [&str; 4] = [
    "Death",
    "Days away from work",
    "Job transfer or restriction",
    "Other recordable cases",
];

pub const CLASSIFICATION_TOTALS: [&str; 4] = [
    "Death Total",
    "Days away from work Total",
    "Job transfer or restriction Total",
    "Other recordable cases Total",
];

pub const INJURY_TYPES: [&str; 6] = [
    "Injury",
    "Skin Disorder",
    "Respiratory Cond",
    "Poisoning",
    "Hearing Loss",
    "All other",
];

pub const INJURY_TYPE_TOTALS: [&str; 6] = [
    "Injury Total",
    "SkinDisorder Total",
    "RespiratoryCond Total",
    "Poisoning Total",
    "Hearling Loss Total",
    "Allother Total",
];

pub struct TemplateBuilder {
    doc: Document,
    page: ObjectId,
    fields: Vec<Object>,
    annotations: Vec<Object>,
    direct_form: bool,
    list_fields: bool,
}

impl TemplateBuilder {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let page = doc.new_object_id();
        Self {
            doc,
            page,
            fields: Vec::new(),
            annotations: Vec::new(),
            direct_form: false,
            list_fields: true,
        }
    }

    /// The injury-type radio group of the 300 log with its six total fields
    pub fn injury_types(mut self) -> Self {
        self = self.radio("Group1a", &INJURY_TYPES, None);
        for total in INJURY_TYPE_TOTALS {
            self = self.text(total);
        }
        self
    }

    /// The OSHA 300 subset used by the end-to-end scenario
    pub fn log_300() -> Self {
        let mut builder = Self::new()
            .text("Establishment name")
            .radio("Group1", &CLASSIFICATIONS, None);
        for total in CLASSIFICATION_TOTALS {
            builder = builder.text(total);
        }
        builder
            .text("Job Title 1")
            .text("Date of injury or Illness month 1")
            .text("Date of injury or illness day 1")
            .text("Number of days injured or ill away from work 1")
            .text("Number of days injured or ill away from work Total")
    }

    pub fn text(self, name: &str) -> Self {
        self.text_with_value(name, None)
    }

    pub fn text_with_value(self, name: &str, value: Option<&str>) -> Self {
        self.text_field(Object::string_literal(name), value)
    }

    /// Text field whose `/T` holds raw PDFDocEncoding bytes
    pub fn text_encoded(self, name: &[u8]) -> Self {
        self.text_field(Object::String(name.to_vec(), StringFormat::Literal), None)
    }

    fn text_field(mut self, name: Object, value: Option<&str>) -> Self {
        let mut field = self.widget();
        field.set("FT", "Tx");
        field.set("T", name);
        if let Some(value) = value {
            field.set("V", Object::string_literal(value));
        }
        let id = self.doc.add_object(field);
        self.register(id, id);
        self
    }

    /// Radio group with one kid widget per export value
    pub fn radio(mut self, name: &str, exports: &[&str], selected: Option<&str>) -> Self {
        let group = self.doc.new_object_id();
        let mut kids = Vec::new();
        for export in exports {
            let mut widget = self.widget();
            widget.set("Parent", group);
            widget.set("AP", self.appearances(export));
            let state = if selected == Some(*export) { *export } else { "Off" };
            widget.set("AS", Object::Name(state.as_bytes().to_vec()));
            let widget_id = self.doc.add_object(widget);
            self.annotations.push(Object::Reference(widget_id));
            kids.push(Object::Reference(widget_id));
        }

        let mut field = dictionary! {
            "FT" => "Btn",
            "Ff" => RADIO_FLAG,
            "T" => Object::string_literal(name),
            "Kids" => kids,
        };
        if let Some(selected) = selected {
            field.set("V", Object::Name(selected.as_bytes().to_vec()));
        }
        self.doc.objects.insert(group, Object::Dictionary(field));
        self.fields.push(Object::Reference(group));
        self
    }

    pub fn checkbox(mut self, name: &str, export: &str) -> Self {
        let mut field = self.widget();
        field.set("FT", "Btn");
        field.set("T", Object::string_literal(name));
        field.set("AP", self.appearances(export));
        field.set("AS", "Off");
        let id = self.doc.add_object(field);
        self.register(id, id);
        self
    }

    pub fn pushbutton(mut self, name: &str) -> Self {
        let mut field = self.widget();
        field.set("FT", "Btn");
        field.set("Ff", PUSHBUTTON_FLAG);
        field.set("T", Object::string_literal(name));
        let id = self.doc.add_object(field);
        self.register(id, id);
        self
    }

    /// Parent field carrying only a name, with a text kid: `parent.child`
    pub fn nested_text(mut self, parent: &str, child: &str) -> Self {
        let parent_id = self.doc.new_object_id();
        let mut kid = self.widget();
        kid.set("FT", "Tx");
        kid.set("T", Object::string_literal(child));
        kid.set("Parent", parent_id);
        let kid_id = self.doc.add_object(kid);
        self.annotations.push(Object::Reference(kid_id));

        self.doc.objects.insert(
            parent_id,
            Object::Dictionary(dictionary! {
                "T" => Object::string_literal(parent),
                "Kids" => vec![Object::Reference(kid_id)],
            }),
        );
        self.fields.push(Object::Reference(parent_id));
        self
    }

    /// A `/Fields` entry stored inline instead of as a reference
    pub fn direct_field_entry(mut self, name: &str) -> Self {
        self.fields.push(Object::Dictionary(dictionary! {
            "FT" => "Tx",
            "T" => Object::string_literal(name),
        }));
        self
    }

    /// Store `/AcroForm` inside the catalog instead of as its own object
    pub fn direct_form(mut self) -> Self {
        self.direct_form = true;
        self
    }

    /// Leave `/Fields` empty so fields are reachable only through page annotations
    pub fn without_field_list(mut self) -> Self {
        self.list_fields = false;
        self
    }

    pub fn build(mut self) -> Vec<u8> {
        let pages = self.doc.new_object_id();
        self.doc.objects.insert(
            self.page,
            Object::Dictionary(dictionary! {
                "Type" => "Page",
                "Parent" => pages,
                "MediaBox" => rect([0, 0, 612, 792]),
                "Annots" => self.annotations.clone(),
            }),
        );
        self.doc.objects.insert(
            pages,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(self.page)],
                "Count" => 1i64,
            }),
        );

        let fields = if self.list_fields { self.fields.clone() } else { Vec::new() };
        let form = dictionary! { "Fields" => fields };
        let form = if self.direct_form {
            Object::Dictionary(form)
        } else {
            Object::Reference(self.doc.add_object(form))
        };

        let catalog = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages,
            "AcroForm" => form,
        });
        self.doc.trailer.set("Root", catalog);

        let mut bytes = Vec::new();
        self.doc.save_to(&mut bytes).unwrap();
        bytes
    }

    fn widget(&self) -> Dictionary {
        dictionary! {
            "Type" => "Annot",
            "Subtype" => "Widget",
            "Rect" => rect([0, 0, 10, 10]),
            "P" => self.page,
        }
    }

    fn appearances(&mut self, export: &str) -> Dictionary {
        let on = self.doc.add_object(Stream::new(Dictionary::new(), Vec::new()));
        let off = self.doc.add_object(Stream::new(Dictionary::new(), Vec::new()));

        let mut normal = Dictionary::new();
        normal.set(export.as_bytes().to_vec(), on);
        normal.set("Off", off);
        dictionary! { "N" => normal }
    }

    fn register(&mut self, field: ObjectId, widget: ObjectId) {
        self.fields.push(Object::Reference(field));
        self.annotations.push(Object::Reference(widget));
    }
}

fn rect(corners: [i64; 4]) -> Vec<Object> {
    corners.iter().map(|value| Object::Integer(*value)).collect()
}

pub fn index_of(bytes: &[u8]) -> FieldIndex {
    build_index(bytes).unwrap()
}

pub fn text_value(index: &FieldIndex, identifier: &str) -> Option<String> {
    index.get(identifier).and_then(|descriptor| descriptor.current_value.clone())
}

/// Exports of the members currently switched on
pub fn selected_exports(index: &FieldIndex, identifier: &str) -> Vec<String> {
    index
        .get(identifier)
        .map(|descriptor| {
            descriptor
                .selected_members()
                .map(|member| member.export_value.clone())
                .collect()
        })
        .unwrap_or_default()
}

/// A fresh scratch directory under the system temp dir
pub fn scratch_dir(label: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("complymate-{}-{}", label, Uuid::new_v4().simple()));
    std::fs::create_dir_all(&path).unwrap();
    path
}

pub fn write_template(directory: &Path, code: &str, bytes: &[u8]) {
    std::fs::write(directory.join(format!("osha_{}_template.pdf", code)), bytes).unwrap();
}
