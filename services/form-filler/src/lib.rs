//! ComplyMate Form Filler
//!
//! Fills the OSHA 300, 300A and 301 recordkeeping templates from a flat
//! dictionary of collected facts.
//!
//! A generation runs in four stages: the field index is built from the
//! template's AcroForm tree, the data mapper resolves facts onto field
//! identifiers, the value writer sets the resolved values and the document
//! serializer produces the output bytes. Per-field failures become
//! diagnostics on the generated form; only template-level failures abort.

pub mod archive;
pub mod catalog;
pub mod degrade;
pub mod field_index;
pub mod mapper;
pub mod pdf_objects;
pub mod serializer;
pub mod service;
pub mod template_store;
pub mod writer;

pub use archive::{FormArchive, StoredForm};
pub use catalog::{FactPrompt, FormCatalog, FormMapping};
pub use degrade::{degrade, Diagnostics};
pub use field_index::{build_index, promote_direct_fields, ChoiceMember, FieldDescriptor, FieldIndex};
pub use mapper::DataMapper;
pub use serializer::serialize;
pub use service::{FilledForm, FormFillerService, MappingAudit, TemplateListing};
pub use template_store::{Template, TemplateStore};
pub use writer::WriteSummary;
