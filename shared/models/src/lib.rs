//! # ComplyMate Core Domain Models
//!
//! Types shared by the form-filling engine and its callers.
//!
//! ## Key Models
//!
//! - **FormType**: the OSHA forms that have a fillable template (300, 300A, 301)
//! - **FactDictionary**: flat, loosely named facts collected for a form
//! - **FieldSummary**: introspection view of a template field
//! - **ResolvedAssignment**: field identifier to value, produced by the data mapper
//! - **GeneratedForm**: a filled document written to the output directory
//!
//! Fact values are a closed set of scalar kinds so the mapper can render every
//! value without inspecting arbitrary JSON.

pub mod form;
pub mod facts;
pub mod field;
pub mod assignment;
pub mod generated;


pub use form::*;
pub use facts::*;
pub use field::*;
pub use assignment::*;
pub use generated::*;
