//! PDF Object Helpers
//!
//! Explicit dereferencing and text decoding over the `lopdf` object graph.
//! Form dictionaries are often stored behind indirect references, so every
//! read goes through [`resolve`] instead of assuming a direct object.

use lopdf::{decode_text_string, Dictionary, Document, Object, ObjectId};

use complymate_utils::{FormFillError, FormResult};

/// Longest reference chain followed before giving up
const MAX_REFERENCE_DEPTH: usize = 32;

pub const OFF_STATE: &str = "Off";

/// Left in place by the UTF-8 text string decoder
const UTF8_BOM: char = '\u{feff}';

/// Follow references until a direct object is reached
pub fn resolve<'a>(doc: &'a Document, object: &'a Object) -> FormResult<&'a Object> {
    let mut current = object;
    for _ in 0..MAX_REFERENCE_DEPTH {
        match current {
            Object::Reference(id) => {
                current = doc.get_object(*id).map_err(|e| {
                    FormFillError::field_resolution(
                        format!("{} {} R", id.0, id.1),
                        format!("dangling reference: {}", e),
                    )
                })?;
            }
            direct => return Ok(direct),
        }
    }

    Err(FormFillError::field_resolution(
        "reference",
        format!("reference chain longer than {}", MAX_REFERENCE_DEPTH),
    ))
}

/// Dictionary stored under `id`, dereferenced
pub fn dictionary(doc: &Document, id: ObjectId) -> FormResult<&Dictionary> {
    let object = doc.get_object(id).map_err(|e| {
        FormFillError::field_resolution(format!("{} {} R", id.0, id.1), format!("missing object: {}", e))
    })?;

    match resolve(doc, object)? {
        Object::Dictionary(dict) => Ok(dict),
        Object::Stream(stream) => Ok(&stream.dict),
        other => Err(FormFillError::field_resolution(
            format!("{} {} R", id.0, id.1),
            format!("expected a dictionary, found {}", type_name(other)),
        )),
    }
}

/// Value stored under `key`, dereferenced; `None` when the key is absent
pub fn lookup<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> FormResult<Option<&'a Object>> {
    match dict.get(key) {
        Ok(object) => resolve(doc, object).map(Some),
        Err(_) => Ok(None),
    }
}

pub fn lookup_dictionary<'a>(
    doc: &'a Document,
    dict: &'a Dictionary,
    key: &[u8],
) -> FormResult<Option<&'a Dictionary>> {
    match lookup(doc, dict, key)? {
        Some(Object::Dictionary(inner)) => Ok(Some(inner)),
        Some(Object::Stream(stream)) => Ok(Some(&stream.dict)),
        Some(Object::Null) | None => Ok(None),
        Some(other) => Err(FormFillError::field_resolution(
            String::from_utf8_lossy(key),
            format!("expected a dictionary, found {}", type_name(other)),
        )),
    }
}

pub fn lookup_array<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> FormResult<&'a [Object]> {
    match lookup(doc, dict, key)? {
        Some(Object::Array(items)) => Ok(items.as_slice()),
        Some(Object::Null) | None => Ok(&[]),
        Some(other) => Err(FormFillError::field_resolution(
            String::from_utf8_lossy(key),
            format!("expected an array, found {}", type_name(other)),
        )),
    }
}

pub fn lookup_integer(doc: &Document, dict: &Dictionary, key: &[u8]) -> FormResult<Option<i64>> {
    match lookup(doc, dict, key)? {
        Some(Object::Integer(value)) => Ok(Some(*value)),
        Some(Object::Real(value)) => Ok(Some(*value as i64)),
        _ => Ok(None),
    }
}

pub fn lookup_name(doc: &Document, dict: &Dictionary, key: &[u8]) -> FormResult<Option<String>> {
    match lookup(doc, dict, key)? {
        Some(Object::Name(name)) => Ok(Some(String::from_utf8_lossy(name).into_owned())),
        _ => Ok(None),
    }
}

/// Text of a string or name object
pub fn lookup_text(doc: &Document, dict: &Dictionary, key: &[u8]) -> FormResult<Option<String>> {
    match lookup(doc, dict, key)? {
        Some(string @ Object::String(..)) => decode_text_string(string)
            .map(|text| Some(text.trim_start_matches(UTF8_BOM).to_string()))
            .map_err(|e| {
                FormFillError::field_resolution(String::from_utf8_lossy(key), format!("undecodable text string: {}", e))
            }),
        Some(Object::Name(name)) => Ok(Some(String::from_utf8_lossy(name).into_owned())),
        _ => Ok(None),
    }
}

pub fn name(value: &str) -> Object {
    Object::Name(value.as_bytes().to_vec())
}

/// Field names sometimes arrive wrapped in delimiters or padded with NULs
pub fn clean_identifier(raw: &str) -> String {
    let mut identifier = raw.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    while identifier.len() >= 2 && identifier.starts_with('(') && identifier.ends_with(')') {
        identifier = identifier[1..identifier.len() - 1].trim();
    }
    identifier.to_string()
}

pub fn type_name(object: &Object) -> &'static str {
    match object {
        Object::Null => "null",
        Object::Boolean(_) => "boolean",
        Object::Integer(_) => "integer",
        Object::Real(_) => "real",
        Object::Name(_) => "name",
        Object::String(_, _) => "string",
        Object::Array(_) => "array",
        Object::Dictionary(_) => "dictionary",
        Object::Stream(_) => "stream",
        Object::Reference(_) => "reference",
    }
}
