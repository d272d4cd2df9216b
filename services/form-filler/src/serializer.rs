//! Document Serializer

use lopdf::Document;
use tracing::debug;

use complymate_utils::{FormFillError, FormResult};

/// Render the modified document to PDF bytes
pub fn serialize(doc: &mut Document) -> FormResult<Vec<u8>> {
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| FormFillError::serialization(format!("failed to write PDF: {}", e)))?;

    if !buffer.starts_with(b"%PDF-") {
        return Err(FormFillError::serialization("writer produced no PDF header"));
    }

    debug!(bytes = buffer.len(), "Document serialized");
    Ok(buffer)
}
