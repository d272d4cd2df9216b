//! Graceful Degradation
//!
//! Per-field failures are logged, recorded and skipped; whole-template
//! failures keep propagating as errors.

use tracing::warn;

use complymate_models::Diagnostic;
use complymate_utils::FormResult;

/// Turn a failed per-field step into a logged [`Diagnostic`]
pub fn degrade<T>(subject: &str, result: FormResult<T>) -> Result<T, Diagnostic> {
    result.map_err(|error| {
        warn!(subject = %subject, code = error.error_code(), error = %error, "Skipping field");
        Diagnostic::new(subject, error.error_code(), error.to_string())
    })
}

/// Diagnostics collected over one generation call
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the value on success, record the failure otherwise
    pub fn absorb<T>(&mut self, subject: &str, result: FormResult<T>) -> Option<T> {
        match degrade(subject, result) {
            Ok(value) => Some(value),
            Err(diagnostic) => {
                self.entries.push(diagnostic);
                None
            }
        }
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<Diagnostic> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use complymate_utils::FormFillError;

    #[test]
    fn test_absorb_records_failures_only() {
        let mut diagnostics = Diagnostics::new();

        assert_eq!(diagnostics.absorb("Job Title 1", Ok(3)), Some(3));
        let failed: FormResult<i32> = Err(FormFillError::field_resolution("Group1", "unknown option"));
        assert_eq!(diagnostics.absorb("Group1", failed), None);

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics.entries()[0].subject, "Group1");
        assert_eq!(diagnostics.entries()[0].code, "FIELD_RESOLUTION");
    }

    #[test]
    fn test_degrade_passes_values_through() {
        assert_eq!(degrade("x", Ok::<_, FormFillError>("v")).unwrap(), "v");
        let diagnostic = degrade::<()>("x", Err(FormFillError::internal("boom"))).unwrap_err();
        assert_eq!(diagnostic.code, "INTERNAL_ERROR");
    }
}
