use crate::error::{FormFillError, FormResult};
use regex::Regex;
use std::sync::OnceLock;
use validator::{Validate, ValidationError, ValidationErrors};

pub fn validate_config<T: Validate>(config: &T) -> FormResult<()> {
    match config.validate() {
        Ok(()) => Ok(()),
        Err(errors) => {
            let error_messages = format_validation_errors(&errors);
            Err(FormFillError::configuration(error_messages))
        }
    }
}

pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut messages = Vec::new();
    collect_validation_errors("", errors, &mut messages);
    messages.join(", ")
}

fn collect_validation_errors(prefix: &str, errors: &ValidationErrors, messages: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };

        match kind {
            validator::ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    let message = match error.code.as_ref() {
                        "length" => format!("Length validation failed for field '{}'", path),
                        "file_pattern" => format!("Field '{}' must contain the {{code}} placeholder", path),
                        _ => format!("Validation failed for field '{}': {}", path, error.code),
                    };
                    messages.push(message);
                }
            }
            validator::ValidationErrorsKind::Struct(nested) => {
                collect_validation_errors(&path, nested, messages);
            }
            validator::ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_validation_errors(&format!("{}[{}]", path, index), nested, messages);
                }
            }
        }
    }
}

/// Template file patterns must name the form code somewhere
pub fn validate_file_pattern(pattern: &str) -> Result<(), ValidationError> {
    if pattern.contains("{code}") {
        Ok(())
    } else {
        Err(ValidationError::new("file_pattern"))
    }
}

/// Generated file names are served back to callers, so only plain names pass
pub fn validate_output_file_name(file_name: &str) -> FormResult<()> {
    static FILE_NAME: OnceLock<Regex> = OnceLock::new();
    let pattern = FILE_NAME.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*\.pdf$").expect("file name pattern is valid")
    });

    if file_name.contains("..") || !pattern.is_match(file_name) {
        return Err(FormFillError::validation(
            "file_name",
            format!("'{}' is not a generated form file name", file_name),
        ));
    }

    Ok(())
}

/// Split a `MM/DD` (or `MM/DD/YYYY`) date into zero-padded month and day
pub fn parse_month_day(value: &str) -> Option<(String, String)> {
    static MONTH_DAY: OnceLock<Regex> = OnceLock::new();
    let pattern = MONTH_DAY.get_or_init(|| {
        Regex::new(r"^\s*(\d{1,2})\s*[/-]\s*(\d{1,2})(?:\s*[/-]\s*\d{2,4})?\s*$")
            .expect("month/day pattern is valid")
    });

    let captures = pattern.captures(value)?;
    let month: u32 = captures[1].parse().ok()?;
    let day: u32 = captures[2].parse().ok()?;

    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }

    Some((format!("{:02}", month), format!("{:02}", day)))
}

/// Last two digits of a four digit year
pub fn two_digit_year(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.len() == 4 && trimmed.chars().all(|c| c.is_ascii_digit()) {
        Some(trimmed[2..].to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_month_day() {
        assert_eq!(parse_month_day("07/04"), Some(("07".to_string(), "04".to_string())));
        assert_eq!(parse_month_day("1/15/2024"), Some(("01".to_string(), "15".to_string())));
        assert_eq!(parse_month_day(" 12 - 31 "), Some(("12".to_string(), "31".to_string())));
    }

    #[test]
    fn test_parse_month_day_rejects_garbage() {
        assert_eq!(parse_month_day("July 4th"), None);
        assert_eq!(parse_month_day("13/01"), None);
        assert_eq!(parse_month_day("00/10"), None);
        assert_eq!(parse_month_day("07/32"), None);
    }

    #[test]
    fn test_two_digit_year() {
        assert_eq!(two_digit_year("2024").as_deref(), Some("24"));
        assert_eq!(two_digit_year("24"), None);
        assert_eq!(two_digit_year("20x4"), None);
    }

    #[test]
    fn test_validate_output_file_name() {
        assert!(validate_output_file_name("osha_300_20240101_120000_1a2b3c4d.pdf").is_ok());
        assert!(validate_output_file_name("../secrets.pdf").is_err());
        assert!(validate_output_file_name("/etc/passwd").is_err());
        assert!(validate_output_file_name("form.txt").is_err());
        assert!(validate_output_file_name("a..pdf").is_err());
    }

    #[test]
    fn test_validate_file_pattern() {
        assert!(validate_file_pattern("osha_{code}_template.pdf").is_ok());
        assert!(validate_file_pattern("template.pdf").is_err());
    }

    mod properties {
        use super::super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_month_day_pairs_are_zero_padded(month in 1u32..=12, day in 1u32..=31, year in proptest::option::of(1990u32..2100)) {
                let raw = match year {
                    Some(year) => format!("{}/{}/{}", month, day, year),
                    None => format!("{}/{}", month, day),
                };
                prop_assert_eq!(parse_month_day(&raw), Some((format!("{:02}", month), format!("{:02}", day))));
            }

            #[test]
            fn prop_generated_names_are_accepted(
                code in "(300|300a|301)",
                stamp in "[0-9]{8}_[0-9]{6}",
                id in "[0-9a-f]{8}"
            ) {
                let file_name = format!("osha_{}_{}_{}.pdf", code, stamp, id);
                prop_assert!(validate_output_file_name(&file_name).is_ok());
            }

            #[test]
            fn prop_path_separators_are_rejected(head in "[a-z]{1,8}", tail in "[a-z]{1,8}") {
                let nested = format!("{}/{}.pdf", head, tail);
                let parent = format!("../{}.pdf", tail);
                prop_assert!(validate_output_file_name(&nested).is_err());
                prop_assert!(validate_output_file_name(&parent).is_err());
            }
        }
    }
}
