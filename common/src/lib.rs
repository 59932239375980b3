pub mod logger;

use validator::ValidationErrors;

/// Joins every field message of a failed validation into a single
/// `"; "`-separated string suitable for a blocking user alert.
///
/// Field order follows the validator's map, so callers that need a stable
/// message should sort or compare by containment.
pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    errors
        .field_errors()
        .values()
        .flat_map(|errs| {
            errs.iter()
                .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Form {
        #[validate(length(min = 1, message = "Name is required"))]
        name: String,
        #[validate(range(min = 1, max = 4, message = "Year must be between 1 and 4"))]
        year: u8,
    }

    #[test]
    fn collects_all_messages() {
        let form = Form {
            name: String::new(),
            year: 9,
        };
        let errors = form.validate().unwrap_err();
        let msg = format_validation_errors(&errors);
        assert!(msg.contains("Name is required"));
        assert!(msg.contains("Year must be between 1 and 4"));
        assert!(msg.contains("; "));
    }

    #[test]
    fn valid_form_has_no_errors() {
        let form = Form {
            name: "Databases".into(),
            year: 2,
        };
        assert!(form.validate().is_ok());
    }
}
