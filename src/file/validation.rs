//! Validators for caller-supplied file attributes.

use validator::ValidationError;

use super::{MAX_DISPLAY_NAME_LENGTH, MAX_MIME_TYPE_LENGTH};

fn at_most(value: &str, max: usize, code: &'static str) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::new(code)
            .with_message(format!("must be at most {max} characters").into()));
    }
    Ok(())
}

/// Validate a display name's length in characters.
pub fn display_name_length(value: &str) -> Result<(), ValidationError> {
    at_most(value, MAX_DISPLAY_NAME_LENGTH, "display_name_length")
}

/// Validate a MIME type's length in characters.
pub fn mime_type_length(value: &str) -> Result<(), ValidationError> {
    at_most(value, MAX_MIME_TYPE_LENGTH, "mime_type_length")
}

/// Validate that a string cannot add or climb path segments in an object key.
pub fn no_path_separators(value: &str) -> Result<(), ValidationError> {
    if value.contains(['/', '\\']) {
        return Err(ValidationError::new("no_path_separators")
            .with_message("must not contain path separators".into()));
    }
    Ok(())
}

/// Validate that a string contains no control characters at all.
pub fn no_control_chars(value: &str) -> Result<(), ValidationError> {
    if value.chars().any(char::is_control) {
        return Err(ValidationError::new("no_control_chars")
            .with_message("must not contain control characters".into()));
    }
    Ok(())
}

/// Validate that a string is not empty after trimming whitespace.
pub fn not_empty_trimmed(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("not_empty_trimmed").with_message("is required".into()));
    }
    Ok(())
}
