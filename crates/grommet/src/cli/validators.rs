//! CLI input validation functions.
//!
//! These validators are used by clap's `value_parser` attribute to validate
//! user input at parse time, providing immediate feedback for invalid values.

use crate::domain;

/// Validate an identifier argument (issue or file ID).
///
/// IDs look like `issue_1718000000000_k3x9a0q2m`: ASCII letters, digits,
/// underscores and hyphens.
fn validate_id(s: &str, kind: &str) -> Result<String, String> {
    let s = s.trim();

    if s.is_empty() {
        return Err(format!("{kind} ID cannot be empty"));
    }

    if let Some(c) = s
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        return Err(format!(
            "Invalid {} ID '{s}': unexpected character '{c}'",
            kind.to_lowercase()
        ));
    }

    Ok(s.to_string())
}

/// Validate issue ID format.
pub fn validate_issue_id(s: &str) -> Result<String, String> {
    validate_id(s, "Issue")
}

/// Validate file ID format.
pub fn validate_file_id(s: &str) -> Result<String, String> {
    validate_id(s, "File")
}

/// Validate a title.
///
/// Applies the domain rules (non-blank, at most 200 characters) and rejects
/// line breaks and control characters.
pub fn validate_title(s: &str) -> Result<String, String> {
    let s = s.trim();

    domain::validate_title(s).map_err(|e| e.to_string())?;

    if s.contains('\n') || s.contains('\r') {
        return Err("Title cannot contain newline characters".to_string());
    }

    if let Some(pos) = s.chars().position(|c| c != '\t' && c.is_control()) {
        return Err(format!(
            "Title contains invalid control character at position {pos}"
        ));
    }

    Ok(s.to_string())
}

/// Validate a description.
///
/// Multi-line text is fine; other control characters are rejected.
pub fn validate_description(s: &str) -> Result<String, String> {
    if let Some(pos) = s
        .chars()
        .position(|c| !matches!(c, '\t' | '\n' | '\r') && c.is_control())
    {
        return Err(format!(
            "Description contains invalid control character at position {pos}"
        ));
    }
    Ok(s.to_string())
}

/// Validate a MIME type given on the command line (`type/subtype`).
pub fn validate_content_type(s: &str) -> Result<String, String> {
    let s = s.trim();
    match s.split_once('/') {
        Some((kind, subtype))
            if !kind.is_empty() && !subtype.is_empty() && !s.contains(char::is_whitespace) =>
        {
            Ok(s.to_ascii_lowercase())
        }
        _ => Err(format!(
            "Invalid content type '{s}'. Expected type/subtype (e.g., image/png)"
        )),
    }
}
