//! Input validation for operator-supplied identifiers.
//!
//! Ticket and change-request identifiers end up inside git branch names and
//! commit messages; ruleset filenames end up inside a YAML scalar. Anything
//! that would break either is rejected before a run starts planning.

use crate::error::PromoteError;

/// Maximum allowed length for ticket and change-request identifiers.
pub const MAX_ID_LENGTH: usize = 128;

/// Maximum allowed length for a ruleset filename.
pub const MAX_RULESET_LENGTH: usize = 255;

/// Validates a ticket or change-request identifier.
///
/// An identifier is valid if:
/// - It is not empty
/// - It is no longer than MAX_ID_LENGTH characters
/// - It contains only alphanumeric characters, dashes, underscores, and dots
/// - It does not start with a dash or dot, end with a dot, or contain `..`
///
/// # Examples
///
/// ```
/// use promote::validation::validate_id;
///
/// assert!(validate_id("ticket", "JIRA-1").is_ok());
/// assert!(validate_id("ticket", "CMR_100.2").is_ok());
/// assert!(validate_id("ticket", "").is_err());
/// assert!(validate_id("ticket", "feature/x").is_err());
/// ```
pub fn validate_id(what: &str, id: &str) -> Result<(), PromoteError> {
    if id.is_empty() {
        return Err(PromoteError::Input(format!("{what} cannot be empty")));
    }

    if id.len() > MAX_ID_LENGTH {
        return Err(PromoteError::Input(format!(
            "{what} too long: {} characters (max {MAX_ID_LENGTH})",
            id.len()
        )));
    }

    let valid_chars = id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.');
    if !valid_chars {
        return Err(PromoteError::Input(format!(
            "{what} '{id}' contains invalid characters. Use only alphanumeric characters, dashes (-), underscores (_), and dots (.)"
        )));
    }

    if id.starts_with('-') || id.starts_with('.') || id.ends_with('.') || id.contains("..") {
        return Err(PromoteError::Input(format!(
            "{what} '{id}' cannot be used inside a branch name"
        )));
    }

    Ok(())
}

/// Validates a ruleset filename before it is written into a YAML scalar.
///
/// Quotes, `#`, whitespace and control characters are rejected since each
/// would change how the surrounding line parses.
pub fn validate_ruleset(name: &str) -> Result<(), PromoteError> {
    if name.is_empty() {
        return Err(PromoteError::Input("ruleset filename cannot be empty".into()));
    }

    if name.len() > MAX_RULESET_LENGTH {
        return Err(PromoteError::Input(format!(
            "ruleset filename too long: {} characters (max {MAX_RULESET_LENGTH})",
            name.len()
        )));
    }

    if let Some(bad) = name
        .chars()
        .find(|c| c.is_whitespace() || c.is_control() || matches!(c, '"' | '\'' | '#'))
    {
        return Err(PromoteError::Input(format!(
            "ruleset filename '{}' contains forbidden character {bad:?}",
            name.escape_debug()
        )));
    }

    Ok(())
}

/// Clap value parser for ticket identifiers.
pub fn clap_ticket_validator(s: &str) -> Result<String, String> {
    validate_id("ticket", s).map_err(|e| e.to_string())?;
    Ok(s.to_string())
}

/// Clap value parser for change-request identifiers.
pub fn clap_change_request_validator(s: &str) -> Result<String, String> {
    validate_id("change request", s).map_err(|e| e.to_string())?;
    Ok(s.to_string())
}

/// Clap value parser for ruleset filenames.
pub fn clap_ruleset_validator(s: &str) -> Result<String, String> {
    validate_ruleset(s).map_err(|e| e.to_string())?;
    Ok(s.to_string())
}
