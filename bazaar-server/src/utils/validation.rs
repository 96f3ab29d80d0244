//! Input validation helpers
//!
//! Centralized text length constants and validation functions.
//! redb values are JSON blobs with no built-in length enforcement,
//! so every user-supplied string is bounded here before it is stored.

use crate::utils::ServiceError;

// ── Text length limits ──────────────────────────────────────────────

/// Entity names: product titles, account names, bank names, etc.
pub const MAX_NAME_LEN: usize = 200;

/// Free-text descriptions (ledger entry description, order notes)
pub const MAX_NOTE_LEN: usize = 500;

/// Short identifiers: phone, account numbers, wallet addresses, symbols
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// URLs / image paths
pub const MAX_URL_LEN: usize = 2048;

/// Delivery addresses
pub const MAX_ADDRESS_LEN: usize = 500;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(
    value: &str,
    field: &str,
    max_len: usize,
) -> Result<(), ServiceError> {
    if value.trim().is_empty() {
        return Err(ServiceError::InvalidArgument(format!(
            "{field} must not be empty"
        )));
    }
    if value.len() > max_len {
        return Err(ServiceError::InvalidArgument(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        )));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), ServiceError> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(ServiceError::InvalidArgument(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.len()
        )));
    }
    Ok(())
}
