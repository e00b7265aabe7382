//! Field rules shared by request payloads.

/// Rejects strings that are empty once trimmed.
pub fn not_blank(value: &str, _context: &()) -> garde::Result {
    if value.trim().is_empty() {
        return Err(garde::Error::new("must not be blank"));
    }
    Ok(())
}

/// Password policy: printable, no surrounding whitespace.
///
/// Length bounds are declared on the field itself.
pub fn password_policy(value: &str, _context: &()) -> garde::Result {
    if value.trim() != value {
        return Err(garde::Error::new(
            "must not start or end with whitespace",
        ));
    }

    if value.chars().any(char::is_control) {
        return Err(garde::Error::new("must not contain control characters"));
    }

    Ok(())
}

/// Parses a path id. Ids are positive integers.
pub fn parse_id(raw: &str) -> crate::error::Result<i64> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| {
            crate::error::AppError::MalformedRequest(format!(
                "Invalid id {:?}: expected a positive integer",
                raw
            ))
        })
}
