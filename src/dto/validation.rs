//! Validation helpers for DTOs.

use validator::ValidationError;

/// Validates that a text field carries something besides whitespace.
///
/// # Examples
///
/// ```ignore
/// validate_not_blank("Friday futsal") // Ok
/// validate_not_blank("   ")           // Err - only whitespace
/// validate_not_blank("")              // Err - empty
/// ```
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("not_blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_not_blank_valid() {
        assert!(validate_not_blank("Friday futsal").is_ok());
        assert!(validate_not_blank("  padded  ").is_ok());
        assert!(validate_not_blank("x").is_ok());
    }

    #[test]
    fn test_validate_not_blank_invalid() {
        assert!(validate_not_blank("").is_err()); // empty
        assert!(validate_not_blank("   ").is_err()); // spaces
        assert!(validate_not_blank("\t\n").is_err()); // other whitespace
    }
}
