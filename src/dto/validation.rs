//! Validation helpers for DTOs.

use validator::ValidationError;

/// Number of option slots every question carries.
const OPTION_SLOTS: usize = 4;

/// Validates the option list of a question: exactly 4 slots (empty string =
/// unused) with a non-empty first slot once trimmed.
pub fn validate_options(options: &[String]) -> Result<(), ValidationError> {
    if options.len() != OPTION_SLOTS {
        let mut err = ValidationError::new("options_length");
        err.message = Some(
            format!(
                "questions carry exactly {OPTION_SLOTS} option slots (got {})",
                options.len()
            )
            .into(),
        );
        return Err(err);
    }

    if options[0].trim().is_empty() {
        let mut err = ValidationError::new("options_first_empty");
        err.message = Some("the first option slot must not be empty".into());
        return Err(err);
    }

    Ok(())
}

/// Validates a correct-option index against the fixed slot count.
pub fn validate_correct_index(index: u8) -> Result<(), ValidationError> {
    if usize::from(index) >= OPTION_SLOTS {
        let mut err = ValidationError::new("correct_index_range");
        err.message =
            Some(format!("correct index must be 0-{} (got {index})", OPTION_SLOTS - 1).into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn four_slots_with_first_filled_are_valid() {
        assert!(validate_options(&options(&["Paris", "Lyon", "", ""])).is_ok());
        assert!(validate_options(&options(&["42", "", "", ""])).is_ok());
    }

    #[test]
    fn wrong_slot_count_is_rejected() {
        assert!(validate_options(&options(&["a", "b", "c"])).is_err());
        assert!(validate_options(&options(&["a", "b", "c", "d", "e"])).is_err());
        assert!(validate_options(&options(&[])).is_err());
    }

    #[test]
    fn blank_first_slot_is_rejected() {
        assert!(validate_options(&options(&["", "b", "c", "d"])).is_err());
        assert!(validate_options(&options(&["   ", "b", "c", "d"])).is_err());
    }

    #[test]
    fn correct_index_bounds() {
        assert!(validate_correct_index(0).is_ok());
        assert!(validate_correct_index(3).is_ok());
        assert!(validate_correct_index(4).is_err());
    }
}
