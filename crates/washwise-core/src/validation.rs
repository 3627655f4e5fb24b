//! # Validation
//!
//! Identifier checks applied at the two places untrusted ids enter the
//! system: machine listings from the vending platform, and HTTP parameters.

use crate::error::ValidationError;

/// Parses a remote machine id.
///
/// Machine ids arrive as decimal strings. Anything that is not a positive
/// integer is rejected so that it can never be stored under id `0`.
///
/// ## Example
/// ```rust
/// use washwise_core::validation::parse_machine_id;
///
/// assert_eq!(parse_machine_id("42").unwrap(), 42);
/// assert!(parse_machine_id("abc").is_err());
/// assert!(parse_machine_id("0").is_err());
/// ```
pub fn parse_machine_id(raw: &str) -> Result<i64, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required {
            field: "machineId".to_string(),
        });
    }

    let id: i64 = trimmed
        .parse()
        .map_err(|e: std::num::ParseIntError| ValidationError::InvalidFormat {
            field: "machineId".to_string(),
            reason: e.to_string(),
        })?;

    if id <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "machineId".to_string(),
        });
    }

    Ok(id)
}

/// Checks that a shop id is present.
pub fn validate_shop_id(raw: &str) -> Result<&str, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required {
            field: "shopId".to_string(),
        });
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_ids() {
        assert_eq!(parse_machine_id("42").unwrap(), 42);
        assert_eq!(parse_machine_id(" 1001 ").unwrap(), 1001);
        assert_eq!(
            parse_machine_id("9007199254740993").unwrap(),
            9_007_199_254_740_993
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_machine_id("abc"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(matches!(
            parse_machine_id("12a"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(matches!(
            parse_machine_id(""),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_non_positive() {
        assert!(matches!(
            parse_machine_id("0"),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(matches!(
            parse_machine_id("-5"),
            Err(ValidationError::MustBePositive { .. })
        ));
    }

    #[test]
    fn test_validate_shop_id() {
        assert_eq!(validate_shop_id(" S1 ").unwrap(), "S1");
        assert!(validate_shop_id("   ").is_err());
    }
}
