//! # Validation Module
//!
//! Field validators shared by every record type.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP (apps/api)                                              │
//! │  └── JSON shape (malformed body → 400 invalid_body)                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: stockroom-core                                               │
//! │  ├── THIS MODULE: names, references, dates                             │
//! │  └── stock / value: quantities and decimals                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints on the quantity triple                          │
//! │  ├── UNIQUE (rental, product)                                          │
//! │  └── Foreign keys (protect / cascade)                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockroom_core::validation::{validate_name, validate_reference};
//!
//! assert_eq!(validate_name("name", Some("  Tripod ")).unwrap(), "Tripod");
//! assert!(validate_name("name", Some("")).is_err());
//! assert!(validate_reference("brand_id", Some("not-a-uuid")).is_err());
//! ```

use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::MAX_NAME_LENGTH;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum length of an external user id.
pub const MAX_USER_ID_LENGTH: usize = 128;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a mandatory short text field and returns it trimmed.
///
/// ## Rules
/// - Must not be absent or blank
/// - At most [`MAX_NAME_LENGTH`] characters
pub fn validate_name(field: &str, value: Option<&str>) -> ValidationResult<String> {
    let value = value.map(str::trim).unwrap_or_default();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    check_length(field, value, MAX_NAME_LENGTH)?;
    Ok(value.to_string())
}

/// Validates an optional short text field.
///
/// Blank input becomes `None`.
pub fn validate_optional_text(field: &str, value: Option<&str>) -> ValidationResult<Option<String>> {
    match value.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => {
            check_length(field, s, MAX_NAME_LENGTH)?;
            Ok(Some(s.to_string()))
        }
    }
}

/// Validates an opaque user id from the identity provider.
pub fn validate_user_id(value: Option<&str>) -> ValidationResult<String> {
    let value = value.map(str::trim).unwrap_or_default();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: "user_id".to_string(),
        });
    }

    check_length("user_id", value, MAX_USER_ID_LENGTH)?;
    Ok(value.to_string())
}

fn check_length(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

// =============================================================================
// Reference Validators
// =============================================================================

/// Validates a reference to another record (a UUID string).
///
/// Existence is checked by the database layer; this only checks shape.
pub fn validate_reference(field: &str, value: Option<&str>) -> ValidationResult<String> {
    let value = value.map(str::trim).unwrap_or_default();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    Uuid::parse_str(value).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(value.to_string())
}

// =============================================================================
// Date Validators
// =============================================================================

/// Validates that a return date does not precede the loan date.
pub fn validate_date_order(loaned_on: NaiveDate, returned_on: Option<NaiveDate>) -> ValidationResult<()> {
    match returned_on {
        Some(returned) if returned < loaned_on => Err(ValidationError::InvalidFormat {
            field: "returned_on".to_string(),
            reason: "cannot be before loaned_on".to_string(),
        }),
        _ => Ok(()),
    }
}

/// Requires a date that is optional in the JSON shape.
pub fn require_date(field: &str, value: Option<NaiveDate>) -> ValidationResult<NaiveDate> {
    value.ok_or_else(|| ValidationError::Required {
        field: field.to_string(),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("name", Some(" Audio ")).unwrap(), "Audio");
        assert!(matches!(
            validate_name("name", None),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_name("name", Some("   ")),
            Err(ValidationError::Required { .. })
        ));

        let long = "x".repeat(MAX_NAME_LENGTH + 1);
        assert_eq!(
            validate_name("name", Some(&long)),
            Err(ValidationError::TooLong {
                field: "name".to_string(),
                max: MAX_NAME_LENGTH
            })
        );

        // Length counts characters, not bytes.
        let accented = "é".repeat(MAX_NAME_LENGTH);
        assert!(validate_name("name", Some(&accented)).is_ok());
    }

    #[test]
    fn test_validate_optional_text() {
        assert_eq!(validate_optional_text("model", Some("  ")).unwrap(), None);
        assert_eq!(
            validate_optional_text("model", Some("X-100")).unwrap(),
            Some("X-100".to_string())
        );
        assert!(validate_optional_text("model", Some(&"m".repeat(46))).is_err());
    }

    #[test]
    fn test_validate_reference() {
        let id = Uuid::new_v4().to_string();
        assert_eq!(validate_reference("brand_id", Some(&id)).unwrap(), id);
        assert!(matches!(
            validate_reference("brand_id", Some("42")),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(matches!(
            validate_reference("brand_id", None),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_validate_date_order() {
        let day = |d| NaiveDate::from_ymd_opt(2024, 3, d).unwrap();
        assert!(validate_date_order(day(1), None).is_ok());
        assert!(validate_date_order(day(1), Some(day(1))).is_ok());
        let err = validate_date_order(day(5), Some(day(2))).unwrap_err();
        assert_eq!(err.field(), "returned_on");
    }

    #[test]
    fn test_validate_user_id() {
        assert_eq!(validate_user_id(Some("auth0|42")).unwrap(), "auth0|42");
        assert!(validate_user_id(Some("")).is_err());
    }
}
