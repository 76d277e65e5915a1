//! # Value Module
//!
//! Parsing and formatting of the values that cross the serialization
//! boundary as text: raw client input, product unit values and
//! monetary amounts.
//!
//! ## Why Fixed-Point?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  As f64:     0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                 │
//! │                                                                         │
//! │  OUR SOLUTION: rust_decimal::Decimal                                    │
//! │    "12,50" ──► 12.50 (scale kept) ──► "12.50"                          │
//! │    "1e3"   ──► 1000               ──► "1000"   (never an exponent)      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockroom_core::value::UnitValue;
//!
//! let value = UnitValue::parse(Some("12,50")).unwrap();
//! assert_eq!(value.to_string(), "12.50");
//!
//! assert!(UnitValue::parse(None).is_err());      // mandatory
//! assert!(UnitValue::parse(Some("-1")).is_err()); // non-negative
//! ```

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;
use crate::validation::ValidationResult;
use crate::{MAX_AMOUNT_DIGITS, MAX_AMOUNT_SCALE};

// =============================================================================
// Raw Input
// =============================================================================

/// A loosely typed input value as clients send it.
///
/// Admin forms post quantities and prices either as JSON numbers or as
/// strings (possibly blank). Both shapes are accepted here and handed to the
/// parsers below as text, so `3`, `"3"` and `" 3 "` behave the same.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    /// A JSON number.
    Number(serde_json::Number),
    /// A JSON string.
    Text(String),
}

impl RawValue {
    /// Returns the value as text.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            RawValue::Number(n) => Cow::Owned(n.to_string()),
            RawValue::Text(s) => Cow::Borrowed(s.as_str()),
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<i64> for RawValue {
    fn from(n: i64) -> Self {
        RawValue::Number(n.into())
    }
}

/// Returns `None` for absent, empty or whitespace-only input.
pub fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

/// Parses a decimal number, accepting `,` as decimal separator and
/// scientific notation.
fn parse_decimal(raw: &str) -> Option<Decimal> {
    let normalized = raw.trim().replace(',', ".");
    let mut decimal = Decimal::from_str(&normalized)
        .or_else(|_| Decimal::from_scientific(&normalized))
        .ok()?;
    // "-0" is zero
    if decimal.is_zero() {
        decimal.set_sign_positive(true);
    }
    Some(decimal)
}

// =============================================================================
// Unit Value
// =============================================================================

/// The per-unit value of a product.
///
/// ## Invariants
/// - Never negative
/// - Displayed as a plain fixed-point string (`"1000"`, never `"1E+3"`)
/// - Scale given by the client is preserved (`"12.50"` stays `"12.50"`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UnitValue(Decimal);

impl UnitValue {
    /// Field name reported in validation errors.
    pub const FIELD: &'static str = "unit_value";

    /// Parses a client-supplied unit value.
    ///
    /// ## Rules
    /// - Absent or blank → `MissingValue`
    /// - Not numeric → `InvalidValue("must be numeric")`
    /// - Negative → `InvalidValue("cannot be negative")`
    pub fn parse(raw: Option<&str>) -> ValidationResult<Self> {
        let raw = non_blank(raw).ok_or_else(|| ValidationError::MissingValue {
            field: Self::FIELD.to_string(),
        })?;

        let decimal = parse_decimal(raw)
            .ok_or_else(|| ValidationError::invalid_value(Self::FIELD, "must be numeric"))?;

        if decimal.is_sign_negative() {
            return Err(ValidationError::invalid_value(
                Self::FIELD,
                "cannot be negative",
            ));
        }

        Ok(UnitValue(decimal))
    }

    /// Zero value.
    pub fn zero() -> Self {
        UnitValue(Decimal::ZERO)
    }

    /// Returns the underlying decimal.
    #[inline]
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for UnitValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parses the canonical text form (as stored in the database).
impl FromStr for UnitValue {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UnitValue::parse(Some(s))
    }
}

impl Serialize for UnitValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for UnitValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawValue::deserialize(deserializer)?;
        UnitValue::parse(Some(&raw.as_text())).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Amount
// =============================================================================

/// A monetary amount with at most 12 digits, 2 of them decimal.
///
/// Used by payment and maintenance-cost records. Amounts are stored and
/// shown with exactly two decimal places (`"10"` → `"10.00"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(Decimal);

impl Amount {
    /// Parses a client-supplied amount for `field`.
    ///
    /// ## Rules
    /// - Absent or blank → `MissingValue`
    /// - Not numeric → `InvalidValue`
    /// - More than 2 decimal places or more than 10 integer digits → `InvalidValue`
    pub fn parse(raw: Option<&str>, field: &str) -> ValidationResult<Self> {
        let raw = non_blank(raw).ok_or_else(|| ValidationError::MissingValue {
            field: field.to_string(),
        })?;

        let decimal = parse_decimal(raw)
            .ok_or_else(|| ValidationError::invalid_value(field, "must be numeric"))?;

        if decimal.normalize().scale() > MAX_AMOUNT_SCALE {
            return Err(ValidationError::invalid_value(
                field,
                format!("must have at most {MAX_AMOUNT_SCALE} decimal places"),
            ));
        }

        let max_integer_digits = (MAX_AMOUNT_DIGITS - MAX_AMOUNT_SCALE) as usize;
        let integer_digits = decimal.trunc().abs().normalize().to_string().len();
        if integer_digits > max_integer_digits {
            return Err(ValidationError::invalid_value(
                field,
                format!("must have at most {MAX_AMOUNT_DIGITS} digits"),
            ));
        }

        let mut decimal = decimal;
        decimal.rescale(MAX_AMOUNT_SCALE);
        Ok(Amount(decimal))
    }

    /// Parses an optional amount: absent or blank input yields `None`.
    pub fn parse_optional(raw: Option<&str>, field: &str) -> ValidationResult<Option<Self>> {
        match non_blank(raw) {
            None => Ok(None),
            Some(s) => Amount::parse(Some(s), field).map(Some),
        }
    }

    /// Returns the underlying decimal.
    #[inline]
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Amount::parse(Some(s), "amount")
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawValue::deserialize(deserializer)?;
        Amount::parse(Some(&raw.as_text()), "amount").map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_value_canonical_form() {
        assert_eq!(UnitValue::parse(Some("12.50")).unwrap().to_string(), "12.50");
        assert_eq!(UnitValue::parse(Some("12,50")).unwrap().to_string(), "12.50");
        assert_eq!(UnitValue::parse(Some(" 7 ")).unwrap().to_string(), "7");
        assert_eq!(UnitValue::parse(Some("1e3")).unwrap().to_string(), "1000");
        assert_eq!(UnitValue::parse(Some("-0")).unwrap().to_string(), "0");
    }

    #[test]
    fn test_unit_value_rejections() {
        assert_eq!(
            UnitValue::parse(None),
            Err(ValidationError::MissingValue {
                field: "unit_value".to_string()
            })
        );
        assert!(matches!(
            UnitValue::parse(Some("   ")),
            Err(ValidationError::MissingValue { .. })
        ));
        assert!(matches!(
            UnitValue::parse(Some("abc")),
            Err(ValidationError::InvalidValue { .. })
        ));
        assert_eq!(
            UnitValue::parse(Some("-3.5")),
            Err(ValidationError::invalid_value("unit_value", "cannot be negative"))
        );
    }

    #[test]
    fn test_unit_value_from_json_number() {
        let value: UnitValue = serde_json::from_str("15.5").unwrap();
        assert_eq!(value.to_string(), "15.5");
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, "\"15.5\"");
    }

    #[test]
    fn test_raw_value_shapes() {
        let n: RawValue = serde_json::from_str("3").unwrap();
        assert_eq!(n.as_text(), "3");
        let s: RawValue = serde_json::from_str("\" 4 \"").unwrap();
        assert_eq!(s.as_text(), " 4 ");
        let missing: Option<RawValue> = serde_json::from_str("null").unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_amount_scale_and_digits() {
        assert_eq!(Amount::parse(Some("10"), "total").unwrap().to_string(), "10.00");
        assert_eq!(Amount::parse(Some("10,5"), "total").unwrap().to_string(), "10.50");
        assert_eq!(Amount::parse(Some("1.230"), "total").unwrap().to_string(), "1.23");
        assert!(Amount::parse(Some("1.234"), "total").is_err());
        assert!(Amount::parse(Some("9999999999.99"), "total").is_ok());
        assert!(Amount::parse(Some("99999999999"), "total").is_err());
        assert_eq!(Amount::parse_optional(Some(""), "discount").unwrap(), None);
    }
}
