//! # Stock Module
//!
//! The quantity rules of a product: how raw input becomes a consistent
//! `(available, loaned, total)` triple, and how Borrow/Return move units
//! between the two counters.
//!
//! ## The Triple
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Product Quantities                              │
//! │                                                                         │
//! │   available (A)  ── units on the shelf, loanable                       │
//! │   loaned    (L)  ── units currently lent out                           │
//! │   total     (T)  ── A + L, never stored independently of A and L       │
//! │                                                                         │
//! │   Borrow(q):  A ──q──► L        Return(q):  L ──q──► A                 │
//! │                                                                         │
//! │   T is unchanged by both movements.                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Status Labels
//! ```text
//! derived when the caller sends no status:
//!
//!   T == 0           ──► out_of_stock
//!   A == 0           ──► exhausted
//!   otherwise        ──► active
//!
//! Borrow:  A' == 0                                   ──► exhausted
//! Return:  A' > 0 and status ∈ {none, exhausted, out_of_stock} ──► active
//! any other label ("retired", "in_repair", ...) is kept as-is
//! ```
//!
//! Everything here is pure. Persisting a movement atomically is the job of
//! the database layer, which loads a [`StockState`], calls
//! [`StockState::borrow`] or [`StockState::return_units`] and writes back the
//! result inside one transaction.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::validation::ValidationResult;
use crate::value::non_blank;

/// Field name of the available counter.
pub const FIELD_AVAILABLE: &str = "quantity_available";
/// Field name of the loaned counter.
pub const FIELD_LOANED: &str = "quantity_loaned";
/// Field name of the total counter.
pub const FIELD_TOTAL: &str = "quantity_total";
/// Field name of a Borrow/Return quantity.
pub const FIELD_MOVEMENT: &str = "quantity";

// =============================================================================
// Stock Levels
// =============================================================================

/// A consistent quantity triple.
///
/// ## Invariants
/// - `available + loaned == total`
/// - all counters are non-negative (unsigned)
/// - `total` fits in a `u32`
///
/// The fields are private: the only way to build a value is through
/// [`StockLevels::new`] or [`StockLevels::from_counts`], both of which check
/// the invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StockLevels {
    available: u32,
    loaned: u32,
}

impl StockLevels {
    /// Builds levels from the two independent counters.
    ///
    /// Fails when `available + loaned` does not fit in a `u32`.
    pub fn new(available: u32, loaned: u32) -> ValidationResult<Self> {
        available
            .checked_add(loaned)
            .ok_or_else(|| ValidationError::invalid_quantity(FIELD_TOTAL, "is out of range"))?;
        Ok(StockLevels { available, loaned })
    }

    /// Rebuilds levels from persisted counters.
    ///
    /// Returns `None` when the stored values break the invariant.
    pub fn from_counts(available: i64, loaned: i64, total: i64) -> Option<Self> {
        let available = u32::try_from(available).ok()?;
        let loaned = u32::try_from(loaned).ok()?;
        let levels = StockLevels::new(available, loaned).ok()?;
        (i64::from(levels.total()) == total).then_some(levels)
    }

    /// Units on the shelf.
    #[inline]
    pub fn available(&self) -> u32 {
        self.available
    }

    /// Units lent out.
    #[inline]
    pub fn loaned(&self) -> u32 {
        self.loaned
    }

    /// `available + loaned`.
    #[inline]
    pub fn total(&self) -> u32 {
        // checked at construction
        self.available + self.loaned
    }
}

impl fmt::Display for StockLevels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "A={} L={} T={}",
            self.available,
            self.loaned,
            self.total()
        )
    }
}

// =============================================================================
// Product Status
// =============================================================================

/// Status label of a product.
///
/// Three labels are produced by the stock rules. Callers may also set any
/// other label, which is carried verbatim in [`ProductStatus::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProductStatus {
    /// At least one unit is available.
    Active,
    /// Units exist but all of them are lent out.
    Exhausted,
    /// The product has no units at all.
    OutOfStock,
    /// A caller-supplied label outside the three above.
    Other(String),
}

impl ProductStatus {
    /// Parses a stored or client-supplied label.
    ///
    /// Blank input means "no status" and yields `None`. Anything else is kept
    /// exactly as given.
    pub fn from_label(label: Option<&str>) -> Option<Self> {
        let label = label?;
        if label.trim().is_empty() {
            return None;
        }
        Some(ProductStatus::from(label.to_string()))
    }

    /// Status implied by a triple.
    pub fn derive(levels: &StockLevels) -> Self {
        if levels.total() == 0 {
            ProductStatus::OutOfStock
        } else if levels.available() == 0 {
            ProductStatus::Exhausted
        } else {
            ProductStatus::Active
        }
    }

    /// Wire label.
    pub fn as_str(&self) -> &str {
        match self {
            ProductStatus::Active => "active",
            ProductStatus::Exhausted => "exhausted",
            ProductStatus::OutOfStock => "out_of_stock",
            ProductStatus::Other(label) => label,
        }
    }

    /// Whether a Return that leaves units available should reset this status
    /// to [`ProductStatus::Active`].
    fn resets_on_return(status: Option<&ProductStatus>) -> bool {
        matches!(
            status,
            None | Some(ProductStatus::Exhausted) | Some(ProductStatus::OutOfStock)
        )
    }
}

impl From<String> for ProductStatus {
    fn from(label: String) -> Self {
        match label.as_str() {
            "active" => ProductStatus::Active,
            "exhausted" => ProductStatus::Exhausted,
            "out_of_stock" => ProductStatus::OutOfStock,
            _ => ProductStatus::Other(label),
        }
    }
}

impl From<ProductStatus> for String {
    fn from(status: ProductStatus) -> Self {
        match status {
            ProductStatus::Other(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Quantity Normalizer
// =============================================================================

/// Raw quantity fields as received from a client.
///
/// `None`, `""` and whitespace all mean "not supplied".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuantityInput<'a> {
    pub available: Option<&'a str>,
    pub loaned: Option<&'a str>,
    pub total: Option<&'a str>,
    pub status: Option<&'a str>,
}

/// Output of [`normalize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedStock {
    pub levels: StockLevels,
    pub status: ProductStatus,
}

/// Turns raw quantity input into a consistent triple and a status.
///
/// ## Arguments
/// * `input` - Raw fields from the request
/// * `existing` - Persisted state when updating, `None` when creating
///
/// ## Rules
/// 1. A blank available/loaned falls back to `existing`, else 0
/// 2. A blank total defaults to `available + loaned`
/// 3. `loaned > total` → [`ValidationError::LoanedExceedsTotal`]
/// 4. The total is then overridden with `available + loaned`
/// 5. A supplied status is kept as given. A blank one is derived from the
///    new triple, whatever label was stored before
///
/// ## Example
/// ```rust
/// use stockroom_core::stock::{normalize, ProductStatus, QuantityInput};
///
/// let input = QuantityInput { available: Some("0"), loaned: Some("4"), ..Default::default() };
/// let out = normalize(&input, None).unwrap();
/// assert_eq!(out.levels.total(), 4);
/// assert_eq!(out.status, ProductStatus::Exhausted);
/// ```
pub fn normalize(
    input: &QuantityInput<'_>,
    existing: Option<&StockState>,
) -> ValidationResult<NormalizedStock> {
    let available = parse_quantity(
        FIELD_AVAILABLE,
        input.available,
        existing.map(|e| e.levels.available()),
    )?;
    let loaned = parse_quantity(
        FIELD_LOANED,
        input.loaned,
        existing.map(|e| e.levels.loaned()),
    )?;

    let sum = u64::from(available) + u64::from(loaned);
    let total = match non_blank(input.total) {
        Some(raw) => u64::from(parse_quantity(FIELD_TOTAL, Some(raw), None)?),
        None => sum,
    };

    if u64::from(loaned) > total {
        return Err(ValidationError::LoanedExceedsTotal);
    }

    let levels = StockLevels::new(available, loaned)?;
    let status = ProductStatus::from_label(input.status)
        .unwrap_or_else(|| ProductStatus::derive(&levels));

    Ok(NormalizedStock { levels, status })
}

/// Parses one quantity field.
///
/// Blank input yields `fallback`, or 0 when there is none.
pub fn parse_quantity(field: &str, raw: Option<&str>, fallback: Option<u32>) -> ValidationResult<u32> {
    let Some(raw) = non_blank(raw) else {
        return Ok(fallback.unwrap_or(0));
    };

    let value: i64 = raw
        .parse()
        .map_err(|_| ValidationError::invalid_quantity(field, "must be a valid integer"))?;

    if value < 0 {
        return Err(ValidationError::invalid_quantity(field, "cannot be negative"));
    }

    u32::try_from(value).map_err(|_| ValidationError::invalid_quantity(field, "is out of range"))
}

/// Parses the quantity of a Borrow/Return request.
///
/// Must be an integer greater than 0.
pub fn parse_movement_quantity(raw: Option<&str>) -> ValidationResult<u32> {
    let Some(raw) = non_blank(raw) else {
        return Err(ValidationError::Required {
            field: FIELD_MOVEMENT.to_string(),
        });
    };

    let value: i64 = raw
        .parse()
        .map_err(|_| ValidationError::invalid_quantity(FIELD_MOVEMENT, "must be a valid integer"))?;

    if value <= 0 {
        return Err(ValidationError::invalid_quantity(
            FIELD_MOVEMENT,
            "must be greater than 0",
        ));
    }

    u32::try_from(value)
        .map_err(|_| ValidationError::invalid_quantity(FIELD_MOVEMENT, "is out of range"))
}

// =============================================================================
// Borrow / Return
// =============================================================================

/// The part of a product that Borrow/Return read and write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockState {
    pub levels: StockLevels,
    pub status: Option<ProductStatus>,
}

impl StockState {
    pub fn new(levels: StockLevels, status: Option<ProductStatus>) -> Self {
        StockState { levels, status }
    }

    /// Moves `quantity` units from available to loaned.
    ///
    /// ## Returns
    /// * `Ok(StockState)` - New state, status set to exhausted when nothing is left
    /// * `Err(InsufficientStock)` - `quantity` exceeds available
    pub fn borrow(&self, quantity: u32) -> CoreResult<StockState> {
        check_movement(quantity)?;

        let available = self.levels.available();
        if quantity > available {
            return Err(CoreError::InsufficientStock {
                available,
                requested: quantity,
            });
        }

        // total is unchanged, so this cannot overflow
        let levels = StockLevels {
            available: available - quantity,
            loaned: self.levels.loaned() + quantity,
        };

        let status = if levels.available() == 0 {
            Some(ProductStatus::Exhausted)
        } else {
            self.status.clone()
        };

        Ok(StockState { levels, status })
    }

    /// Moves `quantity` units from loaned back to available.
    ///
    /// ## Returns
    /// * `Ok(StockState)` - New state, status reset to active when it was
    ///   empty, exhausted or out of stock
    /// * `Err(InsufficientLoaned)` - `quantity` exceeds loaned
    pub fn return_units(&self, quantity: u32) -> CoreResult<StockState> {
        check_movement(quantity)?;

        let loaned = self.levels.loaned();
        if quantity > loaned {
            return Err(CoreError::InsufficientLoaned {
                loaned,
                requested: quantity,
            });
        }

        let levels = StockLevels {
            available: self.levels.available() + quantity,
            loaned: loaned - quantity,
        };

        let status = if levels.available() > 0
            && ProductStatus::resets_on_return(self.status.as_ref())
        {
            Some(ProductStatus::Active)
        } else {
            self.status.clone()
        };

        Ok(StockState { levels, status })
    }
}

fn check_movement(quantity: u32) -> CoreResult<()> {
    if quantity == 0 {
        return Err(
            ValidationError::invalid_quantity(FIELD_MOVEMENT, "must be greater than 0").into(),
        );
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn levels(available: u32, loaned: u32) -> StockLevels {
        StockLevels::new(available, loaned).unwrap()
    }

    fn input<'a>(
        available: Option<&'a str>,
        loaned: Option<&'a str>,
        total: Option<&'a str>,
    ) -> QuantityInput<'a> {
        QuantityInput {
            available,
            loaned,
            total,
            status: None,
        }
    }

    #[test]
    fn test_normalize_overrides_disagreeing_total() {
        let out = normalize(&input(Some("3"), Some("2"), Some("10")), None).unwrap();
        assert_eq!(out.levels, levels(3, 2));
        assert_eq!(out.levels.total(), 5);
        assert_eq!(out.status, ProductStatus::Active);
    }

    #[test]
    fn test_normalize_defaults() {
        let out = normalize(&input(None, Some(" "), Some("")), None).unwrap();
        assert_eq!(out.levels, levels(0, 0));
        assert_eq!(out.status, ProductStatus::OutOfStock);

        let existing = StockState::new(levels(4, 1), Some(ProductStatus::Active));
        let out = normalize(&input(None, Some("2"), None), Some(&existing)).unwrap();
        assert_eq!(out.levels, levels(4, 2));
    }

    #[test]
    fn test_normalize_update_status() {
        // Derived labels follow the new counters.
        let existing = StockState::new(levels(4, 0), Some(ProductStatus::Active));
        let out = normalize(&input(Some("0"), Some("4"), None), Some(&existing)).unwrap();
        assert_eq!(out.status, ProductStatus::Exhausted);

        // Without a supplied status even a custom label is re-derived.
        let retired = ProductStatus::Other("retired".to_string());
        let existing = StockState::new(levels(4, 0), Some(retired.clone()));
        let out = normalize(&input(Some("0"), Some("4"), None), Some(&existing)).unwrap();
        assert_eq!(out.status, ProductStatus::Exhausted);

        let blank = QuantityInput {
            status: Some("  "),
            ..input(Some("1"), None, None)
        };
        let out = normalize(&blank, Some(&existing)).unwrap();
        assert_eq!(out.levels, levels(1, 0));
        assert_eq!(out.status, ProductStatus::Active);
    }

    #[test]
    fn test_normalize_consistent_triple_is_unchanged() {
        let out = normalize(&input(Some("7"), Some("3"), Some("10")), None).unwrap();
        assert_eq!(out.levels, levels(7, 3));
    }

    #[test]
    fn test_normalize_loaned_exceeds_total() {
        let err = normalize(&input(Some("3"), Some("5"), Some("4")), None).unwrap_err();
        assert_eq!(err, ValidationError::LoanedExceedsTotal);
    }

    #[test]
    fn test_normalize_invalid_quantities() {
        let err = normalize(&input(Some("abc"), None, None), None).unwrap_err();
        assert_eq!(
            err,
            ValidationError::invalid_quantity(FIELD_AVAILABLE, "must be a valid integer")
        );

        let err = normalize(&input(None, Some("-1"), None), None).unwrap_err();
        assert_eq!(
            err,
            ValidationError::invalid_quantity(FIELD_LOANED, "cannot be negative")
        );

        let err = normalize(&input(None, None, Some("2.5")), None).unwrap_err();
        assert_eq!(err.field(), FIELD_TOTAL);
    }

    #[test]
    fn test_normalize_status_rules() {
        let out = normalize(&input(Some("0"), Some("3"), None), None).unwrap();
        assert_eq!(out.status, ProductStatus::Exhausted);

        let supplied = QuantityInput {
            status: Some("retired"),
            ..input(Some("5"), None, None)
        };
        let out = normalize(&supplied, None).unwrap();
        assert_eq!(out.status, ProductStatus::Other("retired".to_string()));

        // A supplied label is not checked against the counters.
        let supplied = QuantityInput {
            status: Some("active"),
            ..input(Some("0"), None, None)
        };
        assert_eq!(normalize(&supplied, None).unwrap().status, ProductStatus::Active);
    }

    #[test]
    fn test_borrow_success_keeps_status() {
        let state = StockState::new(levels(10, 0), Some(ProductStatus::Active));
        let after = state.borrow(3).unwrap();
        assert_eq!(after.levels, levels(7, 3));
        assert_eq!(after.levels.total(), 10);
        assert_eq!(after.status, Some(ProductStatus::Active));
    }

    #[test]
    fn test_borrow_keeps_non_exhausted_status() {
        let retired = Some(ProductStatus::Other("retired".to_string()));
        let after = StockState::new(levels(5, 0), retired.clone()).borrow(2).unwrap();
        assert_eq!(after.levels, levels(3, 2));
        assert_eq!(after.status, retired);

        // Borrow never resets a stale label back to active.
        let stale = Some(ProductStatus::OutOfStock);
        let after = StockState::new(levels(5, 0), stale.clone()).borrow(1).unwrap();
        assert_eq!(after.levels, levels(4, 1));
        assert_eq!(after.status, stale);
    }

    #[test]
    fn test_borrow_to_exhaustion() {
        let state = StockState::new(levels(3, 0), Some(ProductStatus::Active));
        let after = state.borrow(3).unwrap();
        assert_eq!(after.levels, levels(0, 3));
        assert_eq!(after.status, Some(ProductStatus::Exhausted));
    }

    #[test]
    fn test_borrow_insufficient() {
        let state = StockState::new(levels(2, 0), None);
        let err = state.borrow(5).unwrap_err();
        assert_eq!(
            err,
            CoreError::InsufficientStock {
                available: 2,
                requested: 5
            }
        );
        assert_eq!(err.to_string(), "Insufficient stock. Available: 2.");
    }

    #[test]
    fn test_return_restores_active() {
        let state = StockState::new(levels(0, 3), Some(ProductStatus::Exhausted));
        let after = state.return_units(3).unwrap();
        assert_eq!(after.levels, levels(3, 0));
        assert_eq!(after.status, Some(ProductStatus::Active));

        let state = StockState::new(levels(0, 1), None);
        assert_eq!(
            state.return_units(1).unwrap().status,
            Some(ProductStatus::Active)
        );
    }

    #[test]
    fn test_return_keeps_custom_status() {
        let retired = Some(ProductStatus::Other("retired".to_string()));
        let state = StockState::new(levels(0, 2), retired.clone());
        let after = state.return_units(2).unwrap();
        assert_eq!(after.levels, levels(2, 0));
        assert_eq!(after.status, retired);
    }

    #[test]
    fn test_return_exceeding_loaned() {
        let state = StockState::new(levels(5, 2), Some(ProductStatus::Active));
        let err = state.return_units(10).unwrap_err();
        assert_eq!(err.to_string(), "Cannot return more than loaned. Loaned: 2.");
    }

    #[test]
    fn test_zero_movement_rejected() {
        let state = StockState::new(levels(5, 2), None);
        assert!(matches!(
            state.borrow(0),
            Err(CoreError::Validation(ValidationError::InvalidQuantity { .. }))
        ));
        assert!(state.return_units(0).is_err());
    }

    #[test]
    fn test_parse_movement_quantity() {
        assert_eq!(parse_movement_quantity(Some("4")), Ok(4));
        assert_eq!(
            parse_movement_quantity(Some("0")),
            Err(ValidationError::invalid_quantity(
                FIELD_MOVEMENT,
                "must be greater than 0"
            ))
        );
        assert!(parse_movement_quantity(Some("-2")).is_err());
        assert!(parse_movement_quantity(Some("x")).is_err());
        assert!(matches!(
            parse_movement_quantity(None),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(ProductStatus::from_label(Some("  ")), None);
        assert_eq!(ProductStatus::from_label(None), None);
        assert_eq!(
            ProductStatus::from_label(Some("out_of_stock")),
            Some(ProductStatus::OutOfStock)
        );
        assert_eq!(ProductStatus::Other("x".into()).as_str(), "x");
        assert_eq!(
            serde_json::to_string(&ProductStatus::Exhausted).unwrap(),
            "\"exhausted\""
        );
    }

    #[test]
    fn test_from_counts_rejects_broken_rows() {
        assert_eq!(StockLevels::from_counts(3, 2, 5), Some(levels(3, 2)));
        assert_eq!(StockLevels::from_counts(3, 2, 6), None);
        assert_eq!(StockLevels::from_counts(-1, 2, 1), None);
    }

    #[derive(Debug, Clone)]
    enum Movement {
        Borrow(u32),
        Return(u32),
    }

    fn movement() -> impl Strategy<Value = Movement> {
        prop_oneof![
            (0u32..50).prop_map(Movement::Borrow),
            (0u32..50).prop_map(Movement::Return),
        ]
    }

    proptest! {
        #[test]
        fn prop_movements_preserve_invariant(
            available in 0u32..100,
            loaned in 0u32..100,
            moves in prop::collection::vec(movement(), 0..40),
        ) {
            let start = levels(available, loaned);
            let mut state = StockState::new(start, None);

            for m in moves {
                let result = match m {
                    Movement::Borrow(q) => state.borrow(q),
                    Movement::Return(q) => state.return_units(q),
                };
                if let Ok(next) = result {
                    state = next;
                }
                let l = state.levels;
                prop_assert_eq!(l.available() + l.loaned(), l.total());
                prop_assert_eq!(l.total(), start.total());
                prop_assert!(l.loaned() <= l.total());
            }
        }

        #[test]
        fn prop_normalize_always_consistent(
            available in proptest::option::of(0u32..1000),
            loaned in proptest::option::of(0u32..1000),
            total in proptest::option::of(0u32..3000),
        ) {
            let a = available.map(|v| v.to_string());
            let l = loaned.map(|v| v.to_string());
            let t = total.map(|v| v.to_string());
            let raw = input(a.as_deref(), l.as_deref(), t.as_deref());

            match normalize(&raw, None) {
                Ok(out) => {
                    prop_assert_eq!(
                        out.levels.total(),
                        out.levels.available() + out.levels.loaned()
                    );
                }
                Err(err) => prop_assert_eq!(err, ValidationError::LoanedExceedsTotal),
            }
        }
    }
}
