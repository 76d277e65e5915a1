//! # Error Types
//!
//! Domain-specific error types for stockroom-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockroom-core errors (this file)                                     │
//! │  ├── CoreError        - Stock rule violations (borrow/return)          │
//! │  └── ValidationError  - Input validation failures (per field)          │
//! │                                                                         │
//! │  stockroom-db errors (separate crate)                                  │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  HTTP errors (apps/api)                                                │
//! │  └── ApiError         - What clients see (400 / 404 / 409 / 500)       │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Validation errors always name the offending field
//! 3. Errors are enum variants, never String
//! 4. Stock errors render the exact message shown to API clients

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These are client-input errors: the request was well formed but the
/// current stock cannot satisfy it. Nothing is ever retried by the core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Borrow asked for more units than are available.
    ///
    /// ## User Workflow
    /// ```text
    /// POST /products/{id}/borrow { quantity: 5 }
    ///      │
    ///      ▼
    /// Current stock: available=2
    ///      │
    ///      ▼
    /// InsufficientStock { available: 2, requested: 5 }
    ///      │
    ///      ▼
    /// 400 { detail: "Insufficient stock. Available: 2." }
    /// ```
    #[error("Insufficient stock. Available: {available}.")]
    InsufficientStock { available: u32, requested: u32 },

    /// Return asked to give back more units than are on loan.
    #[error("Cannot return more than loaned. Loaned: {loaned}.")]
    InsufficientLoaned { loaned: u32, requested: u32 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Every variant names the field it rejects so the API can report it back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A quantity is not a base-10 integer, is negative, or is not strictly
    /// positive where a movement quantity is required.
    #[error("{field} {reason}")]
    InvalidQuantity { field: String, reason: String },

    /// A mandatory decimal value is absent or blank.
    #[error("{field} is required")]
    MissingValue { field: String },

    /// A decimal value is not numeric, negative, or out of range.
    #[error("{field} {reason}")]
    InvalidValue { field: String, reason: String },

    /// Loaned quantity is larger than the total.
    #[error("quantity_loaned cannot exceed the total")]
    LoanedExceedsTotal,

    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Invalid format (e.g., invalid UUID, dates out of order).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A reference names a record that does not exist.
    #[error("{field} does not reference an existing record")]
    UnknownReference { field: String },

    /// Duplicate value (e.g., product already linked to a rental).
    #[error("{message}")]
    Duplicate { field: String, message: String },
}

impl ValidationError {
    /// Returns the name of the field this error refers to.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::InvalidQuantity { field, .. }
            | ValidationError::MissingValue { field }
            | ValidationError::InvalidValue { field, .. }
            | ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::UnknownReference { field }
            | ValidationError::Duplicate { field, .. } => field,
            ValidationError::LoanedExceedsTotal => "quantity_loaned",
        }
    }

    /// Shorthand for an [`ValidationError::InvalidQuantity`].
    pub fn invalid_quantity(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidQuantity {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for an [`ValidationError::InvalidValue`].
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
