//! # stockroom-core: Pure Business Logic for Stockroom
//!
//! This crate is the **heart** of Stockroom. It contains the stock rules
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    apps/api (axum)                              │   │
//! │  │    POST /products, POST /products/{id}/borrow, ...             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ stockroom-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   stock   │  │   value   │  │ validation│  │   │
//! │  │   │  Product  │  │ normalize │  │ UnitValue │  │   names   │  │   │
//! │  │   │  Rental   │  │  borrow   │  │  Amount   │  │   dates   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 stockroom-db (Database Layer)                   │   │
//! │  │        SQLite queries, migrations, ledger transactions          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`stock`] - Quantity normalizer and Borrow/Return transitions
//! - [`value`] - Unit value and amount parsing (fixed-point decimals)
//! - [`types`] - Domain types (Product, Rental, Payment, etc.)
//! - [`input`] - Request bodies and their validation
//! - [`error`] - Domain error types
//! - [`validation`] - Field validation for catalog and rental records
//!
//! ## The Stock Invariant
//!
//! For every product, after every operation:
//! `available + loaned = total`, all three non-negative, `loaned <= total`.
//! [`stock::StockLevels`] cannot represent anything else.
//!
//! ## Example Usage
//!
//! ```rust
//! use stockroom_core::stock::{normalize, QuantityInput, StockState};
//!
//! // Total disagrees with available + loaned: the sum wins.
//! let input = QuantityInput {
//!     available: Some("3"),
//!     loaned: Some("2"),
//!     total: Some("10"),
//!     status: None,
//! };
//! let normalized = normalize(&input, None).unwrap();
//! assert_eq!(normalized.levels.total(), 5);
//!
//! // Lend three units.
//! let state = StockState::new(normalized.levels, Some(normalized.status));
//! let after = state.borrow(3).unwrap();
//! assert_eq!(after.levels.available(), 0);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod input;
pub mod stock;
pub mod types;
pub mod validation;
pub mod value;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use stock::{normalize, NormalizedStock, ProductStatus, QuantityInput, StockLevels, StockState};
pub use types::*;
pub use value::{Amount, RawValue, UnitValue};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum length of short text fields (names, models, labels).
///
/// ## Business Reason
/// Every descriptive column in the rental schema is a 45 character field.
pub const MAX_NAME_LENGTH: usize = 45;

/// Maximum number of digits in a monetary amount.
pub const MAX_AMOUNT_DIGITS: u32 = 12;

/// Maximum number of decimal places in a monetary amount.
pub const MAX_AMOUNT_SCALE: u32 = 2;
