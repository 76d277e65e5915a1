//! # Domain Types
//!
//! Core domain types used throughout Stockroom.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  INVENTORY                                                              │
//! │  ┌──────────┐  ┌──────────┐  ┌──────────┐      ┌─────────────────────┐  │
//! │  │ Category │  │  Brand   │  │ LoanType │ ───► │      Product        │  │
//! │  └────┬─────┘  └────┬─────┘  └──────────┘      │  unit_value         │  │
//! │       └─────────────┴──────────────────────►   │  quantity_* triple  │  │
//! │        (protect)              (cascade)        │  status             │  │
//! │                                                └──────────┬──────────┘  │
//! │  RENTAL                                                   │             │
//! │  ┌──────────┐   ┌──────────────┐   ┌───────────────┐      │             │
//! │  │  Rental  │◄──│RentalProduct │───┘               │      │             │
//! │  └────┬─────┘   └──────────────┘                   │      │             │
//! │       │ cascade  ┌──────────┐ PaymentType / PaymentState (protect)      │
//! │       └─────────►│ Payment  │                                           │
//! │                  └──────────┘                                           │
//! │  MAINTENANCE                                                            │
//! │  ┌─────────────┐  Product / MaintenanceType / MaintenanceCost (protect) │
//! │  │ Maintenance │                                                        │
//! │  └─────────────┘                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every entity has an `id`: UUID v4 string, immutable, used for relations.
//! Users are owned by an external identity provider and referenced by an
//! opaque `user_id`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::stock::{NormalizedStock, ProductStatus, StockLevels, StockState};
use crate::value::{Amount, UnitValue};

// =============================================================================
// Catalog
// =============================================================================

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Category {
    pub id: String,
    pub name: String,
}

/// A product brand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Brand {
    pub id: String,
    pub name: String,
}

/// A loan type (e.g. "Daily rental").
///
/// Deleting a loan type deletes every product that references it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LoanType {
    pub id: String,
    pub name: String,
    /// Free label describing the loan period ("daily", "weekly", ...).
    pub kind: String,
}

/// Validated name-only record (category, brand, payment type, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNamed {
    pub name: String,
}

/// Validated loan type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLoanType {
    pub name: String,
    pub kind: String,
}

// =============================================================================
// Product
// =============================================================================

/// A product that can be lent out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name.
    pub name: String,

    /// Model designation.
    pub model: Option<String>,

    /// Per-unit value, canonical decimal string on the wire.
    #[ts(as = "String")]
    pub unit_value: UnitValue,

    /// Free label for how this product is lent.
    pub loan_kind: Option<String>,

    /// Status label, `null` when none.
    #[ts(as = "Option<String>")]
    pub status: Option<ProductStatus>,

    /// Units on the shelf.
    pub quantity_available: u32,

    /// Units lent out.
    pub quantity_loaned: u32,

    /// Always `quantity_available + quantity_loaned`.
    pub quantity_total: u32,

    pub category_id: String,
    pub category_name: String,
    pub brand_id: String,
    pub brand_name: String,
    pub loan_type_id: String,
    pub loan_type_name: String,

    /// Bumped on every write.
    pub version: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the quantity triple, or `None` if the counters disagree.
    pub fn stock_levels(&self) -> Option<StockLevels> {
        StockLevels::from_counts(
            i64::from(self.quantity_available),
            i64::from(self.quantity_loaned),
            i64::from(self.quantity_total),
        )
    }

    /// Returns the part of the product that stock movements work on.
    pub fn stock_state(&self) -> Option<StockState> {
        self.stock_levels()
            .map(|levels| StockState::new(levels, self.status.clone()))
    }
}

/// Validated product fields, ready to be written.
///
/// Produced by [`crate::input::ProductInput::validate`] for creates and by
/// [`crate::input::ProductInput::merge`] for updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFields {
    pub name: String,
    pub model: Option<String>,
    pub unit_value: UnitValue,
    pub loan_kind: Option<String>,
    pub stock: NormalizedStock,
    pub category_id: String,
    pub brand_id: String,
    pub loan_type_id: String,
}

// =============================================================================
// Rental
// =============================================================================

/// A rental: a set of products lent to one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Rental {
    pub id: String,
    #[ts(as = "String")]
    pub loaned_on: NaiveDate,
    #[ts(as = "Option<String>")]
    pub returned_on: Option<NaiveDate>,
    /// Opaque user id from the identity provider.
    pub user_id: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRental {
    pub loaned_on: NaiveDate,
    pub returned_on: Option<NaiveDate>,
    pub user_id: String,
}

/// How a payment is made (cash, transfer, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentType {
    pub id: String,
    pub name: String,
}

/// Where a payment stands (pending, paid, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentState {
    pub id: String,
    pub name: String,
}

/// A payment recorded against a rental.
///
/// Stored as given; nothing computes with these amounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Payment {
    pub id: String,
    #[ts(as = "String")]
    pub total: Amount,
    #[ts(as = "Option<String>")]
    pub discount: Option<Amount>,
    #[ts(as = "Option<String>")]
    pub amount_paid: Option<Amount>,
    #[ts(as = "Option<String>")]
    pub billed_on: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub due_on: Option<NaiveDate>,
    pub payment_type_id: String,
    pub payment_state_id: String,
    pub rental_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPayment {
    pub total: Amount,
    pub discount: Option<Amount>,
    pub amount_paid: Option<Amount>,
    pub billed_on: Option<NaiveDate>,
    pub due_on: Option<NaiveDate>,
    pub payment_type_id: String,
    pub payment_state_id: String,
    pub rental_id: String,
}

/// A product linked to a rental, with the product's catalog names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RentalProduct {
    pub id: String,
    pub rental_id: String,
    pub product_id: String,
    pub product_name: String,
    pub category_name: String,
    pub brand_name: String,
    pub loan_type_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRentalProduct {
    pub rental_id: String,
    pub product_id: String,
}

// =============================================================================
// Maintenance
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MaintenanceType {
    pub id: String,
    pub name: String,
}

/// Cost of a maintenance job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MaintenanceCost {
    pub id: String,
    #[ts(as = "String")]
    pub total: Amount,
    pub affected_parts: Option<String>,
    #[ts(as = "Option<String>")]
    pub paid_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMaintenanceCost {
    pub total: Amount,
    pub affected_parts: Option<String>,
    pub paid_on: Option<NaiveDate>,
}

/// A maintenance job performed on a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Maintenance {
    pub id: String,
    #[ts(as = "Option<String>")]
    pub performed_on: Option<NaiveDate>,
    pub description: Option<String>,
    pub product_id: String,
    pub maintenance_type_id: String,
    pub cost_id: String,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMaintenance {
    pub performed_on: Option<NaiveDate>,
    pub description: Option<String>,
    pub product_id: String,
    pub maintenance_type_id: String,
    pub cost_id: String,
    pub user_id: String,
}

// =============================================================================
// Unit Tests
// =============================================================================
