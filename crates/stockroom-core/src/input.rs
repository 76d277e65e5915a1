//! # Request Inputs
//!
//! Loosely typed request bodies and their validation into the `New*` /
//! [`ProductFields`] records the database layer writes.
//!
//! ```text
//!   JSON body ──serde──► ProductInput ──validate()──► ProductFields ──► stockroom-db
//!                              │
//!                              └──merge(&current)──► ProductFields   (PUT / PATCH)
//! ```
//!
//! Every field is optional at the serde level so that a missing field is
//! reported as a validation error naming it, not as a body parse failure.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::stock::{normalize, parse_movement_quantity, NormalizedStock, QuantityInput, StockState};
use crate::types::{
    NewLoanType, NewMaintenance, NewMaintenanceCost, NewNamed, NewPayment, NewRental,
    NewRentalProduct, Product, ProductFields,
};
use crate::validation::{
    require_date, validate_date_order, validate_name, validate_optional_text, validate_reference,
    validate_user_id, ValidationResult,
};
use crate::value::{Amount, RawValue, UnitValue};

fn raw_text(raw: &Option<RawValue>) -> Option<std::borrow::Cow<'_, str>> {
    raw.as_ref().map(RawValue::as_text)
}

// =============================================================================
// Catalog Inputs
// =============================================================================

/// Body of every name-only record (category, brand, payment type, ...).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NamedInput {
    pub name: Option<String>,
}

impl NamedInput {
    pub fn validate(&self) -> ValidationResult<NewNamed> {
        Ok(NewNamed {
            name: validate_name("name", self.name.as_deref())?,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoanTypeInput {
    pub name: Option<String>,
    pub kind: Option<String>,
}

impl LoanTypeInput {
    pub fn validate(&self) -> ValidationResult<NewLoanType> {
        Ok(NewLoanType {
            name: validate_name("name", self.name.as_deref())?,
            kind: validate_name("kind", self.kind.as_deref())?,
        })
    }
}

// =============================================================================
// Product Input
// =============================================================================

/// Create/update body of a product.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductInput {
    pub name: Option<String>,
    pub model: Option<String>,
    pub unit_value: Option<RawValue>,
    pub loan_kind: Option<String>,
    pub status: Option<String>,
    pub quantity_available: Option<RawValue>,
    pub quantity_loaned: Option<RawValue>,
    pub quantity_total: Option<RawValue>,
    pub category_id: Option<String>,
    pub brand_id: Option<String>,
    pub loan_type_id: Option<String>,
}

impl ProductInput {
    /// Validates a product for creation.
    ///
    /// Quantities are normalized with no existing state, so blanks become 0.
    pub fn validate(&self) -> ValidationResult<ProductFields> {
        let unit_value = raw_text(&self.unit_value);

        Ok(ProductFields {
            name: validate_name("name", self.name.as_deref())?,
            model: validate_optional_text("model", self.model.as_deref())?,
            unit_value: UnitValue::parse(unit_value.as_deref())?,
            loan_kind: validate_optional_text("loan_kind", self.loan_kind.as_deref())?,
            stock: self.normalize_stock(None)?,
            category_id: validate_reference("category_id", self.category_id.as_deref())?,
            brand_id: validate_reference("brand_id", self.brand_id.as_deref())?,
            loan_type_id: validate_reference("loan_type_id", self.loan_type_id.as_deref())?,
        })
    }

    /// Merges a partial update into the current product.
    ///
    /// Absent fields keep their stored value. Quantities are normalized
    /// against the stored triple. `unit_value` is parsed only when present.
    pub fn merge(&self, current: &Product) -> ValidationResult<ProductFields> {
        let existing = current.stock_state();

        let name = match &self.name {
            Some(name) => validate_name("name", Some(name.as_str()))?,
            None => current.name.clone(),
        };
        let model = match &self.model {
            Some(model) => validate_optional_text("model", Some(model.as_str()))?,
            None => current.model.clone(),
        };
        let unit_value = match raw_text(&self.unit_value) {
            Some(raw) => UnitValue::parse(Some(&raw))?,
            None => current.unit_value,
        };
        let loan_kind = match &self.loan_kind {
            Some(kind) => validate_optional_text("loan_kind", Some(kind.as_str()))?,
            None => current.loan_kind.clone(),
        };
        let reference = |field: &str, value: &Option<String>, stored: &str| match value {
            Some(id) => validate_reference(field, Some(id.as_str())),
            None => Ok(stored.to_string()),
        };

        Ok(ProductFields {
            name,
            model,
            unit_value,
            loan_kind,
            stock: self.normalize_stock(existing.as_ref())?,
            category_id: reference("category_id", &self.category_id, &current.category_id)?,
            brand_id: reference("brand_id", &self.brand_id, &current.brand_id)?,
            loan_type_id: reference("loan_type_id", &self.loan_type_id, &current.loan_type_id)?,
        })
    }

    fn normalize_stock(
        &self,
        existing: Option<&StockState>,
    ) -> ValidationResult<NormalizedStock> {
        let available = raw_text(&self.quantity_available);
        let loaned = raw_text(&self.quantity_loaned);
        let total = raw_text(&self.quantity_total);

        let input = QuantityInput {
            available: available.as_deref(),
            loaned: loaned.as_deref(),
            total: total.as_deref(),
            status: self.status.as_deref(),
        };
        normalize(&input, existing)
    }
}

/// Body of `POST /products/{id}/borrow` and `/return`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MovementInput {
    pub quantity: Option<RawValue>,
}

impl MovementInput {
    /// Returns the requested quantity, which must be greater than 0.
    pub fn validate(&self) -> ValidationResult<u32> {
        let raw = raw_text(&self.quantity);
        parse_movement_quantity(raw.as_deref())
    }
}

// =============================================================================
// Rental Inputs
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RentalInput {
    pub loaned_on: Option<NaiveDate>,
    pub returned_on: Option<NaiveDate>,
    pub user_id: Option<String>,
}

impl RentalInput {
    pub fn validate(&self) -> ValidationResult<NewRental> {
        let loaned_on = require_date("loaned_on", self.loaned_on)?;
        validate_date_order(loaned_on, self.returned_on)?;

        Ok(NewRental {
            loaned_on,
            returned_on: self.returned_on,
            user_id: validate_user_id(self.user_id.as_deref())?,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentInput {
    pub total: Option<RawValue>,
    pub discount: Option<RawValue>,
    pub amount_paid: Option<RawValue>,
    pub billed_on: Option<NaiveDate>,
    pub due_on: Option<NaiveDate>,
    pub payment_type_id: Option<String>,
    pub payment_state_id: Option<String>,
    pub rental_id: Option<String>,
}

impl PaymentInput {
    pub fn validate(&self) -> ValidationResult<NewPayment> {
        let total = raw_text(&self.total);
        let discount = raw_text(&self.discount);
        let amount_paid = raw_text(&self.amount_paid);

        Ok(NewPayment {
            total: Amount::parse(total.as_deref(), "total")?,
            discount: Amount::parse_optional(discount.as_deref(), "discount")?,
            amount_paid: Amount::parse_optional(amount_paid.as_deref(), "amount_paid")?,
            billed_on: self.billed_on,
            due_on: self.due_on,
            payment_type_id: validate_reference("payment_type_id", self.payment_type_id.as_deref())?,
            payment_state_id: validate_reference(
                "payment_state_id",
                self.payment_state_id.as_deref(),
            )?,
            rental_id: validate_reference("rental_id", self.rental_id.as_deref())?,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RentalProductInput {
    pub rental_id: Option<String>,
    pub product_id: Option<String>,
}

impl RentalProductInput {
    pub fn validate(&self) -> ValidationResult<NewRentalProduct> {
        Ok(NewRentalProduct {
            rental_id: validate_reference("rental_id", self.rental_id.as_deref())?,
            product_id: validate_reference("product_id", self.product_id.as_deref())?,
        })
    }
}

// =============================================================================
// Maintenance Inputs
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MaintenanceCostInput {
    pub total: Option<RawValue>,
    pub affected_parts: Option<String>,
    pub paid_on: Option<NaiveDate>,
}

impl MaintenanceCostInput {
    pub fn validate(&self) -> ValidationResult<NewMaintenanceCost> {
        let total = raw_text(&self.total);

        Ok(NewMaintenanceCost {
            total: Amount::parse(total.as_deref(), "total")?,
            affected_parts: validate_optional_text("affected_parts", self.affected_parts.as_deref())?,
            paid_on: self.paid_on,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MaintenanceInput {
    pub performed_on: Option<NaiveDate>,
    pub description: Option<String>,
    pub product_id: Option<String>,
    pub maintenance_type_id: Option<String>,
    pub cost_id: Option<String>,
    pub user_id: Option<String>,
}

impl MaintenanceInput {
    pub fn validate(&self) -> ValidationResult<NewMaintenance> {
        Ok(NewMaintenance {
            performed_on: self.performed_on,
            description: validate_optional_text("description", self.description.as_deref())?,
            product_id: validate_reference("product_id", self.product_id.as_deref())?,
            maintenance_type_id: validate_reference(
                "maintenance_type_id",
                self.maintenance_type_id.as_deref(),
            )?,
            cost_id: validate_reference("cost_id", self.cost_id.as_deref())?,
            user_id: validate_user_id(self.user_id.as_deref())?,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
