//! # Repository Module
//!
//! Database repository implementations for Stockroom.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.products().borrow(id, 3)                                   │
//! │       ▼                                                                 │
//! │  ProductRepository                                                     │
//! │  ├── create / get / list / update / delete                             │
//! │  └── borrow / return_units   (one transaction each)                    │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  All SQL lives in this module tree.                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Product CRUD and the stock ledger
//! - [`catalog::NamedRepository`] - Name-only lookup tables
//! - [`catalog::LoanTypeRepository`] - Loan types
//! - [`rental`] - Rentals, payments, rental/product links
//! - [`maintenance`] - Maintenance costs and records

pub mod catalog;
pub mod maintenance;
pub mod product;
pub mod rental;

use sqlx::SqliteConnection;
use uuid::Uuid;

use stockroom_core::ValidationError;

use crate::error::DbResult;

/// Generates a new record id (UUID v4).
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Checks that `id` exists in `table`.
///
/// A missing row is reported as a validation error on `field` so the client
/// gets a 400 naming the bad reference rather than a constraint failure.
///
/// `table` must be one of the schema's table names, never user input.
pub(crate) async fn ensure_exists(
    conn: &mut SqliteConnection,
    table: &'static str,
    field: &str,
    id: &str,
) -> DbResult<()> {
    let sql = format!("SELECT EXISTS (SELECT 1 FROM {table} WHERE id = ?1)");
    let exists: bool = sqlx::query_scalar(&sql).bind(id).fetch_one(conn).await?;

    if !exists {
        return Err(ValidationError::UnknownReference {
            field: field.to_string(),
        }
        .into());
    }
    Ok(())
}

/// Deletes a row by id from `table`.
///
/// ## Returns
/// * `Ok(())` - Row deleted
/// * `Err(DbError::NotFound)` - No such row
/// * `Err(DbError::ForeignKeyViolation)` - A protected reference still exists
pub(crate) async fn delete_by_id(
    pool: &sqlx::SqlitePool,
    table: &'static str,
    entity: &'static str,
    id: &str,
) -> DbResult<()> {
    let sql = format!("DELETE FROM {table} WHERE id = ?1");
    let result = sqlx::query(&sql).bind(id).execute(pool).await?;

    if result.rows_affected() == 0 {
        return Err(crate::error::DbError::not_found(entity, id));
    }
    Ok(())
}
