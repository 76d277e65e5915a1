//! # Catalog Repositories
//!
//! Lookup tables: categories, brands, loan types, payment types, payment
//! states and maintenance types.
//!
//! All of them except loan types are `{id, name}` rows and share one
//! generic repository, [`NamedRepository`]. Which table it talks to is
//! fixed by the entity type:
//!
//! ```text
//! db.categories()        → NamedRepository<Category>        → categories
//! db.brands()            → NamedRepository<Brand>           → brands
//! db.payment_types()     → NamedRepository<PaymentType>     → payment_types
//! db.payment_states()    → NamedRepository<PaymentState>    → payment_states
//! db.maintenance_types() → NamedRepository<MaintenanceType> → maintenance_types
//! ```

use std::marker::PhantomData;

use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use stockroom_core::{
    Brand, Category, LoanType, MaintenanceType, NewLoanType, NewNamed, PaymentState, PaymentType,
};

use crate::error::{DbError, DbResult};
use crate::repository::{delete_by_id, generate_id};

// =============================================================================
// Named Entities
// =============================================================================

/// Raw `{id, name}` row.
#[derive(Debug, FromRow)]
pub struct NamedRow {
    pub id: String,
    pub name: String,
}

/// An `{id, name}` entity stored in its own table.
pub trait NamedEntity: From<NamedRow> + Send + Unpin {
    /// Table name. A schema constant, never user input.
    const TABLE: &'static str;
    /// Entity label used in errors and logs.
    const ENTITY: &'static str;
}

macro_rules! named_entity {
    ($ty:ident, $table:literal) => {
        impl From<NamedRow> for $ty {
            fn from(row: NamedRow) -> Self {
                $ty {
                    id: row.id,
                    name: row.name,
                }
            }
        }

        impl NamedEntity for $ty {
            const TABLE: &'static str = $table;
            const ENTITY: &'static str = stringify!($ty);
        }
    };
}

named_entity!(Category, "categories");
named_entity!(Brand, "brands");
named_entity!(PaymentType, "payment_types");
named_entity!(PaymentState, "payment_states");
named_entity!(MaintenanceType, "maintenance_types");

/// CRUD for an `{id, name}` table.
#[derive(Debug, Clone)]
pub struct NamedRepository<T> {
    pool: SqlitePool,
    _entity: PhantomData<fn() -> T>,
}

impl<T: NamedEntity> NamedRepository<T> {
    pub fn new(pool: SqlitePool) -> Self {
        NamedRepository {
            pool,
            _entity: PhantomData,
        }
    }

    /// Inserts a new row.
    pub async fn create(&self, input: &NewNamed) -> DbResult<T> {
        let id = generate_id();
        debug!(entity = T::ENTITY, id = %id, name = %input.name, "Inserting");

        let sql = format!("INSERT INTO {} (id, name) VALUES (?1, ?2)", T::TABLE);
        sqlx::query(&sql)
            .bind(&id)
            .bind(&input.name)
            .execute(&self.pool)
            .await?;

        Ok(T::from(NamedRow {
            id,
            name: input.name.clone(),
        }))
    }

    /// Gets a row by id.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<T>> {
        let sql = format!("SELECT id, name FROM {} WHERE id = ?1", T::TABLE);
        let row: Option<NamedRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(T::from))
    }

    /// Lists all rows ordered by name.
    pub async fn list(&self) -> DbResult<Vec<T>> {
        let sql = format!("SELECT id, name FROM {} ORDER BY name, id", T::TABLE);
        let rows: Vec<NamedRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;

        Ok(rows.into_iter().map(T::from).collect())
    }

    /// Renames a row.
    pub async fn update(&self, id: &str, input: &NewNamed) -> DbResult<T> {
        debug!(entity = T::ENTITY, id = %id, "Updating");

        let sql = format!("UPDATE {} SET name = ?2 WHERE id = ?1", T::TABLE);
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(&input.name)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(T::ENTITY, id));
        }

        Ok(T::from(NamedRow {
            id: id.to_string(),
            name: input.name.clone(),
        }))
    }

    /// Deletes a row.
    ///
    /// Fails with `ForeignKeyViolation` while protected references exist
    /// (e.g. a category still used by a product).
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(entity = T::ENTITY, id = %id, "Deleting");
        delete_by_id(&self.pool, T::TABLE, T::ENTITY, id).await
    }
}

// =============================================================================
// Loan Types
// =============================================================================

#[derive(Debug, FromRow)]
struct LoanTypeRow {
    id: String,
    name: String,
    kind: String,
}

impl From<LoanTypeRow> for LoanType {
    fn from(row: LoanTypeRow) -> Self {
        LoanType {
            id: row.id,
            name: row.name,
            kind: row.kind,
        }
    }
}

/// CRUD for loan types.
///
/// Deleting a loan type cascades to its products.
#[derive(Debug, Clone)]
pub struct LoanTypeRepository {
    pool: SqlitePool,
}

impl LoanTypeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        LoanTypeRepository { pool }
    }

    pub async fn create(&self, input: &NewLoanType) -> DbResult<LoanType> {
        let id = generate_id();
        debug!(id = %id, name = %input.name, "Inserting loan type");

        sqlx::query("INSERT INTO loan_types (id, name, kind) VALUES (?1, ?2, ?3)")
            .bind(&id)
            .bind(&input.name)
            .bind(&input.kind)
            .execute(&self.pool)
            .await?;

        Ok(LoanType {
            id,
            name: input.name.clone(),
            kind: input.kind.clone(),
        })
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<LoanType>> {
        let row: Option<LoanTypeRow> =
            sqlx::query_as("SELECT id, name, kind FROM loan_types WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(LoanType::from))
    }

    pub async fn list(&self) -> DbResult<Vec<LoanType>> {
        let rows: Vec<LoanTypeRow> =
            sqlx::query_as("SELECT id, name, kind FROM loan_types ORDER BY name, id")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(LoanType::from).collect())
    }

    pub async fn update(&self, id: &str, input: &NewLoanType) -> DbResult<LoanType> {
        let result = sqlx::query("UPDATE loan_types SET name = ?2, kind = ?3 WHERE id = ?1")
            .bind(id)
            .bind(&input.name)
            .bind(&input.kind)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("LoanType", id));
        }

        Ok(LoanType {
            id: id.to_string(),
            name: input.name.clone(),
            kind: input.kind.clone(),
        })
    }

    /// Deletes a loan type and, through the cascade, its products.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting loan type");
        delete_by_id(&self.pool, "loan_types", "LoanType", id).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
