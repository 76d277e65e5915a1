//! # Maintenance Repositories
//!
//! Maintenance costs and the maintenance jobs that reference them.
//!
//! Every reference of a maintenance record (product, type, cost) is
//! protected: none of them can be deleted while a job points at it.

use chrono::NaiveDate;
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use stockroom_core::{
    Amount, Maintenance, MaintenanceCost, NewMaintenance, NewMaintenanceCost, ValidationError,
};

use crate::error::{DbError, DbResult};
use crate::repository::{delete_by_id, ensure_exists, generate_id};

// =============================================================================
// Costs
// =============================================================================

#[derive(Debug, FromRow)]
struct CostRow {
    id: String,
    total: String,
    affected_parts: Option<String>,
    paid_on: Option<NaiveDate>,
}

impl TryFrom<CostRow> for MaintenanceCost {
    type Error = DbError;

    fn try_from(row: CostRow) -> Result<Self, Self::Error> {
        let total: Amount = row
            .total
            .parse()
            .map_err(|e: ValidationError| DbError::corrupt("MaintenanceCost", &row.id, e.to_string()))?;

        Ok(MaintenanceCost {
            id: row.id,
            total,
            affected_parts: row.affected_parts,
            paid_on: row.paid_on,
        })
    }
}

#[derive(Debug, Clone)]
pub struct MaintenanceCostRepository {
    pool: SqlitePool,
}

impl MaintenanceCostRepository {
    pub fn new(pool: SqlitePool) -> Self {
        MaintenanceCostRepository { pool }
    }

    pub async fn create(&self, input: &NewMaintenanceCost) -> DbResult<MaintenanceCost> {
        let id = generate_id();
        debug!(id = %id, total = %input.total, "Inserting maintenance cost");

        sqlx::query(
            "INSERT INTO maintenance_costs (id, total, affected_parts, paid_on) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&id)
        .bind(input.total.to_string())
        .bind(&input.affected_parts)
        .bind(input.paid_on)
        .execute(&self.pool)
        .await?;

        Ok(MaintenanceCost {
            id,
            total: input.total,
            affected_parts: input.affected_parts.clone(),
            paid_on: input.paid_on,
        })
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<MaintenanceCost>> {
        let row: Option<CostRow> = sqlx::query_as(
            "SELECT id, total, affected_parts, paid_on FROM maintenance_costs WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(MaintenanceCost::try_from).transpose()
    }

    pub async fn list(&self) -> DbResult<Vec<MaintenanceCost>> {
        let rows: Vec<CostRow> = sqlx::query_as(
            "SELECT id, total, affected_parts, paid_on FROM maintenance_costs ORDER BY paid_on, id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(MaintenanceCost::try_from).collect()
    }

    pub async fn update(&self, id: &str, input: &NewMaintenanceCost) -> DbResult<MaintenanceCost> {
        let result = sqlx::query(
            "UPDATE maintenance_costs SET total = ?2, affected_parts = ?3, paid_on = ?4 WHERE id = ?1",
        )
        .bind(id)
        .bind(input.total.to_string())
        .bind(&input.affected_parts)
        .bind(input.paid_on)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("MaintenanceCost", id));
        }

        Ok(MaintenanceCost {
            id: id.to_string(),
            total: input.total,
            affected_parts: input.affected_parts.clone(),
            paid_on: input.paid_on,
        })
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        delete_by_id(&self.pool, "maintenance_costs", "MaintenanceCost", id).await
    }
}

// =============================================================================
// Maintenance Jobs
// =============================================================================

const MAINTENANCE_COLUMNS: &str =
    "id, performed_on, description, product_id, maintenance_type_id, cost_id, user_id";

#[derive(Debug, FromRow)]
struct MaintenanceRow {
    id: String,
    performed_on: Option<NaiveDate>,
    description: Option<String>,
    product_id: String,
    maintenance_type_id: String,
    cost_id: String,
    user_id: String,
}

impl From<MaintenanceRow> for Maintenance {
    fn from(row: MaintenanceRow) -> Self {
        Maintenance {
            id: row.id,
            performed_on: row.performed_on,
            description: row.description,
            product_id: row.product_id,
            maintenance_type_id: row.maintenance_type_id,
            cost_id: row.cost_id,
            user_id: row.user_id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MaintenanceRepository {
    pool: SqlitePool,
}

impl MaintenanceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        MaintenanceRepository { pool }
    }

    /// Records a maintenance job.
    ///
    /// ## Returns
    /// * `Err(DbError::Rejected)` - Unknown product, maintenance type or cost
    pub async fn create(&self, input: &NewMaintenance) -> DbResult<Maintenance> {
        let id = generate_id();
        debug!(id = %id, product_id = %input.product_id, "Inserting maintenance");

        let mut tx = self.pool.begin().await?;
        ensure_references(&mut tx, input).await?;

        let sql = format!(
            "INSERT INTO maintenances ({MAINTENANCE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
        );
        sqlx::query(&sql)
            .bind(&id)
            .bind(input.performed_on)
            .bind(&input.description)
            .bind(&input.product_id)
            .bind(&input.maintenance_type_id)
            .bind(&input.cost_id)
            .bind(&input.user_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(Maintenance {
            id,
            performed_on: input.performed_on,
            description: input.description.clone(),
            product_id: input.product_id.clone(),
            maintenance_type_id: input.maintenance_type_id.clone(),
            cost_id: input.cost_id.clone(),
            user_id: input.user_id.clone(),
        })
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Maintenance>> {
        let sql = format!("SELECT {MAINTENANCE_COLUMNS} FROM maintenances WHERE id = ?1");
        let row: Option<MaintenanceRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Maintenance::from))
    }

    /// Lists jobs, most recent first.
    pub async fn list(&self) -> DbResult<Vec<Maintenance>> {
        let sql = format!(
            "SELECT {MAINTENANCE_COLUMNS} FROM maintenances ORDER BY performed_on DESC, id"
        );
        let rows: Vec<MaintenanceRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;

        Ok(rows.into_iter().map(Maintenance::from).collect())
    }

    /// Lists the jobs performed on one product.
    pub async fn list_for_product(&self, product_id: &str) -> DbResult<Vec<Maintenance>> {
        let sql = format!(
            "SELECT {MAINTENANCE_COLUMNS} FROM maintenances \
             WHERE product_id = ?1 ORDER BY performed_on DESC, id"
        );
        let rows: Vec<MaintenanceRow> = sqlx::query_as(&sql)
            .bind(product_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Maintenance::from).collect())
    }

    pub async fn update(&self, id: &str, input: &NewMaintenance) -> DbResult<Maintenance> {
        let mut tx = self.pool.begin().await?;
        ensure_references(&mut tx, input).await?;

        let result = sqlx::query(
            r#"
            UPDATE maintenances SET
                performed_on = ?2,
                description = ?3,
                product_id = ?4,
                maintenance_type_id = ?5,
                cost_id = ?6,
                user_id = ?7
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(input.performed_on)
        .bind(&input.description)
        .bind(&input.product_id)
        .bind(&input.maintenance_type_id)
        .bind(&input.cost_id)
        .bind(&input.user_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Maintenance", id));
        }
        tx.commit().await?;

        Ok(Maintenance {
            id: id.to_string(),
            performed_on: input.performed_on,
            description: input.description.clone(),
            product_id: input.product_id.clone(),
            maintenance_type_id: input.maintenance_type_id.clone(),
            cost_id: input.cost_id.clone(),
            user_id: input.user_id.clone(),
        })
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        delete_by_id(&self.pool, "maintenances", "Maintenance", id).await
    }
}

async fn ensure_references(
    conn: &mut sqlx::SqliteConnection,
    input: &NewMaintenance,
) -> DbResult<()> {
    ensure_exists(conn, "products", "product_id", &input.product_id).await?;
    ensure_exists(conn, "maintenance_types", "maintenance_type_id", &input.maintenance_type_id)
        .await?;
    ensure_exists(conn, "maintenance_costs", "cost_id", &input.cost_id).await
}

// =============================================================================
// Unit Tests
// =============================================================================
