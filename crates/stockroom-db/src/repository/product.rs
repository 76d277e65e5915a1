//! # Product Repository
//!
//! Database operations for products, including the stock ledger.
//!
//! ## Key Operations
//! - CRUD (reads join the category, brand and loan-type names)
//! - Borrow / Return, each in one transaction
//! - Locked read-modify-write for field updates
//!
//! ## Ledger Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Borrow / Return                                      │
//! │                                                                         │
//! │  BEGIN                                                                 │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  UPDATE products SET version = version WHERE id = ?   ◄── takes the    │
//! │    │   (0 rows → NotFound)                                write lock,  │
//! │    ▼                                                      other writers│
//! │  SELECT triple + status                                   wait here    │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  StockState::borrow(q) / return_units(q)   (stockroom-core, pure)      │
//! │    │   Err → drop tx → ROLLBACK, nothing visible                       │
//! │    ▼                                                                    │
//! │  UPDATE triple, status, version + 1                                    │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  COMMIT                                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! SQLite has no row locks. Making the first statement of the transaction a
//! write acquires the database write lock before anything is read, which
//! gives the same guarantee as `SELECT ... FOR UPDATE`: two concurrent
//! movements on one product run one after the other, and the second one
//! sees what the first committed.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use stockroom_core::input::ProductInput;
use stockroom_core::stock::FIELD_MOVEMENT;
use stockroom_core::validation::ValidationResult;
use stockroom_core::{
    CoreError, Product, ProductFields, ProductStatus, StockLevels, StockState, UnitValue,
    ValidationError,
};

use crate::error::{DbError, DbResult};
use crate::repository::{delete_by_id, ensure_exists, generate_id};

/// Columns of a product read, with the catalog names joined in.
const PRODUCT_SELECT: &str = r#"
    SELECT
        p.id,
        p.name,
        p.model,
        p.unit_value,
        p.loan_kind,
        p.status,
        p.quantity_available,
        p.quantity_loaned,
        p.quantity_total,
        p.category_id,
        c.name AS category_name,
        p.brand_id,
        b.name AS brand_name,
        p.loan_type_id,
        l.name AS loan_type_name,
        p.version,
        p.created_at,
        p.updated_at
    FROM products p
    INNER JOIN categories c ON c.id = p.category_id
    INNER JOIN brands b ON b.id = p.brand_id
    INNER JOIN loan_types l ON l.id = p.loan_type_id
"#;

/// Raw `products` row.
#[derive(Debug, FromRow)]
struct ProductRow {
    id: String,
    name: String,
    model: Option<String>,
    unit_value: String,
    loan_kind: Option<String>,
    status: Option<String>,
    quantity_available: i64,
    quantity_loaned: i64,
    quantity_total: i64,
    category_id: String,
    category_name: String,
    brand_id: String,
    brand_name: String,
    loan_type_id: String,
    loan_type_name: String,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = DbError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let levels =
            StockLevels::from_counts(row.quantity_available, row.quantity_loaned, row.quantity_total)
                .ok_or_else(|| DbError::corrupt("Product", &row.id, "inconsistent quantities"))?;
        let unit_value: UnitValue = row
            .unit_value
            .parse()
            .map_err(|e: ValidationError| DbError::corrupt("Product", &row.id, e.to_string()))?;

        Ok(Product {
            id: row.id,
            name: row.name,
            model: row.model,
            unit_value,
            loan_kind: row.loan_kind,
            status: ProductStatus::from_label(row.status.as_deref()),
            quantity_available: levels.available(),
            quantity_loaned: levels.loaned(),
            quantity_total: levels.total(),
            category_id: row.category_id,
            category_name: row.category_name,
            brand_id: row.brand_id,
            brand_name: row.brand_name,
            loan_type_id: row.loan_type_id,
            loan_type_name: row.loan_type_name,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Which way a ledger movement goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Movement {
    Borrow,
    Return,
}

impl Movement {
    fn apply(self, state: &StockState, quantity: u32) -> Result<StockState, CoreError> {
        match self {
            Movement::Borrow => state.borrow(quantity),
            Movement::Return => state.return_units(quantity),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Movement::Borrow => "borrow",
            Movement::Return => "return",
        }
    }
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// let product = repo.create(&fields).await?;
/// let product = repo.borrow(&product.id, 3).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        fetch_product(&mut conn, id).await
    }

    /// Lists all products ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let sql = format!("{PRODUCT_SELECT} ORDER BY p.name, p.id");
        let rows: Vec<ProductRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;

        debug!(count = rows.len(), "Listed products");
        rows.into_iter().map(Product::try_from).collect()
    }

    /// Counts products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Inserts a new product from validated fields.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Inserted product, with catalog names
    /// * `Err(DbError::Rejected)` - A catalog reference does not exist
    pub async fn create(&self, fields: &ProductFields) -> DbResult<Product> {
        let id = generate_id();
        let now = Utc::now();
        debug!(id = %id, name = %fields.name, "Inserting product");

        let mut tx = self.pool.begin().await?;
        ensure_references(&mut tx, fields).await?;

        let levels = fields.stock.levels;
        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, model, unit_value, loan_kind, status,
                quantity_available, quantity_loaned, quantity_total,
                category_id, brand_id, loan_type_id,
                version, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8, ?9,
                ?10, ?11, ?12,
                1, ?13, ?13
            )
            "#,
        )
        .bind(&id)
        .bind(&fields.name)
        .bind(&fields.model)
        .bind(fields.unit_value.to_string())
        .bind(&fields.loan_kind)
        .bind(fields.stock.status.as_str())
        .bind(i64::from(levels.available()))
        .bind(i64::from(levels.loaned()))
        .bind(i64::from(levels.total()))
        .bind(&fields.category_id)
        .bind(&fields.brand_id)
        .bind(&fields.loan_type_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let product = fetch_product(&mut tx, &id)
            .await?
            .ok_or_else(|| DbError::Internal(format!("Product {id} vanished after insert")))?;
        tx.commit().await?;

        info!(id = %product.id, stock = %levels, "Product created");
        Ok(product)
    }

    /// Applies a partial update (PUT / PATCH body) to a product.
    ///
    /// Absent fields keep their stored value; quantities are normalized
    /// against the stored triple.
    pub async fn update(&self, id: &str, input: &ProductInput) -> DbResult<Product> {
        self.update_with(id, |current| input.merge(current)).await
    }

    /// Locked read-modify-write of a product.
    ///
    /// `build` receives the current product, read under the write lock, and
    /// returns the new field values. A Borrow/Return cannot slip in between
    /// the read and the write.
    ///
    /// ## Returns
    /// * `Ok(Product)` - The updated product
    /// * `Err(DbError::NotFound)` - No such product
    /// * `Err(DbError::Rejected)` - `build` refused the input
    pub async fn update_with<F>(&self, id: &str, build: F) -> DbResult<Product>
    where
        F: FnOnce(&Product) -> ValidationResult<ProductFields>,
    {
        debug!(id = %id, "Updating product");

        let mut tx = self.pool.begin().await?;
        lock_product(&mut tx, id).await?;

        let current = fetch_product(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;
        let fields = build(&current)?;
        ensure_references(&mut tx, &fields).await?;

        let levels = fields.stock.levels;
        sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                model = ?3,
                unit_value = ?4,
                loan_kind = ?5,
                status = ?6,
                quantity_available = ?7,
                quantity_loaned = ?8,
                quantity_total = ?9,
                category_id = ?10,
                brand_id = ?11,
                loan_type_id = ?12,
                updated_at = ?13,
                version = version + 1
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&fields.name)
        .bind(&fields.model)
        .bind(fields.unit_value.to_string())
        .bind(&fields.loan_kind)
        .bind(fields.stock.status.as_str())
        .bind(i64::from(levels.available()))
        .bind(i64::from(levels.loaned()))
        .bind(i64::from(levels.total()))
        .bind(&fields.category_id)
        .bind(&fields.brand_id)
        .bind(&fields.loan_type_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        let product = fetch_product(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;
        tx.commit().await?;

        info!(id = %id, stock = %levels, version = product.version, "Product updated");
        Ok(product)
    }

    /// Deletes a product.
    ///
    /// Rental links are removed with it. Fails with `ForeignKeyViolation`
    /// while maintenance records reference the product.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");
        delete_by_id(&self.pool, "products", "Product", id).await
    }

    // =========================================================================
    // Stock Ledger
    // =========================================================================

    /// Lends `quantity` units of a product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Updated product
    /// * `Err(DbError::NotFound)` - No such product
    /// * `Err(DbError::Rejected(InsufficientStock))` - Not enough units available
    pub async fn borrow(&self, id: &str, quantity: u32) -> DbResult<Product> {
        self.move_stock(id, quantity, Movement::Borrow).await
    }

    /// Takes back `quantity` lent units of a product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Updated product
    /// * `Err(DbError::NotFound)` - No such product
    /// * `Err(DbError::Rejected(InsufficientLoaned))` - Fewer units are on loan
    pub async fn return_units(&self, id: &str, quantity: u32) -> DbResult<Product> {
        self.move_stock(id, quantity, Movement::Return).await
    }

    async fn move_stock(&self, id: &str, quantity: u32, movement: Movement) -> DbResult<Product> {
        debug!(id = %id, quantity, movement = movement.as_str(), "Stock movement requested");

        // Rejected before any state is read.
        if quantity == 0 {
            return Err(
                ValidationError::invalid_quantity(FIELD_MOVEMENT, "must be greater than 0").into(),
            );
        }

        let mut tx = self.pool.begin().await?;
        lock_product(&mut tx, id).await?;

        let current = read_stock(&mut tx, id).await?;
        let next = match movement.apply(&current, quantity) {
            Ok(next) => next,
            Err(err) => {
                warn!(
                    id = %id,
                    quantity,
                    movement = movement.as_str(),
                    stock = %current.levels,
                    error = %err,
                    "Stock movement rejected"
                );
                // tx dropped here: rollback
                return Err(err.into());
            }
        };

        sqlx::query(
            r#"
            UPDATE products SET
                quantity_available = ?2,
                quantity_loaned = ?3,
                quantity_total = ?4,
                status = ?5,
                updated_at = ?6,
                version = version + 1
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(i64::from(next.levels.available()))
        .bind(i64::from(next.levels.loaned()))
        .bind(i64::from(next.levels.total()))
        .bind(next.status.as_ref().map(ProductStatus::as_str))
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        let product = fetch_product(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;
        tx.commit().await?;

        info!(
            id = %id,
            quantity,
            movement = movement.as_str(),
            before = %current.levels,
            after = %next.levels,
            "Stock movement committed"
        );
        Ok(product)
    }
}

// =============================================================================
// Connection-level helpers (usable inside a transaction)
// =============================================================================

/// Takes the SQLite write lock for this transaction, scoped to one product.
///
/// Returns `NotFound` when the product does not exist.
async fn lock_product(conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
    let result = sqlx::query("UPDATE products SET version = version WHERE id = ?1")
        .bind(id)
        .execute(conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Product", id));
    }
    Ok(())
}

async fn fetch_product(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
    let sql = format!("{PRODUCT_SELECT} WHERE p.id = ?1");
    let row: Option<ProductRow> = sqlx::query_as(&sql).bind(id).fetch_optional(conn).await?;

    row.map(Product::try_from).transpose()
}

#[derive(Debug, FromRow)]
struct StockRow {
    quantity_available: i64,
    quantity_loaned: i64,
    quantity_total: i64,
    status: Option<String>,
}

async fn read_stock(conn: &mut SqliteConnection, id: &str) -> DbResult<StockState> {
    let row: StockRow = sqlx::query_as(
        r#"
        SELECT quantity_available, quantity_loaned, quantity_total, status
        FROM products
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| DbError::not_found("Product", id))?;

    let levels = StockLevels::from_counts(row.quantity_available, row.quantity_loaned, row.quantity_total)
        .ok_or_else(|| DbError::corrupt("Product", id, "inconsistent quantities"))?;

    Ok(StockState::new(
        levels,
        ProductStatus::from_label(row.status.as_deref()),
    ))
}

async fn ensure_references(conn: &mut SqliteConnection, fields: &ProductFields) -> DbResult<()> {
    ensure_exists(conn, "categories", "category_id", &fields.category_id).await?;
    ensure_exists(conn, "brands", "brand_id", &fields.brand_id).await?;
    ensure_exists(conn, "loan_types", "loan_type_id", &fields.loan_type_id).await?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
