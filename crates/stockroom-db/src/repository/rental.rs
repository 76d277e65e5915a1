//! # Rental Repositories
//!
//! Rentals, their payments and the products linked to them.
//!
//! ```text
//!   rentals ──┬──► payments         (CASCADE on rental delete)
//!             └──► rental_products  (CASCADE on rental or product delete)
//!                    UNIQUE (rental_id, product_id)
//! ```
//!
//! Payments are stored as given. Linking a product to a rental does not move
//! stock; Borrow/Return are separate calls on the product.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use stockroom_core::{
    Amount, NewPayment, NewRental, NewRentalProduct, Payment, Rental, RentalProduct,
    ValidationError,
};

use crate::error::{DbError, DbResult};
use crate::repository::{delete_by_id, ensure_exists, generate_id};

/// Message shown when a product is linked to the same rental twice.
pub const DUPLICATE_LINK_MESSAGE: &str = "This product is already linked to the rental.";

// =============================================================================
// Rentals
// =============================================================================

#[derive(Debug, FromRow)]
struct RentalRow {
    id: String,
    loaned_on: NaiveDate,
    returned_on: Option<NaiveDate>,
    user_id: String,
    created_at: DateTime<Utc>,
}

impl From<RentalRow> for Rental {
    fn from(row: RentalRow) -> Self {
        Rental {
            id: row.id,
            loaned_on: row.loaned_on,
            returned_on: row.returned_on,
            user_id: row.user_id,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RentalRepository {
    pool: SqlitePool,
}

impl RentalRepository {
    pub fn new(pool: SqlitePool) -> Self {
        RentalRepository { pool }
    }

    pub async fn create(&self, input: &NewRental) -> DbResult<Rental> {
        let rental = Rental {
            id: generate_id(),
            loaned_on: input.loaned_on,
            returned_on: input.returned_on,
            user_id: input.user_id.clone(),
            created_at: Utc::now(),
        };
        debug!(id = %rental.id, user_id = %rental.user_id, "Inserting rental");

        sqlx::query(
            r#"
            INSERT INTO rentals (id, loaned_on, returned_on, user_id, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&rental.id)
        .bind(rental.loaned_on)
        .bind(rental.returned_on)
        .bind(&rental.user_id)
        .bind(rental.created_at)
        .execute(&self.pool)
        .await?;

        Ok(rental)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Rental>> {
        let row: Option<RentalRow> = sqlx::query_as(
            "SELECT id, loaned_on, returned_on, user_id, created_at FROM rentals WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Rental::from))
    }

    /// Lists rentals, most recent loan first.
    pub async fn list(&self) -> DbResult<Vec<Rental>> {
        let rows: Vec<RentalRow> = sqlx::query_as(
            r#"
            SELECT id, loaned_on, returned_on, user_id, created_at
            FROM rentals
            ORDER BY loaned_on DESC, created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Rental::from).collect())
    }

    pub async fn update(&self, id: &str, input: &NewRental) -> DbResult<Rental> {
        let result = sqlx::query(
            "UPDATE rentals SET loaned_on = ?2, returned_on = ?3, user_id = ?4 WHERE id = ?1",
        )
        .bind(id)
        .bind(input.loaned_on)
        .bind(input.returned_on)
        .bind(&input.user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Rental", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Rental", id))
    }

    /// Deletes a rental with its payments and product links.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting rental");
        delete_by_id(&self.pool, "rentals", "Rental", id).await
    }
}

// =============================================================================
// Payments
// =============================================================================

const PAYMENT_COLUMNS: &str = "id, total, discount, amount_paid, billed_on, due_on, \
                               payment_type_id, payment_state_id, rental_id";

#[derive(Debug, FromRow)]
struct PaymentRow {
    id: String,
    total: String,
    discount: Option<String>,
    amount_paid: Option<String>,
    billed_on: Option<NaiveDate>,
    due_on: Option<NaiveDate>,
    payment_type_id: String,
    payment_state_id: String,
    rental_id: String,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = DbError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        let amount = |raw: &str| -> DbResult<Amount> {
            raw.parse()
                .map_err(|e: ValidationError| DbError::corrupt("Payment", &row.id, e.to_string()))
        };

        let total = amount(&row.total)?;
        let discount = row.discount.as_deref().map(amount).transpose()?;
        let amount_paid = row.amount_paid.as_deref().map(amount).transpose()?;

        Ok(Payment {
            id: row.id,
            total,
            discount,
            amount_paid,
            billed_on: row.billed_on,
            due_on: row.due_on,
            payment_type_id: row.payment_type_id,
            payment_state_id: row.payment_state_id,
            rental_id: row.rental_id,
        })
    }
}

#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: SqlitePool,
}

impl PaymentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PaymentRepository { pool }
    }

    /// Records a payment against a rental.
    ///
    /// ## Returns
    /// * `Err(DbError::Rejected)` - Unknown rental, payment type or state
    pub async fn create(&self, input: &NewPayment) -> DbResult<Payment> {
        let id = generate_id();
        debug!(id = %id, rental_id = %input.rental_id, total = %input.total, "Inserting payment");

        let mut tx = self.pool.begin().await?;
        ensure_exists(&mut tx, "payment_types", "payment_type_id", &input.payment_type_id).await?;
        ensure_exists(&mut tx, "payment_states", "payment_state_id", &input.payment_state_id)
            .await?;
        ensure_exists(&mut tx, "rentals", "rental_id", &input.rental_id).await?;

        let sql = format!(
            "INSERT INTO payments ({PAYMENT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
        );
        sqlx::query(&sql)
            .bind(&id)
            .bind(input.total.to_string())
            .bind(input.discount.map(|a| a.to_string()))
            .bind(input.amount_paid.map(|a| a.to_string()))
            .bind(input.billed_on)
            .bind(input.due_on)
            .bind(&input.payment_type_id)
            .bind(&input.payment_state_id)
            .bind(&input.rental_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(Payment {
            id,
            total: input.total,
            discount: input.discount,
            amount_paid: input.amount_paid,
            billed_on: input.billed_on,
            due_on: input.due_on,
            payment_type_id: input.payment_type_id.clone(),
            payment_state_id: input.payment_state_id.clone(),
            rental_id: input.rental_id.clone(),
        })
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Payment>> {
        let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = ?1");
        let row: Option<PaymentRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Payment::try_from).transpose()
    }

    pub async fn list(&self) -> DbResult<Vec<Payment>> {
        let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments ORDER BY billed_on, id");
        let rows: Vec<PaymentRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;

        rows.into_iter().map(Payment::try_from).collect()
    }

    /// Lists the payments of one rental.
    pub async fn list_for_rental(&self, rental_id: &str) -> DbResult<Vec<Payment>> {
        let sql = format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE rental_id = ?1 ORDER BY billed_on, id"
        );
        let rows: Vec<PaymentRow> = sqlx::query_as(&sql)
            .bind(rental_id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Payment::try_from).collect()
    }

    pub async fn update(&self, id: &str, input: &NewPayment) -> DbResult<Payment> {
        let mut tx = self.pool.begin().await?;
        ensure_exists(&mut tx, "payment_types", "payment_type_id", &input.payment_type_id).await?;
        ensure_exists(&mut tx, "payment_states", "payment_state_id", &input.payment_state_id)
            .await?;
        ensure_exists(&mut tx, "rentals", "rental_id", &input.rental_id).await?;

        let result = sqlx::query(
            r#"
            UPDATE payments SET
                total = ?2,
                discount = ?3,
                amount_paid = ?4,
                billed_on = ?5,
                due_on = ?6,
                payment_type_id = ?7,
                payment_state_id = ?8,
                rental_id = ?9
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(input.total.to_string())
        .bind(input.discount.map(|a| a.to_string()))
        .bind(input.amount_paid.map(|a| a.to_string()))
        .bind(input.billed_on)
        .bind(input.due_on)
        .bind(&input.payment_type_id)
        .bind(&input.payment_state_id)
        .bind(&input.rental_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Payment", id));
        }
        tx.commit().await?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Payment", id))
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        delete_by_id(&self.pool, "payments", "Payment", id).await
    }
}

// =============================================================================
// Rental / Product links
// =============================================================================

const LINK_SELECT: &str = r#"
    SELECT
        rp.id,
        rp.rental_id,
        rp.product_id,
        p.name AS product_name,
        c.name AS category_name,
        b.name AS brand_name,
        l.name AS loan_type_name
    FROM rental_products rp
    INNER JOIN products p ON p.id = rp.product_id
    INNER JOIN categories c ON c.id = p.category_id
    INNER JOIN brands b ON b.id = p.brand_id
    INNER JOIN loan_types l ON l.id = p.loan_type_id
"#;

#[derive(Debug, FromRow)]
struct RentalProductRow {
    id: String,
    rental_id: String,
    product_id: String,
    product_name: String,
    category_name: String,
    brand_name: String,
    loan_type_name: String,
}

impl From<RentalProductRow> for RentalProduct {
    fn from(row: RentalProductRow) -> Self {
        RentalProduct {
            id: row.id,
            rental_id: row.rental_id,
            product_id: row.product_id,
            product_name: row.product_name,
            category_name: row.category_name,
            brand_name: row.brand_name,
            loan_type_name: row.loan_type_name,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RentalProductRepository {
    pool: SqlitePool,
}

impl RentalProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        RentalProductRepository { pool }
    }

    /// Links a product to a rental.
    ///
    /// ## Returns
    /// * `Ok(RentalProduct)` - The link with the product's catalog names
    /// * `Err(DbError::Rejected(Duplicate))` - The pair is already linked
    /// * `Err(DbError::Rejected(UnknownReference))` - No such rental or product
    pub async fn create(&self, input: &NewRentalProduct) -> DbResult<RentalProduct> {
        let id = generate_id();
        debug!(rental_id = %input.rental_id, product_id = %input.product_id, "Linking product");

        let mut tx = self.pool.begin().await?;
        ensure_exists(&mut tx, "rentals", "rental_id", &input.rental_id).await?;
        ensure_exists(&mut tx, "products", "product_id", &input.product_id).await?;

        let inserted = sqlx::query(
            "INSERT INTO rental_products (id, rental_id, product_id) VALUES (?1, ?2, ?3)",
        )
        .bind(&id)
        .bind(&input.rental_id)
        .bind(&input.product_id)
        .execute(&mut *tx)
        .await;

        inserted.map_err(duplicate_link)?;

        let sql = format!("{LINK_SELECT} WHERE rp.id = ?1");
        let row: RentalProductRow = sqlx::query_as(&sql).bind(&id).fetch_one(&mut *tx).await?;
        tx.commit().await?;

        Ok(row.into())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<RentalProduct>> {
        let sql = format!("{LINK_SELECT} WHERE rp.id = ?1");
        let row: Option<RentalProductRow> =
            sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?;

        Ok(row.map(RentalProduct::from))
    }

    /// Points an existing link at another rental or product.
    ///
    /// Same rules as [`create`](Self::create); `NotFound` when the link is gone.
    pub async fn update(&self, id: &str, input: &NewRentalProduct) -> DbResult<RentalProduct> {
        debug!(id = %id, rental_id = %input.rental_id, product_id = %input.product_id, "Updating link");

        let mut tx = self.pool.begin().await?;
        ensure_exists(&mut tx, "rentals", "rental_id", &input.rental_id).await?;
        ensure_exists(&mut tx, "products", "product_id", &input.product_id).await?;

        let result = sqlx::query(
            "UPDATE rental_products SET rental_id = ?2, product_id = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(&input.rental_id)
        .bind(&input.product_id)
        .execute(&mut *tx)
        .await
        .map_err(duplicate_link)?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("RentalProduct", id));
        }

        let sql = format!("{LINK_SELECT} WHERE rp.id = ?1");
        let row: RentalProductRow = sqlx::query_as(&sql).bind(id).fetch_one(&mut *tx).await?;
        tx.commit().await?;

        Ok(row.into())
    }

    pub async fn list(&self) -> DbResult<Vec<RentalProduct>> {
        let sql = format!("{LINK_SELECT} ORDER BY rp.rental_id, p.name");
        let rows: Vec<RentalProductRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;

        Ok(rows.into_iter().map(RentalProduct::from).collect())
    }

    /// Lists the products linked to one rental.
    pub async fn list_for_rental(&self, rental_id: &str) -> DbResult<Vec<RentalProduct>> {
        let sql = format!("{LINK_SELECT} WHERE rp.rental_id = ?1 ORDER BY p.name");
        let rows: Vec<RentalProductRow> = sqlx::query_as(&sql)
            .bind(rental_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(RentalProduct::from).collect())
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        delete_by_id(&self.pool, "rental_products", "RentalProduct", id).await
    }
}

/// A second link for the same pair is a client error, not a constraint failure.
fn duplicate_link(err: sqlx::Error) -> DbError {
    match DbError::from(err) {
        DbError::UniqueViolation { .. } => ValidationError::Duplicate {
            field: "product_id".to_string(),
            message: DUPLICATE_LINK_MESSAGE.to_string(),
        }
        .into(),
        other => other,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Database;
    use crate::repository::test_support::{product, refs, test_db};
    use stockroom_core::{CoreError, NewNamed};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, d).unwrap()
    }

    async fn rental(db: &Database) -> Rental {
        db.rentals()
            .create(&NewRental {
                loaned_on: day(1),
                returned_on: None,
                user_id: "user-1".to_string(),
            })
            .await
            .unwrap()
    }

    async fn payment_input(db: &Database, rental_id: &str) -> NewPayment {
        let named = |n: &str| NewNamed {
            name: n.to_string(),
        };
        let kind = db.payment_types().create(&named("Cash")).await.unwrap();
        let state = db.payment_states().create(&named("Paid")).await.unwrap();
        NewPayment {
            total: Amount::parse(Some("120"), "total").unwrap(),
            discount: None,
            amount_paid: Some(Amount::parse(Some("60.5"), "amount_paid").unwrap()),
            billed_on: Some(day(2)),
            due_on: Some(day(30)),
            payment_type_id: kind.id,
            payment_state_id: state.id,
            rental_id: rental_id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_rental_crud() {
        let db = test_db().await;
        let r = rental(&db).await;

        let fetched = db.rentals().get_by_id(&r.id).await.unwrap().unwrap();
        assert_eq!(fetched, r);

        let updated = db
            .rentals()
            .update(
                &r.id,
                &NewRental {
                    loaned_on: day(1),
                    returned_on: Some(day(9)),
                    user_id: "user-1".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.returned_on, Some(day(9)));
        assert_eq!(db.rentals().list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_payment_roundtrip_and_cascade() {
        let db = test_db().await;
        let r = rental(&db).await;
        let input = payment_input(&db, &r.id).await;

        let created = db.payments().create(&input).await.unwrap();
        let fetched = db.payments().get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.amount_paid.unwrap().to_string(), "60.50");
        assert_eq!(db.payments().list_for_rental(&r.id).await.unwrap().len(), 1);

        // Payment type is protected while referenced.
        assert!(matches!(
            db.payment_types().delete(&input.payment_type_id).await,
            Err(DbError::ForeignKeyViolation { .. })
        ));

        db.rentals().delete(&r.id).await.unwrap();
        assert!(db.payments().get_by_id(&created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_payment_unknown_rental() {
        let db = test_db().await;
        let mut input = payment_input(&db, "").await;
        input.rental_id = uuid::Uuid::new_v4().to_string();

        let err = db.payments().create(&input).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Rejected(CoreError::Validation(ValidationError::UnknownReference { .. }))
        ));
    }

    #[tokio::test]
    async fn test_link_product_once() {
        let db = test_db().await;
        let refs = refs(&db).await;
        let p = product(&db, &refs, 2, 0).await;
        let r = rental(&db).await;
        let link = NewRentalProduct {
            rental_id: r.id.clone(),
            product_id: p.id.clone(),
        };

        let created = db.rental_products().create(&link).await.unwrap();
        assert_eq!(created.product_name, "Speaker");
        assert_eq!(created.brand_name, "Acme");

        let err = db.rental_products().create(&link).await.unwrap_err();
        assert_eq!(err.to_string(), "Validation error: This product is already linked to the rental.");

        let listed = db.rental_products().list_for_rental(&r.id).await.unwrap();
        assert_eq!(listed, vec![created]);
    }

    #[tokio::test]
    async fn test_link_get_and_update() {
        let db = test_db().await;
        let refs = refs(&db).await;
        let p = product(&db, &refs, 2, 0).await;
        let first = rental(&db).await;
        let second = rental(&db).await;
        let link = |rental_id: &str| NewRentalProduct {
            rental_id: rental_id.to_string(),
            product_id: p.id.clone(),
        };

        let created = db.rental_products().create(&link(&first.id)).await.unwrap();
        let fetched = db.rental_products().get_by_id(&created.id).await.unwrap();
        assert_eq!(fetched, Some(created.clone()));

        let moved = db
            .rental_products()
            .update(&created.id, &link(&second.id))
            .await
            .unwrap();
        assert_eq!(moved.id, created.id);
        assert_eq!(moved.rental_id, second.id);
        assert_eq!(moved.product_name, "Speaker");

        // Moving a second link onto an existing pair is a duplicate.
        let other = db.rental_products().create(&link(&first.id)).await.unwrap();
        let err = db
            .rental_products()
            .update(&other.id, &link(&second.id))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Rejected(CoreError::Validation(ValidationError::Duplicate { .. }))
        ));

        let missing = uuid::Uuid::new_v4().to_string();
        assert!(matches!(
            db.rental_products().update(&missing, &link(&first.id)).await,
            Err(DbError::NotFound { .. })
        ));
        assert!(db.rental_products().get_by_id(&missing).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_product_delete_removes_links() {
        let db = test_db().await;
        let refs = refs(&db).await;
        let p = product(&db, &refs, 2, 0).await;
        let r = rental(&db).await;
        db.rental_products()
            .create(&NewRentalProduct {
                rental_id: r.id.clone(),
                product_id: p.id.clone(),
            })
            .await
            .unwrap();

        db.products().delete(&p.id).await.unwrap();
        assert!(db.rental_products().list().await.unwrap().is_empty());
    }
}
