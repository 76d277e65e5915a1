//! # Seed Data Generator
//!
//! Populates the database with a small demo catalog for development.
//!
//! ## Usage
//! ```bash
//! cargo run -p stockroom-db --bin seed
//!
//! # Specify database path
//! cargo run -p stockroom-db --bin seed -- --db ./data/stockroom.db
//! ```
//!
//! ## Generated Data
//! - Categories, brands and loan types
//! - Payment types/states and maintenance types
//! - One product per catalog entry below, with quantities run through the
//!   same normalization as the HTTP API (some with units already on loan)

use std::env;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use stockroom_core::input::{LoanTypeInput, NamedInput, ProductInput};
use stockroom_core::RawValue;
use stockroom_db::{migrations, Database, DbConfig};

/// (name, model, unit value, category, brand, available, loaned)
const PRODUCTS: &[(&str, &str, &str, &str, &str, i64, i64)] = &[
    ("Portable Speaker", "SP-200", "49.90", "Audio", "Acme", 8, 2),
    ("Wireless Microphone", "WM-10", "89.00", "Audio", "Sonora", 4, 0),
    ("Mixing Console", "MX-12", "420.00", "Audio", "Sonora", 1, 1),
    ("Projector", "PJ-1080", "650.00", "Video", "Lumen", 3, 0),
    ("Projection Screen", "SC-100", "120.50", "Video", "Lumen", 0, 2),
    ("LED Par Light", "LP-36", "35.00", "Lighting", "Acme", 24, 6),
    ("Folding Table", "FT-180", "25.00", "Furniture", "Basis", 40, 0),
    ("Stackable Chair", "SC-01", "8.75", "Furniture", "Basis", 150, 50),
];

const LOAN_TYPES: &[(&str, &str)] = &[("Daily", "daily"), ("Weekly", "weekly")];
const PAYMENT_TYPES: &[&str] = &["Cash", "Card", "Transfer"];
const PAYMENT_STATES: &[&str] = &["Pending", "Partial", "Paid"];
const MAINTENANCE_TYPES: &[&str] = &["Cleaning", "Repair", "Inspection"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let mut db_path =
        env::var("DATABASE_PATH").unwrap_or_else(|_| String::from("./stockroom.db"));

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Stockroom Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: $DATABASE_PATH or ./stockroom.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let db = Database::new(DbConfig::new(&db_path))
        .await
        .with_context(|| format!("opening {db_path}"))?;
    let (total, applied) = migrations::migration_status(db.pool()).await?;
    info!(path = %db_path, applied, total, "Connected, migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        warn!(existing, "Database already has products, skipping seed");
        return Ok(());
    }

    let named = |name: &str| {
        NamedInput {
            name: Some(name.to_string()),
        }
        .validate()
    };

    for name in PAYMENT_TYPES.iter().copied() {
        db.payment_types().create(&named(name)?).await?;
    }
    for name in PAYMENT_STATES.iter().copied() {
        db.payment_states().create(&named(name)?).await?;
    }
    for name in MAINTENANCE_TYPES.iter().copied() {
        db.maintenance_types().create(&named(name)?).await?;
    }

    let mut loan_type_ids = Vec::new();
    for (name, kind) in LOAN_TYPES {
        let input = LoanTypeInput {
            name: Some(name.to_string()),
            kind: Some(kind.to_string()),
        };
        loan_type_ids.push(db.loan_types().create(&input.validate()?).await?.id);
    }

    let mut categories: Vec<(String, String)> = Vec::new();
    let mut brands: Vec<(String, String)> = Vec::new();
    let mut created = 0;

    for (idx, (name, model, value, category, brand, available, loaned)) in
        PRODUCTS.iter().enumerate()
    {
        let category_id = match categories.iter().find(|(n, _)| n == category) {
            Some((_, id)) => id.clone(),
            None => {
                let id = db.categories().create(&named(*category)?).await?.id;
                categories.push((category.to_string(), id.clone()));
                id
            }
        };
        let brand_id = match brands.iter().find(|(n, _)| n == brand) {
            Some((_, id)) => id.clone(),
            None => {
                let id = db.brands().create(&named(*brand)?).await?.id;
                brands.push((brand.to_string(), id.clone()));
                id
            }
        };

        let input = ProductInput {
            name: Some(name.to_string()),
            model: Some(model.to_string()),
            unit_value: Some(RawValue::from(*value)),
            quantity_available: Some(RawValue::from(*available)),
            quantity_loaned: Some(RawValue::from(*loaned)),
            category_id: Some(category_id),
            brand_id: Some(brand_id),
            loan_type_id: Some(loan_type_ids[idx % loan_type_ids.len()].clone()),
            ..Default::default()
        };

        let product = db.products().create(&input.validate()?).await?;
        info!(
            name = %product.name,
            available = product.quantity_available,
            loaned = product.quantity_loaned,
            status = ?product.status,
            "Seeded product"
        );
        created += 1;
    }

    info!(
        products = created,
        categories = categories.len(),
        brands = brands.len(),
        "Seed complete"
    );

    db.close().await;
    Ok(())
}
