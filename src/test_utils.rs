//! Shared test utilities for the POS backend.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{
        money::Money,
        product::{self, NewProduct},
        user::{self, NewUser},
    },
    entities,
    errors::Result,
};
use sea_orm::{ConnectOptions, DatabaseConnection};
use std::path::Path;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates an on-disk `SQLite` database at `path` with a pool of several connections, for
/// tests that need transactions to run truly concurrently.
pub async fn setup_file_db(path: &Path) -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(format!("sqlite://{}?mode=rwc", path.display()));
    options.max_connections(4).sqlx_logging(false);
    let db = sea_orm::Database::connect(options).await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a cashier with the given username.
pub async fn create_test_user(
    db: &DatabaseConnection,
    username: &str,
) -> Result<entities::user::Model> {
    user::create_user(
        db,
        NewUser {
            username: username.to_string(),
            full_name: None,
            role: None,
        },
    )
    .await
}

/// Creates a product with custom barcode, name, price and stock.
pub async fn create_custom_product(
    db: &DatabaseConnection,
    barcode: &str,
    name: &str,
    price_cents: i64,
    stock_quantity: i32,
) -> Result<entities::product::Model> {
    product::create_product(
        db,
        NewProduct {
            barcode: barcode.to_string(),
            name: name.to_string(),
            price: Money::from_cents(price_cents),
            stock_quantity,
            category_id: None,
            subcategory_id: None,
        },
    )
    .await
}

/// Creates a test product with sensible defaults.
///
/// # Defaults
/// * `barcode`: `"111111"`
/// * `name`: `"Cola 330ml"`
/// * price: 1.50
/// * stock: 10
pub async fn create_test_product(db: &DatabaseConnection) -> Result<entities::product::Model> {
    create_custom_product(db, "111111", "Cola 330ml", 150, 10).await
}

/// Sets up a database with one cashier.
/// Returns (db, user) for cart and checkout scenarios.
pub async fn setup_with_user() -> Result<(DatabaseConnection, entities::user::Model)> {
    let db = setup_test_db().await?;
    let user = create_test_user(&db, "cashier").await?;
    Ok((db, user))
}

/// Sets up a complete test environment with a cashier and the default product.
/// Returns (db, user, product).
pub async fn setup_with_product() -> Result<(
    DatabaseConnection,
    entities::user::Model,
    entities::product::Model,
)> {
    let (db, user) = setup_with_user().await?;
    let product = create_test_product(&db).await?;
    Ok((db, user, product))
}
