//! Database configuration module for the POS backend.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity models with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust struct definitions without hand-written SQL.
//! Creation is guarded with `IF NOT EXISTS` and safe to run on every startup.

use crate::entities::{Cart, CartItem, Product, Sale, SaleItem, User};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use std::path::Path;
use tracing::{debug, info};

/// Default store used when `DATABASE_URL` is not set.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/pos.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable or returns the
/// default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Directory holding an on-disk `SQLite` file, if the URL names one.
fn sqlite_parent_dir(url: &str) -> Option<&Path> {
    let path = url.strip_prefix("sqlite://")?;
    let path = path.split('?').next()?;
    if path.is_empty() || path.starts_with(":memory:") {
        return None;
    }
    Path::new(path).parent().filter(|p| !p.as_os_str().is_empty())
}

/// Establishes a connection to the database named by `DATABASE_URL`.
///
/// For on-disk `SQLite` stores the parent directory is created first, since `SQLite` can
/// create the file but not the folder it lives in.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    if let Some(dir) = sqlite_parent_dir(&database_url) {
        std::fs::create_dir_all(dir)?;
    }

    let db = Database::connect(&database_url).await?;
    info!(url = %database_url, "connected to database");
    Ok(db)
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait + Copy,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    debug!(table = entity.table_name(), "table ready");
    Ok(())
}

/// Creates all tables the POS needs, parents before children so foreign keys resolve.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, User).await?;
    create_table(db, &schema, Product).await?;
    create_table(db, &schema, Cart).await?;
    create_table(db, &schema, CartItem).await?;
    create_table(db, &schema, Sale).await?;
    create_table(db, &schema, SaleItem).await?;

    Ok(())
}
