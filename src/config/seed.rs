//! Seed data loading from config.toml
//!
//! The seed file lists the users and products a fresh till starts with. Seeding runs on
//! every startup and only inserts what is missing: users are matched by username and
//! products by barcode, so existing rows (and their current stock) are never touched.

use crate::{
    core::{
        money::Money,
        product::{self, NewProduct},
        user::{self, NewUser},
    },
    entities::Role,
    errors::{Error, Result},
};
use sea_orm::{DatabaseConnection, TransactionTrait};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info, warn};

/// Default seed file location, overridden by `POS_SEED_FILE`.
pub const DEFAULT_SEED_FILE: &str = "config.toml";

/// The whole seed file.
#[derive(Debug, Default, Deserialize)]
pub struct SeedConfig {
    /// Users to create
    #[serde(default)]
    pub users: Vec<SeedUser>,
    /// Catalog entries to create
    #[serde(default)]
    pub products: Vec<SeedProduct>,
}

/// One `[[users]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedUser {
    /// Login name
    pub username: String,
    /// Display name
    #[serde(default)]
    pub full_name: Option<String>,
    /// Defaults to cashier
    #[serde(default)]
    pub role: Option<Role>,
}

/// One `[[products]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedProduct {
    /// Unique barcode
    pub barcode: String,
    /// Display name
    pub name: String,
    /// Unit price, e.g. `"1.50"`
    pub price: Money,
    /// Initial stock
    pub stock_quantity: i32,
}

/// Counts of rows inserted by [`apply_seed`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    /// Users created
    pub users_created: usize,
    /// Products created
    pub products_created: usize,
}

/// Parses seed data from a TOML file.
///
/// # Errors
/// Returns [`Error::Config`] if the file cannot be read or the TOML is invalid.
pub fn load_seed_config<P: AsRef<Path>>(path: P) -> Result<SeedConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!(
            "Failed to read seed file {}: {e}",
            path.as_ref().display()
        ),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse seed file: {e}"),
    })
}

/// Seed file path from `POS_SEED_FILE` or [`DEFAULT_SEED_FILE`].
#[must_use]
pub fn seed_file_path() -> String {
    std::env::var("POS_SEED_FILE").unwrap_or_else(|_| DEFAULT_SEED_FILE.to_string())
}

/// Inserts every seed user and product that does not exist yet, in one transaction.
///
/// A seed admin is skipped with a warning when another administrator already exists.
pub async fn apply_seed(db: &DatabaseConnection, config: &SeedConfig) -> Result<SeedReport> {
    info!(
        users = config.users.len(),
        products = config.products.len(),
        "applying seed data"
    );
    let txn = db.begin().await?;
    let mut report = SeedReport::default();

    for seed_user in &config.users {
        if user::get_user_by_username(&txn, &seed_user.username)
            .await?
            .is_some()
        {
            debug!(username = %seed_user.username, "seed user already present");
            continue;
        }

        let new_user = NewUser {
            username: seed_user.username.clone(),
            full_name: seed_user.full_name.clone(),
            role: seed_user.role,
        };
        match user::create_user(&txn, new_user).await {
            Ok(_) => report.users_created += 1,
            Err(Error::Forbidden { message }) => {
                warn!(username = %seed_user.username, %message, "skipping seed user");
            }
            Err(e) => return Err(e),
        }
    }

    for seed_product in &config.products {
        if product::get_product_by_barcode(&txn, &seed_product.barcode)
            .await?
            .is_some()
        {
            debug!(barcode = %seed_product.barcode, "seed product already present");
            continue;
        }

        product::create_product(
            &txn,
            NewProduct {
                barcode: seed_product.barcode.clone(),
                name: seed_product.name.clone(),
                price: seed_product.price,
                stock_quantity: seed_product.stock_quantity,
                category_id: None,
                subcategory_id: None,
            },
        )
        .await?;
        report.products_created += 1;
    }

    txn.commit().await?;
    info!(
        users_created = report.users_created,
        products_created = report.products_created,
        "seed data applied"
    );
    Ok(report)
}
