//! Product business logic - Catalog operations the till depends on.
//!
//! This module provides functions for creating, retrieving, updating, and deleting products.
//! Products are looked up by id when added to a cart and by barcode when scanned. Stock is
//! set here as an absolute value; checkout only ever decrements it through [`super::stock`].
//! All functions are async and return Result types for proper error handling throughout the system.

use crate::{
    core::money::Money,
    entities::{CartItem, Product, SaleItem, cart_item, product, sale_item},
    errors::{Error, Result},
};
use sea_orm::{PaginatorTrait, QueryOrder, Set, prelude::*};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;

/// Product as presented to API clients, with the price as a decimal amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    /// Product id
    pub id: i64,
    /// Unique barcode
    pub barcode: String,
    /// Display name
    pub name: String,
    /// Current unit price
    pub price: Money,
    /// Units in stock
    pub stock_quantity: i32,
    /// Optional category reference
    pub category_id: Option<i64>,
    /// Optional subcategory reference
    pub subcategory_id: Option<i64>,
}

impl From<&product::Model> for ProductSummary {
    fn from(model: &product::Model) -> Self {
        Self {
            id: model.id,
            barcode: model.barcode.clone(),
            name: model.name.clone(),
            price: Money::from_cents(model.price_cents),
            stock_quantity: model.stock_quantity,
            category_id: model.category_id,
            subcategory_id: model.subcategory_id,
        }
    }
}

/// Arguments for [`create_product`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    /// Unique barcode
    pub barcode: String,
    /// Display name
    pub name: String,
    /// Unit price
    pub price: Money,
    /// Initial stock
    pub stock_quantity: i32,
    /// Optional category reference
    #[serde(default)]
    pub category_id: Option<i64>,
    /// Optional subcategory reference
    #[serde(default)]
    pub subcategory_id: Option<i64>,
}

/// Arguments for [`update_product`]; absent fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductChanges {
    /// New display name
    #[serde(default)]
    pub name: Option<String>,
    /// New unit price
    #[serde(default)]
    pub price: Option<Money>,
    /// New absolute stock level
    #[serde(default)]
    pub stock_quantity: Option<i32>,
    /// New category reference; `Some(None)` (JSON `null`) clears it
    #[serde(default, deserialize_with = "present")]
    pub category_id: Option<Option<i64>>,
    /// New subcategory reference; `Some(None)` (JSON `null`) clears it
    #[serde(default, deserialize_with = "present")]
    pub subcategory_id: Option<Option<i64>>,
}

/// Marks a field as present, so an explicit `null` is told apart from an absent field.
fn present<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn validate_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation {
            message: "Product name cannot be empty".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

fn validate_stock(stock_quantity: i32) -> Result<i32> {
    if stock_quantity < 0 {
        return Err(Error::InvalidQuantity {
            quantity: stock_quantity.into(),
        });
    }
    Ok(stock_quantity)
}

/// Retrieves all products, ordered alphabetically by name.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_all_products<C>(db: &C) -> Result<Vec<product::Model>>
where
    C: ConnectionTrait,
{
    Product::find()
        .order_by_asc(product::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds the product printed with `barcode`, returning None if it is not in the catalog.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_product_by_barcode<C>(db: &C, barcode: &str) -> Result<Option<product::Model>>
where
    C: ConnectionTrait,
{
    Product::find()
        .filter(product::Column::Barcode.eq(barcode))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a specific product by its unique ID.
///
/// # Errors
/// Returns [`Error::ProductNotFound`] if the product does not exist, or a database error.
pub async fn get_product_by_id<C>(db: &C, product_id: i64) -> Result<product::Model>
where
    C: ConnectionTrait,
{
    Product::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::ProductNotFound {
            name: product_id.to_string(),
        })
}

/// Creates a new product with the specified parameters, performing input validation.
///
/// The name is trimmed and the barcode must not already be in use.
///
/// # Errors
/// Returns an error if:
/// - The name or barcode is empty, or the barcode is taken ([`Error::Validation`])
/// - The stock quantity is negative ([`Error::InvalidQuantity`])
/// - The database insert operation fails
pub async fn create_product<C>(db: &C, new_product: NewProduct) -> Result<product::Model>
where
    C: ConnectionTrait,
{
    let name = validate_name(&new_product.name)?;
    let stock_quantity = validate_stock(new_product.stock_quantity)?;
    let barcode = new_product.barcode.trim().to_string();
    if barcode.is_empty() {
        return Err(Error::Validation {
            message: "Barcode cannot be empty".to_string(),
        });
    }

    if get_product_by_barcode(db, &barcode).await?.is_some() {
        return Err(Error::Validation {
            message: "Product with this barcode already exists".to_string(),
        });
    }

    let now = chrono::Utc::now();
    let product = product::ActiveModel {
        barcode: Set(barcode),
        name: Set(name),
        price_cents: Set(new_product.price.cents()),
        stock_quantity: Set(stock_quantity),
        category_id: Set(new_product.category_id),
        subcategory_id: Set(new_product.subcategory_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(product_id = product.id, barcode = %product.barcode, "product created");
    Ok(product)
}

/// Applies `changes` to an existing product and refreshes its updated timestamp.
///
/// Price changes only affect carts mutated afterwards and never completed sales.
///
/// # Errors
/// Returns an error if:
/// - The product does not exist
/// - The new name is empty or the new stock is negative
/// - The database update operation fails
pub async fn update_product<C>(
    db: &C,
    product_id: i64,
    changes: ProductChanges,
) -> Result<product::Model>
where
    C: ConnectionTrait,
{
    let mut product: product::ActiveModel = get_product_by_id(db, product_id).await?.into();

    if let Some(name) = changes.name {
        product.name = Set(validate_name(&name)?);
    }
    if let Some(price) = changes.price {
        product.price_cents = Set(price.cents());
    }
    if let Some(stock_quantity) = changes.stock_quantity {
        product.stock_quantity = Set(validate_stock(stock_quantity)?);
    }
    if let Some(category_id) = changes.category_id {
        product.category_id = Set(category_id);
    }
    if let Some(subcategory_id) = changes.subcategory_id {
        product.subcategory_id = Set(subcategory_id);
    }
    product.updated_at = Set(chrono::Utc::now());

    product.update(db).await.map_err(Into::into)
}

/// Deletes a product that no cart line or sale line refers to.
///
/// # Errors
/// Returns an error if:
/// - The product does not exist
/// - The product is still referenced by a cart or a recorded sale ([`Error::Validation`])
/// - The database delete operation fails
pub async fn delete_product<C>(db: &C, product_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    let product = get_product_by_id(db, product_id).await?;

    let in_carts = CartItem::find()
        .filter(cart_item::Column::ProductId.eq(product_id))
        .count(db)
        .await?;
    let in_sales = SaleItem::find()
        .filter(sale_item::Column::ProductId.eq(product_id))
        .count(db)
        .await?;
    if in_carts > 0 || in_sales > 0 {
        return Err(Error::Validation {
            message: format!(
                "Product '{}' is referenced by carts or recorded sales",
                product.name
            ),
        });
    }

    product.delete(db).await?;
    info!(product_id, "product deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn new_product(barcode: &str, name: &str, cents: i64, stock: i32) -> NewProduct {
        NewProduct {
            barcode: barcode.to_string(),
            name: name.to_string(),
            price: Money::from_cents(cents),
            stock_quantity: stock,
            category_id: None,
            subcategory_id: None,
        }
    }

    #[tokio::test]
    async fn test_create_product_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        // Test empty name validation
        let result = create_product(&db, new_product("1", "  ", 100, 1)).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        // Test negative stock validation
        let result = create_product(&db, new_product("1", "Cola", 100, -1)).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidQuantity { quantity: -1 }
        ));

        // Test empty barcode validation
        let result = create_product(&db, new_product(" ", "Cola", 100, 1)).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_product_integration() -> Result<()> {
        let db = setup_test_db().await?;

        let product = create_product(&db, new_product("111111", " Cola 330ml ", 150, 100)).await?;
        assert_eq!(product.name, "Cola 330ml");
        assert_eq!(product.price_cents, 150);
        assert_eq!(product.stock_quantity, 100);

        let by_barcode = get_product_by_barcode(&db, "111111").await?.unwrap();
        assert_eq!(by_barcode, product);
        assert!(get_product_by_barcode(&db, "999999").await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_barcode_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        create_product(&db, new_product("111111", "Cola", 150, 10)).await?;

        let result = create_product(&db, new_product("111111", "Other", 100, 1)).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_get_all_products_sorted_by_name() -> Result<()> {
        let db = setup_test_db().await?;
        create_product(&db, new_product("2", "Water", 50, 1)).await?;
        create_product(&db, new_product("1", "Chips", 200, 1)).await?;

        let names: Vec<String> = get_all_products(&db)
            .await?
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Chips".to_string(), "Water".to_string()]);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_product_partial() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_product(&db, new_product("1", "Cola", 150, 10)).await?;

        let updated = update_product(
            &db,
            product.id,
            ProductChanges {
                price: Some(Money::from_cents(175)),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(updated.price_cents, 175);
        assert_eq!(updated.name, "Cola");
        assert_eq!(updated.stock_quantity, 10);

        let result = update_product(
            &db,
            product.id,
            ProductChanges {
                stock_quantity: Some(-5),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::InvalidQuantity { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_update_product_clears_category() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_product(&db, new_product("1", "Cola", 150, 10)).await?;

        let set: ProductChanges =
            serde_json::from_value(serde_json::json!({ "categoryId": 4, "subcategoryId": 7 }))
                .unwrap();
        let updated = update_product(&db, product.id, set).await?;
        assert_eq!(updated.category_id, Some(4));
        assert_eq!(updated.subcategory_id, Some(7));

        // An absent field keeps its value, an explicit null clears it
        let clear: ProductChanges =
            serde_json::from_value(serde_json::json!({ "categoryId": null })).unwrap();
        assert_eq!(clear.category_id, Some(None));
        assert_eq!(clear.subcategory_id, None);
        let updated = update_product(&db, product.id, clear).await?;
        assert_eq!(updated.category_id, None);
        assert_eq!(updated.subcategory_id, Some(7));
        assert!(updated.updated_at >= product.created_at);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_missing_product() -> Result<()> {
        let db = setup_test_db().await?;

        let result = update_product(&db, 42, ProductChanges::default()).await;
        assert!(matches!(result.unwrap_err(), Error::ProductNotFound { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_product() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_product(&db, new_product("1", "Cola", 150, 10)).await?;

        delete_product(&db, product.id).await?;
        assert!(matches!(
            get_product_by_id(&db, product.id).await.unwrap_err(),
            Error::ProductNotFound { .. }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_product_in_cart_refused() -> Result<()> {
        let (db, user, product) = setup_with_product().await?;
        crate::core::cart::add_item(&db, user.id, product.id, 1).await?;

        let result = delete_product(&db, product.id).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));
        assert!(get_product_by_id(&db, product.id).await.is_ok());

        Ok(())
    }
}
