//! Stock ledger - The per-product available quantity.
//!
//! Checkout is the only caller that takes stock away, and it does so through [`decrement`],
//! a single conditional `UPDATE` that cannot drive the quantity below zero no matter how
//! many checkouts race on the same product.

use crate::{
    entities::{Product, product},
    errors::{Error, Result},
};
use sea_orm::{prelude::*, sea_query::Expr};
use tracing::{debug, instrument, warn};

/// Current stock of a product.
///
/// # Errors
/// Returns [`Error::ProductNotFound`] if the product does not exist, or a database error.
pub async fn available<C>(db: &C, product_id: i64) -> Result<i32>
where
    C: ConnectionTrait,
{
    Product::find_by_id(product_id)
        .one(db)
        .await?
        .map(|p| p.stock_quantity)
        .ok_or_else(|| Error::ProductNotFound {
            name: product_id.to_string(),
        })
}

/// Takes `amount` units of a product out of stock.
///
/// Executes `UPDATE products SET stock_quantity = stock_quantity - amount
/// WHERE id = ? AND stock_quantity >= amount`. When no row matches, either the product is
/// gone or another checkout got there first; both are reported as [`Error::StockConflict`]
/// and nothing is written.
///
/// # Arguments
/// * `db` - Database connection or transaction
/// * `product_id` - Product to decrement
/// * `amount` - Units to remove, must be positive
#[instrument(skip(db))]
pub async fn decrement<C>(db: &C, product_id: i64, amount: i32) -> Result<()>
where
    C: ConnectionTrait,
{
    if amount <= 0 {
        return Err(Error::InvalidQuantity {
            quantity: amount.into(),
        });
    }

    let result = Product::update_many()
        .col_expr(
            product::Column::StockQuantity,
            Expr::col(product::Column::StockQuantity).sub(amount),
        )
        .filter(product::Column::Id.eq(product_id))
        .filter(product::Column::StockQuantity.gte(amount))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        warn!(product_id, amount, "conditional stock decrement matched no row");
        return Err(Error::StockConflict { product_id });
    }

    debug!(product_id, amount, "stock decremented");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_decrement_rejects_non_positive_amount() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = decrement(&db, 1, 0).await;
        assert!(matches!(result, Err(Error::InvalidQuantity { quantity: 0 })));

        let result = decrement(&db, 1, -3).await;
        assert!(matches!(result, Err(Error::InvalidQuantity { quantity: -3 })));

        assert!(db.into_transaction_log().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_decrement_reduces_stock() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_custom_product(&db, "111111", "Cola", 150, 10).await?;

        decrement(&db, product.id, 4).await?;
        assert_eq!(available(&db, product.id).await?, 6);

        // Draining to exactly zero is allowed
        decrement(&db, product.id, 6).await?;
        assert_eq!(available(&db, product.id).await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_decrement_never_goes_negative() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_custom_product(&db, "222222", "Water", 50, 3).await?;

        let result = decrement(&db, product.id, 4).await;
        assert!(matches!(
            result,
            Err(Error::StockConflict { product_id }) if product_id == product.id
        ));
        assert_eq!(available(&db, product.id).await?, 3);

        Ok(())
    }

    #[tokio::test]
    async fn test_decrement_missing_product() -> Result<()> {
        let db = setup_test_db().await?;

        let result = decrement(&db, 404, 1).await;
        assert!(matches!(result, Err(Error::StockConflict { product_id: 404 })));

        let result = available(&db, 404).await;
        assert!(matches!(result, Err(Error::ProductNotFound { .. })));

        Ok(())
    }
}
