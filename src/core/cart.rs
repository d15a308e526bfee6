//! Cart business logic - The cart aggregator.
//!
//! Every user owns at most one cart, created lazily on first use. Each mutation runs in its
//! own database transaction, validates the requested quantity against the product's stock,
//! writes the affected line and then recomputes the cart total by re-summing every persisted
//! line subtotal, so the cached total can never drift from its lines.

use crate::{
    core::{money::Money, product::ProductSummary, user},
    entities::{Cart, CartItem, Product, cart, cart_item, product},
    errors::{Error, Result},
};
use sea_orm::{
    QueryOrder, Set, TransactionTrait,
    prelude::*,
    sea_query::{Expr, OnConflict},
};
use serde::Serialize;
use tracing::{debug, instrument};

/// A cart with its lines, as returned by every cart operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartDetails {
    /// Cart id
    pub id: i64,
    /// Owning user
    pub user_id: i64,
    /// Sum of the line subtotals
    pub total_amount: Money,
    /// Lines in insertion order
    pub items: Vec<CartLine>,
}

/// One line of a [`CartDetails`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Cart item id, used to update or remove the line
    pub id: i64,
    /// Product on this line
    pub product_id: i64,
    /// Units requested
    pub quantity: i32,
    /// Quantity times the price at the last mutation
    pub subtotal: Money,
    /// Current catalog view of the product
    pub product: ProductSummary,
}

/// Returns the user's cart, creating an empty one if the user has none yet.
///
/// Creation is an `INSERT .. ON CONFLICT (user_id) DO NOTHING` followed by a read, so two
/// concurrent first requests for the same user still end up sharing one cart.
///
/// # Errors
/// Returns [`Error::UserNotFound`] if the user does not exist, or a database error.
pub async fn get_or_create_cart<C>(db: &C, user_id: i64) -> Result<cart::Model>
where
    C: ConnectionTrait,
{
    if let Some(existing) = find_cart(db, user_id).await? {
        return Ok(existing);
    }

    user::get_user(db, user_id).await?;

    let empty = cart::ActiveModel {
        user_id: Set(user_id),
        total_cents: Set(0),
        updated_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    Cart::insert(empty)
        .on_conflict(
            OnConflict::column(cart::Column::UserId)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;
    debug!(user_id, "cart created");

    find_cart(db, user_id)
        .await?
        .ok_or_else(|| Error::Database(DbErr::RecordNotFound(format!("cart of user {user_id}"))))
}

/// The user's cart if one exists, without creating it.
pub async fn find_cart<C>(db: &C, user_id: i64) -> Result<Option<cart::Model>>
where
    C: ConnectionTrait,
{
    Cart::find()
        .filter(cart::Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Rewrites the user's cart row in place, taking the store's write lock for the rest of the
/// transaction. A no-op when the user has no cart.
pub async fn lock_cart<C>(db: &C, user_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    Cart::update_many()
        .col_expr(cart::Column::UpdatedAt, Expr::col(cart::Column::UpdatedAt).into())
        .filter(cart::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    Ok(())
}

/// Lines of a cart joined with their products, in insertion order.
pub async fn load_lines<C>(
    db: &C,
    cart_id: i64,
) -> Result<Vec<(cart_item::Model, Option<product::Model>)>>
where
    C: ConnectionTrait,
{
    CartItem::find()
        .filter(cart_item::Column::CartId.eq(cart_id))
        .find_also_related(Product)
        .order_by_asc(cart_item::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

async fn load_details<C>(db: &C, cart: cart::Model) -> Result<CartDetails>
where
    C: ConnectionTrait,
{
    let items = load_lines(db, cart.id)
        .await?
        .into_iter()
        .map(|(item, product)| -> Result<CartLine> {
            let product = product.ok_or_else(|| Error::ProductNotFound {
                name: item.product_id.to_string(),
            })?;
            Ok(CartLine {
                id: item.id,
                product_id: item.product_id,
                quantity: item.quantity,
                subtotal: Money::from_cents(item.subtotal_cents),
                product: ProductSummary::from(&product),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CartDetails {
        id: cart.id,
        user_id: cart.user_id,
        total_amount: Money::from_cents(cart.total_cents),
        items,
    })
}

/// Re-sums all persisted line subtotals and stores the result as the cart total.
pub async fn recalculate_total<C>(db: &C, cart: cart::Model) -> Result<cart::Model>
where
    C: ConnectionTrait,
{
    let items = CartItem::find()
        .filter(cart_item::Column::CartId.eq(cart.id))
        .all(db)
        .await?;
    let total = Money::total(
        items
            .iter()
            .map(|item| Money::from_cents(item.subtotal_cents)),
    )?;

    let mut cart: cart::ActiveModel = cart.into();
    cart.total_cents = Set(total.cents());
    cart.updated_at = Set(chrono::Utc::now());
    cart.update(db).await.map_err(Into::into)
}

/// Finds a line and its cart, treating lines in other users' carts as missing.
async fn find_owned_item<C>(
    db: &C,
    user_id: i64,
    item_id: i64,
) -> Result<(cart_item::Model, cart::Model)>
where
    C: ConnectionTrait,
{
    let not_found = || Error::CartItemNotFound { id: item_id };

    let item = CartItem::find_by_id(item_id)
        .one(db)
        .await?
        .ok_or_else(not_found)?;
    let cart = Cart::find_by_id(item.cart_id)
        .one(db)
        .await?
        .filter(|cart| cart.user_id == user_id)
        .ok_or_else(not_found)?;

    Ok((item, cart))
}

/// Returns the user's cart with its lines, creating an empty cart if needed.
///
/// # Errors
/// Returns [`Error::UserNotFound`] for unknown users, or a database error.
pub async fn get_cart(db: &DatabaseConnection, user_id: i64) -> Result<CartDetails> {
    let txn = db.begin().await?;
    let cart = get_or_create_cart(&txn, user_id).await?;
    let details = load_details(&txn, cart).await?;
    txn.commit().await?;
    Ok(details)
}

/// Adds `quantity` units of a product to the user's cart.
///
/// If the product is already in the cart the quantities are merged and the subtotal is
/// recomputed from the merged quantity and the product's current price.
///
/// # Errors
/// Returns an error if:
/// - `quantity` is not positive ([`Error::InvalidQuantity`], before any database access)
/// - The product does not exist ([`Error::ProductNotFound`])
/// - The merged quantity exceeds the product's stock ([`Error::InsufficientStock`])
/// - The user does not exist or the database operation fails
#[instrument(skip(db))]
pub async fn add_item(
    db: &DatabaseConnection,
    user_id: i64,
    product_id: i64,
    quantity: i32,
) -> Result<CartDetails> {
    if quantity <= 0 {
        return Err(Error::InvalidQuantity {
            quantity: quantity.into(),
        });
    }

    let txn = db.begin().await?;

    let product = Product::find_by_id(product_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::ProductNotFound {
            name: product_id.to_string(),
        })?;
    let cart = get_or_create_cart(&txn, user_id).await?;

    let existing = CartItem::find()
        .filter(cart_item::Column::CartId.eq(cart.id))
        .filter(cart_item::Column::ProductId.eq(product_id))
        .one(&txn)
        .await?;

    let merged = existing
        .as_ref()
        .map_or(0, |item| item.quantity)
        .checked_add(quantity)
        .ok_or(Error::InvalidQuantity {
            quantity: quantity.into(),
        })?;
    if product.stock_quantity < merged {
        return Err(Error::InsufficientStock {
            product: product.name,
            available: product.stock_quantity,
        });
    }
    let subtotal = Money::from_cents(product.price_cents).times(merged)?;

    if let Some(item) = existing {
        let mut item: cart_item::ActiveModel = item.into();
        item.quantity = Set(merged);
        item.subtotal_cents = Set(subtotal.cents());
        item.update(&txn).await?;
    } else {
        cart_item::ActiveModel {
            cart_id: Set(cart.id),
            product_id: Set(product_id),
            quantity: Set(merged),
            subtotal_cents: Set(subtotal.cents()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    let cart = recalculate_total(&txn, cart).await?;
    let details = load_details(&txn, cart).await?;
    txn.commit().await?;

    debug!(cart_id = details.id, merged, total = %details.total_amount, "item added");
    Ok(details)
}

/// Sets the quantity of one of the user's cart lines; zero removes the line.
///
/// # Errors
/// Returns an error if:
/// - `quantity` is negative ([`Error::InvalidQuantity`], before any database access)
/// - The line does not exist or is in another user's cart ([`Error::CartItemNotFound`])
/// - `quantity` exceeds the product's current stock ([`Error::InsufficientStock`])
/// - The database operation fails
#[instrument(skip(db))]
pub async fn set_item_quantity(
    db: &DatabaseConnection,
    user_id: i64,
    item_id: i64,
    quantity: i32,
) -> Result<CartDetails> {
    if quantity < 0 {
        return Err(Error::InvalidQuantity {
            quantity: quantity.into(),
        });
    }

    let txn = db.begin().await?;
    let (item, cart) = find_owned_item(&txn, user_id, item_id).await?;
    let product = Product::find_by_id(item.product_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::ProductNotFound {
            name: item.product_id.to_string(),
        })?;

    if product.stock_quantity < quantity {
        return Err(Error::InsufficientStock {
            product: product.name,
            available: product.stock_quantity,
        });
    }

    if quantity == 0 {
        item.delete(&txn).await?;
    } else {
        let subtotal = Money::from_cents(product.price_cents).times(quantity)?;
        let mut item: cart_item::ActiveModel = item.into();
        item.quantity = Set(quantity);
        item.subtotal_cents = Set(subtotal.cents());
        item.update(&txn).await?;
    }

    let cart = recalculate_total(&txn, cart).await?;
    let details = load_details(&txn, cart).await?;
    txn.commit().await?;
    Ok(details)
}

/// Removes one of the user's cart lines.
///
/// # Errors
/// Returns [`Error::CartItemNotFound`] if the line does not exist or is in another user's
/// cart, or a database error.
#[instrument(skip(db))]
pub async fn remove_item(
    db: &DatabaseConnection,
    user_id: i64,
    item_id: i64,
) -> Result<CartDetails> {
    let txn = db.begin().await?;
    let (item, cart) = find_owned_item(&txn, user_id, item_id).await?;
    item.delete(&txn).await?;

    let cart = recalculate_total(&txn, cart).await?;
    let details = load_details(&txn, cart).await?;
    txn.commit().await?;
    Ok(details)
}

/// Deletes every line of the cart and resets its total to zero. The cart row itself stays.
pub async fn clear_lines<C>(db: &C, cart: cart::Model) -> Result<cart::Model>
where
    C: ConnectionTrait,
{
    CartItem::delete_many()
        .filter(cart_item::Column::CartId.eq(cart.id))
        .exec(db)
        .await?;

    let mut cart: cart::ActiveModel = cart.into();
    cart.total_cents = Set(0);
    cart.updated_at = Set(chrono::Utc::now());
    cart.update(db).await.map_err(Into::into)
}

/// Empties the user's cart.
///
/// # Errors
/// Returns [`Error::UserNotFound`] for unknown users, or a database error.
#[instrument(skip(db))]
pub async fn clear(db: &DatabaseConnection, user_id: i64) -> Result<CartDetails> {
    let txn = db.begin().await?;
    let cart = get_or_create_cart(&txn, user_id).await?;
    let cart = clear_lines(&txn, cart).await?;
    let details = load_details(&txn, cart).await?;
    txn.commit().await?;
    Ok(details)
}
