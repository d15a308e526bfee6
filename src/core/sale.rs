//! Sale store - The append-only ledger of completed checkouts.
//!
//! Sales and their lines are only ever inserted, by checkout, and read back here. Every
//! sale line carries its own copy of the product name, unit price and subtotal, so reading
//! a sale never consults the live catalog prices.

use crate::{
    core::{money::Money, user::UserSummary},
    entities::{PaymentMethod, Sale, SaleItem, User, cart_item, product, sale, sale_item, user},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Serialize;
use std::collections::HashMap;

/// A completed sale with its lines and the user who rang it up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleDetails {
    /// Sale id
    pub id: i64,
    /// Amount charged
    pub total_amount: Money,
    /// How the customer paid
    pub payment_method: PaymentMethod,
    /// Commit time
    pub created_at: DateTimeUtc,
    /// Lines in the order they were recorded
    pub items: Vec<SaleLine>,
    /// Cashier descriptor
    pub user: UserSummary,
}

/// One line of a [`SaleDetails`], as snapshotted at sale time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleLine {
    /// Sale item id
    pub id: i64,
    /// Product that was sold
    pub product_id: i64,
    /// Product name at sale time
    pub product_name: String,
    /// Units sold
    pub quantity: i32,
    /// Unit price at sale time
    pub price: Money,
    /// Line subtotal at sale time
    pub subtotal: Money,
}

impl From<sale_item::Model> for SaleLine {
    fn from(model: sale_item::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            product_name: model.product_name,
            quantity: model.quantity,
            price: Money::from_cents(model.price_cents),
            subtotal: Money::from_cents(model.subtotal_cents),
        }
    }
}

fn assemble(sale: sale::Model, items: Vec<sale_item::Model>, user: &UserSummary) -> SaleDetails {
    SaleDetails {
        id: sale.id,
        total_amount: Money::from_cents(sale.total_cents),
        payment_method: sale.payment_method,
        created_at: sale.created_at,
        items: items.into_iter().map(SaleLine::from).collect(),
        user: user.clone(),
    }
}

/// Inserts the sale header.
pub async fn record_sale<C>(
    db: &C,
    user_id: i64,
    total: Money,
    payment_method: PaymentMethod,
) -> Result<sale::Model>
where
    C: ConnectionTrait,
{
    sale::ActiveModel {
        user_id: Set(user_id),
        total_cents: Set(total.cents()),
        payment_method: Set(payment_method),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Inserts one sale line, copying quantity and subtotal from the cart line and name and
/// unit price from the product as read in the current transaction.
pub async fn record_sale_item<C>(
    db: &C,
    sale_id: i64,
    line: &cart_item::Model,
    product: &product::Model,
) -> Result<sale_item::Model>
where
    C: ConnectionTrait,
{
    sale_item::ActiveModel {
        sale_id: Set(sale_id),
        product_id: Set(product.id),
        product_name: Set(product.name.clone()),
        quantity: Set(line.quantity),
        price_cents: Set(product.price_cents),
        subtotal_cents: Set(line.subtotal_cents),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Loads a sale with its lines and cashier.
///
/// # Errors
/// Returns [`Error::SaleNotFound`] if no such sale exists, or a database error.
pub async fn get_sale<C>(db: &C, sale_id: i64) -> Result<SaleDetails>
where
    C: ConnectionTrait,
{
    let sale = Sale::find_by_id(sale_id)
        .one(db)
        .await?
        .ok_or(Error::SaleNotFound { id: sale_id })?;
    let items = SaleItem::find()
        .filter(sale_item::Column::SaleId.eq(sale.id))
        .order_by_asc(sale_item::Column::Id)
        .all(db)
        .await?;
    let user = User::find_by_id(sale.user_id)
        .one(db)
        .await?
        .ok_or(Error::UserNotFound { id: sale.user_id })?;

    Ok(assemble(sale, items, &UserSummary::from(&user)))
}

/// All sales, newest first, each with its lines and cashier.
pub async fn list_sales<C>(db: &C) -> Result<Vec<SaleDetails>>
where
    C: ConnectionTrait,
{
    let sales = Sale::find()
        .order_by_desc(sale::Column::CreatedAt)
        .order_by_desc(sale::Column::Id)
        .all(db)
        .await?;
    if sales.is_empty() {
        return Ok(Vec::new());
    }

    let sale_ids: Vec<i64> = sales.iter().map(|s| s.id).collect();
    let mut items_by_sale: HashMap<i64, Vec<sale_item::Model>> = HashMap::new();
    for item in SaleItem::find()
        .filter(sale_item::Column::SaleId.is_in(sale_ids))
        .order_by_asc(sale_item::Column::Id)
        .all(db)
        .await?
    {
        items_by_sale.entry(item.sale_id).or_default().push(item);
    }

    let mut user_ids: Vec<i64> = sales.iter().map(|s| s.user_id).collect();
    user_ids.sort_unstable();
    user_ids.dedup();
    let users: HashMap<i64, UserSummary> = User::find()
        .filter(user::Column::Id.is_in(user_ids))
        .all(db)
        .await?
        .iter()
        .map(|u| (u.id, UserSummary::from(u)))
        .collect();

    sales
        .into_iter()
        .map(|sale| {
            let user = users
                .get(&sale.user_id)
                .ok_or(Error::UserNotFound { id: sale.user_id })?;
            let items = items_by_sale.remove(&sale.id).unwrap_or_default();
            Ok(assemble(sale, items, user))
        })
        .collect()
}
