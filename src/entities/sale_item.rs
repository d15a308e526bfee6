//! Sale item entity - One line of a completed sale.
//!
//! Name, unit price and subtotal are copied from the product and cart line when the sale
//! is committed, so later catalog edits never change what was charged.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sale line database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sale_items")]
pub struct Model {
    /// Unique identifier for the line
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Sale this line belongs to
    pub sale_id: i64,
    /// Product that was sold
    pub product_id: i64,
    /// Product name at sale time
    pub product_name: String,
    /// Units sold
    pub quantity: i32,
    /// Unit price at sale time, in cents
    pub price_cents: i64,
    /// Line subtotal at sale time, in cents
    pub subtotal_cents: i64,
}

/// Defines relationships between `SaleItem` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each line belongs to one sale
    #[sea_orm(
        belongs_to = "super::sale::Entity",
        from = "Column::SaleId",
        to = "super::sale::Column::Id"
    )]
    Sale,
    /// Each line references the product that was sold
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
}

impl Related<super::sale::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sale.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
