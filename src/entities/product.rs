//! Product entity - Represents a catalog item that can be scanned at the till.
//!
//! Each product is identified by a unique barcode and carries its unit price in cents
//! and the quantity currently in stock. The stock column is the stock ledger: it is only
//! decremented by checkout and only overwritten by catalog management.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Barcode printed on the item, unique across the catalog
    #[sea_orm(unique)]
    pub barcode: String,
    /// Name of the product (e.g., "Cola 330ml")
    pub name: String,
    /// Unit price in cents
    pub price_cents: i64,
    /// Units available for sale, never negative
    pub stock_quantity: i32,
    /// Optional category reference
    pub category_id: Option<i64>,
    /// Optional subcategory reference
    pub subcategory_id: Option<i64>,
    /// When the product was created
    pub created_at: DateTimeUtc,
    /// When the product was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Product and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A product appears on many cart lines
    #[sea_orm(has_many = "super::cart_item::Entity")]
    CartItems,
    /// A product appears on many sale lines
    #[sea_orm(has_many = "super::sale_item::Entity")]
    SaleItems,
}

impl Related<super::cart_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CartItems.def()
    }
}

impl Related<super::sale_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SaleItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
