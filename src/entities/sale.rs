//! Sale entity - An immutable record of a completed checkout.
//!
//! Sales are append-only: they are inserted once by checkout and never updated or deleted.
//! A sale holds no reference to the cart that produced it.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// How the customer paid
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentMethod {
    /// Cash at the till
    #[sea_orm(string_value = "CASH")]
    Cash,
    /// Debit or credit card
    #[sea_orm(string_value = "CARD")]
    Card,
    /// Gift or meal voucher
    #[sea_orm(string_value = "VOUCHER")]
    Voucher,
}

/// Sale database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sales")]
pub struct Model {
    /// Unique identifier for the sale
    #[sea_orm(primary_key)]
    pub id: i64,
    /// User who rang up the sale
    pub user_id: i64,
    /// Total charged in cents, snapshot of the cart total at checkout
    pub total_cents: i64,
    /// Payment method used
    pub payment_method: PaymentMethod,
    /// When the sale was committed
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Sale and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each sale belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    /// One sale has many lines
    #[sea_orm(has_many = "super::sale_item::Entity")]
    Items,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::sale_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
