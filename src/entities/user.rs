//! User entity - Represents a cashier or administrator operating the till.
//!
//! Identity is verified upstream, so no credential material is stored here.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Role of a user within the shop
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Shop administrator; at most one exists
    #[sea_orm(string_value = "admin")]
    Admin,
    /// Till operator
    #[sea_orm(string_value = "cashier")]
    Cashier,
}

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Login name, unique across all users
    #[sea_orm(unique)]
    pub username: String,
    /// Optional display name
    pub full_name: Option<String>,
    /// Admin or cashier
    pub role: Role,
    /// When the user was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between User and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One user has at most one cart
    #[sea_orm(has_one = "super::cart::Entity")]
    Cart,
    /// One user rings up many sales
    #[sea_orm(has_many = "super::sale::Entity")]
    Sales,
}

impl Related<super::cart::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cart.def()
    }
}

impl Related<super::sale::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sales.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
