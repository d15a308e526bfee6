//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.
//! Monetary columns hold integer cents; conversion to decimals happens in `core::money`.

pub mod cart;
pub mod cart_item;
pub mod product;
pub mod sale;
pub mod sale_item;
pub mod user;

// Re-export specific types to avoid conflicts
pub use cart::{Column as CartColumn, Entity as Cart, Model as CartModel};
pub use cart_item::{Column as CartItemColumn, Entity as CartItem, Model as CartItemModel};
pub use product::{Column as ProductColumn, Entity as Product, Model as ProductModel};
pub use sale::{Column as SaleColumn, Entity as Sale, Model as SaleModel, PaymentMethod};
pub use sale_item::{Column as SaleItemColumn, Entity as SaleItem, Model as SaleItemModel};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel, Role};
