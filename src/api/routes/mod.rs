//! Handlers grouped by resource.

pub mod cart;
pub mod products;
pub mod sales;
pub mod users;
