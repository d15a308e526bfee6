//! Core business logic - framework-agnostic cart, checkout, stock and catalog operations.
//!
//! Every function takes a `SeaORM` connection (or transaction) and returns the crate
//! [`Result`](crate::errors::Result); nothing in here knows about HTTP.

/// Cart aggregator: one cart per user, totals re-summed after every mutation
pub mod cart;
/// Checkout engine: all-or-nothing conversion of a cart into a sale
pub mod checkout;
/// Fixed-point money in cents
pub mod money;
/// Product catalog
pub mod product;
/// Sale store: append-only record of completed checkouts
pub mod sale;
/// Stock ledger: conditional decrements of product stock
pub mod stock;
/// Users operating the till
pub mod user;

pub use money::Money;
