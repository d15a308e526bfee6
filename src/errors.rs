//! Unified error type for the POS backend.
//!
//! Every fallible operation in the crate returns [`Result`]. Storage errors from `SeaORM`
//! convert automatically; domain failures carry enough context to be shown to the caller
//! verbatim.

use thiserror::Error;

/// All errors produced by the core, configuration and HTTP layers.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration file or environment could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Storage failure (connection, transaction or query error)
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O failure (socket binding, file access)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Product does not exist
    #[error("Product '{name}' not found")]
    ProductNotFound {
        /// Product id, barcode or name used for the lookup
        name: String,
    },

    /// Cart line does not exist or belongs to another user's cart
    #[error("Cart item {id} not found")]
    CartItemNotFound {
        /// Cart item id
        id: i64,
    },

    /// Sale does not exist
    #[error("Sale {id} not found")]
    SaleNotFound {
        /// Sale id
        id: i64,
    },

    /// User does not exist
    #[error("User {id} not found")]
    UserNotFound {
        /// User id
        id: i64,
    },

    /// Requested quantity exceeds what the stock ledger holds
    #[error("Insufficient stock for {product}. Available: {available}")]
    InsufficientStock {
        /// Name of the offending product
        product: String,
        /// Quantity currently in stock
        available: i32,
    },

    /// A conditional stock decrement matched no row because stock dropped below the amount
    #[error("Stock for product {product_id} changed concurrently")]
    StockConflict {
        /// Product whose decrement lost the race
        product_id: i64,
    },

    /// Checkout attempted on a cart without line items
    #[error("Cart is empty")]
    EmptyCart,

    /// Payment method outside CASH, CARD and VOUCHER
    #[error("Invalid payment method: '{method}'")]
    InvalidPaymentMethod {
        /// The rejected value
        method: String,
    },

    /// Line quantity out of range
    #[error("Invalid quantity: {quantity}")]
    InvalidQuantity {
        /// The rejected value
        quantity: i64,
    },

    /// Monetary value that is negative, too precise or out of range
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected value, as given
        amount: String,
    },

    /// Input rejected by a business rule (duplicate barcode, empty name, ...)
    #[error("{message}")]
    Validation {
        /// Human-readable reason
        message: String,
    },

    /// Caller identity missing or malformed
    #[error("{message}")]
    Unauthorized {
        /// Human-readable reason
        message: String,
    },

    /// Caller is not allowed to perform the operation
    #[error("{message}")]
    Forbidden {
        /// Human-readable reason
        message: String,
    },
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
