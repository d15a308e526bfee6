//! Checkout engine - Turns a user's cart into a sale.
//!
//! A checkout attempt moves through `Pending -> Validating -> Committing` and ends either
//! `Committed` or `Rejected`. Everything from reading the cart to clearing it happens in one
//! database transaction: the sale header, its lines, the stock decrements and the cart reset
//! are either all visible afterwards or none of them are.

use crate::{
    core::{cart, money::Money, sale, sale::SaleDetails, stock},
    entities::{PaymentMethod, cart_item, product},
    errors::{Error, Result},
};
use sea_orm::{ConnectionTrait, DatabaseConnection, DatabaseTransaction, TransactionTrait};
use std::{fmt, str::FromStr};
use tracing::{debug, error, info, instrument, warn};

impl PaymentMethod {
    /// Wire name of the payment method
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "CASH",
            Self::Card => "CARD",
            Self::Voucher => "VOUCHER",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "CASH" => Ok(Self::Cash),
            "CARD" => Ok(Self::Card),
            "VOUCHER" => Ok(Self::Voucher),
            other => Err(Error::InvalidPaymentMethod {
                method: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stage reached by a checkout attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutStage {
    /// Request accepted, nothing read yet
    Pending,
    /// Cart loaded, stock being re-checked
    Validating,
    /// Sale being written
    Committing,
    /// Transaction committed
    Committed,
    /// Transaction rolled back
    Rejected,
}

impl CheckoutStage {
    /// Lowercase name used in logs
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Validating => "validating",
            Self::Committing => "committing",
            Self::Committed => "committed",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for CheckoutStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Checks out the user's cart.
///
/// The payment method is parsed before anything is read. Inside a single transaction the
/// cart is loaded with its products, every line is re-checked against the stock read in that
/// same transaction, a sale snapshotting the cart total is written together with one line
/// per cart line, stock is decremented conditionally, and the cart is emptied. Any failure
/// rolls the whole transaction back and leaves the cart as it was.
///
/// # Errors
/// Returns an error if:
/// - `payment_method` is not `CASH`, `CARD` or `VOUCHER` ([`Error::InvalidPaymentMethod`])
/// - The user has no cart or it has no lines ([`Error::EmptyCart`])
/// - A line asks for more than is in stock, including when a concurrent checkout took the
///   stock first ([`Error::InsufficientStock`])
/// - The database operation fails
#[instrument(skip(db))]
pub async fn checkout(
    db: &DatabaseConnection,
    user_id: i64,
    payment_method: &str,
) -> Result<SaleDetails> {
    let payment_method = PaymentMethod::from_str(payment_method)?;
    let mut stage = CheckoutStage::Pending;

    let txn = db.begin().await?;
    match run(&txn, user_id, payment_method, &mut stage).await {
        Ok(details) => {
            txn.commit().await?;
            info!(
                sale_id = details.id,
                total = %details.total_amount,
                %payment_method,
                lines = details.items.len(),
                stage = %CheckoutStage::Committed,
                "checkout completed"
            );
            Ok(details)
        }
        Err(err) => {
            if let Err(rollback_err) = txn.rollback().await {
                error!(error = %rollback_err, "rollback after failed checkout failed");
            }
            warn!(
                error = %err,
                failed_at = %stage,
                stage = %CheckoutStage::Rejected,
                "checkout rejected"
            );
            Err(err)
        }
    }
}

async fn run(
    txn: &DatabaseTransaction,
    user_id: i64,
    payment_method: PaymentMethod,
    stage: &mut CheckoutStage,
) -> Result<SaleDetails> {
    *stage = CheckoutStage::Validating;
    // Write before the first read so concurrent checkouts queue on the lock instead of
    // failing to upgrade a read lock.
    cart::lock_cart(txn, user_id).await?;
    let cart = cart::find_cart(txn, user_id)
        .await?
        .ok_or(Error::EmptyCart)?;
    let lines = validate_lines(cart::load_lines(txn, cart.id).await?)?;
    debug!(cart_id = cart.id, lines = lines.len(), "cart validated");

    *stage = CheckoutStage::Committing;
    let total = Money::from_cents(cart.total_cents);
    let header = sale::record_sale(txn, user_id, total, payment_method).await?;

    for (line, product) in &lines {
        sale::record_sale_item(txn, header.id, line, product).await?;
        take_stock(txn, line, product).await?;
    }

    cart::clear_lines(txn, cart).await?;

    sale::get_sale(txn, header.id).await
}

/// Decrements stock for one line. When the conditional decrement loses to another checkout,
/// the failure is reported as a shortage with the stock as it stands now.
async fn take_stock<C>(db: &C, line: &cart_item::Model, product: &product::Model) -> Result<()>
where
    C: ConnectionTrait,
{
    match stock::decrement(db, product.id, line.quantity).await {
        Err(Error::StockConflict { product_id }) => Err(Error::InsufficientStock {
            product: product.name.clone(),
            available: stock::available(db, product_id).await?,
        }),
        other => other,
    }
}

/// Pairs every cart line with its product and rejects the cart if any line cannot be served.
fn validate_lines(
    lines: Vec<(cart_item::Model, Option<product::Model>)>,
) -> Result<Vec<(cart_item::Model, product::Model)>> {
    if lines.is_empty() {
        return Err(Error::EmptyCart);
    }

    lines
        .into_iter()
        .map(|(line, product)| -> Result<(cart_item::Model, product::Model)> {
            let product = product.ok_or_else(|| Error::ProductNotFound {
                name: line.product_id.to_string(),
            })?;
            if product.stock_quantity < line.quantity {
                return Err(Error::InsufficientStock {
                    product: product.name,
                    available: product.stock_quantity,
                });
            }
            Ok((line, product))
        })
        .collect()
}
