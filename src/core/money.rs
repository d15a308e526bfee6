//! Fixed-point money.
//!
//! Amounts are held as integer cents inside the core and in storage. `rust_decimal` is only
//! used at the JSON boundary, where amounts are rendered as two-place decimal strings and
//! parsed back from strings or numbers.

use crate::errors::{Error, Result};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Number of decimal places carried by every amount
const SCALE: u32 = 2;

/// A monetary amount in cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

impl Money {
    /// Zero cents
    pub const ZERO: Self = Self(0);

    /// Wraps an amount already expressed in cents.
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// The amount in cents, as stored in the database.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Line subtotal: this unit price times `quantity`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidAmount`] if the product overflows.
    pub fn times(self, quantity: i32) -> Result<Self> {
        self.0
            .checked_mul(i64::from(quantity))
            .map(Self)
            .ok_or_else(|| Error::InvalidAmount {
                amount: format!("{self} x {quantity}"),
            })
    }

    /// Adds two amounts.
    ///
    /// # Errors
    /// Returns [`Error::InvalidAmount`] if the sum overflows.
    pub fn checked_add(self, other: Self) -> Result<Self> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or_else(|| Error::InvalidAmount {
                amount: format!("{self} + {other}"),
            })
    }

    /// Sums a sequence of amounts without wrapping.
    ///
    /// # Errors
    /// Returns [`Error::InvalidAmount`] if the running total overflows.
    pub fn total<I>(amounts: I) -> Result<Self>
    where
        I: IntoIterator<Item = Self>,
    {
        amounts
            .into_iter()
            .try_fold(Self::ZERO, |acc, amount| acc.checked_add(amount))
    }

    /// The amount as a two-place decimal.
    #[must_use]
    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, SCALE)
    }
}

impl TryFrom<Decimal> for Money {
    type Error = Error;

    /// Accepts non-negative amounts with at most two decimal places.
    fn try_from(value: Decimal) -> Result<Self> {
        let invalid = || Error::InvalidAmount {
            amount: value.to_string(),
        };

        if value.is_sign_negative() && !value.is_zero() {
            return Err(invalid());
        }
        if value.round_dp(SCALE) != value {
            return Err(invalid());
        }

        value
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|cents| cents.trunc().to_i64())
            .map(Self)
            .ok_or_else(invalid)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        Serialize::serialize(&self.to_decimal(), serializer)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = <Decimal as Deserialize>::deserialize(deserializer)?;
        Self::try_from(value).map_err(serde::de::Error::custom)
    }
}
