//! Money value objects
//!
//! Monetary values are `rust_decimal::Decimal` so that amounts entered as
//! `10.10` stay exactly `10.10`. `Amount` is the only way money enters the
//! ledger. It is never zero or negative, never above `MAX_AMOUNT`, and never
//! finer than `MAX_AMOUNT_SCALE` decimal places, which keeps every ledger
//! inside the balance engine's exact 128-bit range.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::balance_engine::BalanceError;

/// Number of decimal places balances are reported with
pub const CURRENCY_SCALE: u32 = 2;

/// Most decimal places a single amount may carry
pub const MAX_AMOUNT_SCALE: u32 = 4;

/// Largest single amount, in whole currency units
pub const MAX_AMOUNT: i64 = 1_000_000_000_000;

/// A strictly positive monetary amount carried by an expense or payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, BalanceError> {
        if value <= Decimal::ZERO {
            return Err(BalanceError::InvalidAmount(value));
        }

        let value = value.normalize();
        if value > Decimal::from(MAX_AMOUNT) {
            return Err(BalanceError::AmountTooLarge(value));
        }
        if value.scale() > MAX_AMOUNT_SCALE {
            return Err(BalanceError::AmountTooPrecise(value));
        }

        Ok(Self(value))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = BalanceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
