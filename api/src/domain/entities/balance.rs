//! Derived balance types
//!
//! None of these are persisted. They are recomputed from the ledger on
//! every query.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::activity::Activity;
use super::expense::Expense;
use super::payment::Payment;
use super::user::{User, UserId};

/// `debtor` owes `creditor` a strictly positive `amount` (2 decimal places)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Balance {
    pub debtor: UserId,
    pub creditor: UserId,
    pub amount: Decimal,
}

/// Signed net position of one user: positive means they are owed money
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetBalance {
    pub user_id: UserId,
    pub net: Decimal,
}

/// One participant's part of an expense
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Share {
    pub user_id: UserId,
    pub amount: Decimal,
}

/// How net debts are turned into transfers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementStrategy {
    /// Greedy global settlement, at most n - 1 transfers
    #[default]
    Minimal,
    /// Net each pair of users separately, no cross-user simplification
    Pairwise,
}

impl std::fmt::Display for SettlementStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettlementStrategy::Minimal => write!(f, "minimal"),
            SettlementStrategy::Pairwise => write!(f, "pairwise"),
        }
    }
}

impl std::str::FromStr for SettlementStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "minimal" => Ok(SettlementStrategy::Minimal),
            "pairwise" => Ok(SettlementStrategy::Pairwise),
            _ => Err(format!("Unknown settlement strategy: {}", s)),
        }
    }
}

/// A consistent read of the whole ledger
#[derive(Debug, Clone, Default)]
pub struct LedgerSnapshot {
    pub users: Vec<User>,
    pub activities: Vec<Activity>,
    pub expenses: Vec<Expense>,
    pub payments: Vec<Payment>,
}

impl LedgerSnapshot {
    pub fn user(&self, id: &UserId) -> Option<&User> {
        self.users.iter().find(|u| &u.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_defaults_to_minimal() {
        assert_eq!(SettlementStrategy::default(), SettlementStrategy::Minimal);
    }

    #[test]
    fn strategy_from_str() {
        assert_eq!(
            "PAIRWISE".parse::<SettlementStrategy>().unwrap(),
            SettlementStrategy::Pairwise
        );
        assert_eq!(
            "minimal".parse::<SettlementStrategy>().unwrap(),
            SettlementStrategy::Minimal
        );
        assert!("greedy".parse::<SettlementStrategy>().is_err());
    }

    #[test]
    fn strategy_deserializes_lowercase() {
        let strategy: SettlementStrategy = serde_json::from_str("\"pairwise\"").unwrap();
        assert_eq!(strategy, SettlementStrategy::Pairwise);
    }
}
