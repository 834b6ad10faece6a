//! Wire types of the PalPay REST API
//!
//! Amounts travel as decimal strings and are read back into
//! `rust_decimal::Decimal`, so nothing is lost to floating point.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub payment_details: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Activity {
    pub id: Uuid,
    pub name: String,
    pub participants: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// One participant's part of an expense, in cents
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Share {
    pub user_id: Uuid,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Expense {
    pub id: Uuid,
    pub amount: Decimal,
    pub paid_by_user_id: Uuid,
    pub activity_id: Uuid,
    pub participants: Vec<Uuid>,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub shares: Vec<Share>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Payment {
    pub id: Uuid,
    pub amount: Decimal,
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A user as shown next to a balance
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UserRef {
    pub id: Uuid,
    pub name: String,
}

/// `debtor` owes `creditor` `amount`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BalanceEntry {
    pub debtor: UserRef,
    pub creditor: UserRef,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NetBalance {
    pub user: UserRef,
    pub net: Decimal,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AuditLog {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Uuid,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}

/// debtor id -> creditor id -> amount, for a single activity
pub type Settlements = BTreeMap<Uuid, BTreeMap<Uuid, Decimal>>;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Health {
    pub status: String,
    pub version: String,
}

/// How the server turns debts into transfers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SettlementStrategy {
    /// Fewest transfers across everyone
    #[default]
    Minimal,
    /// Net each pair of users on its own
    Pairwise,
}

impl SettlementStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettlementStrategy::Minimal => "minimal",
            SettlementStrategy::Pairwise => "pairwise",
        }
    }
}

// --- Request Types ---

#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_details: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewActivity {
    pub name: String,
    pub participants: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewExpense {
    pub amount: Decimal,
    pub paid_by_user_id: Uuid,
    pub activity_id: Uuid,
    pub participants: Vec<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewPayment {
    pub amount: Decimal,
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
}
