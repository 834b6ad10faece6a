//! Expense domain entity
//!
//! An amount paid by one user and shared evenly by the participants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::activity::ActivityId;
use super::money::Amount;
use super::user::UserId;

/// Unique identifier for an expense
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpenseId(pub Uuid);

impl ExpenseId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ExpenseId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for ExpenseId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ExpenseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub amount: Amount,
    pub paid_by_user_id: UserId,
    pub activity_id: ActivityId,
    /// Users sharing the cost, payer included when they take a share
    pub participants: Vec<UserId>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Data needed to create a new expense
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub amount: Amount,
    pub paid_by_user_id: UserId,
    pub activity_id: ActivityId,
    pub participants: Vec<UserId>,
    pub description: Option<String>,
}
