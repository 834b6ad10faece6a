//! Test fixtures
//!
//! Factory functions for creating test data with sensible defaults.
//! Entities built here bypass service validation, so tests can seed any
//! ledger shape directly into the store.

use chrono::Utc;
use rust_decimal::Decimal;

use crate::adapters::InMemoryLedgerStore;
use crate::domain::entities::{
    Activity, ActivityId, Amount, Expense, ExpenseId, Payment, PaymentId, User, UserId,
};

/// Create a test user with an email derived from the name
pub fn test_user(name: &str) -> User {
    User {
        id: UserId::new(),
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
        payment_details: None,
        created_at: Utc::now(),
    }
}

pub fn test_activity(name: &str, participants: &[UserId]) -> Activity {
    Activity {
        id: ActivityId::new(),
        name: name.to_string(),
        participants: participants.to_vec(),
        created_at: Utc::now(),
    }
}

/// Create a test expense. Panics on an amount `Amount` rejects.
pub fn test_expense(
    amount: Decimal,
    paid_by: UserId,
    activity: ActivityId,
    participants: &[UserId],
) -> Expense {
    Expense {
        id: ExpenseId::new(),
        amount: Amount::new(amount).expect("fixture amount must be positive"),
        paid_by_user_id: paid_by,
        activity_id: activity,
        participants: participants.to_vec(),
        description: None,
        created_at: Utc::now(),
    }
}

pub fn test_payment(amount: Decimal, from: UserId, to: UserId) -> Payment {
    Payment {
        id: PaymentId::new(),
        amount: Amount::new(amount).expect("fixture amount must be positive"),
        from_user_id: from,
        to_user_id: to,
        created_at: Utc::now(),
    }
}

/// A store holding one user per name plus one activity they all belong to
pub fn store_with_group(names: &[&str]) -> (InMemoryLedgerStore, Vec<User>, Activity) {
    let users: Vec<User> = names.iter().map(|n| test_user(n)).collect();
    let ids: Vec<UserId> = users.iter().map(|u| u.id).collect();
    let activity = test_activity("Trip", &ids);

    let store = users
        .iter()
        .cloned()
        .fold(InMemoryLedgerStore::new(), |store, user| store.with_user(user))
        .with_activity(activity.clone());

    (store, users, activity)
}
