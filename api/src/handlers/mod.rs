//! HTTP handlers
//!
//! Axum request handlers for the API endpoints. Every handler is generic
//! over the storage backend carried in `AppState`.

pub mod activities;
pub mod audit;
pub mod balances;
pub mod expenses;
pub mod extract;
pub mod payments;
pub mod users;

pub use activities::{create_activity, get_activity, list_activities};
pub use audit::list_audit_logs;
pub use balances::{get_activity_settlements, get_balances, get_net_balances};
pub use expenses::{create_expense, get_expense, list_expenses};
pub use payments::{create_payment, get_payment, list_payments};
pub use users::{create_user, get_user, list_users};
