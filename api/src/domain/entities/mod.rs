//! Domain entities
//!
//! Pure domain models for the expense-sharing ledger.
//! These are separate from the SeaORM entities in the `entity` module.

pub mod activity;
pub mod audit_log;
pub mod balance;
pub mod expense;
pub mod money;
pub mod payment;
pub mod user;

pub use activity::{dedup_participants, Activity, ActivityId, NewActivity};
pub use audit_log::{AuditAction, AuditLog, AuditLogId, EntityType, NewAuditLog};
pub use balance::{Balance, LedgerSnapshot, NetBalance, SettlementStrategy, Share};
pub use expense::{Expense, ExpenseId, NewExpense};
pub use money::{Amount, CURRENCY_SCALE, MAX_AMOUNT, MAX_AMOUNT_SCALE};
pub use payment::{NewPayment, Payment, PaymentId};
pub use user::{NewUser, User, UserId};
