//! Repository port traits
//!
//! These traits define the interface for ledger persistence.
//! Implementations are provided by adapters (in-memory, PostgreSQL).
//!
//! Method names carry the entity name so a single store type can implement
//! every trait without ambiguous calls.

use async_trait::async_trait;

use crate::domain::entities::{
    Activity, ActivityId, AuditLog, Expense, ExpenseId, LedgerSnapshot, NewActivity,
    NewAuditLog, NewExpense, NewPayment, NewUser, Payment, PaymentId, User, UserId,
};
use crate::error::DomainError;

/// Repository for User entities
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by ID
    async fn find_user(&self, id: &UserId) -> Result<Option<User>, DomainError>;

    /// Find a user by (lowercased) email
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;

    /// All users, oldest first
    async fn list_users(&self) -> Result<Vec<User>, DomainError>;

    /// Create a new user. Fails with `AlreadyExists` on a duplicate email.
    async fn create_user(&self, user: &NewUser) -> Result<User, DomainError>;
}

/// Repository for Activity entities
#[async_trait]
pub trait ActivityRepository: Send + Sync {
    async fn find_activity(&self, id: &ActivityId) -> Result<Option<Activity>, DomainError>;

    /// All activities, oldest first
    async fn list_activities(&self) -> Result<Vec<Activity>, DomainError>;

    async fn create_activity(&self, activity: &NewActivity) -> Result<Activity, DomainError>;
}

/// Repository for Expense entities
#[async_trait]
pub trait ExpenseRepository: Send + Sync {
    async fn find_expense(&self, id: &ExpenseId) -> Result<Option<Expense>, DomainError>;

    /// All expenses, oldest first
    async fn list_expenses(&self) -> Result<Vec<Expense>, DomainError>;

    async fn create_expense(&self, expense: &NewExpense) -> Result<Expense, DomainError>;
}

/// Repository for Payment entities
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn find_payment(&self, id: &PaymentId) -> Result<Option<Payment>, DomainError>;

    /// All payments, oldest first
    async fn list_payments(&self) -> Result<Vec<Payment>, DomainError>;

    async fn create_payment(&self, payment: &NewPayment) -> Result<Payment, DomainError>;
}

/// Append-only audit trail
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    async fn append_audit_log(&self, entry: &NewAuditLog) -> Result<AuditLog, DomainError>;

    /// Most recent entries first
    async fn list_audit_logs(&self, limit: u64) -> Result<Vec<AuditLog>, DomainError>;
}

/// Consistent reads of the whole ledger
#[async_trait]
pub trait LedgerReader: Send + Sync {
    /// Users, activities, expenses and payments as of a single instant.
    /// Writes that race with this call are either fully included or not at all.
    async fn snapshot(&self) -> Result<LedgerSnapshot, DomainError>;
}

/// Everything the application layer needs from a storage backend
pub trait LedgerStore:
    UserRepository
    + ActivityRepository
    + ExpenseRepository
    + PaymentRepository
    + AuditLogRepository
    + LedgerReader
    + 'static
{
}

impl<T> LedgerStore for T where
    T: UserRepository
        + ActivityRepository
        + ExpenseRepository
        + PaymentRepository
        + AuditLogRepository
        + LedgerReader
        + 'static
{
}
