//! Mock implementations of port traits
//!
//! `FailingLedgerStore` answers every call with a database error, for
//! exercising the error paths of services and handlers.

use async_trait::async_trait;

use crate::domain::entities::{
    Activity, ActivityId, AuditLog, Expense, ExpenseId, LedgerSnapshot, NewActivity, NewAuditLog,
    NewExpense, NewPayment, NewUser, Payment, PaymentId, User, UserId,
};
use crate::domain::ports::{
    ActivityRepository, AuditLogRepository, ExpenseRepository, LedgerReader, PaymentRepository,
    UserRepository,
};
use crate::error::DomainError;

/// Store whose every operation fails with `DomainError::Database`
#[derive(Clone, Default)]
pub struct FailingLedgerStore;

fn outage<T>() -> Result<T, DomainError> {
    Err(DomainError::Database("connection refused".to_string()))
}

#[async_trait]
impl UserRepository for FailingLedgerStore {
    async fn find_user(&self, _id: &UserId) -> Result<Option<User>, DomainError> {
        outage()
    }

    async fn find_user_by_email(&self, _email: &str) -> Result<Option<User>, DomainError> {
        outage()
    }

    async fn list_users(&self) -> Result<Vec<User>, DomainError> {
        outage()
    }

    async fn create_user(&self, _user: &NewUser) -> Result<User, DomainError> {
        outage()
    }
}

#[async_trait]
impl ActivityRepository for FailingLedgerStore {
    async fn find_activity(&self, _id: &ActivityId) -> Result<Option<Activity>, DomainError> {
        outage()
    }

    async fn list_activities(&self) -> Result<Vec<Activity>, DomainError> {
        outage()
    }

    async fn create_activity(&self, _activity: &NewActivity) -> Result<Activity, DomainError> {
        outage()
    }
}

#[async_trait]
impl ExpenseRepository for FailingLedgerStore {
    async fn find_expense(&self, _id: &ExpenseId) -> Result<Option<Expense>, DomainError> {
        outage()
    }

    async fn list_expenses(&self) -> Result<Vec<Expense>, DomainError> {
        outage()
    }

    async fn create_expense(&self, _expense: &NewExpense) -> Result<Expense, DomainError> {
        outage()
    }
}

#[async_trait]
impl PaymentRepository for FailingLedgerStore {
    async fn find_payment(&self, _id: &PaymentId) -> Result<Option<Payment>, DomainError> {
        outage()
    }

    async fn list_payments(&self) -> Result<Vec<Payment>, DomainError> {
        outage()
    }

    async fn create_payment(&self, _payment: &NewPayment) -> Result<Payment, DomainError> {
        outage()
    }
}

#[async_trait]
impl AuditLogRepository for FailingLedgerStore {
    async fn append_audit_log(&self, _entry: &NewAuditLog) -> Result<AuditLog, DomainError> {
        outage()
    }

    async fn list_audit_logs(&self, _limit: u64) -> Result<Vec<AuditLog>, DomainError> {
        outage()
    }
}

#[async_trait]
impl LedgerReader for FailingLedgerStore {
    async fn snapshot(&self) -> Result<LedgerSnapshot, DomainError> {
        outage()
    }
}
