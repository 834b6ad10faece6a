//! In-memory ledger store
//!
//! Keeps the whole ledger behind one `RwLock`, which gives single-writer
//! semantics and lets `snapshot` read every collection under one guard.
//! Used when no database is configured, and by tests.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::entities::{
    Activity, ActivityId, AuditLog, AuditLogId, Expense, ExpenseId, LedgerSnapshot, NewActivity,
    NewAuditLog, NewExpense, NewPayment, NewUser, Payment, PaymentId, User, UserId,
};
use crate::domain::ports::{
    ActivityRepository, AuditLogRepository, ExpenseRepository, LedgerReader, PaymentRepository,
    UserRepository,
};
use crate::error::DomainError;

#[derive(Debug, Default)]
struct LedgerState {
    users: Vec<User>,
    activities: Vec<Activity>,
    expenses: Vec<Expense>,
    payments: Vec<Payment>,
    audit_logs: Vec<AuditLog>,
}

#[derive(Clone, Default)]
pub struct InMemoryLedgerStore {
    state: Arc<RwLock<LedgerState>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, LedgerState>, DomainError> {
        self.state
            .read()
            .map_err(|_| DomainError::Internal("ledger lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, LedgerState>, DomainError> {
        self.state
            .write()
            .map_err(|_| DomainError::Internal("ledger lock poisoned".to_string()))
    }
}

#[cfg(test)]
impl InMemoryLedgerStore {
    /// Pre-populate with a user for testing
    pub fn with_user(self, user: User) -> Self {
        self.state.write().unwrap().users.push(user);
        self
    }

    /// Pre-populate with an activity for testing
    pub fn with_activity(self, activity: Activity) -> Self {
        self.state.write().unwrap().activities.push(activity);
        self
    }

    /// Pre-populate with an expense for testing (no validation)
    pub fn with_expense(self, expense: Expense) -> Self {
        self.state.write().unwrap().expenses.push(expense);
        self
    }

    /// Pre-populate with a payment for testing (no validation)
    pub fn with_payment(self, payment: Payment) -> Self {
        self.state.write().unwrap().payments.push(payment);
        self
    }
}

#[async_trait]
impl UserRepository for InMemoryLedgerStore {
    async fn find_user(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        Ok(self.read()?.users.iter().find(|u| &u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        Ok(self
            .read()?
            .users
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, DomainError> {
        Ok(self.read()?.users.clone())
    }

    async fn create_user(&self, new_user: &NewUser) -> Result<User, DomainError> {
        let mut state = self.write()?;

        if state.users.iter().any(|u| u.email == new_user.email) {
            return Err(DomainError::AlreadyExists(format!(
                "User with email '{}' already exists",
                new_user.email
            )));
        }

        let user = User {
            id: UserId::new(),
            name: new_user.name.clone(),
            email: new_user.email.clone(),
            payment_details: new_user.payment_details.clone(),
            created_at: Utc::now(),
        };
        state.users.push(user.clone());

        Ok(user)
    }
}

#[async_trait]
impl ActivityRepository for InMemoryLedgerStore {
    async fn find_activity(&self, id: &ActivityId) -> Result<Option<Activity>, DomainError> {
        Ok(self
            .read()?
            .activities
            .iter()
            .find(|a| &a.id == id)
            .cloned())
    }

    async fn list_activities(&self) -> Result<Vec<Activity>, DomainError> {
        Ok(self.read()?.activities.clone())
    }

    async fn create_activity(&self, new_activity: &NewActivity) -> Result<Activity, DomainError> {
        let activity = Activity {
            id: ActivityId::new(),
            name: new_activity.name.clone(),
            participants: new_activity.participants.clone(),
            created_at: Utc::now(),
        };
        self.write()?.activities.push(activity.clone());

        Ok(activity)
    }
}

#[async_trait]
impl ExpenseRepository for InMemoryLedgerStore {
    async fn find_expense(&self, id: &ExpenseId) -> Result<Option<Expense>, DomainError> {
        Ok(self.read()?.expenses.iter().find(|e| &e.id == id).cloned())
    }

    async fn list_expenses(&self) -> Result<Vec<Expense>, DomainError> {
        Ok(self.read()?.expenses.clone())
    }

    async fn create_expense(&self, new_expense: &NewExpense) -> Result<Expense, DomainError> {
        let expense = Expense {
            id: ExpenseId::new(),
            amount: new_expense.amount,
            paid_by_user_id: new_expense.paid_by_user_id,
            activity_id: new_expense.activity_id,
            participants: new_expense.participants.clone(),
            description: new_expense.description.clone(),
            created_at: Utc::now(),
        };
        self.write()?.expenses.push(expense.clone());

        Ok(expense)
    }
}

#[async_trait]
impl PaymentRepository for InMemoryLedgerStore {
    async fn find_payment(&self, id: &PaymentId) -> Result<Option<Payment>, DomainError> {
        Ok(self.read()?.payments.iter().find(|p| &p.id == id).cloned())
    }

    async fn list_payments(&self) -> Result<Vec<Payment>, DomainError> {
        Ok(self.read()?.payments.clone())
    }

    async fn create_payment(&self, new_payment: &NewPayment) -> Result<Payment, DomainError> {
        let payment = Payment {
            id: PaymentId::new(),
            amount: new_payment.amount,
            from_user_id: new_payment.from_user_id,
            to_user_id: new_payment.to_user_id,
            created_at: Utc::now(),
        };
        self.write()?.payments.push(payment.clone());

        Ok(payment)
    }
}

#[async_trait]
impl AuditLogRepository for InMemoryLedgerStore {
    async fn append_audit_log(&self, entry: &NewAuditLog) -> Result<AuditLog, DomainError> {
        let log = AuditLog {
            id: AuditLogId::new(),
            timestamp: Utc::now(),
            action: entry.action,
            entity_type: entry.entity_type,
            entity_id: entry.entity_id,
            user_id: entry.user_id,
            details: entry.details.clone(),
        };
        self.write()?.audit_logs.push(log.clone());

        Ok(log)
    }

    async fn list_audit_logs(&self, limit: u64) -> Result<Vec<AuditLog>, DomainError> {
        Ok(self
            .read()?
            .audit_logs
            .iter()
            .rev()
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl LedgerReader for InMemoryLedgerStore {
    async fn snapshot(&self) -> Result<LedgerSnapshot, DomainError> {
        let state = self.read()?;
        Ok(LedgerSnapshot {
            users: state.users.clone(),
            activities: state.activities.clone(),
            expenses: state.expenses.clone(),
            payments: state.payments.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Amount, AuditAction, EntityType};
    use rust_decimal_macros::dec;

    fn new_user(name: &str) -> NewUser {
        NewUser {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            payment_details: None,
        }
    }

    #[tokio::test]
    async fn create_and_find_user() {
        let store = InMemoryLedgerStore::new();

        let user = store.create_user(&new_user("Alice")).await.unwrap();

        assert_eq!(store.find_user(&user.id).await.unwrap(), Some(user.clone()));
        assert_eq!(
            store
                .find_user_by_email("alice@example.com")
                .await
                .unwrap()
                .map(|u| u.id),
            Some(user.id)
        );
        assert!(store.find_user(&UserId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = InMemoryLedgerStore::new();
        store.create_user(&new_user("Alice")).await.unwrap();

        let result = store.create_user(&new_user("Alice")).await;

        assert!(matches!(result, Err(DomainError::AlreadyExists(_))));
        assert_eq!(store.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn lists_keep_creation_order() {
        let store = InMemoryLedgerStore::new();
        let a = store.create_user(&new_user("A")).await.unwrap();
        let b = store.create_user(&new_user("B")).await.unwrap();

        let ids: Vec<UserId> = store
            .list_users()
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.id)
            .collect();

        assert_eq!(ids, vec![a.id, b.id]);
    }

    #[tokio::test]
    async fn snapshot_contains_all_records() {
        let store = InMemoryLedgerStore::new();
        let a = store.create_user(&new_user("A")).await.unwrap();
        let b = store.create_user(&new_user("B")).await.unwrap();
        let activity = store
            .create_activity(&NewActivity {
                name: "Trip".to_string(),
                participants: vec![a.id, b.id],
            })
            .await
            .unwrap();
        store
            .create_expense(&NewExpense {
                amount: Amount::new(dec!(10)).unwrap(),
                paid_by_user_id: a.id,
                activity_id: activity.id,
                participants: vec![a.id, b.id],
                description: None,
            })
            .await
            .unwrap();
        store
            .create_payment(&NewPayment {
                amount: Amount::new(dec!(5)).unwrap(),
                from_user_id: b.id,
                to_user_id: a.id,
            })
            .await
            .unwrap();

        let snapshot = store.snapshot().await.unwrap();

        assert_eq!(snapshot.users.len(), 2);
        assert_eq!(snapshot.activities.len(), 1);
        assert_eq!(snapshot.expenses.len(), 1);
        assert_eq!(snapshot.payments.len(), 1);
    }

    #[tokio::test]
    async fn audit_logs_newest_first_with_limit() {
        let store = InMemoryLedgerStore::new();
        for _ in 0..3 {
            store
                .append_audit_log(&NewAuditLog::created(EntityType::User, uuid::Uuid::new_v4()))
                .await
                .unwrap();
        }
        let last = store
            .append_audit_log(&NewAuditLog::created(EntityType::Payment, uuid::Uuid::new_v4()))
            .await
            .unwrap();

        let logs = store.list_audit_logs(2).await.unwrap();

        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].id, last.id);
        assert_eq!(logs[0].action, AuditAction::Create);
    }
}
