//! Ledger service
//!
//! Creates and reads users, activities, expenses and payments. Every
//! successful create is validated against the current ledger, persisted,
//! and recorded in the audit trail.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;

use crate::domain::balance_engine::{check_capacity, BalanceError};
use crate::domain::entities::{
    dedup_participants, Activity, ActivityId, AuditLog, EntityType, Expense, ExpenseId,
    LedgerSnapshot, NewActivity, NewAuditLog, NewExpense, NewPayment, NewUser, Payment,
    PaymentId, User, UserId,
};
use crate::domain::ports::LedgerStore;
use crate::error::{AppError, DomainError};

/// Service for recording ledger entries
pub struct LedgerService<S: LedgerStore> {
    store: Arc<S>,
}

impl<S: LedgerStore> LedgerService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    /// Register a user. Emails are unique, compared lowercased.
    pub async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let user = user.normalized().map_err(DomainError::Validation)?;

        if self.store.find_user_by_email(&user.email).await?.is_some() {
            return Err(DomainError::AlreadyExists(format!(
                "User with email '{}' already exists",
                user.email
            ))
            .into());
        }

        let created = self.store.create_user(&user).await?;

        self.audit(
            NewAuditLog::created(EntityType::User, created.id.0)
                .by(created.id)
                .with_details(json!({ "name": created.name, "email": created.email })),
        )
        .await;
        tracing::info!(user_id = %created.id, "User created");

        Ok(created)
    }

    pub async fn get_user(&self, id: &UserId) -> Result<User, AppError> {
        self.store
            .find_user(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("User {}", id)).into())
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        Ok(self.store.list_users().await?)
    }

    // ------------------------------------------------------------------
    // Activities
    // ------------------------------------------------------------------

    /// Create an activity. Repeated participant ids are collapsed and every
    /// participant must be a registered user.
    pub async fn create_activity(&self, activity: NewActivity) -> Result<Activity, AppError> {
        let name = activity.name.trim().to_string();
        if name.is_empty() || name.chars().count() > 100 {
            return Err(DomainError::Validation(
                "Activity name must be between 1 and 100 characters".to_string(),
            )
            .into());
        }

        let participants = dedup_participants(activity.participants);
        for user in &participants {
            self.require_user(user).await?;
        }

        let created = self
            .store
            .create_activity(&NewActivity { name, participants })
            .await?;

        self.audit(
            NewAuditLog::created(EntityType::Activity, created.id.0)
                .with_details(json!({ "name": created.name, "participants": created.participants })),
        )
        .await;
        tracing::info!(
            activity_id = %created.id,
            participants = created.participants.len(),
            "Activity created"
        );

        Ok(created)
    }

    pub async fn get_activity(&self, id: &ActivityId) -> Result<Activity, AppError> {
        self.store
            .find_activity(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Activity {}", id)).into())
    }

    pub async fn list_activities(&self) -> Result<Vec<Activity>, AppError> {
        Ok(self.store.list_activities().await?)
    }

    // ------------------------------------------------------------------
    // Expenses
    // ------------------------------------------------------------------

    /// Record an expense paid by one member of an activity and shared by
    /// some of its members.
    pub async fn create_expense(&self, expense: NewExpense) -> Result<Expense, AppError> {
        let participants = dedup_participants(expense.participants);
        if participants.is_empty() {
            return Err(DomainError::InvalidExpense(
                "An expense needs at least one participant".to_string(),
            )
            .into());
        }

        let activity = self.get_activity(&expense.activity_id).await?;

        self.require_user(&expense.paid_by_user_id).await?;
        if !activity.has_participant(&expense.paid_by_user_id) {
            return Err(DomainError::Validation(format!(
                "Payer {} is not a participant of activity {}",
                expense.paid_by_user_id, activity.id
            ))
            .into());
        }

        for user in &participants {
            self.require_user(user).await?;
            if !activity.has_participant(user) {
                return Err(DomainError::Validation(format!(
                    "User {} is not a participant of activity {}",
                    user, activity.id
                ))
                .into());
            }
        }

        let description = expense
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        let pending = Expense {
            id: ExpenseId::new(),
            amount: expense.amount,
            paid_by_user_id: expense.paid_by_user_id,
            activity_id: expense.activity_id,
            participants: participants.clone(),
            description: None,
            created_at: Utc::now(),
        };
        self.ensure_capacity(|ledger| ledger.expenses.push(pending), DomainError::InvalidExpense)
            .await?;

        let created = self
            .store
            .create_expense(&NewExpense {
                participants,
                description,
                ..expense
            })
            .await?;

        self.audit(
            NewAuditLog::created(EntityType::Expense, created.id.0)
                .by(created.paid_by_user_id)
                .with_details(json!({
                    "amount": created.amount,
                    "activity_id": created.activity_id,
                    "participants": created.participants,
                })),
        )
        .await;
        tracing::info!(
            expense_id = %created.id,
            activity_id = %created.activity_id,
            amount = %created.amount,
            "Expense recorded"
        );

        Ok(created)
    }

    pub async fn get_expense(&self, id: &ExpenseId) -> Result<Expense, AppError> {
        self.store
            .find_expense(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Expense {}", id)).into())
    }

    pub async fn list_expenses(&self) -> Result<Vec<Expense>, AppError> {
        Ok(self.store.list_expenses().await?)
    }

    // ------------------------------------------------------------------
    // Payments
    // ------------------------------------------------------------------

    /// Record a direct payment between two different users
    pub async fn create_payment(&self, payment: NewPayment) -> Result<Payment, AppError> {
        if payment.from_user_id == payment.to_user_id {
            return Err(DomainError::Validation(
                "A payment needs two different users".to_string(),
            )
            .into());
        }

        self.require_user(&payment.from_user_id).await?;
        self.require_user(&payment.to_user_id).await?;

        let pending = Payment {
            id: PaymentId::new(),
            amount: payment.amount,
            from_user_id: payment.from_user_id,
            to_user_id: payment.to_user_id,
            created_at: Utc::now(),
        };
        self.ensure_capacity(|ledger| ledger.payments.push(pending), DomainError::InvalidAmount)
            .await?;

        let created = self.store.create_payment(&payment).await?;

        self.audit(
            NewAuditLog::created(EntityType::Payment, created.id.0)
                .by(created.from_user_id)
                .with_details(json!({
                    "amount": created.amount,
                    "to_user_id": created.to_user_id,
                })),
        )
        .await;
        tracing::info!(
            payment_id = %created.id,
            from = %created.from_user_id,
            to = %created.to_user_id,
            amount = %created.amount,
            "Payment recorded"
        );

        Ok(created)
    }

    pub async fn get_payment(&self, id: &PaymentId) -> Result<Payment, AppError> {
        self.store
            .find_payment(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Payment {}", id)).into())
    }

    pub async fn list_payments(&self) -> Result<Vec<Payment>, AppError> {
        Ok(self.store.list_payments().await?)
    }

    // ------------------------------------------------------------------
    // Audit trail
    // ------------------------------------------------------------------

    /// Most recent audit entries first
    pub async fn list_audit_logs(&self, limit: u64) -> Result<Vec<AuditLog>, AppError> {
        Ok(self.store.list_audit_logs(limit).await?)
    }

    /// The ledger is append-only, so a record that would push balances past
    /// exact arithmetic is refused up front.
    async fn ensure_capacity(
        &self,
        add: impl FnOnce(&mut LedgerSnapshot),
        reject: fn(String) -> DomainError,
    ) -> Result<(), AppError> {
        let mut ledger = self.store.snapshot().await?;
        add(&mut ledger);

        match check_capacity(&ledger) {
            Ok(()) => Ok(()),
            Err(BalanceError::Overflow) => Err(reject(
                "Recording this would put balances beyond the supported range".to_string(),
            )
            .into()),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping ledger capacity check");
                Ok(())
            }
        }
    }

    async fn require_user(&self, id: &UserId) -> Result<User, AppError> {
        self.store
            .find_user(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("User {}", id)).into())
    }

    /// The entity is already stored, so a failed audit write only warns.
    async fn audit(&self, entry: NewAuditLog) {
        if let Err(e) = self.store.append_audit_log(&entry).await {
            tracing::warn!(
                error = %e,
                entity_type = %entry.entity_type,
                entity_id = %entry.entity_id,
                "Failed to write audit log"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryLedgerStore;
    use crate::domain::entities::{Amount, AuditAction, MAX_AMOUNT};
    use crate::test_utils::{store_with_group, test_expense, test_user, FailingLedgerStore};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn service(store: InMemoryLedgerStore) -> LedgerService<InMemoryLedgerStore> {
        LedgerService::new(Arc::new(store))
    }

    fn new_user(name: &str, email: &str) -> NewUser {
        NewUser {
            name: name.to_string(),
            email: email.to_string(),
            payment_details: None,
        }
    }

    #[tokio::test]
    async fn create_user_normalizes_and_audits() {
        let service = service(InMemoryLedgerStore::new());

        let user = service
            .create_user(new_user(" Alice ", "ALICE@example.com"))
            .await
            .unwrap();

        assert_eq!(user.name, "Alice");
        assert_eq!(user.email, "alice@example.com");
        assert_eq!(service.get_user(&user.id).await.unwrap(), user);

        let logs = service.list_audit_logs(10).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].action, AuditAction::Create);
        assert_eq!(logs[0].entity_type, EntityType::User);
        assert_eq!(logs[0].entity_id, user.id.0);
    }

    #[tokio::test]
    async fn create_user_rejects_duplicate_email_case_insensitively() {
        let service = service(InMemoryLedgerStore::new());
        service
            .create_user(new_user("Alice", "alice@example.com"))
            .await
            .unwrap();

        let result = service
            .create_user(new_user("Other", "Alice@Example.com"))
            .await;

        assert!(matches!(
            result,
            Err(AppError::Domain(DomainError::AlreadyExists(_)))
        ));
    }

    #[tokio::test]
    async fn create_user_rejects_bad_email() {
        let service = service(InMemoryLedgerStore::new());

        let result = service.create_user(new_user("Alice", "not-an-email")).await;

        assert!(matches!(
            result,
            Err(AppError::Domain(DomainError::Validation(_)))
        ));
    }

    #[tokio::test]
    async fn get_unknown_entities_is_not_found() {
        let service = service(InMemoryLedgerStore::new());

        assert!(matches!(
            service.get_user(&UserId::new()).await,
            Err(AppError::Domain(DomainError::NotFound(_)))
        ));
        assert!(matches!(
            service.get_activity(&ActivityId::new()).await,
            Err(AppError::Domain(DomainError::NotFound(_)))
        ));
        assert!(matches!(
            service.get_expense(&ExpenseId::new()).await,
            Err(AppError::Domain(DomainError::NotFound(_)))
        ));
        assert!(matches!(
            service.get_payment(&PaymentId::new()).await,
            Err(AppError::Domain(DomainError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn create_activity_dedups_participants() {
        let alice = test_user("Alice");
        let bob = test_user("Bob");
        let service = service(
            InMemoryLedgerStore::new()
                .with_user(alice.clone())
                .with_user(bob.clone()),
        );

        let activity = service
            .create_activity(NewActivity {
                name: "Ski trip".to_string(),
                participants: vec![alice.id, bob.id, alice.id],
            })
            .await
            .unwrap();

        assert_eq!(activity.participants, vec![alice.id, bob.id]);
    }

    #[tokio::test]
    async fn create_activity_allows_no_participants() {
        let service = service(InMemoryLedgerStore::new());

        let activity = service
            .create_activity(NewActivity {
                name: "Empty".to_string(),
                participants: vec![],
            })
            .await
            .unwrap();

        assert!(activity.participants.is_empty());
    }

    #[tokio::test]
    async fn create_activity_requires_known_users() {
        let service = service(InMemoryLedgerStore::new());

        let result = service
            .create_activity(NewActivity {
                name: "Trip".to_string(),
                participants: vec![UserId::new()],
            })
            .await;

        assert!(matches!(
            result,
            Err(AppError::Domain(DomainError::NotFound(_)))
        ));
        assert!(service.list_activities().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_expense_records_and_audits() {
        let (store, users, activity) = store_with_group(&["A", "B"]);
        let service = service(store);

        let expense = service
            .create_expense(NewExpense {
                amount: Amount::new(dec!(10)).unwrap(),
                paid_by_user_id: users[0].id,
                activity_id: activity.id,
                participants: vec![users[0].id, users[1].id, users[1].id],
                description: Some("  dinner ".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(expense.participants, vec![users[0].id, users[1].id]);
        assert_eq!(expense.description.as_deref(), Some("dinner"));
        assert_eq!(service.list_expenses().await.unwrap(), vec![expense.clone()]);

        let logs = service.list_audit_logs(10).await.unwrap();
        assert_eq!(logs[0].entity_type, EntityType::Expense);
        assert_eq!(logs[0].user_id, Some(users[0].id));
    }

    #[tokio::test]
    async fn create_expense_with_no_participants_is_invalid() {
        let (store, users, activity) = store_with_group(&["A", "B"]);
        let service = service(store);

        let result = service
            .create_expense(NewExpense {
                amount: Amount::new(dec!(10)).unwrap(),
                paid_by_user_id: users[0].id,
                activity_id: activity.id,
                participants: vec![],
                description: None,
            })
            .await;

        assert!(matches!(
            result,
            Err(AppError::Domain(DomainError::InvalidExpense(_)))
        ));
    }

    #[tokio::test]
    async fn create_expense_requires_activity_members() {
        let (store, users, activity) = store_with_group(&["A", "B"]);
        let outsider = test_user("Outsider");
        let service = service(store.with_user(outsider.clone()));

        let payer_outside = service
            .create_expense(NewExpense {
                amount: Amount::new(dec!(10)).unwrap(),
                paid_by_user_id: outsider.id,
                activity_id: activity.id,
                participants: vec![users[0].id],
                description: None,
            })
            .await;
        let participant_outside = service
            .create_expense(NewExpense {
                amount: Amount::new(dec!(10)).unwrap(),
                paid_by_user_id: users[0].id,
                activity_id: activity.id,
                participants: vec![users[1].id, outsider.id],
                description: None,
            })
            .await;

        assert!(matches!(
            payer_outside,
            Err(AppError::Domain(DomainError::Validation(_)))
        ));
        assert!(matches!(
            participant_outside,
            Err(AppError::Domain(DomainError::Validation(_)))
        ));
        assert!(service.list_expenses().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_expense_for_unknown_activity_is_not_found() {
        let (store, users, _) = store_with_group(&["A"]);
        let service = service(store);

        let result = service
            .create_expense(NewExpense {
                amount: Amount::new(dec!(1)).unwrap(),
                paid_by_user_id: users[0].id,
                activity_id: ActivityId::new(),
                participants: vec![users[0].id],
                description: None,
            })
            .await;

        assert!(matches!(
            result,
            Err(AppError::Domain(DomainError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn create_payment_between_same_user_is_rejected() {
        let (store, users, _) = store_with_group(&["A"]);
        let service = service(store);

        let result = service
            .create_payment(NewPayment {
                amount: Amount::new(dec!(3)).unwrap(),
                from_user_id: users[0].id,
                to_user_id: users[0].id,
            })
            .await;

        assert!(matches!(
            result,
            Err(AppError::Domain(DomainError::Validation(_)))
        ));
    }

    #[tokio::test]
    async fn create_payment_records_and_audits() {
        let (store, users, _) = store_with_group(&["A", "B"]);
        let service = service(store);

        let payment = service
            .create_payment(NewPayment {
                amount: Amount::new(dec!(3)).unwrap(),
                from_user_id: users[1].id,
                to_user_id: users[0].id,
            })
            .await
            .unwrap();

        assert_eq!(service.get_payment(&payment.id).await.unwrap(), payment);
        let logs = service.list_audit_logs(1).await.unwrap();
        assert_eq!(logs[0].entity_type, EntityType::Payment);
        assert_eq!(logs[0].entity_id, payment.id.0);
    }

    #[tokio::test]
    async fn storage_failures_surface_as_database_errors() {
        let service = LedgerService::new(Arc::new(FailingLedgerStore));

        assert!(matches!(
            service.list_users().await,
            Err(AppError::Domain(DomainError::Database(_)))
        ));
        assert!(matches!(
            service
                .create_user(new_user("Alice", "alice@example.com"))
                .await,
            Err(AppError::Domain(DomainError::Database(_)))
        ));
    }

    /// 53 members with one expense per group size 1..=53. The common
    /// denominator is then around 1.6e23, which a largest amount at four
    /// decimal places pushes past i128.
    fn crowded_ledger() -> (InMemoryLedgerStore, Vec<User>, Activity) {
        let names: Vec<String> = (1..=53).map(|n| format!("U{}", n)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let (store, users, activity) = store_with_group(&refs);

        let ids: Vec<UserId> = users.iter().map(|u| u.id).collect();
        let store = (1..=ids.len()).fold(store, |store, size| {
            store.with_expense(test_expense(dec!(1), ids[0], activity.id, &ids[..size]))
        });

        (store, users, activity)
    }

    #[tokio::test]
    async fn expense_beyond_exact_range_is_refused() {
        let (store, users, activity) = crowded_ledger();
        let service = service(store);
        let before = service.list_expenses().await.unwrap().len();

        let result = service
            .create_expense(NewExpense {
                amount: Amount::new(Decimal::from(MAX_AMOUNT) - dec!(0.0001)).unwrap(),
                paid_by_user_id: users[0].id,
                activity_id: activity.id,
                participants: vec![users[0].id, users[1].id],
                description: None,
            })
            .await;

        assert!(matches!(
            result,
            Err(AppError::Domain(DomainError::InvalidExpense(_)))
        ));
        assert_eq!(service.list_expenses().await.unwrap().len(), before);

        // an everyday amount still fits
        assert!(service
            .create_expense(NewExpense {
                amount: Amount::new(dec!(12.50)).unwrap(),
                paid_by_user_id: users[0].id,
                activity_id: activity.id,
                participants: vec![users[0].id, users[1].id],
                description: None,
            })
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn payment_beyond_exact_range_is_refused() {
        let (store, users, _) = crowded_ledger();
        let service = service(store);

        let result = service
            .create_payment(NewPayment {
                amount: Amount::new(Decimal::from(MAX_AMOUNT) - dec!(0.0001)).unwrap(),
                from_user_id: users[1].id,
                to_user_id: users[0].id,
            })
            .await;

        assert!(matches!(
            result,
            Err(AppError::Domain(DomainError::InvalidAmount(_)))
        ));
        assert!(service.list_payments().await.unwrap().is_empty());
    }
}
