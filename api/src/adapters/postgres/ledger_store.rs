//! PostgreSQL adapter for the ledger ports
//!
//! Participant lists live in join tables with a `position` column so they
//! come back in the order they were written. Multi-row writes run in a
//! transaction and `snapshot` reads inside a repeatable-read, read-only one.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    AccessMode, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, IsolationLevel, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
    TransactionTrait,
};
use uuid::Uuid;

use crate::domain::entities::{
    Activity, ActivityId, Amount, AuditLog, AuditLogId, Expense, ExpenseId, LedgerSnapshot,
    NewActivity, NewAuditLog, NewExpense, NewPayment, NewUser, Payment, PaymentId, User, UserId,
};
use crate::domain::ports::{
    ActivityRepository, AuditLogRepository, ExpenseRepository, LedgerReader, PaymentRepository,
    UserRepository,
};
use crate::entity::{
    activities, activity_participants, audit_logs, expense_participants, expenses, payments,
    users,
};
use crate::error::DomainError;

/// PostgreSQL implementation of every ledger port
#[derive(Clone)]
pub struct PostgresLedgerStore {
    db: DatabaseConnection,
}

impl PostgresLedgerStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn db_err(e: DbErr) -> DomainError {
    DomainError::Database(e.to_string())
}

fn corrupt(what: &str, id: Uuid, reason: impl std::fmt::Display) -> DomainError {
    DomainError::Database(format!("corrupt {} row {}: {}", what, id, reason))
}

impl From<users::Model> for User {
    fn from(m: users::Model) -> Self {
        User {
            id: UserId(m.id),
            name: m.name,
            email: m.email,
            payment_details: m.payment_details,
            created_at: m.created_at.with_timezone(&Utc),
        }
    }
}

impl TryFrom<payments::Model> for Payment {
    type Error = DomainError;

    fn try_from(m: payments::Model) -> Result<Self, Self::Error> {
        Ok(Payment {
            id: PaymentId(m.id),
            amount: Amount::new(m.amount).map_err(|e| corrupt("payment", m.id, e))?,
            from_user_id: UserId(m.from_user_id),
            to_user_id: UserId(m.to_user_id),
            created_at: m.created_at.with_timezone(&Utc),
        })
    }
}

impl TryFrom<audit_logs::Model> for AuditLog {
    type Error = DomainError;

    fn try_from(m: audit_logs::Model) -> Result<Self, Self::Error> {
        Ok(AuditLog {
            id: AuditLogId(m.id),
            timestamp: m.timestamp.with_timezone(&Utc),
            action: m.action.parse().map_err(|e: String| corrupt("audit log", m.id, e))?,
            entity_type: m
                .entity_type
                .parse()
                .map_err(|e: String| corrupt("audit log", m.id, e))?,
            entity_id: m.entity_id,
            user_id: m.user_id.map(UserId),
            details: m.details,
        })
    }
}

fn into_activity(m: activities::Model, participants: Vec<UserId>) -> Activity {
    Activity {
        id: ActivityId(m.id),
        name: m.name,
        participants,
        created_at: m.created_at.with_timezone(&Utc),
    }
}

fn into_expense(m: expenses::Model, participants: Vec<UserId>) -> Result<Expense, DomainError> {
    Ok(Expense {
        id: ExpenseId(m.id),
        amount: Amount::new(m.amount).map_err(|e| corrupt("expense", m.id, e))?,
        paid_by_user_id: UserId(m.paid_by_user_id),
        activity_id: ActivityId(m.activity_id),
        participants,
        description: m.description,
        created_at: m.created_at.with_timezone(&Utc),
    })
}

async fn load_users<C: ConnectionTrait>(conn: &C) -> Result<Vec<User>, DomainError> {
    let rows = users::Entity::find()
        .order_by_asc(users::Column::CreatedAt)
        .all(conn)
        .await
        .map_err(db_err)?;

    Ok(rows.into_iter().map(Into::into).collect())
}

/// Participants of the given activities (all activities when `ids` is None)
async fn load_activity_participants<C: ConnectionTrait>(
    conn: &C,
    ids: Option<Vec<Uuid>>,
) -> Result<HashMap<Uuid, Vec<UserId>>, DomainError> {
    let mut query = activity_participants::Entity::find();
    if let Some(ids) = ids {
        query = query.filter(activity_participants::Column::ActivityId.is_in(ids));
    }
    let rows = query
        .order_by_asc(activity_participants::Column::Position)
        .all(conn)
        .await
        .map_err(db_err)?;

    let mut grouped: HashMap<Uuid, Vec<UserId>> = HashMap::new();
    for row in rows {
        grouped
            .entry(row.activity_id)
            .or_default()
            .push(UserId(row.user_id));
    }
    Ok(grouped)
}

async fn load_expense_participants<C: ConnectionTrait>(
    conn: &C,
    ids: Option<Vec<Uuid>>,
) -> Result<HashMap<Uuid, Vec<UserId>>, DomainError> {
    let mut query = expense_participants::Entity::find();
    if let Some(ids) = ids {
        query = query.filter(expense_participants::Column::ExpenseId.is_in(ids));
    }
    let rows = query
        .order_by_asc(expense_participants::Column::Position)
        .all(conn)
        .await
        .map_err(db_err)?;

    let mut grouped: HashMap<Uuid, Vec<UserId>> = HashMap::new();
    for row in rows {
        grouped
            .entry(row.expense_id)
            .or_default()
            .push(UserId(row.user_id));
    }
    Ok(grouped)
}

async fn load_activities<C: ConnectionTrait>(conn: &C) -> Result<Vec<Activity>, DomainError> {
    let rows = activities::Entity::find()
        .order_by_asc(activities::Column::CreatedAt)
        .all(conn)
        .await
        .map_err(db_err)?;
    let mut participants = load_activity_participants(conn, None).await?;

    Ok(rows
        .into_iter()
        .map(|m| {
            let members = participants.remove(&m.id).unwrap_or_default();
            into_activity(m, members)
        })
        .collect())
}

async fn load_expenses<C: ConnectionTrait>(conn: &C) -> Result<Vec<Expense>, DomainError> {
    let rows = expenses::Entity::find()
        .order_by_asc(expenses::Column::CreatedAt)
        .all(conn)
        .await
        .map_err(db_err)?;
    let mut participants = load_expense_participants(conn, None).await?;

    rows.into_iter()
        .map(|m| {
            let members = participants.remove(&m.id).unwrap_or_default();
            into_expense(m, members)
        })
        .collect()
}

async fn load_payments<C: ConnectionTrait>(conn: &C) -> Result<Vec<Payment>, DomainError> {
    let rows = payments::Entity::find()
        .order_by_asc(payments::Column::CreatedAt)
        .all(conn)
        .await
        .map_err(db_err)?;

    rows.into_iter().map(TryInto::try_into).collect()
}

#[async_trait]
impl UserRepository for PostgresLedgerStore {
    async fn find_user(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        let result = users::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(result.map(|m| m.into()))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let result = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(result.map(|m| m.into()))
    }

    async fn list_users(&self) -> Result<Vec<User>, DomainError> {
        load_users(&self.db).await
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, DomainError> {
        let model = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(user.name.clone()),
            email: Set(user.email.clone()),
            payment_details: Set(user.payment_details.clone()),
            created_at: Set(Utc::now().fixed_offset()),
        };

        let result = model.insert(&self.db).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => DomainError::AlreadyExists(format!(
                "User with email '{}' already exists",
                user.email
            )),
            _ => db_err(e),
        })?;

        Ok(result.into())
    }
}

#[async_trait]
impl ActivityRepository for PostgresLedgerStore {
    async fn find_activity(&self, id: &ActivityId) -> Result<Option<Activity>, DomainError> {
        let Some(model) = activities::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(db_err)?
        else {
            return Ok(None);
        };

        let participants = load_activity_participants(&self.db, Some(vec![model.id]))
            .await?
            .remove(&model.id)
            .unwrap_or_default();

        Ok(Some(into_activity(model, participants)))
    }

    async fn list_activities(&self) -> Result<Vec<Activity>, DomainError> {
        load_activities(&self.db).await
    }

    async fn create_activity(&self, activity: &NewActivity) -> Result<Activity, DomainError> {
        let id = Uuid::new_v4();
        let txn = self.db.begin().await.map_err(db_err)?;

        let model = activities::ActiveModel {
            id: Set(id),
            name: Set(activity.name.clone()),
            created_at: Set(Utc::now().fixed_offset()),
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        if !activity.participants.is_empty() {
            let rows = activity
                .participants
                .iter()
                .enumerate()
                .map(|(position, user)| activity_participants::ActiveModel {
                    activity_id: Set(id),
                    user_id: Set(user.0),
                    position: Set(position as i32),
                });
            activity_participants::Entity::insert_many(rows)
                .exec(&txn)
                .await
                .map_err(db_err)?;
        }

        txn.commit().await.map_err(db_err)?;

        Ok(into_activity(model, activity.participants.clone()))
    }
}

#[async_trait]
impl ExpenseRepository for PostgresLedgerStore {
    async fn find_expense(&self, id: &ExpenseId) -> Result<Option<Expense>, DomainError> {
        let Some(model) = expenses::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(db_err)?
        else {
            return Ok(None);
        };

        let participants = load_expense_participants(&self.db, Some(vec![model.id]))
            .await?
            .remove(&model.id)
            .unwrap_or_default();

        into_expense(model, participants).map(Some)
    }

    async fn list_expenses(&self) -> Result<Vec<Expense>, DomainError> {
        load_expenses(&self.db).await
    }

    async fn create_expense(&self, expense: &NewExpense) -> Result<Expense, DomainError> {
        let id = Uuid::new_v4();
        let txn = self.db.begin().await.map_err(db_err)?;

        let model = expenses::ActiveModel {
            id: Set(id),
            amount: Set(expense.amount.value()),
            paid_by_user_id: Set(expense.paid_by_user_id.0),
            activity_id: Set(expense.activity_id.0),
            description: Set(expense.description.clone()),
            created_at: Set(Utc::now().fixed_offset()),
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        if !expense.participants.is_empty() {
            let rows = expense
                .participants
                .iter()
                .enumerate()
                .map(|(position, user)| expense_participants::ActiveModel {
                    expense_id: Set(id),
                    user_id: Set(user.0),
                    position: Set(position as i32),
                });
            expense_participants::Entity::insert_many(rows)
                .exec(&txn)
                .await
                .map_err(db_err)?;
        }

        txn.commit().await.map_err(db_err)?;

        into_expense(model, expense.participants.clone())
    }
}

#[async_trait]
impl PaymentRepository for PostgresLedgerStore {
    async fn find_payment(&self, id: &PaymentId) -> Result<Option<Payment>, DomainError> {
        let result = payments::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(db_err)?;

        result.map(TryInto::try_into).transpose()
    }

    async fn list_payments(&self) -> Result<Vec<Payment>, DomainError> {
        load_payments(&self.db).await
    }

    async fn create_payment(&self, payment: &NewPayment) -> Result<Payment, DomainError> {
        let model = payments::ActiveModel {
            id: Set(Uuid::new_v4()),
            amount: Set(payment.amount.value()),
            from_user_id: Set(payment.from_user_id.0),
            to_user_id: Set(payment.to_user_id.0),
            created_at: Set(Utc::now().fixed_offset()),
        };

        model.insert(&self.db).await.map_err(db_err)?.try_into()
    }
}

#[async_trait]
impl AuditLogRepository for PostgresLedgerStore {
    async fn append_audit_log(&self, entry: &NewAuditLog) -> Result<AuditLog, DomainError> {
        let model = audit_logs::ActiveModel {
            id: Set(Uuid::new_v4()),
            timestamp: Set(Utc::now().fixed_offset()),
            action: Set(entry.action.to_string()),
            entity_type: Set(entry.entity_type.to_string()),
            entity_id: Set(entry.entity_id),
            user_id: Set(entry.user_id.map(|u| u.0)),
            details: Set(entry.details.clone()),
        };

        model.insert(&self.db).await.map_err(db_err)?.try_into()
    }

    async fn list_audit_logs(&self, limit: u64) -> Result<Vec<AuditLog>, DomainError> {
        let rows = audit_logs::Entity::find()
            .order_by_desc(audit_logs::Column::Timestamp)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}

#[async_trait]
impl LedgerReader for PostgresLedgerStore {
    async fn snapshot(&self) -> Result<LedgerSnapshot, DomainError> {
        let txn = self
            .db
            .begin_with_config(
                Some(IsolationLevel::RepeatableRead),
                Some(AccessMode::ReadOnly),
            )
            .await
            .map_err(db_err)?;

        let snapshot = LedgerSnapshot {
            users: load_users(&txn).await?,
            activities: load_activities(&txn).await?,
            expenses: load_expenses(&txn).await?,
            payments: load_payments(&txn).await?,
        };

        txn.commit().await.map_err(db_err)?;

        Ok(snapshot)
    }
}
