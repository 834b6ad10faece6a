//! Local ledger cache
//!
//! Mutations flow one way: the client sends a create, the server returns the
//! stored entity, and the entity is merged here. Nothing is refetched except
//! balances, which are marked stale by any expense or payment and reloaded
//! the next time they are asked for.

use uuid::Uuid;

use crate::client::PalPayClient;
use crate::error::ClientError;
use crate::models::{Activity, BalanceEntry, Expense, Payment, SettlementStrategy, User};

#[derive(Debug, Default)]
pub struct LedgerCache {
    users: Vec<User>,
    activities: Vec<Activity>,
    expenses: Vec<Expense>,
    payments: Vec<Payment>,
    balances: Option<(SettlementStrategy, Vec<BalanceEntry>)>,
}

/// Replace the entry with the same id, or append it
fn upsert<T>(items: &mut Vec<T>, item: T, id: impl Fn(&T) -> Uuid) {
    let key = id(&item);
    match items.iter_mut().find(|existing| id(existing) == key) {
        Some(existing) => *existing = item,
        None => items.push(item),
    }
}

impl LedgerCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill the cache with everything the server currently holds
    pub async fn load(client: &PalPayClient) -> Result<Self, ClientError> {
        Ok(Self {
            users: client.list_users().await?,
            activities: client.list_activities().await?,
            expenses: client.list_expenses().await?,
            payments: client.list_payments().await?,
            balances: None,
        })
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }

    pub fn expenses(&self) -> &[Expense] {
        &self.expenses
    }

    pub fn payments(&self) -> &[Payment] {
        &self.payments
    }

    pub fn user(&self, id: &Uuid) -> Option<&User> {
        self.users.iter().find(|u| &u.id == id)
    }

    pub fn activity(&self, id: &Uuid) -> Option<&Activity> {
        self.activities.iter().find(|a| &a.id == id)
    }

    /// Display name for a user id, falling back to the id itself
    pub fn user_name(&self, id: &Uuid) -> String {
        self.user(id)
            .map(|u| u.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    pub fn merge_user(&mut self, user: User) {
        upsert(&mut self.users, user, |u| u.id);
    }

    pub fn merge_activity(&mut self, activity: Activity) {
        upsert(&mut self.activities, activity, |a| a.id);
    }

    pub fn merge_expense(&mut self, expense: Expense) {
        upsert(&mut self.expenses, expense, |e| e.id);
        self.balances = None;
    }

    pub fn merge_payment(&mut self, payment: Payment) {
        upsert(&mut self.payments, payment, |p| p.id);
        self.balances = None;
    }

    pub fn set_balances(&mut self, strategy: SettlementStrategy, balances: Vec<BalanceEntry>) {
        self.balances = Some((strategy, balances));
    }

    /// Cached balances for `strategy`, if still fresh
    pub fn balances(&self, strategy: SettlementStrategy) -> Option<&[BalanceEntry]> {
        match &self.balances {
            Some((cached, balances)) if *cached == strategy => Some(balances),
            _ => None,
        }
    }

    pub fn balances_stale(&self) -> bool {
        self.balances.is_none()
    }

    /// Cached balances, refetched first when stale or computed with another
    /// strategy
    pub async fn balances_or_fetch(
        &mut self,
        client: &PalPayClient,
        strategy: SettlementStrategy,
    ) -> Result<&[BalanceEntry], ClientError> {
        if self.balances(strategy).is_none() {
            tracing::debug!(strategy = strategy.as_str(), "Refreshing balances");
            let fresh = client.balances(strategy).await?;
            self.set_balances(strategy, fresh);
        }

        Ok(self
            .balances
            .as_ref()
            .map(|(_, balances)| balances.as_slice())
            .unwrap_or_default())
    }
}
