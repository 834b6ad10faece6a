//! Balance service
//!
//! Reads one consistent snapshot of the ledger per query, runs the balance
//! engine over it, and attaches user names for display.

use std::collections::BTreeMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::balance_engine::{compute_balances, compute_net_balances, settle_activity};
use crate::domain::entities::{ActivityId, LedgerSnapshot, SettlementStrategy, UserId};
use crate::domain::ports::LedgerStore;
use crate::error::{AppError, DomainError};

/// A user as shown next to a balance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub id: UserId,
    pub name: String,
}

/// `debtor` owes `creditor` the given amount
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceView {
    pub debtor: UserSummary,
    pub creditor: UserSummary,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetBalanceView {
    pub user: UserSummary,
    pub net: Decimal,
}

/// debtor id -> creditor id -> amount
pub type ActivitySettlements = BTreeMap<UserId, BTreeMap<UserId, Decimal>>;

/// Service for deriving balances from the ledger
pub struct BalanceService<S: LedgerStore> {
    store: Arc<S>,
}

impl<S: LedgerStore> BalanceService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Who owes whom across the whole ledger
    pub async fn balances(
        &self,
        strategy: SettlementStrategy,
    ) -> Result<Vec<BalanceView>, AppError> {
        let snapshot = self.store.snapshot().await?;
        let balances = compute_balances(&snapshot, strategy)?;

        tracing::debug!(
            %strategy,
            expenses = snapshot.expenses.len(),
            payments = snapshot.payments.len(),
            transfers = balances.len(),
            "Computed balances"
        );

        Ok(balances
            .into_iter()
            .map(|b| BalanceView {
                debtor: summary(&snapshot, &b.debtor),
                creditor: summary(&snapshot, &b.creditor),
                amount: b.amount,
            })
            .collect())
    }

    /// Signed net of every user, zero nets included
    pub async fn net_balances(&self) -> Result<Vec<NetBalanceView>, AppError> {
        let snapshot = self.store.snapshot().await?;

        Ok(compute_net_balances(&snapshot)?
            .into_iter()
            .map(|n| NetBalanceView {
                user: summary(&snapshot, &n.user_id),
                net: n.net,
            })
            .collect())
    }

    /// Minimal settlement of one activity's expenses
    pub async fn activity_settlements(
        &self,
        activity_id: &ActivityId,
    ) -> Result<ActivitySettlements, AppError> {
        let snapshot = self.store.snapshot().await?;
        if !snapshot.activities.iter().any(|a| &a.id == activity_id) {
            return Err(DomainError::NotFound(format!("Activity {}", activity_id)).into());
        }

        let mut settlements = ActivitySettlements::new();
        for balance in settle_activity(&snapshot, activity_id)? {
            settlements
                .entry(balance.debtor)
                .or_default()
                .insert(balance.creditor, balance.amount);
        }

        Ok(settlements)
    }
}

/// The engine has already rejected unknown users, so a miss only happens
/// for ids that appear in no record.
fn summary(snapshot: &LedgerSnapshot, id: &UserId) -> UserSummary {
    UserSummary {
        id: *id,
        name: snapshot
            .user(id)
            .map(|u| u.name.clone())
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryLedgerStore;
    use crate::test_utils::{
        store_with_group, test_activity, test_expense, test_payment, FailingLedgerStore,
    };
    use rust_decimal_macros::dec;

    fn service(store: InMemoryLedgerStore) -> BalanceService<InMemoryLedgerStore> {
        BalanceService::new(Arc::new(store))
    }

    #[tokio::test]
    async fn empty_ledger_has_no_balances() {
        let service = service(InMemoryLedgerStore::new());

        assert!(service
            .balances(SettlementStrategy::Minimal)
            .await
            .unwrap()
            .is_empty());
        assert!(service.net_balances().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn expense_split_between_two() {
        let (store, users, activity) = store_with_group(&["A", "B"]);
        let (a, b) = (users[0].id, users[1].id);
        let service = service(store.with_expense(test_expense(dec!(10), a, activity.id, &[a, b])));

        let balances = service.balances(SettlementStrategy::Minimal).await.unwrap();

        assert_eq!(
            balances,
            vec![BalanceView {
                debtor: UserSummary {
                    id: b,
                    name: "B".to_string()
                },
                creditor: UserSummary {
                    id: a,
                    name: "A".to_string()
                },
                amount: dec!(5.00),
            }]
        );
        assert_eq!(balances[0].amount.to_string(), "5.00");
    }

    #[tokio::test]
    async fn payment_reduces_debt() {
        let (store, users, activity) = store_with_group(&["A", "B", "C"]);
        let (a, b, c) = (users[0].id, users[1].id, users[2].id);
        let service = service(
            store
                .with_expense(test_expense(dec!(10), a, activity.id, &[a, b, c]))
                .with_payment(test_payment(dec!(3), b, a)),
        );

        let balances = service.balances(SettlementStrategy::Minimal).await.unwrap();
        let owed: Vec<(String, String, Decimal)> = balances
            .into_iter()
            .map(|b| (b.debtor.name, b.creditor.name, b.amount))
            .collect();

        assert_eq!(
            owed,
            vec![
                ("C".to_string(), "A".to_string(), dec!(3.33)),
                ("B".to_string(), "A".to_string(), dec!(0.33)),
            ]
        );
    }

    #[tokio::test]
    async fn pairwise_strategy_keeps_pairs_separate() {
        let (store, users, activity) = store_with_group(&["A", "B", "C"]);
        let (a, b, c) = (users[0].id, users[1].id, users[2].id);
        // A owes B 10, B owes C 10: minimal collapses to A -> C
        let service = service(
            store
                .with_expense(test_expense(dec!(10), b, activity.id, &[a]))
                .with_expense(test_expense(dec!(10), c, activity.id, &[b])),
        );

        let minimal = service.balances(SettlementStrategy::Minimal).await.unwrap();
        let pairwise = service
            .balances(SettlementStrategy::Pairwise)
            .await
            .unwrap();

        assert_eq!(minimal.len(), 1);
        assert_eq!((minimal[0].debtor.id, minimal[0].creditor.id), (a, c));
        assert_eq!(pairwise.len(), 2);
    }

    #[tokio::test]
    async fn net_balances_include_every_user() {
        let (store, users, activity) = store_with_group(&["A", "B", "C"]);
        let (a, b) = (users[0].id, users[1].id);
        let service = service(store.with_expense(test_expense(dec!(10), a, activity.id, &[a, b])));

        let nets: Vec<Decimal> = service
            .net_balances()
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.net)
            .collect();

        assert_eq!(nets, vec![dec!(5.00), dec!(-5.00), dec!(0.00)]);
    }

    #[tokio::test]
    async fn activity_settlements_ignore_other_activities() {
        let (store, users, trip) = store_with_group(&["A", "B"]);
        let (a, b) = (users[0].id, users[1].id);
        let dinner = test_activity("Dinner", &[a, b]);
        let service = service(
            store
                .with_activity(dinner.clone())
                .with_expense(test_expense(dec!(30), a, trip.id, &[a, b]))
                .with_expense(test_expense(dec!(8), b, dinner.id, &[a, b]))
                .with_payment(test_payment(dec!(15), b, a)),
        );

        let trip_settlements = service.activity_settlements(&trip.id).await.unwrap();
        let dinner_settlements = service.activity_settlements(&dinner.id).await.unwrap();

        assert_eq!(trip_settlements[&b][&a], dec!(15.00));
        assert_eq!(dinner_settlements[&a][&b], dec!(4.00));
        assert_eq!(dinner_settlements.len(), 1);
    }

    #[tokio::test]
    async fn activity_settlements_for_unknown_activity_is_not_found() {
        let service = service(InMemoryLedgerStore::new());

        let result = service.activity_settlements(&ActivityId::new()).await;

        assert!(matches!(
            result,
            Err(AppError::Domain(DomainError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn snapshot_failure_is_a_database_error() {
        let service = BalanceService::new(Arc::new(FailingLedgerStore));

        assert!(matches!(
            service.balances(SettlementStrategy::Minimal).await,
            Err(AppError::Domain(DomainError::Database(_)))
        ));
    }
}
