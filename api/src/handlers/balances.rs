//! Balance handlers
//!
//! Read-only views derived from the ledger on every request.

use axum::{
    extract::State,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::app::{ActivitySettlements, BalanceView, NetBalanceView};
use crate::domain::entities::{ActivityId, SettlementStrategy};
use crate::domain::ports::LedgerStore;
use crate::error::AppError;
use crate::handlers::extract::{PathParam, QueryParams};
use crate::AppState;

/// Query parameters for the balance list
#[derive(Debug, Deserialize)]
pub struct BalancesQuery {
    #[serde(default)]
    pub strategy: SettlementStrategy,
}

/// GET /balances/?strategy=minimal|pairwise
pub async fn get_balances<S: LedgerStore>(
    State(state): State<AppState<S>>,
    QueryParams(query): QueryParams<BalancesQuery>,
) -> Result<Json<Vec<BalanceView>>, AppError> {
    Ok(Json(state.balance_service.balances(query.strategy).await?))
}

/// GET /balances/net
pub async fn get_net_balances<S: LedgerStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<NetBalanceView>>, AppError> {
    Ok(Json(state.balance_service.net_balances().await?))
}

/// GET /settlements/:activity_id
///
/// Settle one activity on its own: `{debtor_id: {creditor_id: amount}}`.
pub async fn get_activity_settlements<S: LedgerStore>(
    State(state): State<AppState<S>>,
    PathParam(activity_id): PathParam<Uuid>,
) -> Result<Json<ActivitySettlements>, AppError> {
    Ok(Json(
        state
            .balance_service
            .activity_settlements(&ActivityId(activity_id))
            .await?,
    ))
}
