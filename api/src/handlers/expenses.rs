//! Expense handlers
//!
//! Expense responses carry each participant's share in cents next to the
//! stored expense, so callers never split amounts themselves.

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::balance_engine::split_evenly;
use crate::domain::entities::{ActivityId, Amount, Expense, ExpenseId, NewExpense, Share, UserId};
use crate::domain::ports::LedgerStore;
use crate::error::AppError;
use crate::handlers::extract::{JsonBody, PathParam};
use crate::AppState;

/// Request to record an expense. `amount` may be a JSON number or string.
#[derive(Debug, Deserialize)]
pub struct CreateExpenseRequest {
    pub amount: Decimal,
    pub paid_by_user_id: Uuid,
    pub activity_id: Uuid,
    pub participants: Vec<Uuid>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExpenseResponse {
    #[serde(flatten)]
    pub expense: Expense,
    pub shares: Vec<Share>,
}

impl TryFrom<Expense> for ExpenseResponse {
    type Error = AppError;

    fn try_from(expense: Expense) -> Result<Self, Self::Error> {
        let shares = split_evenly(expense.amount, &expense.participants)?;
        Ok(Self { expense, shares })
    }
}

/// GET /expenses/
pub async fn list_expenses<S: LedgerStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<ExpenseResponse>>, AppError> {
    let expenses = state.ledger_service.list_expenses().await?;

    let responses = expenses
        .into_iter()
        .map(ExpenseResponse::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(responses))
}

/// POST /expenses/
pub async fn create_expense<S: LedgerStore>(
    State(state): State<AppState<S>>,
    JsonBody(req): JsonBody<CreateExpenseRequest>,
) -> Result<(StatusCode, Json<ExpenseResponse>), AppError> {
    let expense = state
        .ledger_service
        .create_expense(NewExpense {
            amount: Amount::new(req.amount)?,
            paid_by_user_id: UserId(req.paid_by_user_id),
            activity_id: ActivityId(req.activity_id),
            participants: req.participants.into_iter().map(UserId).collect(),
            description: req.description,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(expense.try_into()?)))
}

/// GET /expenses/:id
pub async fn get_expense<S: LedgerStore>(
    State(state): State<AppState<S>>,
    PathParam(id): PathParam<Uuid>,
) -> Result<Json<ExpenseResponse>, AppError> {
    let expense = state.ledger_service.get_expense(&ExpenseId(id)).await?;

    Ok(Json(expense.try_into()?))
}
