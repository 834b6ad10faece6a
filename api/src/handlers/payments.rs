//! Payment handlers

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::entities::{Amount, NewPayment, Payment, PaymentId, UserId};
use crate::domain::ports::LedgerStore;
use crate::error::AppError;
use crate::handlers::extract::{JsonBody, PathParam};
use crate::AppState;

/// Request to record a direct payment from one user to another
#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    pub amount: Decimal,
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
}

/// GET /payments/
pub async fn list_payments<S: LedgerStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<Payment>>, AppError> {
    Ok(Json(state.ledger_service.list_payments().await?))
}

/// POST /payments/
pub async fn create_payment<S: LedgerStore>(
    State(state): State<AppState<S>>,
    JsonBody(req): JsonBody<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<Payment>), AppError> {
    let payment = state
        .ledger_service
        .create_payment(NewPayment {
            amount: Amount::new(req.amount)?,
            from_user_id: UserId(req.from_user_id),
            to_user_id: UserId(req.to_user_id),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(payment)))
}

/// GET /payments/:id
pub async fn get_payment<S: LedgerStore>(
    State(state): State<AppState<S>>,
    PathParam(id): PathParam<Uuid>,
) -> Result<Json<Payment>, AppError> {
    Ok(Json(state.ledger_service.get_payment(&PaymentId(id)).await?))
}
