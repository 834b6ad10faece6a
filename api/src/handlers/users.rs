//! User handlers
//!
//! Endpoints for registering and looking up users.

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::entities::{NewUser, User, UserId};
use crate::domain::ports::LedgerStore;
use crate::error::AppError;
use crate::handlers::extract::{JsonBody, PathParam};
use crate::AppState;

/// Request to register a user
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    /// How the user wants to be paid back (IBAN, PayPal handle, ...)
    #[serde(default)]
    pub payment_details: Option<String>,
}

/// GET /users/
pub async fn list_users<S: LedgerStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(state.ledger_service.list_users().await?))
}

/// POST /users/
pub async fn create_user<S: LedgerStore>(
    State(state): State<AppState<S>>,
    JsonBody(req): JsonBody<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let user = state
        .ledger_service
        .create_user(NewUser {
            name: req.name,
            email: req.email,
            payment_details: req.payment_details,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /users/:id
pub async fn get_user<S: LedgerStore>(
    State(state): State<AppState<S>>,
    PathParam(id): PathParam<Uuid>,
) -> Result<Json<User>, AppError> {
    Ok(Json(state.ledger_service.get_user(&UserId(id)).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_payment_details_optional() {
        let req: CreateUserRequest =
            serde_json::from_str(r#"{"name": "Alice", "email": "alice@example.com"}"#).unwrap();
        assert_eq!(req.name, "Alice");
        assert!(req.payment_details.is_none());
    }
}
