//! Unified error types for the PalPay API
//!
//! This module defines error types for each layer:
//! - `DomainError`: Core business logic and storage errors
//! - `AppError`: Application layer errors (wraps domain errors for HTTP responses)
//!
//! Balance engine failures (`BalanceError`) convert into `DomainError`.
//! Extractor rejections convert into `AppError::BadRequest`, so malformed
//! requests get the same JSON body as every other error.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::domain::balance_engine::BalanceError;

/// Domain layer errors - pure business logic errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Entity already exists: {0}")]
    AlreadyExists(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid expense: {0}")]
    InvalidExpense(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<BalanceError> for DomainError {
    fn from(e: BalanceError) -> Self {
        match e {
            BalanceError::InvalidAmount(_)
            | BalanceError::AmountTooLarge(_)
            | BalanceError::AmountTooPrecise(_) => DomainError::InvalidAmount(e.to_string()),
            BalanceError::InvalidExpense(msg) => DomainError::InvalidExpense(msg),
            BalanceError::UnknownUser(id) => {
                DomainError::Internal(format!("ledger references unknown user {}", id))
            }
            BalanceError::Overflow => DomainError::Internal(e.to_string()),
        }
    }
}

/// Application layer errors - used by HTTP handlers
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("Invalid request: {0}")]
    BadRequest(String),
}

impl From<BalanceError> for AppError {
    fn from(e: BalanceError) -> Self {
        AppError::Domain(e.into())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// Error response body for JSON responses
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Domain(DomainError::NotFound(msg)) => {
                (StatusCode::NOT_FOUND, "Not found", Some(msg.clone()))
            }
            AppError::Domain(DomainError::AlreadyExists(msg)) => {
                (StatusCode::CONFLICT, "Already exists", Some(msg.clone()))
            }
            AppError::Domain(DomainError::Validation(msg)) => (
                StatusCode::BAD_REQUEST,
                "Validation error",
                Some(msg.clone()),
            ),
            AppError::Domain(DomainError::InvalidAmount(msg)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Invalid amount",
                Some(msg.clone()),
            ),
            AppError::Domain(DomainError::InvalidExpense(msg)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Invalid expense",
                Some(msg.clone()),
            ),
            AppError::Domain(DomainError::Database(msg)) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    None,
                )
            }
            AppError::Domain(DomainError::Internal(msg)) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    None,
                )
            }
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "Bad request", Some(msg.clone()))
            }
        };

        let body = Json(ErrorResponse {
            error: error.to_string(),
            details,
        });

        (status, body).into_response()
    }
}
