//! Client error types
//!
//! Server errors arrive as `{error, details?}` with an HTTP status. They are
//! mapped back onto the variants below so callers can tell a bad amount
//! from a missing user or a dead connection.

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid expense: {0}")]
    InvalidExpense(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    details: Option<String>,
}

impl ClientError {
    /// Map a non-success status and its body to a typed error
    pub fn from_status(status: u16, body: &str) -> Self {
        let parsed = serde_json::from_str::<ErrorBody>(body).ok();
        let message = match &parsed {
            Some(ErrorBody {
                details: Some(details),
                ..
            }) => details.clone(),
            Some(ErrorBody { error, .. }) => error.clone(),
            None => body.trim().to_string(),
        };

        match status {
            400 => ClientError::Validation(message),
            404 => ClientError::NotFound(message),
            409 => ClientError::Conflict(message),
            422 => match parsed.as_ref().map(|b| b.error.as_str()) {
                Some("Invalid amount") => ClientError::InvalidAmount(message),
                Some("Invalid expense") => ClientError::InvalidExpense(message),
                _ => ClientError::Api { status, message },
            },
            _ => ClientError::Api { status, message },
        }
    }
}
