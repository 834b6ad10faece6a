//! Activity handlers

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::entities::{Activity, ActivityId, NewActivity, UserId};
use crate::domain::ports::LedgerStore;
use crate::error::AppError;
use crate::handlers::extract::{JsonBody, PathParam};
use crate::AppState;

/// Request to create an activity. Participants are required; an empty list
/// is allowed.
#[derive(Debug, Deserialize)]
pub struct CreateActivityRequest {
    pub name: String,
    pub participants: Vec<Uuid>,
}

/// GET /activities/
pub async fn list_activities<S: LedgerStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<Activity>>, AppError> {
    Ok(Json(state.ledger_service.list_activities().await?))
}

/// POST /activities/
pub async fn create_activity<S: LedgerStore>(
    State(state): State<AppState<S>>,
    JsonBody(req): JsonBody<CreateActivityRequest>,
) -> Result<(StatusCode, Json<Activity>), AppError> {
    let activity = state
        .ledger_service
        .create_activity(NewActivity {
            name: req.name,
            participants: req.participants.into_iter().map(UserId).collect(),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(activity)))
}

/// GET /activities/:id
pub async fn get_activity<S: LedgerStore>(
    State(state): State<AppState<S>>,
    PathParam(id): PathParam<Uuid>,
) -> Result<Json<Activity>, AppError> {
    Ok(Json(state.ledger_service.get_activity(&ActivityId(id)).await?))
}
