//! Audit log handlers

use axum::{
    extract::State,
    Json,
};
use serde::Deserialize;

use crate::domain::entities::AuditLog;
use crate::domain::ports::LedgerStore;
use crate::error::AppError;
use crate::handlers::extract::QueryParams;
use crate::AppState;

const MAX_LIMIT: u64 = 1000;

/// Query parameters for listing audit entries
#[derive(Debug, Deserialize)]
pub struct AuditLogQuery {
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_limit() -> u64 {
    100
}

/// GET /audit-logs/?limit=N
///
/// Newest entries first. `limit` must be positive and is capped at 1000.
pub async fn list_audit_logs<S: LedgerStore>(
    State(state): State<AppState<S>>,
    QueryParams(query): QueryParams<AuditLogQuery>,
) -> Result<Json<Vec<AuditLog>>, AppError> {
    if query.limit == 0 {
        return Err(AppError::BadRequest("limit must be at least 1".to_string()));
    }
    let limit = query.limit.min(MAX_LIMIT);
    Ok(Json(state.ledger_service.list_audit_logs(limit).await?))
}
