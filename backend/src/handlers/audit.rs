//! Audit log handlers

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::AuditEntry;
use crate::services::AuditService;
use crate::AppState;

/// Query parameters selecting one audited record
#[derive(Debug, Deserialize)]
pub struct AuditLogQuery {
    pub entity_type: String,
    pub entity_id: Uuid,
}

/// List the audit trail of one record
pub async fn list_audit_logs(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<AuditLogQuery>,
) -> AppResult<Json<Vec<AuditEntry>>> {
    let service = AuditService::new(state.db);
    let entries = service
        .list_for_entity(&current_user.0, &query.entity_type, query.entity_id)
        .await?;
    Ok(Json(entries))
}
