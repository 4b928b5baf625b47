//! Append-only audit log
//!
//! Entries are written after the owning transaction commits, on the pool.
//! A failed write inside the transaction would abort it in Postgres, and an
//! audit failure must never undo the action it describes.

use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Actor, AuditAction, AuditEntity, AuditEntry, AuditRow, UserRole};

/// Audit service for recording mutating actions
#[derive(Clone)]
pub struct AuditService {
    db: PgPool,
}

impl AuditService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Insert one entry
    pub async fn record(
        &self,
        user_id: Option<Uuid>,
        action: AuditAction,
        entity: AuditEntity,
        entity_id: Uuid,
        details: Value,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (user_id, action, entity_type, entity_id, details)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user_id)
        .bind(action.as_str())
        .bind(entity.as_str())
        .bind(entity_id)
        .bind(details)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// Insert one entry, logging instead of failing
    pub async fn record_best_effort(
        &self,
        actor: &Actor,
        action: AuditAction,
        entity: AuditEntity,
        entity_id: Uuid,
        details: Value,
    ) {
        if let Err(e) = self
            .record(Some(actor.user_id), action, entity, entity_id, details)
            .await
        {
            tracing::warn!(
                action = action.as_str(),
                entity_type = entity.as_str(),
                %entity_id,
                error = %e,
                "Failed to write audit entry"
            );
        }
    }

    /// Entries for one record, newest first
    pub async fn list_for_entity(
        &self,
        actor: &Actor,
        entity_type: &str,
        entity_id: Uuid,
    ) -> AppResult<Vec<AuditEntry>> {
        actor.require_role(&[UserRole::Logistics], "read the audit log")?;
        let entity = AuditEntity::parse(entity_type).ok_or_else(|| {
            AppError::validation(
                "entity_type",
                format!("Unknown audit entity type '{}'", entity_type),
            )
        })?;

        let rows = sqlx::query_as::<_, AuditRow>(
            r#"
            SELECT id, user_id, action, entity_type, entity_id, details, created_at
            FROM audit_logs
            WHERE entity_type = $1 AND entity_id = $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(entity.as_str())
        .bind(entity_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(AuditEntry::from).collect())
    }
}
