//! Status transition execution
//!
//! The transition table in `shared::lifecycle` decides what a status change
//! means; this service applies the plan to the shipment, its laptops and
//! its links inside one transaction, then fires the audit entry and the
//! milestone email once the change is durable.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    Actor, AuditAction, AuditEntity, Shipment, ShipmentRow, ShipmentStatus, SHIPMENT_COLUMNS,
};
use crate::services::records;
use crate::services::{AuditService, NotificationService};
use shared::{check_engineer_assignment, plan_transition};

/// Body of a status change request
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusInput {
    pub status: String,
    /// Forecast arrival at the engineer; stamped on `in_transit_to_engineer`
    pub eta_to_engineer: Option<DateTime<Utc>>,
}

/// Lifecycle service applying status transitions
#[derive(Clone)]
pub struct LifecycleService {
    db: PgPool,
    notifications: NotificationService,
}

impl LifecycleService {
    pub fn new(db: PgPool, notifications: NotificationService) -> Self {
        Self { db, notifications }
    }

    /// Move a shipment to a new status
    pub async fn update_status(
        &self,
        actor: &Actor,
        shipment_id: Uuid,
        input: UpdateStatusInput,
    ) -> AppResult<Shipment> {
        let requested = ShipmentStatus::parse(&input.status).ok_or_else(|| {
            AppError::validation(
                "status",
                format!("Unknown shipment status '{}'", input.status),
            )
        })?;
        if !actor.can_set_status(requested) {
            return Err(AppError::Forbidden(format!(
                "Role '{}' may not set status '{}'",
                actor.role, requested
            )));
        }

        let mut tx = self.db.begin().await?;

        let shipment = records::lock_shipment(&mut tx, shipment_id).await?;
        let plan = plan_transition(shipment.shipment_type, shipment.status, requested)?;

        let mut timestamps = shipment.timestamps.clone();
        let stamped = plan.apply_timestamps(&mut timestamps, Utc::now(), input.eta_to_engineer);

        let updated: Shipment = sqlx::query_as::<_, ShipmentRow>(&format!(
            r#"
            UPDATE shipments
            SET status = $2,
                pickup_scheduled_date = $3,
                picked_up_at = $4,
                arrived_warehouse_at = $5,
                released_warehouse_at = $6,
                eta_to_engineer = $7,
                delivered_at = $8,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            SHIPMENT_COLUMNS
        ))
        .bind(shipment.id)
        .bind(plan.to.as_str())
        .bind(timestamps.pickup_scheduled_date)
        .bind(timestamps.picked_up_at)
        .bind(timestamps.arrived_warehouse_at)
        .bind(timestamps.released_warehouse_at)
        .bind(timestamps.eta_to_engineer)
        .bind(timestamps.delivered_at)
        .fetch_one(&mut *tx)
        .await?
        .try_into()?;

        let mut laptops_updated = 0;
        if let Some(laptop_status) = plan.laptop_status {
            laptops_updated =
                records::set_linked_laptop_status(&mut tx, shipment.id, laptop_status).await?;
        }
        records::set_links_active(&mut tx, shipment.id, plan.links_active).await?;

        tx.commit().await?;

        tracing::info!(
            %shipment_id,
            from = %plan.from,
            to = %plan.to,
            laptops_updated,
            "Shipment status updated"
        );
        AuditService::new(self.db.clone())
            .record_best_effort(
                actor,
                AuditAction::ShipmentStatusUpdated,
                AuditEntity::Shipment,
                shipment_id,
                serde_json::json!({
                    "from": plan.from,
                    "to": plan.to,
                    "stamped": stamped.map(|s| s.column()),
                    "laptop_status": plan.laptop_status,
                    "laptops_updated": laptops_updated,
                }),
            )
            .await;

        if let Some(kind) = plan.notify {
            let notifications = self.notifications.clone();
            tokio::spawn(async move { notifications.dispatch(kind, shipment_id).await });
        }

        Ok(updated)
    }

    /// Copy an engineer assignment onto every linked laptop.
    ///
    /// Runs on the caller's transaction so the shipment and its laptops never
    /// disagree about who the laptop is going to.
    pub async fn propagate_engineer(
        conn: &mut PgConnection,
        shipment: &Shipment,
        software_engineer_id: Uuid,
    ) -> AppResult<u64> {
        check_engineer_assignment(shipment.shipment_type)?;
        if !shipment.shipment_type.syncs_laptops() {
            return Ok(0);
        }
        let updated =
            records::set_linked_laptop_engineer(conn, shipment.id, software_engineer_id).await?;
        tracing::debug!(shipment_id = %shipment.id, updated, "Engineer propagated to laptops");
        Ok(updated)
    }
}
