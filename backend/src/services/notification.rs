//! Milestone email outbox
//!
//! The four notifier operations each look up what they need by shipment id
//! and queue rows in `notification_logs`. Rendering and SMTP delivery belong
//! to the external mailer that drains the table.

use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::NotificationConfig;
use crate::error::{AppError, AppResult};
use crate::models::{NotificationKind, Shipment, ShipmentRow, SHIPMENT_COLUMNS};

/// Notification service queuing milestone emails
#[derive(Clone)]
pub struct NotificationService {
    db: PgPool,
    config: NotificationConfig,
}

/// Data a milestone email is composed from
#[derive(Debug, Clone)]
pub struct MilestoneContext {
    pub shipment: Shipment,
    /// Contact on the pickup form, if one was submitted
    pub contact_email: Option<String>,
    /// Engineer on the inline delivery details, if any
    pub engineer_email: Option<String>,
}

/// One queued email
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundEmail {
    pub kind: NotificationKind,
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// Compose the emails for a milestone.
///
/// Recipients fall back to the logistics inbox when the shipment carries no
/// address of its own.
pub fn compose(
    kind: NotificationKind,
    ctx: &MilestoneContext,
    config: &NotificationConfig,
) -> Vec<OutboundEmail> {
    let shipment = &ctx.shipment;
    let reference = &shipment.jira_ticket_number;
    let logistics = config.logistics_email.clone();

    let (recipients, subject, body) = match kind {
        NotificationKind::PickupConfirmation => (
            vec![ctx.contact_email.clone().unwrap_or(logistics)],
            format!("Pickup scheduled for shipment {}", reference),
            format!(
                "The courier pickup for shipment {} ({} laptop(s)) has been scheduled.",
                reference, shipment.laptop_count
            ),
        ),
        NotificationKind::WarehousePreAlert => (
            vec![config.warehouse_email.clone()],
            format!("Incoming shipment {}", reference),
            format!(
                "Shipment {} is in transit to the warehouse with {} laptop(s). Courier: {}. Tracking: {}.",
                reference,
                shipment.laptop_count,
                shipment.courier_name.as_deref().unwrap_or("unknown"),
                shipment.tracking_number.as_deref().unwrap_or("none"),
            ),
        ),
        NotificationKind::ReleaseNotification => (
            vec![ctx.engineer_email.clone().unwrap_or(logistics)],
            format!("Your laptop has left the warehouse ({})", reference),
            format!(
                "Shipment {} has been released from the warehouse and is on its way.",
                reference
            ),
        ),
        NotificationKind::DeliveryConfirmation => {
            let mut recipients = vec![logistics];
            if let Some(contact) = ctx.contact_email.clone() {
                recipients.push(contact);
            }
            (
                recipients,
                format!("Shipment {} delivered", reference),
                format!("Shipment {} has been delivered.", reference),
            )
        }
    };

    recipients
        .into_iter()
        .map(|recipient| OutboundEmail {
            kind,
            recipient,
            subject: subject.clone(),
            body: body.clone(),
        })
        .collect()
}

impl NotificationService {
    pub fn new(db: PgPool, config: NotificationConfig) -> Self {
        Self { db, config }
    }

    pub async fn send_pickup_confirmation(&self, shipment_id: Uuid) -> AppResult<usize> {
        self.queue(NotificationKind::PickupConfirmation, shipment_id)
            .await
    }

    pub async fn send_warehouse_pre_alert(&self, shipment_id: Uuid) -> AppResult<usize> {
        self.queue(NotificationKind::WarehousePreAlert, shipment_id)
            .await
    }

    pub async fn send_release_notification(&self, shipment_id: Uuid) -> AppResult<usize> {
        self.queue(NotificationKind::ReleaseNotification, shipment_id)
            .await
    }

    pub async fn send_delivery_confirmation(&self, shipment_id: Uuid) -> AppResult<usize> {
        self.queue(NotificationKind::DeliveryConfirmation, shipment_id)
            .await
    }

    /// Fire-and-forget wrapper used after a status change commits
    pub async fn dispatch(&self, kind: NotificationKind, shipment_id: Uuid) {
        let result = match kind {
            NotificationKind::PickupConfirmation => self.send_pickup_confirmation(shipment_id).await,
            NotificationKind::WarehousePreAlert => self.send_warehouse_pre_alert(shipment_id).await,
            NotificationKind::ReleaseNotification => {
                self.send_release_notification(shipment_id).await
            }
            NotificationKind::DeliveryConfirmation => {
                self.send_delivery_confirmation(shipment_id).await
            }
        };

        if let Err(e) = result {
            tracing::warn!(
                kind = kind.as_str(),
                %shipment_id,
                error = %e,
                "Failed to queue notification"
            );
        }
    }

    async fn queue(&self, kind: NotificationKind, shipment_id: Uuid) -> AppResult<usize> {
        if !self.config.enabled {
            tracing::debug!(kind = kind.as_str(), %shipment_id, "Notifications disabled");
            return Ok(0);
        }

        let ctx = self.load_context(shipment_id).await?;
        let emails = compose(kind, &ctx, &self.config);

        for email in &emails {
            sqlx::query(
                r#"
                INSERT INTO notification_logs (shipment_id, kind, recipient, sender, subject, body)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(shipment_id)
            .bind(email.kind.as_str())
            .bind(&email.recipient)
            .bind(&self.config.from_address)
            .bind(&email.subject)
            .bind(&email.body)
            .execute(&self.db)
            .await?;
        }

        tracing::info!(kind = kind.as_str(), %shipment_id, count = emails.len(), "Queued notification");
        Ok(emails.len())
    }

    async fn load_context(&self, shipment_id: Uuid) -> AppResult<MilestoneContext> {
        let shipment: Shipment = sqlx::query_as::<_, ShipmentRow>(&format!(
            "SELECT {} FROM shipments WHERE id = $1",
            SHIPMENT_COLUMNS
        ))
        .bind(shipment_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Shipment".to_string()))?
        .try_into()?;

        let contact_email: Option<String> = sqlx::query_scalar(
            "SELECT form_data->>'contact_email' FROM pickup_forms WHERE shipment_id = $1",
        )
        .bind(shipment_id)
        .fetch_optional(&self.db)
        .await?
        .flatten();

        let engineer_email = shipment
            .delivery_details
            .as_ref()
            .and_then(|d| d.get("engineer_email"))
            .and_then(|e| e.as_str())
            .map(str::to_string);

        Ok(MilestoneContext {
            shipment,
            contact_email,
            engineer_email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shared::{ShipmentStatus, ShipmentType, StageTimestamps};

    fn config() -> NotificationConfig {
        NotificationConfig {
            enabled: true,
            from_address: "no-reply@test".to_string(),
            warehouse_email: "warehouse@test".to_string(),
            logistics_email: "logistics@test".to_string(),
        }
    }

    fn ctx(contact: Option<&str>, engineer: Option<&str>) -> MilestoneContext {
        MilestoneContext {
            shipment: Shipment {
                id: Uuid::new_v4(),
                shipment_type: ShipmentType::SingleFullJourney,
                status: ShipmentStatus::PickupScheduled,
                client_company_id: Uuid::new_v4(),
                software_engineer_id: None,
                laptop_count: 1,
                timestamps: StageTimestamps::default(),
                courier_name: Some("FedEx".to_string()),
                tracking_number: None,
                second_tracking_number: None,
                jira_ticket_number: "SCOP-42".to_string(),
                notes: None,
                delivery_details: None,
                created_by: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            contact_email: contact.map(str::to_string),
            engineer_email: engineer.map(str::to_string),
        }
    }

    #[test]
    fn test_pickup_confirmation_goes_to_contact() {
        let emails = compose(
            NotificationKind::PickupConfirmation,
            &ctx(Some("client@acme.test"), None),
            &config(),
        );
        assert_eq!(emails.len(), 1);
        assert_eq!(emails[0].recipient, "client@acme.test");
        assert!(emails[0].subject.contains("SCOP-42"));
    }

    #[test]
    fn test_pre_alert_goes_to_warehouse() {
        let emails = compose(NotificationKind::WarehousePreAlert, &ctx(None, None), &config());
        assert_eq!(emails[0].recipient, "warehouse@test");
        assert!(emails[0].body.contains("FedEx"));
    }

    #[test]
    fn test_release_falls_back_to_logistics() {
        let emails = compose(NotificationKind::ReleaseNotification, &ctx(None, None), &config());
        assert_eq!(emails[0].recipient, "logistics@test");

        let emails = compose(
            NotificationKind::ReleaseNotification,
            &ctx(None, Some("dev@acme.test")),
            &config(),
        );
        assert_eq!(emails[0].recipient, "dev@acme.test");
    }

    #[test]
    fn test_delivery_confirmation_copies_contact() {
        let emails = compose(
            NotificationKind::DeliveryConfirmation,
            &ctx(Some("client@acme.test"), None),
            &config(),
        );
        let recipients: Vec<_> = emails.iter().map(|e| e.recipient.as_str()).collect();
        assert_eq!(recipients, vec!["logistics@test", "client@acme.test"]);
    }
}
