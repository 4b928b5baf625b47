//! Pickup form submission and replacement

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    Actor, AuditAction, AuditEntity, PickupForm, PickupFormData, ShipmentType, UserRole,
};
use crate::services::records;
use crate::services::AuditService;
use shared::{check_bulk_pickup_form, check_pickup_form_submission};

/// Pickup form service
#[derive(Clone)]
pub struct PickupFormService {
    db: PgPool,
}

impl PickupFormService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Submit the first pickup form of a shipment, or replace it.
    ///
    /// On bulk shipments the form's `number_of_laptops` becomes the declared
    /// `laptop_count`.
    pub async fn submit_pickup_form(
        &self,
        actor: &Actor,
        shipment_id: Uuid,
        form: PickupFormData,
    ) -> AppResult<PickupForm> {
        actor.require_role(
            &[UserRole::Logistics, UserRole::Client],
            "submit pickup forms",
        )?;

        let mut tx = self.db.begin().await?;

        let shipment = records::lock_shipment(&mut tx, shipment_id).await?;
        actor.require_company(shipment.client_company_id)?;

        let has_form = records::has_pickup_form(&mut tx, shipment.id).await?;
        check_pickup_form_submission(&shipment, has_form)?;

        let mut laptop_count = shipment.laptop_count;
        if shipment.shipment_type == ShipmentType::BulkToWarehouse {
            check_bulk_pickup_form(&form)?;

            if let Some(declared) = form.number_of_laptops {
                let linked = records::count_linked_laptops(&mut tx, shipment.id).await?;
                if i64::from(declared) < linked {
                    return Err(AppError::Conflict {
                        resource: "shipment".to_string(),
                        message: format!(
                            "Shipment already holds {} laptops; the form declares {}",
                            linked, declared
                        ),
                    });
                }
                laptop_count = declared;
            }
        } else {
            form.check()?;
        }

        let saved = records::upsert_pickup_form(&mut tx, shipment.id, actor.user_id, &form).await?;

        if laptop_count != shipment.laptop_count {
            sqlx::query("UPDATE shipments SET laptop_count = $2, updated_at = NOW() WHERE id = $1")
                .bind(shipment.id)
                .bind(laptop_count)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        tracing::info!(%shipment_id, replaced = has_form, laptop_count, "Pickup form saved");
        AuditService::new(self.db.clone())
            .record_best_effort(
                actor,
                AuditAction::PickupFormSubmitted,
                AuditEntity::Shipment,
                shipment_id,
                serde_json::json!({
                    "replaced": has_form,
                    "previous_laptop_count": shipment.laptop_count,
                    "laptop_count": laptop_count,
                }),
            )
            .await;

        Ok(saved)
    }
}
