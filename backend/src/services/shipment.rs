//! Shipment service: creation, edits, bulk linking and reads
//!
//! Each creation procedure runs in one transaction: the shipment row, any
//! laptop it creates or claims, the link and the pickup form snapshot commit
//! together or not at all.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    Actor, AuditAction, AuditEntity, Laptop, LaptopStatus, PickupForm, Shipment, ShipmentRow,
    ShipmentStatus, ShipmentType, UserRole, SHIPMENT_COLUMNS,
};
use crate::services::records::{self, NewShipment};
use crate::services::{AuditService, LifecycleService, NotificationService};
use shared::{
    can_edit, notification_for, check_bulk_link, check_engineer_shipment_laptop, route_creation_request,
    AddLaptopInput, BulkToWarehouseInput, CreateShipmentRequest, EditEligibility, Pagination,
    PaginatedResponse, PaginationMeta, SingleFullJourneyInput, UpdateShipmentInput,
    WarehouseToEngineerInput,
};

/// Shipment service for the creation and edit procedures
#[derive(Clone)]
pub struct ShipmentService {
    db: PgPool,
    notifications: Option<NotificationService>,
}

/// Shipment with everything a detail view needs
#[derive(Debug, Clone, Serialize)]
pub struct ShipmentDetail {
    #[serde(flatten)]
    pub shipment: Shipment,
    pub laptops: Vec<Laptop>,
    pub pickup_form: Option<PickupForm>,
    pub edit_eligibility: EditEligibility,
}

/// Filters for shipment listings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShipmentFilter {
    pub shipment_type: Option<String>,
    pub status: Option<String>,
    pub client_company_id: Option<Uuid>,
}

impl ShipmentFilter {
    fn parsed(&self) -> AppResult<(Option<ShipmentType>, Option<ShipmentStatus>)> {
        let shipment_type = self
            .shipment_type
            .as_deref()
            .map(|raw| {
                ShipmentType::parse(raw).ok_or_else(|| {
                    AppError::validation("shipment_type", format!("Unknown shipment type '{}'", raw))
                })
            })
            .transpose()?;
        let status = self
            .status
            .as_deref()
            .map(|raw| {
                ShipmentStatus::parse(raw).ok_or_else(|| {
                    AppError::validation("status", format!("Unknown shipment status '{}'", raw))
                })
            })
            .transpose()?;
        Ok((shipment_type, status))
    }
}

impl ShipmentService {
    /// Create a new ShipmentService instance
    pub fn new(db: PgPool) -> Self {
        Self {
            db,
            notifications: None,
        }
    }

    /// Queue milestone emails for shipments created already under way
    pub fn with_notifications(mut self, notifications: NotificationService) -> Self {
        self.notifications = Some(notifications);
        self
    }

    // ========================================================================
    // Creation
    // ========================================================================

    /// Route a raw creation body to its per-type procedure
    pub async fn create_shipment(
        &self,
        actor: &Actor,
        body: serde_json::Value,
    ) -> AppResult<ShipmentDetail> {
        let routed = route_creation_request(body)?;
        let request = routed.request;
        let shipment_type = request.shipment_type();

        if !actor.can_create(shipment_type) {
            return Err(AppError::Forbidden(format!(
                "Role '{}' may not create {} shipments",
                actor.role, shipment_type
            )));
        }
        actor.require_company(request.client_company_id())?;
        request.check()?;

        if routed.legacy {
            tracing::info!(user_id = %actor.user_id, "Legacy shipment request routed to single full journey");
        }

        let shipment = match request {
            CreateShipmentRequest::SingleFullJourney(input) => {
                self.create_single_full_journey(actor, input).await?
            }
            CreateShipmentRequest::BulkToWarehouse(input) => {
                self.create_bulk_to_warehouse(actor, input).await?
            }
            CreateShipmentRequest::WarehouseToEngineer(input) => {
                self.create_warehouse_to_engineer(actor, input).await?
            }
        };

        tracing::info!(
            shipment_id = %shipment.id,
            shipment_type = %shipment.shipment_type,
            laptop_count = shipment.laptop_count,
            "Shipment created"
        );
        AuditService::new(self.db.clone())
            .record_best_effort(
                actor,
                AuditAction::ShipmentCreated,
                AuditEntity::Shipment,
                shipment.id,
                serde_json::json!({
                    "shipment_type": shipment.shipment_type,
                    "laptop_count": shipment.laptop_count,
                    "jira_ticket_number": shipment.jira_ticket_number,
                    "legacy_request": routed.legacy,
                }),
            )
            .await;

        // Warehouse-to-engineer shipments start out released
        if let (Some(kind), Some(notifications)) =
            (notification_for(shipment.status), self.notifications.clone())
        {
            let shipment_id = shipment.id;
            tokio::spawn(async move { notifications.dispatch(kind, shipment_id).await });
        }

        self.get_shipment(actor, shipment.id).await
    }

    /// Shipment, auto-created laptop, link and pickup form in one go
    async fn create_single_full_journey(
        &self,
        actor: &Actor,
        input: SingleFullJourneyInput,
    ) -> AppResult<Shipment> {
        let mut tx = self.db.begin().await?;

        let shipment = records::insert_shipment(
            &mut tx,
            NewShipment {
                shipment_type: ShipmentType::SingleFullJourney,
                client_company_id: input.client_company_id,
                software_engineer_id: input.software_engineer_id,
                laptop_count: 1,
                released_warehouse_at: None,
                courier_name: input.courier_name,
                jira_ticket_number: input.jira_ticket_number,
                notes: input.notes,
                delivery_details: None,
                created_by: actor.user_id,
            },
        )
        .await?;

        let laptop = records::insert_laptop(
            &mut tx,
            &input.laptop,
            LaptopStatus::InTransitToWarehouse,
            Some(shipment.client_company_id),
            shipment.software_engineer_id,
        )
        .await?;
        records::link_laptop(&mut tx, shipment.id, laptop.id, shipment.is_active()).await?;
        records::upsert_pickup_form(&mut tx, shipment.id, actor.user_id, &input.pickup).await?;

        tx.commit().await?;
        Ok(shipment)
    }

    /// Bulk shipment with its declared count; laptops are linked later
    async fn create_bulk_to_warehouse(
        &self,
        actor: &Actor,
        input: BulkToWarehouseInput,
    ) -> AppResult<Shipment> {
        if actor.role == UserRole::Client && input.pickup_form.is_none() {
            return Err(AppError::validation(
                "pickup_form",
                "Clients must submit the pickup form with a bulk shipment",
            ));
        }

        // The client's form is the authoritative count
        let laptop_count = input
            .pickup_form
            .as_ref()
            .and_then(|form| form.number_of_laptops)
            .unwrap_or(input.laptop_count);

        let mut tx = self.db.begin().await?;

        let shipment = records::insert_shipment(
            &mut tx,
            NewShipment {
                shipment_type: ShipmentType::BulkToWarehouse,
                client_company_id: input.client_company_id,
                software_engineer_id: None,
                laptop_count,
                released_warehouse_at: None,
                courier_name: None,
                jira_ticket_number: input.jira_ticket_number,
                notes: input.notes,
                delivery_details: None,
                created_by: actor.user_id,
            },
        )
        .await?;

        if let Some(form) = &input.pickup_form {
            records::upsert_pickup_form(&mut tx, shipment.id, actor.user_id, form).await?;
        }

        tx.commit().await?;
        Ok(shipment)
    }

    /// Claim an inventoried laptop and send it to an engineer
    async fn create_warehouse_to_engineer(
        &self,
        actor: &Actor,
        input: WarehouseToEngineerInput,
    ) -> AppResult<Shipment> {
        let delivery_details = serde_json::to_value(&input.delivery)
            .map_err(|e| AppError::Internal(e.to_string()))?;

        let mut tx = self.db.begin().await?;

        let (laptop, state) = records::laptop_link_state(&mut tx, input.laptop_id).await?;
        check_engineer_shipment_laptop(input.client_company_id, &state)?;

        let shipment = records::insert_shipment(
            &mut tx,
            NewShipment {
                shipment_type: ShipmentType::WarehouseToEngineer,
                client_company_id: input.client_company_id,
                software_engineer_id: Some(input.software_engineer_id),
                laptop_count: 1,
                // Starts life already released
                released_warehouse_at: Some(Utc::now()),
                courier_name: input.courier_name,
                jira_ticket_number: input.jira_ticket_number,
                notes: input.notes,
                delivery_details: Some(delivery_details),
                created_by: actor.user_id,
            },
        )
        .await?;

        records::link_laptop(&mut tx, shipment.id, laptop.id, shipment.is_active()).await?;
        records::move_laptop(
            &mut tx,
            laptop.id,
            LaptopStatus::InTransitToEngineer,
            shipment.client_company_id,
            Some(input.software_engineer_id),
        )
        .await?;

        tx.commit().await?;
        Ok(shipment)
    }

    // ========================================================================
    // Bulk linking
    // ========================================================================

    /// Link an existing or newly registered laptop to a bulk shipment
    pub async fn add_laptop_to_bulk_shipment(
        &self,
        actor: &Actor,
        shipment_id: Uuid,
        input: AddLaptopInput,
    ) -> AppResult<Laptop> {
        actor.require_role(
            &[UserRole::Logistics, UserRole::Warehouse, UserRole::Client],
            "add laptops to shipments",
        )?;
        if let AddLaptopInput::New(details) = &input {
            details.check()?;
        }

        let mut tx = self.db.begin().await?;

        let shipment = records::lock_shipment(&mut tx, shipment_id).await?;
        actor.require_company(shipment.client_company_id)?;
        let linked = records::count_linked_laptops(&mut tx, shipment.id).await?;

        let laptop_id = match &input {
            AddLaptopInput::Existing { laptop_id } => *laptop_id,
            AddLaptopInput::New(details) => {
                records::insert_laptop(
                    &mut tx,
                    details,
                    LaptopStatus::Available,
                    Some(shipment.client_company_id),
                    None,
                )
                .await?
                .id
            }
        };

        let (_, state) = records::laptop_link_state(&mut tx, laptop_id).await?;
        check_bulk_link(&shipment, linked, &state)?;

        records::link_laptop(&mut tx, shipment.id, laptop_id, shipment.is_active()).await?;
        let laptop = records::move_laptop(
            &mut tx,
            laptop_id,
            LaptopStatus::InTransitToWarehouse,
            shipment.client_company_id,
            None,
        )
        .await?;

        tx.commit().await?;

        tracing::info!(%shipment_id, laptop_id = %laptop.id, "Laptop added to bulk shipment");
        AuditService::new(self.db.clone())
            .record_best_effort(
                actor,
                AuditAction::LaptopAddedToShipment,
                AuditEntity::Shipment,
                shipment_id,
                serde_json::json!({
                    "laptop_id": laptop.id,
                    "serial_number": laptop.serial_number,
                    "linked_count": linked + 1,
                }),
            )
            .await;

        Ok(laptop)
    }

    // ========================================================================
    // Edits
    // ========================================================================

    /// Apply a partial edit, gated by the edit guard
    pub async fn update_shipment(
        &self,
        actor: &Actor,
        shipment_id: Uuid,
        input: UpdateShipmentInput,
    ) -> AppResult<ShipmentDetail> {
        actor.require_role(&[UserRole::Logistics], "edit shipments")?;

        let mut tx = self.db.begin().await?;

        let shipment = records::lock_shipment(&mut tx, shipment_id).await?;
        let has_form = records::has_pickup_form(&mut tx, shipment.id).await?;
        can_edit(&shipment, has_form).require()?;
        input.check(&shipment)?;

        let updated: Shipment = sqlx::query_as::<_, ShipmentRow>(&format!(
            r#"
            UPDATE shipments
            SET software_engineer_id = COALESCE($2, software_engineer_id),
                courier_name = COALESCE($3, courier_name),
                tracking_number = COALESCE($4, tracking_number),
                second_tracking_number = COALESCE($5, second_tracking_number),
                notes = COALESCE($6, notes),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            SHIPMENT_COLUMNS
        ))
        .bind(shipment.id)
        .bind(input.software_engineer_id)
        .bind(&input.courier_name)
        .bind(&input.tracking_number)
        .bind(&input.second_tracking_number)
        .bind(&input.notes)
        .fetch_one(&mut *tx)
        .await?
        .try_into()?;

        if let Some(engineer_id) = input.software_engineer_id {
            LifecycleService::propagate_engineer(&mut tx, &updated, engineer_id).await?;
        }

        tx.commit().await?;

        tracing::info!(%shipment_id, "Shipment updated");
        AuditService::new(self.db.clone())
            .record_best_effort(
                actor,
                AuditAction::ShipmentUpdated,
                AuditEntity::Shipment,
                shipment_id,
                serde_json::json!({
                    "software_engineer_id": input.software_engineer_id,
                    "courier_name": input.courier_name,
                    "tracking_number": input.tracking_number,
                    "second_tracking_number": input.second_tracking_number,
                    "notes_changed": input.notes.is_some(),
                }),
            )
            .await;

        self.get_shipment(actor, shipment_id).await
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Get a shipment with its laptops, pickup form and edit eligibility
    pub async fn get_shipment(&self, actor: &Actor, shipment_id: Uuid) -> AppResult<ShipmentDetail> {
        let mut conn = self.db.acquire().await?;

        let shipment = records::find_shipment(&mut conn, shipment_id).await?;
        actor.require_company(shipment.client_company_id)?;

        let laptops = records::linked_laptops(&mut conn, shipment.id).await?;
        let pickup_form = records::find_pickup_form(&mut conn, shipment.id).await?;
        let edit_eligibility = can_edit(&shipment, pickup_form.is_some());

        Ok(ShipmentDetail {
            shipment,
            laptops,
            pickup_form,
            edit_eligibility,
        })
    }

    /// Answer the edit guard for one shipment
    pub async fn edit_eligibility(
        &self,
        actor: &Actor,
        shipment_id: Uuid,
    ) -> AppResult<EditEligibility> {
        let mut conn = self.db.acquire().await?;

        let shipment = records::find_shipment(&mut conn, shipment_id).await?;
        actor.require_company(shipment.client_company_id)?;
        let has_form = records::has_pickup_form(&mut conn, shipment.id).await?;

        Ok(can_edit(&shipment, has_form))
    }

    /// List shipments, newest first; clients only see their own company
    pub async fn list_shipments(
        &self,
        actor: &Actor,
        filter: ShipmentFilter,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<Shipment>> {
        let (shipment_type, status) = filter.parsed()?;
        let company = actor.company_scope().or(filter.client_company_id);

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM shipments
            WHERE ($1::text IS NULL OR shipment_type = $1)
              AND ($2::text IS NULL OR status = $2)
              AND ($3::uuid IS NULL OR client_company_id = $3)
            "#,
        )
        .bind(shipment_type.map(|t| t.as_str()))
        .bind(status.map(|s| s.as_str()))
        .bind(company)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, ShipmentRow>(&format!(
            r#"
            SELECT {}
            FROM shipments
            WHERE ($1::text IS NULL OR shipment_type = $1)
              AND ($2::text IS NULL OR status = $2)
              AND ($3::uuid IS NULL OR client_company_id = $3)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#,
            SHIPMENT_COLUMNS
        ))
        .bind(shipment_type.map(|t| t.as_str()))
        .bind(status.map(|s| s.as_str()))
        .bind(company)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            data: crate::models::convert_rows(rows)?,
            pagination: PaginationMeta::new(&pagination, total.max(0) as u64),
        })
    }
}
