//! Row-level reads and writes shared by the transactional services
//!
//! Every helper takes a `PgConnection` so it runs inside whatever
//! transaction the caller has open. Reads that feed a rule check lock the
//! row with `FOR UPDATE`.

use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    Laptop, LaptopDetails, LaptopRow, LaptopStatus, PickupForm, PickupFormData, PickupFormRow,
    Shipment, ShipmentRow, ShipmentType, LAPTOP_COLUMNS, SHIPMENT_COLUMNS,
};
use shared::LaptopLinkState;

/// Fields of a shipment row about to be inserted
#[derive(Debug)]
pub struct NewShipment {
    pub shipment_type: ShipmentType,
    pub client_company_id: Uuid,
    pub software_engineer_id: Option<Uuid>,
    pub laptop_count: i32,
    pub released_warehouse_at: Option<DateTime<Utc>>,
    pub courier_name: Option<String>,
    pub jira_ticket_number: String,
    pub notes: Option<String>,
    pub delivery_details: Option<serde_json::Value>,
    pub created_by: Uuid,
}

pub async fn insert_shipment(conn: &mut PgConnection, new: NewShipment) -> AppResult<Shipment> {
    sqlx::query_as::<_, ShipmentRow>(&format!(
        r#"
        INSERT INTO shipments (
            shipment_type, status, client_company_id, software_engineer_id, laptop_count,
            released_warehouse_at, courier_name, jira_ticket_number, notes,
            delivery_details, created_by
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING {}
        "#,
        SHIPMENT_COLUMNS
    ))
    .bind(new.shipment_type.as_str())
    .bind(new.shipment_type.initial_status().as_str())
    .bind(new.client_company_id)
    .bind(new.software_engineer_id)
    .bind(new.laptop_count)
    .bind(new.released_warehouse_at)
    .bind(new.courier_name)
    .bind(new.jira_ticket_number.trim())
    .bind(new.notes)
    .bind(new.delivery_details)
    .bind(new.created_by)
    .fetch_one(&mut *conn)
    .await?
    .try_into()
}

pub async fn find_shipment(conn: &mut PgConnection, shipment_id: Uuid) -> AppResult<Shipment> {
    sqlx::query_as::<_, ShipmentRow>(&format!(
        "SELECT {} FROM shipments WHERE id = $1",
        SHIPMENT_COLUMNS
    ))
    .bind(shipment_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::NotFound("Shipment".to_string()))?
    .try_into()
}

pub async fn lock_shipment(conn: &mut PgConnection, shipment_id: Uuid) -> AppResult<Shipment> {
    sqlx::query_as::<_, ShipmentRow>(&format!(
        "SELECT {} FROM shipments WHERE id = $1 FOR UPDATE",
        SHIPMENT_COLUMNS
    ))
    .bind(shipment_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::NotFound("Shipment".to_string()))?
    .try_into()
}

pub async fn find_laptop(conn: &mut PgConnection, laptop_id: Uuid) -> AppResult<Laptop> {
    sqlx::query_as::<_, LaptopRow>(&format!(
        "SELECT {} FROM laptops WHERE id = $1",
        LAPTOP_COLUMNS
    ))
    .bind(laptop_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::NotFound("Laptop".to_string()))?
    .try_into()
}

pub async fn lock_laptop(conn: &mut PgConnection, laptop_id: Uuid) -> AppResult<Laptop> {
    sqlx::query_as::<_, LaptopRow>(&format!(
        "SELECT {} FROM laptops WHERE id = $1 FOR UPDATE",
        LAPTOP_COLUMNS
    ))
    .bind(laptop_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::NotFound("Laptop".to_string()))?
    .try_into()
}

/// Lock a laptop and gather what the link rules look at
pub async fn laptop_link_state(
    conn: &mut PgConnection,
    laptop_id: Uuid,
) -> AppResult<(Laptop, LaptopLinkState)> {
    let laptop = lock_laptop(conn, laptop_id).await?;

    let reception_reports: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM reception_reports WHERE laptop_id = $1")
            .bind(laptop_id)
            .fetch_one(&mut *conn)
            .await?;

    let active_shipments: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM shipment_laptops WHERE laptop_id = $1 AND active",
    )
    .bind(laptop_id)
    .fetch_one(&mut *conn)
    .await?;

    let state = LaptopLinkState {
        status: laptop.status,
        client_company_id: laptop.client_company_id,
        reception_reports,
        active_shipments,
    };
    Ok((laptop, state))
}

/// Register a laptop; duplicate serials surface as a conflict
pub async fn insert_laptop(
    conn: &mut PgConnection,
    details: &LaptopDetails,
    status: LaptopStatus,
    client_company_id: Option<Uuid>,
    software_engineer_id: Option<Uuid>,
) -> AppResult<Laptop> {
    sqlx::query_as::<_, LaptopRow>(&format!(
        r#"
        INSERT INTO laptops (
            serial_number, brand, model, cpu, ram_gb, ssd_gb,
            status, client_company_id, software_engineer_id
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {}
        "#,
        LAPTOP_COLUMNS
    ))
    .bind(details.normalized_serial())
    .bind(&details.brand)
    .bind(&details.model)
    .bind(&details.cpu)
    .bind(details.ram_gb)
    .bind(details.ssd_gb)
    .bind(status.as_str())
    .bind(client_company_id)
    .bind(software_engineer_id)
    .fetch_one(&mut *conn)
    .await
    .map_err(AppError::from_constraint)?
    .try_into()
}

/// Link a laptop to a shipment; a second active link violates the index
pub async fn link_laptop(
    conn: &mut PgConnection,
    shipment_id: Uuid,
    laptop_id: Uuid,
    active: bool,
) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO shipment_laptops (shipment_id, laptop_id, active) VALUES ($1, $2, $3)",
    )
    .bind(shipment_id)
    .bind(laptop_id)
    .bind(active)
    .execute(&mut *conn)
    .await
    .map_err(AppError::from_constraint)?;
    Ok(())
}

pub async fn count_linked_laptops(conn: &mut PgConnection, shipment_id: Uuid) -> AppResult<i64> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM shipment_laptops WHERE shipment_id = $1")
        .bind(shipment_id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(count)
}

pub async fn linked_laptops(conn: &mut PgConnection, shipment_id: Uuid) -> AppResult<Vec<Laptop>> {
    let rows = sqlx::query_as::<_, LaptopRow>(&format!(
        r#"
        SELECT {}
        FROM laptops
        WHERE id IN (SELECT laptop_id FROM shipment_laptops WHERE shipment_id = $1)
        ORDER BY created_at
        "#,
        LAPTOP_COLUMNS
    ))
    .bind(shipment_id)
    .fetch_all(&mut *conn)
    .await?;

    crate::models::convert_rows(rows)
}

/// Laptops linked to shipment `$1` that no other shipment actively holds.
///
/// A laptop claimed by a later shipment keeps following that shipment, so
/// changes to the older one must not reach it.
const HELD_LAPTOP_IDS: &str = r#"
    SELECT sl.laptop_id
    FROM shipment_laptops sl
    WHERE sl.shipment_id = $1
      AND NOT EXISTS (
          SELECT 1
          FROM shipment_laptops other
          WHERE other.laptop_id = sl.laptop_id
            AND other.active
            AND other.shipment_id <> sl.shipment_id
      )
"#;

/// Set a status on every laptop the shipment still holds
pub async fn set_linked_laptop_status(
    conn: &mut PgConnection,
    shipment_id: Uuid,
    status: LaptopStatus,
) -> AppResult<u64> {
    let result = sqlx::query(&format!(
        r#"
        UPDATE laptops
        SET status = $2, updated_at = NOW()
        WHERE id IN ({})
        "#,
        HELD_LAPTOP_IDS
    ))
    .bind(shipment_id)
    .bind(status.as_str())
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected())
}

/// Set the engineer on every laptop the shipment still holds
pub async fn set_linked_laptop_engineer(
    conn: &mut PgConnection,
    shipment_id: Uuid,
    software_engineer_id: Uuid,
) -> AppResult<u64> {
    let result = sqlx::query(&format!(
        r#"
        UPDATE laptops
        SET software_engineer_id = $2, updated_at = NOW()
        WHERE id IN ({})
        "#,
        HELD_LAPTOP_IDS
    ))
    .bind(shipment_id)
    .bind(software_engineer_id)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected())
}

/// Recompute whether a shipment's links still hold their laptops
pub async fn set_links_active(
    conn: &mut PgConnection,
    shipment_id: Uuid,
    active: bool,
) -> AppResult<()> {
    sqlx::query("UPDATE shipment_laptops SET active = $2 WHERE shipment_id = $1")
        .bind(shipment_id)
        .bind(active)
        .execute(&mut *conn)
        .await
        .map_err(AppError::from_constraint)?;
    Ok(())
}

/// Update one laptop's status, engineer and owner
pub async fn move_laptop(
    conn: &mut PgConnection,
    laptop_id: Uuid,
    status: LaptopStatus,
    client_company_id: Uuid,
    software_engineer_id: Option<Uuid>,
) -> AppResult<Laptop> {
    sqlx::query_as::<_, LaptopRow>(&format!(
        r#"
        UPDATE laptops
        SET status = $2,
            client_company_id = $3,
            software_engineer_id = COALESCE($4, software_engineer_id),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {}
        "#,
        LAPTOP_COLUMNS
    ))
    .bind(laptop_id)
    .bind(status.as_str())
    .bind(client_company_id)
    .bind(software_engineer_id)
    .fetch_one(&mut *conn)
    .await?
    .try_into()
}

pub async fn has_pickup_form(conn: &mut PgConnection, shipment_id: Uuid) -> AppResult<bool> {
    let exists = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pickup_forms WHERE shipment_id = $1)")
        .bind(shipment_id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(exists)
}

pub async fn find_pickup_form(
    conn: &mut PgConnection,
    shipment_id: Uuid,
) -> AppResult<Option<PickupForm>> {
    let row = sqlx::query_as::<_, PickupFormRow>(
        r#"
        SELECT id, shipment_id, submitted_by, submitted_at, form_data
        FROM pickup_forms
        WHERE shipment_id = $1
        "#,
    )
    .bind(shipment_id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(row.map(PickupForm::from))
}

/// Insert or replace the single pickup form snapshot of a shipment
pub async fn upsert_pickup_form(
    conn: &mut PgConnection,
    shipment_id: Uuid,
    submitted_by: Uuid,
    form: &PickupFormData,
) -> AppResult<PickupForm> {
    let form_data =
        serde_json::to_value(form).map_err(|e| AppError::Internal(e.to_string()))?;

    let row = sqlx::query_as::<_, PickupFormRow>(
        r#"
        INSERT INTO pickup_forms (shipment_id, submitted_by, form_data)
        VALUES ($1, $2, $3)
        ON CONFLICT (shipment_id) DO UPDATE
        SET submitted_by = EXCLUDED.submitted_by,
            submitted_at = NOW(),
            form_data = EXCLUDED.form_data
        RETURNING id, shipment_id, submitted_by, submitted_at, form_data
        "#,
    )
    .bind(shipment_id)
    .bind(submitted_by)
    .bind(form_data)
    .fetch_one(&mut *conn)
    .await?;
    Ok(PickupForm::from(row))
}
