//! Database models for the Laptop Tracking Platform
//!
//! Re-exports models from the shared crate and adds the row types read from
//! Postgres. Status columns are plain text; every row is parsed through the
//! vocabulary predicates before it reaches the lifecycle rules, and a value
//! outside the vocabulary is treated as corrupt data.

use chrono::{DateTime, Utc};
use uuid::Uuid;

pub use shared::models::*;

use crate::error::AppError;

/// Column list matching [`ShipmentRow`]
pub const SHIPMENT_COLUMNS: &str = "id, shipment_type, status, client_company_id, \
    software_engineer_id, laptop_count, pickup_scheduled_date, picked_up_at, \
    arrived_warehouse_at, released_warehouse_at, eta_to_engineer, delivered_at, \
    courier_name, tracking_number, second_tracking_number, jira_ticket_number, notes, \
    delivery_details, created_by, created_at, updated_at";

/// Column list matching [`LaptopRow`]
pub const LAPTOP_COLUMNS: &str = "id, serial_number, brand, model, cpu, ram_gb, ssd_gb, \
    status, client_company_id, software_engineer_id, created_at, updated_at";

/// Column list matching [`ReceptionReportRow`]
pub const RECEPTION_REPORT_COLUMNS: &str = "id, laptop_id, shipment_id, warehouse_user_id, \
    received_at, notes, photo_serial_number, photo_external_condition, \
    photo_working_condition, status, approved_by, approved_at, created_at";

fn corrupt(table: &str, column: &str, value: &str) -> AppError {
    AppError::Internal(format!(
        "{}.{} holds unknown value '{}'",
        table, column, value
    ))
}

#[derive(Debug, sqlx::FromRow)]
pub struct ShipmentRow {
    pub id: Uuid,
    pub shipment_type: String,
    pub status: String,
    pub client_company_id: Uuid,
    pub software_engineer_id: Option<Uuid>,
    pub laptop_count: i32,
    pub pickup_scheduled_date: Option<DateTime<Utc>>,
    pub picked_up_at: Option<DateTime<Utc>>,
    pub arrived_warehouse_at: Option<DateTime<Utc>>,
    pub released_warehouse_at: Option<DateTime<Utc>>,
    pub eta_to_engineer: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub courier_name: Option<String>,
    pub tracking_number: Option<String>,
    pub second_tracking_number: Option<String>,
    pub jira_ticket_number: String,
    pub notes: Option<String>,
    pub delivery_details: Option<serde_json::Value>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ShipmentRow> for Shipment {
    type Error = AppError;

    fn try_from(row: ShipmentRow) -> Result<Self, Self::Error> {
        let shipment_type = ShipmentType::parse(&row.shipment_type)
            .ok_or_else(|| corrupt("shipments", "shipment_type", &row.shipment_type))?;
        let status = ShipmentStatus::parse(&row.status)
            .ok_or_else(|| corrupt("shipments", "status", &row.status))?;

        Ok(Shipment {
            id: row.id,
            shipment_type,
            status,
            client_company_id: row.client_company_id,
            software_engineer_id: row.software_engineer_id,
            laptop_count: row.laptop_count,
            timestamps: StageTimestamps {
                pickup_scheduled_date: row.pickup_scheduled_date,
                picked_up_at: row.picked_up_at,
                arrived_warehouse_at: row.arrived_warehouse_at,
                released_warehouse_at: row.released_warehouse_at,
                eta_to_engineer: row.eta_to_engineer,
                delivered_at: row.delivered_at,
            },
            courier_name: row.courier_name,
            tracking_number: row.tracking_number,
            second_tracking_number: row.second_tracking_number,
            jira_ticket_number: row.jira_ticket_number,
            notes: row.notes,
            delivery_details: row.delivery_details,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct LaptopRow {
    pub id: Uuid,
    pub serial_number: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub cpu: Option<String>,
    pub ram_gb: Option<i32>,
    pub ssd_gb: Option<i32>,
    pub status: String,
    pub client_company_id: Option<Uuid>,
    pub software_engineer_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<LaptopRow> for Laptop {
    type Error = AppError;

    fn try_from(row: LaptopRow) -> Result<Self, Self::Error> {
        let status = LaptopStatus::parse(&row.status)
            .ok_or_else(|| corrupt("laptops", "status", &row.status))?;

        Ok(Laptop {
            id: row.id,
            serial_number: row.serial_number,
            brand: row.brand,
            model: row.model,
            cpu: row.cpu,
            ram_gb: row.ram_gb,
            ssd_gb: row.ssd_gb,
            status,
            client_company_id: row.client_company_id,
            software_engineer_id: row.software_engineer_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct ReceptionReportRow {
    pub id: Uuid,
    pub laptop_id: Uuid,
    pub shipment_id: Option<Uuid>,
    pub warehouse_user_id: Uuid,
    pub received_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub photo_serial_number: String,
    pub photo_external_condition: String,
    pub photo_working_condition: String,
    pub status: String,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<ReceptionReportRow> for ReceptionReport {
    type Error = AppError;

    fn try_from(row: ReceptionReportRow) -> Result<Self, Self::Error> {
        let status = ReceptionReportStatus::parse(&row.status)
            .ok_or_else(|| corrupt("reception_reports", "status", &row.status))?;

        Ok(ReceptionReport {
            id: row.id,
            laptop_id: row.laptop_id,
            shipment_id: row.shipment_id,
            warehouse_user_id: row.warehouse_user_id,
            received_at: row.received_at,
            notes: row.notes,
            photo_serial_number: row.photo_serial_number,
            photo_external_condition: row.photo_external_condition,
            photo_working_condition: row.photo_working_condition,
            status,
            approved_by: row.approved_by,
            approved_at: row.approved_at,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct PickupFormRow {
    pub id: Uuid,
    pub shipment_id: Uuid,
    pub submitted_by: Option<Uuid>,
    pub submitted_at: DateTime<Utc>,
    pub form_data: serde_json::Value,
}

impl From<PickupFormRow> for PickupForm {
    fn from(row: PickupFormRow) -> Self {
        PickupForm {
            id: row.id,
            shipment_id: row.shipment_id,
            submitted_by: row.submitted_by,
            submitted_at: row.submitted_at,
            form_data: row.form_data,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct AuditRow {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl From<AuditRow> for AuditEntry {
    fn from(row: AuditRow) -> Self {
        AuditEntry {
            id: row.id,
            user_id: row.user_id,
            action: row.action,
            entity_type: row.entity_type,
            entity_id: row.entity_id,
            details: row.details,
            created_at: row.created_at,
        }
    }
}

/// Convert a batch of rows, failing on the first corrupt one
pub fn convert_rows<R, T>(rows: Vec<R>) -> Result<Vec<T>, AppError>
where
    T: TryFrom<R, Error = AppError>,
{
    rows.into_iter().map(T::try_from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn laptop_row(status: &str) -> LaptopRow {
        LaptopRow {
            id: Uuid::new_v4(),
            serial_number: "C02XK1ZQ".to_string(),
            brand: None,
            model: None,
            cpu: None,
            ram_gb: None,
            ssd_gb: None,
            status: status.to_string(),
            client_company_id: None,
            software_engineer_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_laptop_row_parses_status() {
        let laptop = Laptop::try_from(laptop_row("at_warehouse")).unwrap();
        assert_eq!(laptop.status, LaptopStatus::AtWarehouse);
    }

    #[test]
    fn test_laptop_row_rejects_unknown_status() {
        let err = Laptop::try_from(laptop_row("lost")).unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
