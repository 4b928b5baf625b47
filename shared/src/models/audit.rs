//! Audit log vocabulary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Mutating action recorded in the audit log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    ShipmentCreated,
    ShipmentStatusUpdated,
    ShipmentUpdated,
    PickupFormSubmitted,
    LaptopCreated,
    LaptopAddedToShipment,
    ReceptionReportCreated,
    ReceptionReportApproved,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::ShipmentCreated => "shipment_created",
            AuditAction::ShipmentStatusUpdated => "shipment_status_updated",
            AuditAction::ShipmentUpdated => "shipment_updated",
            AuditAction::PickupFormSubmitted => "pickup_form_submitted",
            AuditAction::LaptopCreated => "laptop_created",
            AuditAction::LaptopAddedToShipment => "laptop_added_to_shipment",
            AuditAction::ReceptionReportCreated => "reception_report_created",
            AuditAction::ReceptionReportApproved => "reception_report_approved",
        }
    }
}

/// Kind of record an audit entry points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEntity {
    Shipment,
    Laptop,
    ReceptionReport,
}

impl AuditEntity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditEntity::Shipment => "shipment",
            AuditEntity::Laptop => "laptop",
            AuditEntity::ReceptionReport => "reception_report",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "shipment" => Some(AuditEntity::Shipment),
            "laptop" => Some(AuditEntity::Laptop),
            "reception_report" => Some(AuditEntity::ReceptionReport),
            _ => None,
        }
    }
}

/// Append-only audit record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
