//! Shipment models and the shipment status vocabulary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which leg of the client → warehouse → engineer journey a shipment covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentType {
    /// One laptop, client all the way to engineer; the laptop is auto-created
    SingleFullJourney,
    /// Several laptops, client to warehouse only; laptops are linked one by one
    BulkToWarehouse,
    /// One already-inventoried laptop, warehouse to engineer
    WarehouseToEngineer,
}

impl ShipmentType {
    pub const ALL: [ShipmentType; 3] = [
        ShipmentType::SingleFullJourney,
        ShipmentType::BulkToWarehouse,
        ShipmentType::WarehouseToEngineer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentType::SingleFullJourney => "single_full_journey",
            ShipmentType::BulkToWarehouse => "bulk_to_warehouse",
            ShipmentType::WarehouseToEngineer => "warehouse_to_engineer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "single_full_journey" => Some(ShipmentType::SingleFullJourney),
            "bulk_to_warehouse" => Some(ShipmentType::BulkToWarehouse),
            "warehouse_to_engineer" => Some(ShipmentType::WarehouseToEngineer),
            _ => None,
        }
    }

    /// Status a freshly created shipment starts in
    pub fn initial_status(&self) -> ShipmentStatus {
        match self {
            ShipmentType::SingleFullJourney | ShipmentType::BulkToWarehouse => {
                ShipmentStatus::PendingPickup
            }
            ShipmentType::WarehouseToEngineer => ShipmentStatus::ReleasedFromWarehouse,
        }
    }

    /// Statuses this type of shipment may ever hold, in journey order
    pub fn leg(&self) -> &'static [ShipmentStatus] {
        use ShipmentStatus::*;
        match self {
            ShipmentType::SingleFullJourney => &ShipmentStatus::ALL,
            ShipmentType::BulkToWarehouse => &[
                PendingPickup,
                PickupScheduled,
                PickedUpFromClient,
                InTransitToWarehouse,
                AtWarehouse,
            ],
            ShipmentType::WarehouseToEngineer => &[
                AtWarehouse,
                ReleasedFromWarehouse,
                InTransitToEngineer,
                Delivered,
            ],
        }
    }

    /// Whether an engineer may be assigned to the shipment at all
    pub fn allows_engineer(&self) -> bool {
        !matches!(self, ShipmentType::BulkToWarehouse)
    }

    /// Whether shipment-level changes are mirrored onto linked laptops
    pub fn syncs_laptops(&self) -> bool {
        match self {
            ShipmentType::SingleFullJourney | ShipmentType::WarehouseToEngineer => true,
            ShipmentType::BulkToWarehouse => false,
        }
    }

    /// Whether edits wait for a pickup form to exist
    pub fn requires_pickup_form(&self) -> bool {
        match self {
            ShipmentType::SingleFullJourney | ShipmentType::BulkToWarehouse => true,
            ShipmentType::WarehouseToEngineer => false,
        }
    }
}

impl std::fmt::Display for ShipmentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handoff stage of a shipment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    PendingPickup,
    PickupScheduled,
    PickedUpFromClient,
    InTransitToWarehouse,
    AtWarehouse,
    ReleasedFromWarehouse,
    InTransitToEngineer,
    Delivered,
}

impl ShipmentStatus {
    pub const ALL: [ShipmentStatus; 8] = [
        ShipmentStatus::PendingPickup,
        ShipmentStatus::PickupScheduled,
        ShipmentStatus::PickedUpFromClient,
        ShipmentStatus::InTransitToWarehouse,
        ShipmentStatus::AtWarehouse,
        ShipmentStatus::ReleasedFromWarehouse,
        ShipmentStatus::InTransitToEngineer,
        ShipmentStatus::Delivered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentStatus::PendingPickup => "pending_pickup",
            ShipmentStatus::PickupScheduled => "pickup_scheduled",
            ShipmentStatus::PickedUpFromClient => "picked_up_from_client",
            ShipmentStatus::InTransitToWarehouse => "in_transit_to_warehouse",
            ShipmentStatus::AtWarehouse => "at_warehouse",
            ShipmentStatus::ReleasedFromWarehouse => "released_from_warehouse",
            ShipmentStatus::InTransitToEngineer => "in_transit_to_engineer",
            ShipmentStatus::Delivered => "delivered",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending_pickup" => Some(ShipmentStatus::PendingPickup),
            "pickup_scheduled" => Some(ShipmentStatus::PickupScheduled),
            "picked_up_from_client" => Some(ShipmentStatus::PickedUpFromClient),
            "in_transit_to_warehouse" => Some(ShipmentStatus::InTransitToWarehouse),
            "at_warehouse" => Some(ShipmentStatus::AtWarehouse),
            "released_from_warehouse" => Some(ShipmentStatus::ReleasedFromWarehouse),
            "in_transit_to_engineer" => Some(ShipmentStatus::InTransitToEngineer),
            "delivered" => Some(ShipmentStatus::Delivered),
            _ => None,
        }
    }

    /// Stage timestamp stamped when a shipment reaches this status
    pub fn stage_timestamp(&self) -> Option<StageTimestamp> {
        match self {
            ShipmentStatus::PendingPickup | ShipmentStatus::InTransitToWarehouse => None,
            ShipmentStatus::PickupScheduled => Some(StageTimestamp::PickupScheduled),
            ShipmentStatus::PickedUpFromClient => Some(StageTimestamp::PickedUp),
            ShipmentStatus::AtWarehouse => Some(StageTimestamp::ArrivedWarehouse),
            ShipmentStatus::ReleasedFromWarehouse => Some(StageTimestamp::ReleasedWarehouse),
            ShipmentStatus::InTransitToEngineer => Some(StageTimestamp::EtaToEngineer),
            ShipmentStatus::Delivered => Some(StageTimestamp::Delivered),
        }
    }

    /// A shipment in this status still holds its laptops.
    ///
    /// Laptops sitting in the warehouse or already delivered are free to join
    /// another shipment.
    pub fn holds_laptops(&self) -> bool {
        !matches!(self, ShipmentStatus::AtWarehouse | ShipmentStatus::Delivered)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ShipmentStatus::Delivered)
    }
}

impl std::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reject anything outside the shipment status vocabulary
pub fn is_valid_shipment_status(s: &str) -> bool {
    ShipmentStatus::parse(s).is_some()
}

/// Reject anything outside the shipment type vocabulary
pub fn is_valid_shipment_type(s: &str) -> bool {
    ShipmentType::parse(s).is_some()
}

/// Once-set timestamps marking arrival at a lifecycle stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageTimestamp {
    PickupScheduled,
    PickedUp,
    ArrivedWarehouse,
    ReleasedWarehouse,
    EtaToEngineer,
    Delivered,
}

impl StageTimestamp {
    /// Column holding this timestamp in the `shipments` table
    pub fn column(&self) -> &'static str {
        match self {
            StageTimestamp::PickupScheduled => "pickup_scheduled_date",
            StageTimestamp::PickedUp => "picked_up_at",
            StageTimestamp::ArrivedWarehouse => "arrived_warehouse_at",
            StageTimestamp::ReleasedWarehouse => "released_warehouse_at",
            StageTimestamp::EtaToEngineer => "eta_to_engineer",
            StageTimestamp::Delivered => "delivered_at",
        }
    }
}

/// The six stage timestamps of a shipment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTimestamps {
    pub pickup_scheduled_date: Option<DateTime<Utc>>,
    pub picked_up_at: Option<DateTime<Utc>>,
    pub arrived_warehouse_at: Option<DateTime<Utc>>,
    pub released_warehouse_at: Option<DateTime<Utc>>,
    pub eta_to_engineer: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
}

impl StageTimestamps {
    fn slot(&mut self, stage: StageTimestamp) -> &mut Option<DateTime<Utc>> {
        match stage {
            StageTimestamp::PickupScheduled => &mut self.pickup_scheduled_date,
            StageTimestamp::PickedUp => &mut self.picked_up_at,
            StageTimestamp::ArrivedWarehouse => &mut self.arrived_warehouse_at,
            StageTimestamp::ReleasedWarehouse => &mut self.released_warehouse_at,
            StageTimestamp::EtaToEngineer => &mut self.eta_to_engineer,
            StageTimestamp::Delivered => &mut self.delivered_at,
        }
    }

    pub fn get(&self, stage: StageTimestamp) -> Option<DateTime<Utc>> {
        match stage {
            StageTimestamp::PickupScheduled => self.pickup_scheduled_date,
            StageTimestamp::PickedUp => self.picked_up_at,
            StageTimestamp::ArrivedWarehouse => self.arrived_warehouse_at,
            StageTimestamp::ReleasedWarehouse => self.released_warehouse_at,
            StageTimestamp::EtaToEngineer => self.eta_to_engineer,
            StageTimestamp::Delivered => self.delivered_at,
        }
    }

    /// Set `stage` to `at` unless it already holds a value.
    ///
    /// Returns whether the timestamp was written.
    pub fn stamp(&mut self, stage: StageTimestamp, at: DateTime<Utc>) -> bool {
        let slot = self.slot(stage);
        if slot.is_some() {
            return false;
        }
        *slot = Some(at);
        true
    }
}

/// A tracked movement of one or more laptops
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shipment {
    pub id: Uuid,
    pub shipment_type: ShipmentType,
    pub status: ShipmentStatus,
    pub client_company_id: Uuid,
    pub software_engineer_id: Option<Uuid>,
    /// Declared laptop count; bulk shipments take it from the client
    pub laptop_count: i32,
    #[serde(flatten)]
    pub timestamps: StageTimestamps,
    pub courier_name: Option<String>,
    pub tracking_number: Option<String>,
    pub second_tracking_number: Option<String>,
    pub jira_ticket_number: String,
    pub notes: Option<String>,
    /// Inline engineer delivery snapshot (warehouse-to-engineer only)
    pub delivery_details: Option<serde_json::Value>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Shipment {
    /// Whether the shipment currently holds its linked laptops
    pub fn is_active(&self) -> bool {
        self.status.holds_laptops()
    }
}
