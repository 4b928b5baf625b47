//! Laptop models and the laptop status vocabulary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::{LifecycleError, LifecycleResult};

/// Where a physical laptop currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaptopStatus {
    Available,
    InTransitToWarehouse,
    AtWarehouse,
    InTransitToEngineer,
    Delivered,
    Retired,
}

impl LaptopStatus {
    pub const ALL: [LaptopStatus; 6] = [
        LaptopStatus::Available,
        LaptopStatus::InTransitToWarehouse,
        LaptopStatus::AtWarehouse,
        LaptopStatus::InTransitToEngineer,
        LaptopStatus::Delivered,
        LaptopStatus::Retired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LaptopStatus::Available => "available",
            LaptopStatus::InTransitToWarehouse => "in_transit_to_warehouse",
            LaptopStatus::AtWarehouse => "at_warehouse",
            LaptopStatus::InTransitToEngineer => "in_transit_to_engineer",
            LaptopStatus::Delivered => "delivered",
            LaptopStatus::Retired => "retired",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "available" => Some(LaptopStatus::Available),
            "in_transit_to_warehouse" => Some(LaptopStatus::InTransitToWarehouse),
            "at_warehouse" => Some(LaptopStatus::AtWarehouse),
            "in_transit_to_engineer" => Some(LaptopStatus::InTransitToEngineer),
            "delivered" => Some(LaptopStatus::Delivered),
            "retired" => Some(LaptopStatus::Retired),
            _ => None,
        }
    }

    /// Source statuses a warehouse-to-engineer shipment may pick a laptop from
    pub fn can_ship_to_engineer(&self) -> bool {
        matches!(self, LaptopStatus::Available | LaptopStatus::AtWarehouse)
    }

    /// Statuses from which a laptop may be added to a bulk shipment
    pub fn can_join_bulk_shipment(&self) -> bool {
        matches!(
            self,
            LaptopStatus::Available | LaptopStatus::InTransitToWarehouse
        )
    }

    /// Statuses in which the warehouse may file a reception report
    pub fn can_be_received(&self) -> bool {
        matches!(
            self,
            LaptopStatus::Available | LaptopStatus::InTransitToWarehouse | LaptopStatus::AtWarehouse
        )
    }
}

impl std::fmt::Display for LaptopStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reject anything outside the laptop status vocabulary
pub fn is_valid_laptop_status(s: &str) -> bool {
    LaptopStatus::parse(s).is_some()
}

/// A physical laptop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Laptop {
    pub id: Uuid,
    pub serial_number: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub cpu: Option<String>,
    pub ram_gb: Option<i32>,
    pub ssd_gb: Option<i32>,
    pub status: LaptopStatus,
    pub client_company_id: Option<Uuid>,
    pub software_engineer_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Hardware details supplied when a laptop is registered
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LaptopDetails {
    #[validate(length(min = 1, max = 100, message = "Serial number is required"))]
    pub serial_number: String,
    #[validate(length(max = 100))]
    pub brand: Option<String>,
    #[validate(length(max = 100))]
    pub model: Option<String>,
    #[validate(length(max = 100))]
    pub cpu: Option<String>,
    #[validate(range(min = 1, max = 1024, message = "RAM must be between 1 and 1024 GB"))]
    pub ram_gb: Option<i32>,
    #[validate(range(min = 1, max = 65536, message = "SSD must be between 1 and 65536 GB"))]
    pub ssd_gb: Option<i32>,
}

impl LaptopDetails {
    /// Validate and normalise the serial number
    pub fn check(&self) -> LifecycleResult<()> {
        self.validate()
            .map_err(|e| LifecycleError::from_validation_errors(&e))?;
        crate::validation::validate_serial_number(&self.serial_number)
            .map_err(|msg| LifecycleError::validation("serial_number", msg))
    }

    pub fn normalized_serial(&self) -> String {
        crate::validation::normalize_serial_number(&self.serial_number)
    }
}

/// Input for registering a standalone laptop
#[derive(Debug, Clone, Deserialize)]
pub struct NewLaptopInput {
    #[serde(flatten)]
    pub details: LaptopDetails,
    pub client_company_id: Option<Uuid>,
}

/// Filter for laptop listings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LaptopFilter {
    pub status: Option<String>,
    pub client_company_id: Option<Uuid>,
}

impl LaptopFilter {
    /// Parse the status filter through the validity predicate
    pub fn status(&self) -> LifecycleResult<Option<LaptopStatus>> {
        match &self.status {
            None => Ok(None),
            Some(raw) => LaptopStatus::parse(raw)
                .map(Some)
                .ok_or_else(|| {
                    LifecycleError::validation("status", format!("Unknown laptop status '{}'", raw))
                }),
        }
    }
}
