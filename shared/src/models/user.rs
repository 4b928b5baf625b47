//! Caller roles and permission checks

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ShipmentStatus, ShipmentType};
use crate::error::{LifecycleError, LifecycleResult};

/// Role carried in the caller's token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Logistics,
    Warehouse,
    Client,
    ProjectManager,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Logistics => "logistics",
            UserRole::Warehouse => "warehouse",
            UserRole::Client => "client",
            UserRole::ProjectManager => "project_manager",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "logistics" => Some(UserRole::Logistics),
            "warehouse" => Some(UserRole::Warehouse),
            "client" => Some(UserRole::Client),
            "project_manager" => Some(UserRole::ProjectManager),
            _ => None,
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated caller of an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: UserRole,
    /// Company a client user belongs to
    pub client_company_id: Option<Uuid>,
}

impl Actor {
    pub fn require_role(&self, allowed: &[UserRole], action: &str) -> LifecycleResult<()> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(LifecycleError::Forbidden(format!(
                "Role '{}' may not {}",
                self.role, action
            )))
        }
    }

    /// Clients only see and act on their own company's records
    pub fn require_company(&self, company_id: Uuid) -> LifecycleResult<()> {
        match self.role {
            UserRole::Client if self.client_company_id != Some(company_id) => Err(
                LifecycleError::Forbidden("Record belongs to another company".to_string()),
            ),
            _ => Ok(()),
        }
    }

    /// Company scope to apply to listings, if any
    pub fn company_scope(&self) -> Option<Uuid> {
        match self.role {
            UserRole::Client => self.client_company_id,
            _ => None,
        }
    }

    pub fn can_create(&self, shipment_type: ShipmentType) -> bool {
        match (self.role, shipment_type) {
            (UserRole::Logistics, _) => true,
            (UserRole::Client, ShipmentType::SingleFullJourney)
            | (UserRole::Client, ShipmentType::BulkToWarehouse) => true,
            _ => false,
        }
    }

    /// Logistics drives the whole journey; the warehouse only books laptops
    /// in and out of its own floor.
    pub fn can_set_status(&self, status: ShipmentStatus) -> bool {
        match self.role {
            UserRole::Logistics => true,
            UserRole::Warehouse => matches!(
                status,
                ShipmentStatus::AtWarehouse | ShipmentStatus::ReleasedFromWarehouse
            ),
            UserRole::Client | UserRole::ProjectManager => false,
        }
    }
}
