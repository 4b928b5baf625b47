//! Edit eligibility guard and partial-update rules

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{LifecycleError, LifecycleResult};
use crate::models::{Shipment, ShipmentStatus, ShipmentType};

/// Answer of the edit guard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EditEligibility {
    pub allowed: bool,
    pub reason: &'static str,
}

impl EditEligibility {
    fn allowed(reason: &'static str) -> Self {
        Self {
            allowed: true,
            reason,
        }
    }

    fn denied(reason: &'static str) -> Self {
        Self {
            allowed: false,
            reason,
        }
    }

    /// Turn a denial into an error for the write paths
    pub fn require(self) -> LifecycleResult<()> {
        if self.allowed {
            Ok(())
        } else {
            Err(LifecycleError::conflict("shipment", self.reason))
        }
    }
}

/// Whether a shipment's mutable fields may still change.
///
/// Delivered shipments are frozen. Warehouse-to-engineer shipments keep their
/// details inline and are editable until delivery. Single and bulk shipments
/// additionally wait for the client's pickup form.
pub fn edit_eligibility(
    shipment_type: ShipmentType,
    status: ShipmentStatus,
    has_pickup_form: bool,
) -> EditEligibility {
    if status == ShipmentStatus::Delivered {
        return EditEligibility::denied("Delivered shipments cannot be edited");
    }
    if shipment_type.requires_pickup_form() && !has_pickup_form {
        return EditEligibility::denied(
            "Shipment cannot be edited until the pickup form has been submitted",
        );
    }
    EditEligibility::allowed("Shipment can be edited")
}

pub fn can_edit(shipment: &Shipment, has_pickup_form: bool) -> EditEligibility {
    edit_eligibility(shipment.shipment_type, shipment.status, has_pickup_form)
}

/// Partial field set for a shipment edit
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateShipmentInput {
    pub software_engineer_id: Option<Uuid>,
    pub courier_name: Option<String>,
    pub tracking_number: Option<String>,
    pub second_tracking_number: Option<String>,
    pub notes: Option<String>,
    /// Immutable; present only to reject attempts to change it
    pub client_company_id: Option<Uuid>,
    /// Immutable; present only to reject attempts to change it
    pub jira_ticket_number: Option<String>,
    /// Immutable; present only to reject attempts to change it
    pub shipment_type: Option<String>,
}

impl UpdateShipmentInput {
    pub fn is_empty(&self) -> bool {
        self.software_engineer_id.is_none()
            && self.courier_name.is_none()
            && self.tracking_number.is_none()
            && self.second_tracking_number.is_none()
            && self.notes.is_none()
    }

    /// Field-level rules; the edit guard is checked separately and first
    pub fn check(&self, shipment: &Shipment) -> LifecycleResult<()> {
        if self.shipment_type.is_some() {
            return Err(LifecycleError::validation(
                "shipment_type",
                "Shipment type cannot be changed",
            ));
        }
        if self
            .client_company_id
            .is_some_and(|id| id != shipment.client_company_id)
        {
            return Err(LifecycleError::validation(
                "client_company_id",
                "Client company cannot be changed after creation",
            ));
        }
        if self
            .jira_ticket_number
            .as_deref()
            .is_some_and(|ticket| ticket != shipment.jira_ticket_number)
        {
            return Err(LifecycleError::validation(
                "jira_ticket_number",
                "JIRA ticket number cannot be changed after creation",
            ));
        }
        if self.software_engineer_id.is_some() {
            check_engineer_assignment(shipment.shipment_type)?;
        }
        for (field, value, max) in [
            ("courier_name", &self.courier_name, 100),
            ("tracking_number", &self.tracking_number, 100),
            ("second_tracking_number", &self.second_tracking_number, 100),
            ("notes", &self.notes, 2000),
        ] {
            if value.as_ref().is_some_and(|v| v.chars().count() > max) {
                return Err(LifecycleError::validation(
                    field,
                    format!("Must be at most {} characters", max),
                ));
            }
        }
        if self.is_empty() {
            return Err(LifecycleError::validation("body", "No editable fields supplied"));
        }
        Ok(())
    }
}

/// Engineers can only be assigned where the laptop actually reaches one
pub fn check_engineer_assignment(shipment_type: ShipmentType) -> LifecycleResult<()> {
    if shipment_type.allows_engineer() {
        Ok(())
    } else {
        Err(LifecycleError::validation(
            "software_engineer_id",
            "Bulk shipments only travel to the warehouse and cannot have an engineer",
        ))
    }
}

/// Rules for submitting or replacing a pickup form.
///
/// The first submission is what unlocks edits, so it only needs the shipment
/// to be undelivered; replacing an existing form goes through the edit guard.
pub fn check_pickup_form_submission(
    shipment: &Shipment,
    has_pickup_form: bool,
) -> LifecycleResult<()> {
    if !shipment.shipment_type.requires_pickup_form() {
        return Err(LifecycleError::validation(
            "shipment_id",
            "Warehouse-to-engineer shipments carry their delivery details inline",
        ));
    }
    if has_pickup_form {
        can_edit(shipment, true).require()
    } else if shipment.status == ShipmentStatus::Delivered {
        Err(LifecycleError::conflict(
            "shipment",
            "Delivered shipments cannot be edited",
        ))
    } else {
        Ok(())
    }
}
