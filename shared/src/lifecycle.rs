//! Shipment status transition table
//!
//! Every status change goes through [`plan_transition`], which answers two
//! questions from data rather than call-site conditionals: is the move
//! allowed for this shipment type, and what side effects come with it
//! (stage timestamp, laptop status mirror, notification).

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{LifecycleError, LifecycleResult};
use crate::models::{
    LaptopStatus, NotificationKind, ShipmentStatus, ShipmentType, StageTimestamp,
    StageTimestamps,
};

/// Outcome of an allowed status change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionPlan {
    pub shipment_type: ShipmentType,
    pub from: ShipmentStatus,
    pub to: ShipmentStatus,
    /// Stage timestamp to stamp if still empty
    pub stamp: Option<StageTimestamp>,
    /// Status every linked laptop takes on, when the type mirrors laptops
    pub laptop_status: Option<LaptopStatus>,
    /// Milestone email to send once the change is committed
    pub notify: Option<NotificationKind>,
    /// Whether the shipment's laptop links stay active afterwards
    pub links_active: bool,
}

/// Laptop status mirrored from a shipment status.
///
/// Only types with a one-to-one physical correspondence between the box and
/// the laptop mirror anything. A bulk box may hold laptops that arrive and
/// are inspected at different times, so bulk shipments never do.
pub fn mirrored_laptop_status(
    shipment_type: ShipmentType,
    status: ShipmentStatus,
) -> Option<LaptopStatus> {
    use ShipmentStatus as S;

    match shipment_type {
        ShipmentType::BulkToWarehouse => None,
        ShipmentType::SingleFullJourney => match status {
            S::PendingPickup | S::PickupScheduled => None,
            S::PickedUpFromClient | S::InTransitToWarehouse => {
                Some(LaptopStatus::InTransitToWarehouse)
            }
            S::AtWarehouse => Some(LaptopStatus::AtWarehouse),
            S::ReleasedFromWarehouse | S::InTransitToEngineer => {
                Some(LaptopStatus::InTransitToEngineer)
            }
            S::Delivered => Some(LaptopStatus::Delivered),
        },
        ShipmentType::WarehouseToEngineer => match status {
            S::AtWarehouse => Some(LaptopStatus::AtWarehouse),
            S::ReleasedFromWarehouse | S::InTransitToEngineer => {
                Some(LaptopStatus::InTransitToEngineer)
            }
            S::Delivered => Some(LaptopStatus::Delivered),
            S::PendingPickup
            | S::PickupScheduled
            | S::PickedUpFromClient
            | S::InTransitToWarehouse => None,
        },
    }
}

/// Milestone email tied to reaching a status
pub fn notification_for(status: ShipmentStatus) -> Option<NotificationKind> {
    match status {
        ShipmentStatus::PickupScheduled => Some(NotificationKind::PickupConfirmation),
        ShipmentStatus::InTransitToWarehouse => Some(NotificationKind::WarehousePreAlert),
        ShipmentStatus::ReleasedFromWarehouse => Some(NotificationKind::ReleaseNotification),
        ShipmentStatus::Delivered => Some(NotificationKind::DeliveryConfirmation),
        ShipmentStatus::PendingPickup
        | ShipmentStatus::PickedUpFromClient
        | ShipmentStatus::AtWarehouse
        | ShipmentStatus::InTransitToEngineer => None,
    }
}

/// Decide whether `current → requested` is allowed for `shipment_type`.
///
/// Status is not strictly linear: backward corrections inside the type's leg
/// are allowed, but `delivered` is terminal and the requested status must
/// belong to the leg the shipment type covers.
pub fn plan_transition(
    shipment_type: ShipmentType,
    current: ShipmentStatus,
    requested: ShipmentStatus,
) -> LifecycleResult<TransitionPlan> {
    if current == requested {
        return Err(LifecycleError::InvalidTransition(format!(
            "shipment is already '{}'",
            current
        )));
    }
    if current.is_terminal() {
        return Err(LifecycleError::InvalidTransition(format!(
            "shipment is '{}' and can no longer change status",
            current
        )));
    }
    if !shipment_type.leg().contains(&requested) {
        return Err(LifecycleError::InvalidTransition(format!(
            "'{}' is not a status of a {} shipment",
            requested, shipment_type
        )));
    }

    Ok(TransitionPlan {
        shipment_type,
        from: current,
        to: requested,
        stamp: requested.stage_timestamp(),
        laptop_status: mirrored_laptop_status(shipment_type, requested),
        notify: notification_for(requested),
        links_active: requested.holds_laptops(),
    })
}

/// Same as [`plan_transition`] for a raw status string.
///
/// The string goes through the validity predicate before anything is
/// compared.
pub fn plan_transition_str(
    shipment_type: ShipmentType,
    current: ShipmentStatus,
    requested: &str,
) -> LifecycleResult<TransitionPlan> {
    let requested = ShipmentStatus::parse(requested).ok_or_else(|| {
        LifecycleError::validation("status", format!("Unknown shipment status '{}'", requested))
    })?;
    plan_transition(shipment_type, current, requested)
}

impl TransitionPlan {
    /// Stamp the plan's stage timestamp without overwriting an existing one.
    ///
    /// The engineer ETA is a forecast, so it is only stamped when the caller
    /// supplies one. Returns the timestamp written, if any.
    pub fn apply_timestamps(
        &self,
        timestamps: &mut StageTimestamps,
        now: DateTime<Utc>,
        eta_to_engineer: Option<DateTime<Utc>>,
    ) -> Option<StageTimestamp> {
        let stage = self.stamp?;
        let at = match stage {
            StageTimestamp::EtaToEngineer => eta_to_engineer?,
            _ => now,
        };
        timestamps.stamp(stage, at).then_some(stage)
    }
}
