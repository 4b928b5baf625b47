//! Notification kinds emitted by the lifecycle

use serde::{Deserialize, Serialize};

/// Email the notifier sends for a shipment milestone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    PickupConfirmation,
    WarehousePreAlert,
    ReleaseNotification,
    DeliveryConfirmation,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::PickupConfirmation => "pickup_confirmation",
            NotificationKind::WarehousePreAlert => "warehouse_pre_alert",
            NotificationKind::ReleaseNotification => "release_notification",
            NotificationKind::DeliveryConfirmation => "delivery_confirmation",
        }
    }
}
