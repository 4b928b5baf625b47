//! Pickup form snapshot models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::{LifecycleError, LifecycleResult};

/// Intake details submitted once per shipment and replaced in place
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PickupFormData {
    #[validate(length(min = 1, max = 200, message = "Contact name is required"))]
    pub contact_name: String,
    #[validate(email(message = "Contact email is invalid"))]
    pub contact_email: String,
    #[validate(length(min = 5, max = 30, message = "Contact phone is required"))]
    pub contact_phone: String,
    #[validate(length(min = 1, max = 500, message = "Pickup address is required"))]
    pub pickup_address: String,
    #[validate(length(min = 1, max = 100, message = "Pickup city is required"))]
    pub pickup_city: String,
    #[validate(length(min = 1, max = 100, message = "Pickup state is required"))]
    pub pickup_state: String,
    #[validate(length(min = 3, max = 12, message = "Pickup zip is required"))]
    pub pickup_zip: String,
    pub pickup_date: NaiveDate,
    pub pickup_time_slot: Option<PickupTimeSlot>,
    /// Client-declared count; overrides a bulk shipment's `laptop_count`
    #[validate(range(min = 1, max = 10000, message = "Number of laptops must be at least 1"))]
    pub number_of_laptops: Option<i32>,
    #[validate(range(min = 1, max = 1000, message = "Number of boxes must be at least 1"))]
    pub number_of_boxes: Option<i32>,
    pub bulk_length_in: Option<Decimal>,
    pub bulk_width_in: Option<Decimal>,
    pub bulk_height_in: Option<Decimal>,
    pub bulk_weight_lbs: Option<Decimal>,
    #[serde(default)]
    pub include_accessories: bool,
    #[validate(length(max = 1000))]
    pub accessories_description: Option<String>,
    #[validate(length(max = 2000))]
    pub special_instructions: Option<String>,
}

/// Courier pickup window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickupTimeSlot {
    Morning,
    Afternoon,
    Evening,
}

impl PickupFormData {
    /// Field-level validation plus the cross-field rules
    pub fn check(&self) -> LifecycleResult<()> {
        self.validate()
            .map_err(|e| LifecycleError::from_validation_errors(&e))?;

        if self.include_accessories
            && self
                .accessories_description
                .as_deref()
                .map_or(true, |d| d.trim().is_empty())
        {
            return Err(LifecycleError::validation(
                "accessories_description",
                "Describe the accessories when accessories are included",
            ));
        }

        let dimensions = [
            ("bulk_length_in", self.bulk_length_in),
            ("bulk_width_in", self.bulk_width_in),
            ("bulk_height_in", self.bulk_height_in),
            ("bulk_weight_lbs", self.bulk_weight_lbs),
        ];
        for (field, value) in dimensions {
            if let Some(v) = value {
                if v <= Decimal::ZERO {
                    return Err(LifecycleError::validation(field, "Must be greater than zero"));
                }
            }
        }

        Ok(())
    }

    /// Box dimensions are all or nothing
    pub fn has_complete_dimensions(&self) -> bool {
        self.bulk_length_in.is_some()
            && self.bulk_width_in.is_some()
            && self.bulk_height_in.is_some()
            && self.bulk_weight_lbs.is_some()
    }
}

/// Stored pickup form row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickupForm {
    pub id: Uuid,
    pub shipment_id: Uuid,
    pub submitted_by: Option<Uuid>,
    pub submitted_at: DateTime<Utc>,
    pub form_data: serde_json::Value,
}
