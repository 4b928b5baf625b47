//! Warehouse reception report models and rules

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::LaptopStatus;
use crate::error::{LifecycleError, LifecycleResult};

/// Approval state of a reception report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceptionReportStatus {
    Pending,
    Approved,
}

impl ReceptionReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReceptionReportStatus::Pending => "pending",
            ReceptionReportStatus::Approved => "approved",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ReceptionReportStatus::Pending),
            "approved" => Some(ReceptionReportStatus::Approved),
            _ => None,
        }
    }
}

/// The three mandatory inspection photos
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceptionPhoto {
    SerialNumber,
    ExternalCondition,
    WorkingCondition,
}

impl ReceptionPhoto {
    pub const ALL: [ReceptionPhoto; 3] = [
        ReceptionPhoto::SerialNumber,
        ReceptionPhoto::ExternalCondition,
        ReceptionPhoto::WorkingCondition,
    ];

    /// Multipart field carrying this photo
    pub fn field_name(&self) -> &'static str {
        match self {
            ReceptionPhoto::SerialNumber => "photo_serial_number",
            ReceptionPhoto::ExternalCondition => "photo_external_condition",
            ReceptionPhoto::WorkingCondition => "photo_working_condition",
        }
    }

    pub fn from_field_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.field_name() == name)
    }
}

/// Photo slots of one submission, filled as uploads arrive
#[derive(Debug, Clone)]
pub struct ReceptionPhotos<T> {
    pub serial_number: Option<T>,
    pub external_condition: Option<T>,
    pub working_condition: Option<T>,
}

impl<T> Default for ReceptionPhotos<T> {
    fn default() -> Self {
        Self {
            serial_number: None,
            external_condition: None,
            working_condition: None,
        }
    }
}

/// All three photos of a submission
#[derive(Debug, Clone)]
pub struct CompleteReceptionPhotos<T> {
    pub serial_number: T,
    pub external_condition: T,
    pub working_condition: T,
}

impl<T> CompleteReceptionPhotos<T> {
    pub fn map<U>(self, mut f: impl FnMut(ReceptionPhoto, T) -> U) -> CompleteReceptionPhotos<U> {
        CompleteReceptionPhotos {
            serial_number: f(ReceptionPhoto::SerialNumber, self.serial_number),
            external_condition: f(ReceptionPhoto::ExternalCondition, self.external_condition),
            working_condition: f(ReceptionPhoto::WorkingCondition, self.working_condition),
        }
    }

    pub fn into_vec(self) -> Vec<(ReceptionPhoto, T)> {
        vec![
            (ReceptionPhoto::SerialNumber, self.serial_number),
            (ReceptionPhoto::ExternalCondition, self.external_condition),
            (ReceptionPhoto::WorkingCondition, self.working_condition),
        ]
    }
}

impl<T> ReceptionPhotos<T> {
    pub fn set(&mut self, photo: ReceptionPhoto, value: T) {
        match photo {
            ReceptionPhoto::SerialNumber => self.serial_number = Some(value),
            ReceptionPhoto::ExternalCondition => self.external_condition = Some(value),
            ReceptionPhoto::WorkingCondition => self.working_condition = Some(value),
        }
    }

    /// Photo slots still empty, in field order
    pub fn missing(&self) -> Vec<ReceptionPhoto> {
        let mut missing = Vec::new();
        if self.serial_number.is_none() {
            missing.push(ReceptionPhoto::SerialNumber);
        }
        if self.external_condition.is_none() {
            missing.push(ReceptionPhoto::ExternalCondition);
        }
        if self.working_condition.is_none() {
            missing.push(ReceptionPhoto::WorkingCondition);
        }
        missing
    }

    /// Fail unless every slot is filled
    pub fn check_complete(&self) -> LifecycleResult<()> {
        let missing = self.missing();
        match missing.first() {
            None => Ok(()),
            Some(first) => {
                let fields: Vec<&str> = missing.iter().map(|p| p.field_name()).collect();
                Err(LifecycleError::validation(
                    first.field_name(),
                    format!("All three photos are required; missing: {}", fields.join(", ")),
                ))
            }
        }
    }

    /// Require all three photos; a partial set fails as a whole
    pub fn complete(self) -> LifecycleResult<CompleteReceptionPhotos<T>> {
        self.check_complete()?;
        match (self.serial_number, self.external_condition, self.working_condition) {
            (Some(serial_number), Some(external_condition), Some(working_condition)) => {
                Ok(CompleteReceptionPhotos {
                    serial_number,
                    external_condition,
                    working_condition,
                })
            }
            _ => Err(LifecycleError::validation("photos", "All three photos are required")),
        }
    }

    /// Whatever was uploaded, for cleanup after a rejected submission
    pub fn into_present(self) -> Vec<T> {
        [self.serial_number, self.external_condition, self.working_condition]
            .into_iter()
            .flatten()
            .collect()
    }
}

/// Stored reception report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceptionReport {
    pub id: Uuid,
    pub laptop_id: Uuid,
    pub shipment_id: Option<Uuid>,
    pub warehouse_user_id: Uuid,
    pub received_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub photo_serial_number: String,
    pub photo_external_condition: String,
    pub photo_working_condition: String,
    pub status: ReceptionReportStatus,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A laptop may receive a new report only when it is arriving or already
/// stored and has no report awaiting approval.
pub fn check_reception_eligibility(
    laptop_status: LaptopStatus,
    has_pending_report: bool,
) -> LifecycleResult<()> {
    if !laptop_status.can_be_received() {
        return Err(LifecycleError::validation(
            "laptop_id",
            format!(
                "Laptop in status '{}' cannot be received at the warehouse",
                laptop_status
            ),
        ));
    }
    if has_pending_report {
        return Err(LifecycleError::conflict(
            "reception_report",
            "Laptop already has a reception report awaiting approval",
        ));
    }
    Ok(())
}

/// Approval is one-way; re-approving is an error, not a no-op
pub fn check_approval(status: ReceptionReportStatus) -> LifecycleResult<()> {
    match status {
        ReceptionReportStatus::Pending => Ok(()),
        ReceptionReportStatus::Approved => Err(LifecycleError::conflict(
            "reception_report",
            "Reception report has already been approved",
        )),
    }
}

/// Laptop status after a report is approved
pub fn status_after_approval() -> LaptopStatus {
    LaptopStatus::AtWarehouse
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_photos_rejected() {
        let mut photos = ReceptionPhotos::default();
        photos.set(ReceptionPhoto::SerialNumber, "a.jpg");
        photos.set(ReceptionPhoto::WorkingCondition, "c.jpg");

        let err = photos.check_complete().unwrap_err();
        assert_eq!(
            err,
            LifecycleError::validation(
                "photo_external_condition",
                "All three photos are required; missing: photo_external_condition"
            )
        );
        assert_eq!(photos.into_present(), vec!["a.jpg", "c.jpg"]);
    }

    #[test]
    fn test_complete_photos_in_field_order() {
        let mut photos = ReceptionPhotos::default();
        for photo in ReceptionPhoto::ALL {
            photos.set(photo, photo.field_name());
        }
        let complete = photos.complete().unwrap();
        let fields: Vec<_> = complete.into_vec().into_iter().map(|(p, _)| p).collect();
        assert_eq!(fields, ReceptionPhoto::ALL.to_vec());
    }

    #[test]
    fn test_field_names_round_trip() {
        for photo in ReceptionPhoto::ALL {
            assert_eq!(ReceptionPhoto::from_field_name(photo.field_name()), Some(photo));
        }
        assert_eq!(ReceptionPhoto::from_field_name("notes"), None);
    }

    #[test]
    fn test_reception_eligibility() {
        assert!(check_reception_eligibility(LaptopStatus::InTransitToWarehouse, false).is_ok());
        assert!(check_reception_eligibility(LaptopStatus::Delivered, false).is_err());
        assert!(matches!(
            check_reception_eligibility(LaptopStatus::AtWarehouse, true),
            Err(LifecycleError::Conflict { .. })
        ));
    }

    #[test]
    fn test_approval_is_one_way() {
        assert!(check_approval(ReceptionReportStatus::Pending).is_ok());
        assert!(matches!(
            check_approval(ReceptionReportStatus::Approved),
            Err(LifecycleError::Conflict { .. })
        ));
    }
}
