//! Warehouse reception tests
//!
//! Property-based and unit tests for:
//! - Property 10: Photo Completeness
//! - Property 11: Reception Eligibility
//! - Property 12: One-Way Approval
//! - Photo upload naming

use proptest::prelude::*;
use shared::{
    check_approval, check_reception_eligibility, status_after_approval, validate_photo_filename,
    LaptopStatus, LifecycleError, ReceptionPhoto, ReceptionPhotos, ReceptionReportStatus,
    PHOTO_EXTENSIONS,
};

// ============================================================================
// Property Test Strategies
// ============================================================================

fn laptop_status_strategy() -> impl Strategy<Value = LaptopStatus> {
    prop::sample::select(LaptopStatus::ALL.to_vec())
}

/// Any subset of the three photo slots
fn photo_subset_strategy() -> impl Strategy<Value = Vec<ReceptionPhoto>> {
    prop::sample::subsequence(ReceptionPhoto::ALL.to_vec(), 0..=3)
}

fn photo_filename_strategy() -> impl Strategy<Value = String> {
    (
        "[a-zA-Z0-9_-]{1,20}",
        prop_oneof![
            prop::sample::select(PHOTO_EXTENSIONS.to_vec()).prop_map(|e| e.to_string()),
            prop::sample::select(PHOTO_EXTENSIONS.to_vec()).prop_map(|e| e.to_uppercase()),
            Just("gif".to_string()),
            Just("pdf".to_string()),
            Just("exe".to_string()),
        ],
    )
        .prop_map(|(stem, ext)| format!("{}.{}", stem, ext))
}

// ============================================================================
// Property 10: Photo Completeness
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// A submission is complete only with all three photos, and the error
    /// names the first missing one
    #[test]
    fn prop_all_three_photos_required(present in photo_subset_strategy()) {
        let mut photos = ReceptionPhotos::default();
        for photo in &present {
            photos.set(*photo, photo.field_name().to_string());
        }

        let missing: Vec<_> = ReceptionPhoto::ALL
            .into_iter()
            .filter(|p| !present.contains(p))
            .collect();
        prop_assert_eq!(photos.missing(), missing.clone());

        match photos.check_complete() {
            Ok(()) => prop_assert!(missing.is_empty()),
            Err(LifecycleError::Validation { field, .. }) => {
                prop_assert_eq!(field.as_str(), missing[0].field_name());
            }
            Err(other) => prop_assert!(false, "unexpected error {:?}", other),
        }
    }

    /// Files already staged survive a failed completeness check so they can
    /// be cleaned up
    #[test]
    fn prop_present_photos_recoverable(present in photo_subset_strategy()) {
        let mut photos = ReceptionPhotos::default();
        for photo in &present {
            photos.set(*photo, *photo);
        }
        let mut recovered = photos.into_present();
        recovered.sort_by_key(|p| p.field_name());
        let mut expected = present.clone();
        expected.sort_by_key(|p| p.field_name());
        prop_assert_eq!(recovered, expected);
    }
}

#[test]
fn test_complete_photos_keep_field_order() {
    let mut photos = ReceptionPhotos::default();
    photos.set(ReceptionPhoto::WorkingCondition, "c.jpg");
    photos.set(ReceptionPhoto::SerialNumber, "a.jpg");
    photos.set(ReceptionPhoto::ExternalCondition, "b.jpg");

    let complete = photos.complete().unwrap();
    let urls: Vec<_> = complete
        .map(|photo, name| format!("/uploads/reception/{}-{}", photo.field_name(), name))
        .into_vec();
    assert_eq!(urls[0].0, ReceptionPhoto::SerialNumber);
    assert_eq!(urls[1].0, ReceptionPhoto::ExternalCondition);
    assert_eq!(urls[2].0, ReceptionPhoto::WorkingCondition);
    assert!(urls[2].1.ends_with("c.jpg"));
}

#[test]
fn test_photo_field_names() {
    for photo in ReceptionPhoto::ALL {
        assert_eq!(ReceptionPhoto::from_field_name(photo.field_name()), Some(photo));
    }
    assert_eq!(ReceptionPhoto::from_field_name("photo_box"), None);
}

// ============================================================================
// Property 11: Reception Eligibility
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Reports are filed only for arriving or stored laptops without a
    /// pending report
    #[test]
    fn prop_reception_eligibility(status in laptop_status_strategy(), pending in any::<bool>()) {
        let receivable = matches!(
            status,
            LaptopStatus::Available | LaptopStatus::InTransitToWarehouse | LaptopStatus::AtWarehouse
        );
        let result = check_reception_eligibility(status, pending);
        prop_assert_eq!(result.is_ok(), receivable && !pending);

        if receivable && pending {
            let is_conflict = matches!(result, Err(LifecycleError::Conflict { .. }));
            prop_assert!(is_conflict);
        }
    }

    #[test]
    fn prop_photo_extensions(filename in photo_filename_strategy()) {
        let ext = filename.rsplit_once('.').map(|(_, e)| e.to_ascii_lowercase()).unwrap();
        let accepted = PHOTO_EXTENSIONS.contains(&ext.as_str());
        match validate_photo_filename(&filename) {
            Ok(normalized) => {
                prop_assert!(accepted);
                prop_assert_eq!(normalized, ext);
            }
            Err(_) => prop_assert!(!accepted),
        }
    }
}

#[test]
fn test_photo_without_extension_rejected() {
    assert!(validate_photo_filename("IMG_0042").is_err());
    assert!(validate_photo_filename("").is_err());
}

// ============================================================================
// Property 12: One-Way Approval
// ============================================================================

#[test]
fn test_pending_report_can_be_approved() {
    assert!(check_approval(ReceptionReportStatus::Pending).is_ok());
    assert_eq!(status_after_approval(), LaptopStatus::AtWarehouse);
}

#[test]
fn test_reapproval_is_conflict() {
    let err = check_approval(ReceptionReportStatus::Approved).unwrap_err();
    assert!(matches!(err, LifecycleError::Conflict { .. }));
}

#[test]
fn test_report_status_vocabulary() {
    assert_eq!(ReceptionReportStatus::Pending.as_str(), "pending");
    assert_eq!(ReceptionReportStatus::Approved.as_str(), "approved");
    assert_eq!(ReceptionReportStatus::parse("approved"), Some(ReceptionReportStatus::Approved));
    assert_eq!(ReceptionReportStatus::parse("rejected"), None);
}
