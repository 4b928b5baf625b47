//! Shipment lifecycle tests
//!
//! Property-based and unit tests for:
//! - Property 1: Status Vocabulary Closure
//! - Property 2: Transition Table Legs
//! - Property 3: Laptop Status Propagation
//! - Property 4: Once-Set Stage Timestamps
//! - Journey scenarios across shipment types

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use shared::{
    is_valid_laptop_status, is_valid_shipment_status, mirrored_laptop_status, plan_transition,
    plan_transition_str, LaptopStatus, LifecycleError, NotificationKind, ShipmentStatus,
    ShipmentType, StageTimestamp, StageTimestamps,
};

// ============================================================================
// Property Test Strategies
// ============================================================================

fn shipment_type_strategy() -> impl Strategy<Value = ShipmentType> {
    prop::sample::select(ShipmentType::ALL.to_vec())
}

fn shipment_status_strategy() -> impl Strategy<Value = ShipmentStatus> {
    prop::sample::select(ShipmentStatus::ALL.to_vec())
}

fn laptop_status_strategy() -> impl Strategy<Value = LaptopStatus> {
    prop::sample::select(LaptopStatus::ALL.to_vec())
}

/// Arbitrary snake_case-looking strings, mostly outside the vocabulary
fn status_like_string_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z_]{1,30}",
        "[A-Za-z_ ]{1,30}",
        shipment_status_strategy().prop_map(|s| s.as_str().to_uppercase()),
        shipment_status_strategy().prop_map(|s| format!(" {}", s.as_str())),
    ]
}

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
}

// ============================================================================
// Property 1: Status Vocabulary Closure
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Every shipment status renders to a string the predicate accepts and
    /// parses back to itself
    #[test]
    fn prop_shipment_status_round_trips(status in shipment_status_strategy()) {
        prop_assert!(is_valid_shipment_status(status.as_str()));
        prop_assert_eq!(ShipmentStatus::parse(status.as_str()), Some(status));
    }

    #[test]
    fn prop_laptop_status_round_trips(status in laptop_status_strategy()) {
        prop_assert!(is_valid_laptop_status(status.as_str()));
        prop_assert_eq!(LaptopStatus::parse(status.as_str()), Some(status));
    }

    /// A string is a valid status exactly when it is one of the listed values
    #[test]
    fn prop_unknown_status_strings_rejected(raw in status_like_string_strategy()) {
        let listed = ShipmentStatus::ALL.iter().any(|s| s.as_str() == raw);
        prop_assert_eq!(is_valid_shipment_status(&raw), listed);

        if !listed {
            let err = plan_transition_str(
                ShipmentType::SingleFullJourney,
                ShipmentStatus::PendingPickup,
                &raw,
            )
            .unwrap_err();
            let is_validation = matches!(err, LifecycleError::Validation { .. });
            prop_assert!(is_validation);
        }
    }
}

#[test]
fn test_shipment_status_vocabulary() {
    let expected = [
        "pending_pickup",
        "pickup_scheduled",
        "picked_up_from_client",
        "in_transit_to_warehouse",
        "at_warehouse",
        "released_from_warehouse",
        "in_transit_to_engineer",
        "delivered",
    ];
    let actual: Vec<_> = ShipmentStatus::ALL.iter().map(|s| s.as_str()).collect();
    assert_eq!(actual, expected);
}

#[test]
fn test_laptop_status_vocabulary() {
    for raw in [
        "available",
        "in_transit_to_warehouse",
        "at_warehouse",
        "in_transit_to_engineer",
        "delivered",
        "retired",
    ] {
        assert!(is_valid_laptop_status(raw), "{} should be valid", raw);
    }
    assert!(!is_valid_laptop_status("in_repair"));
    assert!(!is_valid_laptop_status(""));
}

#[test]
fn test_status_serializes_as_snake_case() {
    let json = serde_json::to_string(&ShipmentStatus::ReleasedFromWarehouse).unwrap();
    assert_eq!(json, "\"released_from_warehouse\"");

    let parsed: ShipmentType = serde_json::from_str("\"warehouse_to_engineer\"").unwrap();
    assert_eq!(parsed, ShipmentType::WarehouseToEngineer);
}

// ============================================================================
// Property 2: Transition Table Legs
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// An allowed transition always lands inside the type's leg, and
    /// anything outside the leg is refused
    #[test]
    fn prop_transitions_stay_in_leg(
        shipment_type in shipment_type_strategy(),
        from in shipment_status_strategy(),
        to in shipment_status_strategy(),
    ) {
        let in_leg = shipment_type.leg().contains(&to);
        match plan_transition(shipment_type, from, to) {
            Ok(plan) => {
                prop_assert!(in_leg);
                prop_assert_ne!(from, to);
                prop_assert_ne!(from, ShipmentStatus::Delivered);
                prop_assert_eq!(plan.to, to);
                prop_assert_eq!(plan.from, from);
            }
            Err(err) => {
                let is_transition = matches!(err, LifecycleError::InvalidTransition(_));
                prop_assert!(is_transition);
                prop_assert!(!in_leg || from == to || from == ShipmentStatus::Delivered);
            }
        }
    }

    /// Delivered is terminal for every type
    #[test]
    fn prop_delivered_is_terminal(
        shipment_type in shipment_type_strategy(),
        to in shipment_status_strategy(),
    ) {
        prop_assert!(plan_transition(shipment_type, ShipmentStatus::Delivered, to).is_err());
    }

    /// Links stay active until the shipment reaches the warehouse or delivery
    #[test]
    fn prop_links_follow_holding_statuses(
        shipment_type in shipment_type_strategy(),
        from in shipment_status_strategy(),
        to in shipment_status_strategy(),
    ) {
        if let Ok(plan) = plan_transition(shipment_type, from, to) {
            let expected = !matches!(to, ShipmentStatus::AtWarehouse | ShipmentStatus::Delivered);
            prop_assert_eq!(plan.links_active, expected);
        }
    }
}

#[test]
fn test_bulk_leg_ends_at_warehouse() {
    for to in [
        ShipmentStatus::ReleasedFromWarehouse,
        ShipmentStatus::InTransitToEngineer,
        ShipmentStatus::Delivered,
    ] {
        assert!(plan_transition(ShipmentType::BulkToWarehouse, ShipmentStatus::AtWarehouse, to).is_err());
    }
}

#[test]
fn test_engineer_shipment_cannot_go_back_to_client_leg() {
    for to in [
        ShipmentStatus::PendingPickup,
        ShipmentStatus::PickupScheduled,
        ShipmentStatus::PickedUpFromClient,
        ShipmentStatus::InTransitToWarehouse,
    ] {
        let err = plan_transition(
            ShipmentType::WarehouseToEngineer,
            ShipmentStatus::ReleasedFromWarehouse,
            to,
        )
        .unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidTransition(_)));
    }
}

#[test]
fn test_backward_correction_inside_leg_allowed() {
    let plan = plan_transition(
        ShipmentType::SingleFullJourney,
        ShipmentStatus::PickedUpFromClient,
        ShipmentStatus::PickupScheduled,
    )
    .unwrap();
    assert_eq!(plan.to, ShipmentStatus::PickupScheduled);
}

#[test]
fn test_same_status_rejected() {
    let err = plan_transition(
        ShipmentType::SingleFullJourney,
        ShipmentStatus::AtWarehouse,
        ShipmentStatus::AtWarehouse,
    )
    .unwrap_err();
    assert!(matches!(err, LifecycleError::InvalidTransition(_)));
}

#[test]
fn test_milestone_notifications() {
    let cases = [
        (ShipmentStatus::PickupScheduled, Some(NotificationKind::PickupConfirmation)),
        (ShipmentStatus::InTransitToWarehouse, Some(NotificationKind::WarehousePreAlert)),
        (ShipmentStatus::ReleasedFromWarehouse, Some(NotificationKind::ReleaseNotification)),
        (ShipmentStatus::Delivered, Some(NotificationKind::DeliveryConfirmation)),
        (ShipmentStatus::AtWarehouse, None),
        (ShipmentStatus::PickedUpFromClient, None),
    ];
    for (to, expected) in cases {
        let plan = plan_transition(ShipmentType::SingleFullJourney, ShipmentStatus::PendingPickup, to)
            .unwrap();
        assert_eq!(plan.notify, expected, "notification for {}", to);
    }
}

// ============================================================================
// Property 3: Laptop Status Propagation
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Bulk shipments never change their laptops' status
    #[test]
    fn prop_bulk_never_propagates(
        from in shipment_status_strategy(),
        to in shipment_status_strategy(),
    ) {
        if let Ok(plan) = plan_transition(ShipmentType::BulkToWarehouse, from, to) {
            prop_assert_eq!(plan.laptop_status, None);
        }
    }

    /// The plan carries exactly the mirrored status for its type
    #[test]
    fn prop_plan_uses_mirror_table(
        shipment_type in shipment_type_strategy(),
        from in shipment_status_strategy(),
        to in shipment_status_strategy(),
    ) {
        if let Ok(plan) = plan_transition(shipment_type, from, to) {
            prop_assert_eq!(plan.laptop_status, mirrored_laptop_status(shipment_type, to));
        }
    }
}

#[test]
fn test_single_journey_propagation_table() {
    let cases = [
        (ShipmentStatus::PickupScheduled, None),
        (ShipmentStatus::PickedUpFromClient, Some(LaptopStatus::InTransitToWarehouse)),
        (ShipmentStatus::InTransitToWarehouse, Some(LaptopStatus::InTransitToWarehouse)),
        (ShipmentStatus::AtWarehouse, Some(LaptopStatus::AtWarehouse)),
        (ShipmentStatus::ReleasedFromWarehouse, Some(LaptopStatus::InTransitToEngineer)),
        (ShipmentStatus::InTransitToEngineer, Some(LaptopStatus::InTransitToEngineer)),
        (ShipmentStatus::Delivered, Some(LaptopStatus::Delivered)),
    ];
    for (status, expected) in cases {
        assert_eq!(
            mirrored_laptop_status(ShipmentType::SingleFullJourney, status),
            expected,
            "single shipment at {}",
            status
        );
    }
}

#[test]
fn test_engineer_shipment_propagation_table() {
    let cases = [
        (ShipmentStatus::AtWarehouse, Some(LaptopStatus::AtWarehouse)),
        (ShipmentStatus::ReleasedFromWarehouse, Some(LaptopStatus::InTransitToEngineer)),
        (ShipmentStatus::InTransitToEngineer, Some(LaptopStatus::InTransitToEngineer)),
        (ShipmentStatus::Delivered, Some(LaptopStatus::Delivered)),
    ];
    for (status, expected) in cases {
        assert_eq!(
            mirrored_laptop_status(ShipmentType::WarehouseToEngineer, status),
            expected
        );
    }
}

// ============================================================================
// Property 4: Once-Set Stage Timestamps
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Replaying any sequence of allowed transitions never overwrites a
    /// stage timestamp that was already set
    #[test]
    fn prop_stage_timestamps_never_overwritten(
        shipment_type in shipment_type_strategy(),
        path in prop::collection::vec(shipment_status_strategy(), 1..12),
    ) {
        let mut status = shipment_type.initial_status();
        let mut timestamps = StageTimestamps::default();
        let mut first_seen: Vec<(StageTimestamp, DateTime<Utc>)> = Vec::new();

        for (step, to) in path.into_iter().enumerate() {
            let Ok(plan) = plan_transition(shipment_type, status, to) else {
                continue;
            };
            let now = base_time() + Duration::hours(step as i64);
            let eta = Some(now + Duration::days(2));

            if let Some(stage) = plan.apply_timestamps(&mut timestamps, now, eta) {
                prop_assert!(first_seen.iter().all(|(s, _)| *s != stage));
                first_seen.push((stage, timestamps.get(stage).unwrap()));
            }
            for (stage, at) in &first_seen {
                prop_assert_eq!(timestamps.get(*stage), Some(*at));
            }
            status = to;
        }
    }
}

#[test]
fn test_eta_only_stamped_when_supplied() {
    let plan = plan_transition(
        ShipmentType::WarehouseToEngineer,
        ShipmentStatus::ReleasedFromWarehouse,
        ShipmentStatus::InTransitToEngineer,
    )
    .unwrap();

    let mut timestamps = StageTimestamps::default();
    assert_eq!(plan.apply_timestamps(&mut timestamps, base_time(), None), None);
    assert_eq!(timestamps.eta_to_engineer, None);

    let eta = base_time() + Duration::days(3);
    assert_eq!(
        plan.apply_timestamps(&mut timestamps, base_time(), Some(eta)),
        Some(StageTimestamp::EtaToEngineer)
    );
    assert_eq!(timestamps.eta_to_engineer, Some(eta));
}

#[test]
fn test_stage_columns() {
    assert_eq!(StageTimestamp::PickupScheduled.column(), "pickup_scheduled_date");
    assert_eq!(StageTimestamp::ArrivedWarehouse.column(), "arrived_warehouse_at");
    assert_eq!(StageTimestamp::Delivered.column(), "delivered_at");
}

// ============================================================================
// Journey Scenarios
// ============================================================================

/// Walk a shipment through `path`, mirroring laptop status the way the
/// backend does inside its transaction
fn walk(
    shipment_type: ShipmentType,
    laptop: &mut LaptopStatus,
    timestamps: &mut StageTimestamps,
    path: &[ShipmentStatus],
) -> ShipmentStatus {
    let mut status = shipment_type.initial_status();
    for (step, to) in path.iter().enumerate() {
        let plan = plan_transition(shipment_type, status, *to)
            .unwrap_or_else(|e| panic!("{} -> {} refused: {}", status, to, e));
        plan.apply_timestamps(timestamps, base_time() + Duration::hours(step as i64), None);
        if let Some(next) = plan.laptop_status {
            *laptop = next;
        }
        status = *to;
    }
    status
}

#[test]
fn test_single_journey_end_to_end() {
    let mut laptop = LaptopStatus::InTransitToWarehouse;
    let mut timestamps = StageTimestamps::default();

    let status = walk(
        ShipmentType::SingleFullJourney,
        &mut laptop,
        &mut timestamps,
        &[
            ShipmentStatus::PickupScheduled,
            ShipmentStatus::PickedUpFromClient,
            ShipmentStatus::InTransitToWarehouse,
            ShipmentStatus::AtWarehouse,
            ShipmentStatus::ReleasedFromWarehouse,
            ShipmentStatus::InTransitToEngineer,
            ShipmentStatus::Delivered,
        ],
    );

    assert_eq!(status, ShipmentStatus::Delivered);
    assert_eq!(laptop, LaptopStatus::Delivered);
    assert!(timestamps.pickup_scheduled_date.is_some());
    assert!(timestamps.picked_up_at.is_some());
    assert!(timestamps.arrived_warehouse_at.is_some());
    assert!(timestamps.released_warehouse_at.is_some());
    assert!(timestamps.delivered_at.is_some());
    assert!(timestamps.eta_to_engineer.is_none());
}

#[test]
fn test_bulk_arrival_leaves_laptops_alone() {
    let mut laptop = LaptopStatus::InTransitToWarehouse;
    let mut timestamps = StageTimestamps::default();

    walk(
        ShipmentType::BulkToWarehouse,
        &mut laptop,
        &mut timestamps,
        &[
            ShipmentStatus::PickupScheduled,
            ShipmentStatus::PickedUpFromClient,
            ShipmentStatus::InTransitToWarehouse,
            ShipmentStatus::AtWarehouse,
        ],
    );

    assert_eq!(laptop, LaptopStatus::InTransitToWarehouse);
    assert!(timestamps.arrived_warehouse_at.is_some());
}

#[test]
fn test_engineer_shipment_starts_released() {
    assert_eq!(
        ShipmentType::WarehouseToEngineer.initial_status(),
        ShipmentStatus::ReleasedFromWarehouse
    );

    let mut laptop = LaptopStatus::InTransitToEngineer;
    let mut timestamps = StageTimestamps::default();
    walk(
        ShipmentType::WarehouseToEngineer,
        &mut laptop,
        &mut timestamps,
        &[ShipmentStatus::InTransitToEngineer, ShipmentStatus::Delivered],
    );
    assert_eq!(laptop, LaptopStatus::Delivered);
}
