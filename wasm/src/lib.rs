//! WebAssembly module for the Laptop Tracking Platform
//!
//! Lets the browser run the same lifecycle rules as the server:
//! - Status vocabulary checks
//! - Allowed status changes per shipment type
//! - The edit guard
//! - Offline form validation

use serde::Serialize;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::validation::*;

fn parse_type(raw: &str) -> Result<ShipmentType, JsValue> {
    ShipmentType::parse(raw)
        .ok_or_else(|| JsValue::from_str(&format!("Unknown shipment type '{}'", raw)))
}

fn parse_status(raw: &str) -> Result<ShipmentStatus, JsValue> {
    ShipmentStatus::parse(raw)
        .ok_or_else(|| JsValue::from_str(&format!("Unknown shipment status '{}'", raw)))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Whether `status` is one of the shipment statuses
#[wasm_bindgen]
pub fn is_shipment_status(status: &str) -> bool {
    is_valid_shipment_status(status)
}

/// Whether `status` is one of the laptop statuses
#[wasm_bindgen]
pub fn is_laptop_status(status: &str) -> bool {
    is_valid_laptop_status(status)
}

/// Statuses a shipment of this type moves through, in order
#[wasm_bindgen]
pub fn shipment_type_statuses(shipment_type: &str) -> Result<js_sys::Array, JsValue> {
    let shipment_type = parse_type(shipment_type)?;
    Ok(shipment_type
        .leg()
        .iter()
        .map(|s| JsValue::from_str(s.as_str()))
        .collect())
}

/// Whether the status dropdown should offer `to`
#[wasm_bindgen]
pub fn can_transition(shipment_type: &str, from: &str, to: &str) -> bool {
    match (ShipmentType::parse(shipment_type), ShipmentStatus::parse(from)) {
        (Some(shipment_type), Some(from)) => {
            shared::plan_transition_str(shipment_type, from, to).is_ok()
        }
        _ => false,
    }
}

/// Transition plan as JSON, or the refusal message
#[wasm_bindgen]
pub fn plan_status_change(shipment_type: &str, from: &str, to: &str) -> Result<String, JsValue> {
    let plan = shared::plan_transition_str(parse_type(shipment_type)?, parse_status(from)?, to)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    to_json(&plan)
}

/// Edit guard answer as `{"allowed": bool, "reason": string}`
#[wasm_bindgen]
pub fn shipment_edit_eligibility(
    shipment_type: &str,
    status: &str,
    has_pickup_form: bool,
) -> Result<String, JsValue> {
    let eligibility = shared::edit_eligibility(
        parse_type(shipment_type)?,
        parse_status(status)?,
        has_pickup_form,
    );
    to_json(&eligibility)
}

/// Validate a pickup form before it is submitted
#[wasm_bindgen]
pub fn validate_pickup_form(form_json: &str, bulk: bool) -> Result<(), JsValue> {
    let form: PickupFormData = serde_json::from_str(form_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid pickup form JSON: {}", e)))?;

    let checked = if bulk {
        shared::check_bulk_pickup_form(&form)
    } else {
        form.check()
    };
    checked.map_err(|e| JsValue::from_str(&e.to_string()))
}

#[wasm_bindgen]
pub fn is_valid_serial(serial: &str) -> bool {
    validate_serial_number(serial).is_ok()
}

#[wasm_bindgen]
pub fn is_valid_jira(ticket: &str) -> bool {
    validate_jira_ticket(ticket).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_predicates() {
        assert!(is_shipment_status("at_warehouse"));
        assert!(!is_shipment_status("lost"));
        assert!(is_laptop_status("retired"));
        assert!(!is_laptop_status("pending_pickup"));
    }

    #[test]
    fn test_can_transition() {
        assert!(can_transition("single_full_journey", "pending_pickup", "pickup_scheduled"));
        assert!(!can_transition("bulk_to_warehouse", "at_warehouse", "delivered"));
        assert!(!can_transition("warehouse_to_engineer", "delivered", "at_warehouse"));
        assert!(!can_transition("mystery", "pending_pickup", "delivered"));
        assert!(!can_transition("single_full_journey", "pending_pickup", "teleported"));
    }

    #[test]
    fn test_edit_eligibility_json() {
        let json = shipment_edit_eligibility("bulk_to_warehouse", "pending_pickup", false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["allowed"], false);

        let json =
            shipment_edit_eligibility("warehouse_to_engineer", "in_transit_to_engineer", false)
                .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["allowed"], true);
    }

    #[test]
    fn test_identifier_checks() {
        assert!(is_valid_serial("C02XK1ZQJG5H"));
        assert!(!is_valid_serial("no spaces"));
        assert!(is_valid_jira("SCOP-1234"));
        assert!(!is_valid_jira("scop-1234"));
    }
}
