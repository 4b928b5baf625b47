//! Shipment creation inputs, the type router and the laptop link rules

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::{LifecycleError, LifecycleResult};
use crate::models::{
    LaptopDetails, LaptopStatus, PickupFormData, Shipment, ShipmentStatus, ShipmentType,
};

/// Minimum declared count for a bulk shipment
pub const MIN_BULK_LAPTOPS: i32 = 2;

/// Input for a single laptop travelling client → warehouse → engineer.
///
/// The laptop and pickup form fields are flat so the older single-shipment
/// form shape deserializes into it unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SingleFullJourneyInput {
    pub client_company_id: Uuid,
    pub software_engineer_id: Option<Uuid>,
    #[validate(length(min = 1, max = 50, message = "JIRA ticket number is required"))]
    pub jira_ticket_number: String,
    #[validate(length(max = 100))]
    pub courier_name: Option<String>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    #[serde(flatten)]
    pub laptop: LaptopDetails,
    #[serde(flatten)]
    pub pickup: PickupFormData,
}

/// Input for several laptops travelling client → warehouse
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BulkToWarehouseInput {
    pub client_company_id: Uuid,
    /// Present only so it can be rejected with a clear message
    pub software_engineer_id: Option<Uuid>,
    #[validate(length(min = 1, max = 50, message = "JIRA ticket number is required"))]
    pub jira_ticket_number: String,
    pub laptop_count: i32,
    /// Logistics may open the shipment before the client fills the form
    pub pickup_form: Option<PickupFormData>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

/// Engineer delivery details stored inline on warehouse-to-engineer shipments
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DeliveryDetails {
    #[validate(length(min = 1, max = 200, message = "Engineer name is required"))]
    pub engineer_name: String,
    #[validate(email(message = "Engineer email is invalid"))]
    pub engineer_email: String,
    #[validate(length(max = 30))]
    pub engineer_phone: Option<String>,
    #[validate(length(min = 1, max = 500, message = "Delivery address is required"))]
    pub address: String,
    #[validate(length(min = 1, max = 100, message = "Delivery city is required"))]
    pub city: String,
    #[validate(length(min = 1, max = 100, message = "Delivery state is required"))]
    pub state: String,
    #[validate(length(min = 3, max = 12, message = "Delivery zip is required"))]
    pub zip: String,
    pub requested_delivery_date: Option<NaiveDate>,
    #[validate(length(max = 2000))]
    pub special_instructions: Option<String>,
}

/// Input for one inventoried laptop travelling warehouse → engineer
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct WarehouseToEngineerInput {
    pub client_company_id: Uuid,
    pub laptop_id: Uuid,
    pub software_engineer_id: Uuid,
    #[validate(length(min = 1, max = 50, message = "JIRA ticket number is required"))]
    pub jira_ticket_number: String,
    pub delivery: DeliveryDetails,
    #[validate(length(max = 100))]
    pub courier_name: Option<String>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

/// A creation request after routing on its type discriminator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "shipment_type", rename_all = "snake_case")]
pub enum CreateShipmentRequest {
    SingleFullJourney(SingleFullJourneyInput),
    BulkToWarehouse(BulkToWarehouseInput),
    WarehouseToEngineer(WarehouseToEngineerInput),
}

/// Router output
#[derive(Debug, Clone)]
pub struct RoutedRequest {
    pub request: CreateShipmentRequest,
    /// Arrived in the pre-typed shape and was mapped to a single shipment
    pub legacy: bool,
}

/// Pick the creation procedure for a raw request body.
///
/// Bodies without `shipment_type` but carrying the old `number_of_laptops`
/// field are the legacy single-shipment form and get single full journey
/// semantics.
pub fn route_creation_request(mut body: serde_json::Value) -> LifecycleResult<RoutedRequest> {
    let object = body
        .as_object_mut()
        .ok_or_else(|| LifecycleError::validation("body", "Expected a JSON object"))?;

    let legacy = match object.get("shipment_type") {
        Some(serde_json::Value::String(raw)) => {
            if ShipmentType::parse(raw).is_none() {
                return Err(LifecycleError::validation(
                    "shipment_type",
                    format!("Unknown shipment type '{}'", raw),
                ));
            }
            false
        }
        Some(_) => {
            return Err(LifecycleError::validation(
                "shipment_type",
                "Shipment type must be a string",
            ))
        }
        None if object.contains_key("number_of_laptops") => {
            object.insert(
                "shipment_type".to_string(),
                serde_json::Value::String(ShipmentType::SingleFullJourney.as_str().to_string()),
            );
            true
        }
        None => {
            return Err(LifecycleError::validation(
                "shipment_type",
                "Shipment type is required",
            ))
        }
    };

    let request = serde_json::from_value::<CreateShipmentRequest>(body)
        .map_err(|e| LifecycleError::validation("body", e.to_string()))?;

    Ok(RoutedRequest { request, legacy })
}

impl CreateShipmentRequest {
    pub fn shipment_type(&self) -> ShipmentType {
        match self {
            CreateShipmentRequest::SingleFullJourney(_) => ShipmentType::SingleFullJourney,
            CreateShipmentRequest::BulkToWarehouse(_) => ShipmentType::BulkToWarehouse,
            CreateShipmentRequest::WarehouseToEngineer(_) => ShipmentType::WarehouseToEngineer,
        }
    }

    pub fn client_company_id(&self) -> Uuid {
        match self {
            CreateShipmentRequest::SingleFullJourney(input) => input.client_company_id,
            CreateShipmentRequest::BulkToWarehouse(input) => input.client_company_id,
            CreateShipmentRequest::WarehouseToEngineer(input) => input.client_company_id,
        }
    }

    /// Run the per-type input rules; nothing is written before this passes
    pub fn check(&self) -> LifecycleResult<()> {
        match self {
            CreateShipmentRequest::SingleFullJourney(input) => input.check(),
            CreateShipmentRequest::BulkToWarehouse(input) => input.check(),
            CreateShipmentRequest::WarehouseToEngineer(input) => input.check(),
        }
    }
}

fn check_jira(ticket: &str) -> LifecycleResult<()> {
    crate::validation::validate_jira_ticket(ticket)
        .map_err(|msg| LifecycleError::validation("jira_ticket_number", msg))
}

impl SingleFullJourneyInput {
    pub fn check(&self) -> LifecycleResult<()> {
        self.validate()
            .map_err(|e| LifecycleError::from_validation_errors(&e))?;
        check_jira(&self.jira_ticket_number)?;
        self.laptop.check()?;
        self.pickup.check()?;
        Ok(())
    }
}

impl BulkToWarehouseInput {
    pub fn check(&self) -> LifecycleResult<()> {
        self.validate()
            .map_err(|e| LifecycleError::from_validation_errors(&e))?;
        check_jira(&self.jira_ticket_number)?;

        if self.software_engineer_id.is_some() {
            return Err(LifecycleError::validation(
                "software_engineer_id",
                "Bulk shipments only travel to the warehouse and cannot have an engineer",
            ));
        }
        if self.laptop_count < MIN_BULK_LAPTOPS {
            return Err(LifecycleError::validation(
                "laptop_count",
                format!("Bulk shipments need at least {} laptops", MIN_BULK_LAPTOPS),
            ));
        }
        if let Some(form) = &self.pickup_form {
            check_bulk_pickup_form(form)?;
        }
        Ok(())
    }
}

/// Bulk pickup forms must describe the boxes completely
pub fn check_bulk_pickup_form(form: &PickupFormData) -> LifecycleResult<()> {
    form.check()?;
    if let Some(count) = form.number_of_laptops {
        if count < MIN_BULK_LAPTOPS {
            return Err(LifecycleError::validation(
                "number_of_laptops",
                format!("Bulk shipments need at least {} laptops", MIN_BULK_LAPTOPS),
            ));
        }
    }
    let any_dimension = form.bulk_length_in.is_some()
        || form.bulk_width_in.is_some()
        || form.bulk_height_in.is_some()
        || form.bulk_weight_lbs.is_some();
    if any_dimension && !form.has_complete_dimensions() {
        return Err(LifecycleError::validation(
            "bulk_length_in",
            "Provide length, width, height and weight together",
        ));
    }
    Ok(())
}

impl WarehouseToEngineerInput {
    pub fn check(&self) -> LifecycleResult<()> {
        self.validate()
            .map_err(|e| LifecycleError::from_validation_errors(&e))?;
        check_jira(&self.jira_ticket_number)?;
        self.delivery
            .validate()
            .map_err(|e| LifecycleError::from_validation_errors(&e))?;
        Ok(())
    }
}

/// State of a laptop as re-read inside a creation or link transaction
#[derive(Debug, Clone, Copy)]
pub struct LaptopLinkState {
    pub status: LaptopStatus,
    pub client_company_id: Option<Uuid>,
    /// Reception reports on file, approved or not
    pub reception_reports: i64,
    /// Linked shipments that still hold the laptop
    pub active_shipments: i64,
}

/// A warehouse-to-engineer shipment may only take an inventoried laptop.
///
/// The laptop must be `available` or `at_warehouse`, have at least one
/// reception report on file (approval is not required) and not be held by
/// any shipment that is still moving.
pub fn check_engineer_shipment_laptop(
    company_id: Uuid,
    laptop: &LaptopLinkState,
) -> LifecycleResult<()> {
    if !laptop.status.can_ship_to_engineer() {
        return Err(LifecycleError::validation(
            "laptop_id",
            format!(
                "Laptop must be available or at the warehouse, current status: {}",
                laptop.status
            ),
        ));
    }
    if laptop.reception_reports == 0 {
        return Err(LifecycleError::validation(
            "laptop_id",
            "Laptop has no reception report; the warehouse must inspect it first",
        ));
    }
    if laptop.active_shipments > 0 {
        return Err(LifecycleError::conflict(
            "laptop",
            "Laptop is already part of an active shipment",
        ));
    }
    if let Some(owner) = laptop.client_company_id {
        if owner != company_id {
            return Err(LifecycleError::conflict(
                "laptop",
                "Laptop belongs to a different client company",
            ));
        }
    }
    Ok(())
}

/// Re-check run inside the add-to-bulk transaction
pub fn check_bulk_link(
    shipment: &Shipment,
    linked_laptops: i64,
    laptop: &LaptopLinkState,
) -> LifecycleResult<()> {
    if shipment.shipment_type != ShipmentType::BulkToWarehouse {
        return Err(LifecycleError::conflict(
            "shipment",
            "Laptops can only be added to bulk shipments",
        ));
    }
    if matches!(
        shipment.status,
        ShipmentStatus::AtWarehouse | ShipmentStatus::Delivered
    ) {
        return Err(LifecycleError::conflict(
            "shipment",
            format!("Shipment is already '{}'", shipment.status),
        ));
    }
    if linked_laptops >= i64::from(shipment.laptop_count) {
        return Err(LifecycleError::conflict(
            "shipment",
            format!(
                "Shipment already holds its declared {} laptops",
                shipment.laptop_count
            ),
        ));
    }
    if let Some(owner) = laptop.client_company_id {
        if owner != shipment.client_company_id {
            return Err(LifecycleError::conflict(
                "laptop",
                "Laptop belongs to a different client company than the shipment",
            ));
        }
    }
    if !laptop.status.can_join_bulk_shipment() {
        return Err(LifecycleError::validation(
            "laptop_id",
            format!(
                "Laptop must be available or in transit to the warehouse, current status: {}",
                laptop.status
            ),
        ));
    }
    if laptop.active_shipments > 0 {
        return Err(LifecycleError::conflict(
            "laptop",
            "Laptop is already part of an active shipment",
        ));
    }
    Ok(())
}

/// Laptop to add to a bulk shipment: an existing one, or a new serial
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AddLaptopInput {
    Existing { laptop_id: Uuid },
    New(LaptopDetails),
}
