//! Business logic services for the Laptop Tracking Platform

pub mod audit;
pub mod laptop;
pub mod lifecycle;
pub mod notification;
pub mod pickup_form;
pub mod reception;
pub mod records;
pub mod shipment;
pub mod storage;

pub use audit::AuditService;
pub use laptop::LaptopService;
pub use lifecycle::LifecycleService;
pub use notification::NotificationService;
pub use pickup_form::PickupFormService;
pub use reception::ReceptionService;
pub use shipment::ShipmentService;
pub use storage::FileStorage;
