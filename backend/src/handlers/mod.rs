//! HTTP handlers for the Laptop Tracking Platform API

pub mod audit;
pub mod health;
pub mod laptop;
pub mod reception;
pub mod shipment;

pub use audit::*;
pub use health::*;
pub use laptop::*;
pub use reception::*;
pub use shipment::*;
