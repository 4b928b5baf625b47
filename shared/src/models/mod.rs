//! Domain models for the laptop tracking platform

mod audit;
mod laptop;
mod notification;
mod pickup_form;
mod reception;
mod shipment;
mod user;

pub use audit::*;
pub use laptop::*;
pub use notification::*;
pub use pickup_form::*;
pub use reception::*;
pub use shipment::*;
pub use user::*;
