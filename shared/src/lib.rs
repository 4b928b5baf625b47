//! Shared types and lifecycle rules for the laptop tracking platform
//!
//! This crate holds the shipment/laptop lifecycle engine as pure functions:
//! the status vocabularies, the transition table, the creation router, the
//! edit guard and the reception rules. The backend executes these rules
//! inside database transactions; the WASM crate exposes some of them to the
//! browser.

pub mod creation;
pub mod editing;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod types;
pub mod validation;

pub use creation::*;
pub use editing::*;
pub use error::*;
pub use lifecycle::*;
pub use models::*;
pub use types::*;
pub use validation::*;
