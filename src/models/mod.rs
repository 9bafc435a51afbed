//! Modelos del sistema
//!
//! Este módulo contiene los modelos de dominio compartidos por el store,
//! los servicios y el broadcaster.

pub mod auth;
pub mod order;
pub mod status;
pub mod user;
pub mod vehicle;

pub use auth::{Caller, Capability, Role};
pub use order::{OrderScope, Page, RentalOrder};
pub use status::{FleetSnapshot, VehicleStatusUpdate};
pub use user::{NewUser, User};
pub use vehicle::{NewVehicle, Vehicle, VehicleStatus};
