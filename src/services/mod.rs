//! Servicios de la aplicación
//!
//! Lógica de negocio entre las rutas HTTP y el `FleetStore`: alquiler,
//! tarifas, flota, usuarios y el reparto de estado a observadores.

pub mod fee_calculator;
pub mod fleet_service;
pub mod jwt_service;
pub mod rental_service;
pub mod status_broadcaster;
pub mod store_guard;
pub mod subscription_registry;
pub mod user_service;

pub use fee_calculator::FeeCalculator;
pub use fleet_service::FleetService;
pub use jwt_service::{JwtConfig, JwtService};
pub use rental_service::RentalService;
pub use status_broadcaster::{BroadcastConfig, BroadcasterHandle, StatusBroadcaster, TickReport};
pub use store_guard::{GuardedStore, StorePolicy};
pub use subscription_registry::{Subscription, SubscriptionId, SubscriptionRegistry};
pub use user_service::{Session, UserService};
