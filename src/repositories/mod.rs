//! Repositorios de la flota
//!
//! `FleetStore` es la única frontera de persistencia y el único punto de
//! serialización de las transiciones de alquiler. Cada `Transition` se
//! aplica de forma atómica: o cambia el vehículo y la orden a la vez, o no
//! cambia nada.

pub mod fleet_repository;
pub mod memory_repository;
pub mod seed;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::models::{
    NewUser, NewVehicle, OrderScope, Page, RentalOrder, User, Vehicle, VehicleStatus,
};
use crate::utils::errors::AppResult;

pub use fleet_repository::PgFleetStore;
pub use memory_repository::InMemoryFleetStore;

/// Transición atómica vehículo + orden
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Available → Rented y alta de una orden abierta
    Rent {
        vehicle_id: i64,
        renter_id: i64,
        started_at: DateTime<Utc>,
    },
    /// Cierre de una orden abierta y Rented → Available
    Return {
        order_id: i64,
        ended_at: DateTime<Utc>,
        fee: Decimal,
    },
}

#[async_trait]
pub trait FleetStore: Send + Sync {
    async fn get_vehicle(&self, id: i64) -> AppResult<Option<Vehicle>>;

    /// Toda la flota ordenada por id, leída de un único snapshot
    async fn list_vehicles(&self) -> AppResult<Vec<Vehicle>>;

    async fn create_vehicle(&self, vehicle: NewVehicle) -> AppResult<Vehicle>;

    async fn update_vehicle_battery(&self, id: i64, battery_level: u8) -> AppResult<Vehicle>;

    /// Compare-and-swap de estado para mantenimiento: solo se aplica si el
    /// vehículo sigue en `from`
    async fn swap_vehicle_status(
        &self,
        id: i64,
        from: VehicleStatus,
        to: VehicleStatus,
    ) -> AppResult<Vehicle>;

    async fn get_order(&self, id: i64) -> AppResult<Option<RentalOrder>>;

    /// Órdenes más recientes primero
    async fn list_orders(&self, scope: OrderScope, page: Page) -> AppResult<Vec<RentalOrder>>;

    /// Aplica una transición de forma atómica y devuelve la orden afectada.
    ///
    /// Errores: `NotFound` si el vehículo/orden no existe, `Conflict` si el
    /// precondicionado (vehículo disponible, orden abierta) ya no se cumple.
    async fn atomic_transition(&self, transition: Transition) -> AppResult<RentalOrder>;

    async fn create_user(&self, user: NewUser) -> AppResult<User>;

    async fn find_user_by_phone(&self, phone: &str) -> AppResult<Option<User>>;

    async fn get_user(&self, id: i64) -> AppResult<Option<User>>;
}
