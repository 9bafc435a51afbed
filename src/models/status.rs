//! Registros de estado que se empujan a los observadores en cada tick

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::models::vehicle::{Vehicle, VehicleStatus};

/// Estado de un vehículo tal y como lo ve un observador
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleStatusUpdate {
    pub car_id: i64,
    pub battery: u8,
    pub status: VehicleStatus,
}

impl From<&Vehicle> for VehicleStatusUpdate {
    fn from(vehicle: &Vehicle) -> Self {
        Self {
            car_id: vehicle.id,
            battery: vehicle.battery_level,
            status: vehicle.status,
        }
    }
}

/// Payload de un tick: toda la flota, leída de un único snapshot.
/// Se comparte entre observadores sin copiarse.
pub type FleetSnapshot = Arc<Vec<VehicleStatusUpdate>>;
