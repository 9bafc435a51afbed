//! Modelo de Vehicle
//!
//! Este módulo contiene el struct Vehicle, su ciclo de vida y las variantes
//! usadas para crearlo. El estado solo lo cambian la máquina de alquiler
//! (Available ↔ Rented) o un operador (Available ↔ Maintenance).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utils::errors::AppError;

/// Estado del vehículo - se guarda como texto en minúsculas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleStatus {
    Available,
    Rented,
    Maintenance,
}

impl VehicleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleStatus::Available => "available",
            VehicleStatus::Rented => "rented",
            VehicleStatus::Maintenance => "maintenance",
        }
    }
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VehicleStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(VehicleStatus::Available),
            "rented" => Ok(VehicleStatus::Rented),
            "maintenance" => Ok(VehicleStatus::Maintenance),
            other => Err(AppError::InvalidInput(format!(
                "Unknown vehicle status '{}'",
                other
            ))),
        }
    }
}

/// Vehículo de la flota
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: i64,
    pub name: String,
    pub plate: String,
    pub status: VehicleStatus,
    pub battery_level: u8,
    pub updated_at: DateTime<Utc>,
}

impl Vehicle {
    pub fn is_available(&self) -> bool {
        self.status == VehicleStatus::Available
    }
}

/// Datos para dar de alta un vehículo en el store
#[derive(Debug, Clone)]
pub struct NewVehicle {
    pub name: String,
    pub plate: String,
    pub status: VehicleStatus,
    pub battery_level: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_text_roundtrip() {
        for status in [
            VehicleStatus::Available,
            VehicleStatus::Rented,
            VehicleStatus::Maintenance,
        ] {
            assert_eq!(status.as_str().parse::<VehicleStatus>().unwrap(), status);
        }
        assert!("broken".parse::<VehicleStatus>().is_err());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&VehicleStatus::Maintenance).unwrap();
        assert_eq!(json, "\"maintenance\"");
    }
}
