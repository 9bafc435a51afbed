use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{Vehicle, VehicleStatus};
use crate::utils::validation::{validate_license_plate, validate_not_empty};

// Request para crear un vehículo
#[derive(Debug, Deserialize, Validate)]
pub struct CreateVehicleRequest {
    #[validate(custom = "validate_not_empty", length(max = 64))]
    pub name: String,
    #[validate(custom = "validate_license_plate")]
    pub plate: String,
    pub status: Option<VehicleStatus>,
    pub battery: Option<i32>,
}

// Request para cambiar el estado (mantenimiento)
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: VehicleStatus,
}

// Request para actualizar la batería
#[derive(Debug, Deserialize)]
pub struct UpdateBatteryRequest {
    pub battery: i32,
}

// Response de vehículo
#[derive(Debug, Serialize, Deserialize)]
pub struct VehicleResponse {
    pub id: i64,
    pub name: String,
    pub plate: String,
    pub status: VehicleStatus,
    pub battery: u8,
    pub qrcode: String,
    pub updated_at: DateTime<Utc>,
}

impl VehicleResponse {
    pub fn from_vehicle(vehicle: Vehicle, public_base_url: &str) -> Self {
        Self {
            qrcode: qr_code_url(public_base_url, vehicle.id),
            id: vehicle.id,
            name: vehicle.name,
            plate: vehicle.plate,
            status: vehicle.status,
            battery: vehicle.battery_level,
            updated_at: vehicle.updated_at,
        }
    }
}

/// URL que codifica el QR pegado en el vehículo
pub fn qr_code_url(public_base_url: &str, vehicle_id: i64) -> String {
    format!(
        "{}/static/rent.html?id={}",
        public_base_url.trim_end_matches('/'),
        vehicle_id
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qr_code_url() {
        assert_eq!(
            qr_code_url("https://fleet.example/", 12),
            "https://fleet.example/static/rent.html?id=12"
        );
    }

    #[test]
    fn test_create_request_validation() {
        let ok = CreateVehicleRequest {
            name: "西湖0101".to_string(),
            plate: "SC0001".to_string(),
            status: None,
            battery: None,
        };
        assert!(ok.validate().is_ok());

        let bad = CreateVehicleRequest {
            name: " ".to_string(),
            plate: "sc 1".to_string(),
            status: None,
            battery: Some(50),
        };
        let errors = bad.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("plate"));
    }
}
