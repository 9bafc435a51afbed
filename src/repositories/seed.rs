//! Datos de demostración
//!
//! 20 vehículos repartidos entre cinco zonas del parque (uno de cada cinco
//! en mantenimiento) y dos usuarios: un visitante y un administrador.

use rust_decimal::Decimal;
use tracing::info;

use super::FleetStore;
use crate::models::{NewUser, NewVehicle, Role, VehicleStatus};
use crate::utils::errors::{AppError, AppResult};

const SCENIC_SPOTS: [&str; 5] = ["西湖", "良渚", "西溪", "灵隐", "宋城"];
const FLEET_SIZE: usize = 20;

/// Vehículos de demostración, en orden de alta
pub fn demo_vehicles() -> Vec<NewVehicle> {
    (1..=FLEET_SIZE)
        .map(|i| {
            let spot_index = (i - 1) % SCENIC_SPOTS.len();
            let prefix = spot_index + 1;

            NewVehicle {
                name: format!("{}{:02}{:02}", SCENIC_SPOTS[spot_index], prefix, i % 100),
                plate: format!("SC{:04}", i),
                status: if i % 5 == 0 {
                    VehicleStatus::Maintenance
                } else {
                    VehicleStatus::Available
                },
                battery_level: if i % 3 == 0 { 40 } else { 100 },
            }
        })
        .collect()
}

/// Siembra la flota y los usuarios si el store está vacío.
///
/// `hash_cost` es el coste bcrypt de las contraseñas de demostración.
pub async fn seed_demo_data(store: &dyn FleetStore, hash_cost: u32) -> AppResult<bool> {
    if !store.list_vehicles().await?.is_empty() {
        info!("📦 Store ya contiene vehículos, no se siembra");
        return Ok(false);
    }

    for vehicle in demo_vehicles() {
        store.create_vehicle(vehicle).await?;
    }

    let users = [
        ("13800138001", "普通用户", "123456", Role::Guest, Decimal::new(100, 0)),
        ("13800138002", "管理员", "admin123", Role::Admin, Decimal::ZERO),
    ];
    for (phone, nickname, password, role, deposit) in users {
        if store.find_user_by_phone(phone).await?.is_some() {
            continue;
        }
        let password_hash = bcrypt::hash(password, hash_cost)
            .map_err(|e| AppError::Internal(format!("Error hashing seed password: {}", e)))?;
        store
            .create_user(NewUser {
                phone: phone.to_string(),
                nickname: Some(nickname.to_string()),
                password_hash,
                role,
                deposit,
            })
            .await?;
    }

    info!(
        "🌱 Datos de demostración creados: {} vehículos y {} usuarios",
        FLEET_SIZE,
        users.len()
    );
    Ok(true)
}
