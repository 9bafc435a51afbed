//! Servicio de flota
//!
//! Consulta de vehículos y operaciones de mantenimiento (alta, batería,
//! entrada y salida de mantenimiento). Ninguna de estas operaciones puede
//! mover un vehículo hacia o desde `Rented`: eso solo lo hace el servicio
//! de alquiler.

use std::sync::Arc;
use tracing::info;
use validator::Validate;

use crate::dto::vehicle_dto::CreateVehicleRequest;
use crate::models::{Caller, Capability, NewVehicle, Page, Vehicle, VehicleStatus};
use crate::repositories::FleetStore;
use crate::services::store_guard::{GuardedStore, StorePolicy};
use crate::utils::errors::{not_found_error, AppError, AppResult};
use crate::utils::validation::{validate_battery_level, MAX_BATTERY_LEVEL};

#[derive(Clone)]
pub struct FleetService {
    store: GuardedStore,
}

impl FleetService {
    pub fn new(store: Arc<dyn FleetStore>, policy: StorePolicy) -> Self {
        Self {
            store: GuardedStore::new(store, policy),
        }
    }

    pub async fn list_vehicles(&self, page: Page) -> AppResult<Vec<Vehicle>> {
        let vehicles = self
            .store
            .call("list_vehicles", |store| async move { store.list_vehicles().await })
            .await?;

        Ok(vehicles
            .into_iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .collect())
    }

    pub async fn get_vehicle(&self, id: i64) -> AppResult<Vehicle> {
        self.store
            .call("get_vehicle", move |store| async move {
                store.get_vehicle(id).await
            })
            .await?
            .ok_or_else(|| not_found_error("Vehicle", id))
    }

    /// Alta de un vehículo (nunca directamente en `Rented`)
    pub async fn create_vehicle(
        &self,
        request: CreateVehicleRequest,
        caller: &Caller,
    ) -> AppResult<Vehicle> {
        caller.require(Capability::ManageFleet)?;
        request.validate()?;

        let status = request.status.unwrap_or(VehicleStatus::Available);
        if status == VehicleStatus::Rented {
            return Err(AppError::InvalidInput(
                "A vehicle can only be created as available or maintenance".to_string(),
            ));
        }
        let battery_level = battery_from(request.battery.unwrap_or(MAX_BATTERY_LEVEL))?;

        let new_vehicle = NewVehicle {
            name: request.name.trim().to_string(),
            plate: request.plate,
            status,
            battery_level,
        };

        let vehicle = self
            .store
            .call("create_vehicle", |store| {
                let new_vehicle = new_vehicle.clone();
                async move { store.create_vehicle(new_vehicle).await }
            })
            .await?;

        info!(
            "🚗 Vehículo {} creado ({}, {})",
            vehicle.id, vehicle.plate, vehicle.status
        );
        Ok(vehicle)
    }

    pub async fn update_battery(&self, id: i64, battery: i32, caller: &Caller) -> AppResult<Vehicle> {
        caller.require(Capability::ManageFleet)?;
        let battery_level = battery_from(battery)?;

        self.store
            .call("update_vehicle_battery", move |store| async move {
                store.update_vehicle_battery(id, battery_level).await
            })
            .await
    }

    /// Entrada o salida de mantenimiento.
    ///
    /// Solo Available ↔ Maintenance; pedir `Rented` o tocar un vehículo
    /// alquilado es un Conflict. Pedir el estado actual no cambia nada.
    pub async fn set_status(
        &self,
        id: i64,
        target: VehicleStatus,
        caller: &Caller,
    ) -> AppResult<Vehicle> {
        caller.require(Capability::ManageFleet)?;

        if target == VehicleStatus::Rented {
            return Err(AppError::Conflict(
                "Vehicles only become rented through a rental".to_string(),
            ));
        }

        let current = self.get_vehicle(id).await?;
        let from = match current.status {
            status if status == target => return Ok(current),
            VehicleStatus::Rented => {
                return Err(AppError::Conflict(format!(
                    "Vehicle {} is rented and must be returned first",
                    id
                )));
            }
            status => status,
        };

        let vehicle = self
            .store
            .call("swap_vehicle_status", move |store| async move {
                store.swap_vehicle_status(id, from, target).await
            })
            .await?;

        info!("🔧 Vehículo {}: {} → {}", id, from, target);
        Ok(vehicle)
    }
}

fn battery_from(value: i32) -> AppResult<u8> {
    validate_battery_level(value).map_err(|_| {
        AppError::InvalidInput(format!("Battery level must be within 0-100, got {}", value))
    })?;
    u8::try_from(value)
        .map_err(|_| AppError::InvalidInput(format!("Battery level out of range: {}", value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::repositories::InMemoryFleetStore;

    fn service() -> FleetService {
        FleetService::new(Arc::new(InMemoryFleetStore::new()), StorePolicy::default())
    }

    fn operator() -> Caller {
        Caller::new(10, Role::Operator)
    }

    fn request(plate: &str) -> CreateVehicleRequest {
        CreateVehicleRequest {
            name: "灵隐0404".to_string(),
            plate: plate.to_string(),
            status: None,
            battery: Some(80),
        }
    }

    #[tokio::test]
    async fn test_guest_cannot_manage_fleet() {
        let fleet = service();
        let guest = Caller::new(1, Role::Guest);
        let err = fleet.create_vehicle(request("SC0100"), &guest).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_battery_out_of_range_is_invalid_input() {
        let fleet = service();
        let vehicle = fleet.create_vehicle(request("SC0101"), &operator()).await.unwrap();
        assert_eq!(vehicle.battery_level, 80);

        for level in [-1, 101, 1000] {
            let err = fleet
                .update_battery(vehicle.id, level, &operator())
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::InvalidInput(_)), "level {}", level);
        }

        let updated = fleet.update_battery(vehicle.id, 0, &operator()).await.unwrap();
        assert_eq!(updated.battery_level, 0);
    }

    #[tokio::test]
    async fn test_maintenance_round_trip() {
        let fleet = service();
        let vehicle = fleet.create_vehicle(request("SC0102"), &operator()).await.unwrap();

        let parked = fleet
            .set_status(vehicle.id, VehicleStatus::Maintenance, &operator())
            .await
            .unwrap();
        assert_eq!(parked.status, VehicleStatus::Maintenance);

        let again = fleet
            .set_status(vehicle.id, VehicleStatus::Maintenance, &operator())
            .await
            .unwrap();
        assert_eq!(again.status, VehicleStatus::Maintenance);

        let err = fleet
            .set_status(vehicle.id, VehicleStatus::Rented, &operator())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let back = fleet
            .set_status(vehicle.id, VehicleStatus::Available, &operator())
            .await
            .unwrap();
        assert!(back.is_available());
    }

    #[tokio::test]
    async fn test_list_vehicles_pages() {
        let fleet = service();
        for i in 0..5 {
            fleet
                .create_vehicle(request(&format!("SC02{:02}", i)), &operator())
                .await
                .unwrap();
        }

        let page = fleet.list_vehicles(Page::new(Some(3), Some(10))).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].plate, "SC0203");
    }
}
