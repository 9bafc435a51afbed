use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::Mutex;

use super::{FleetStore, Transition};
use crate::models::{
    NewUser, NewVehicle, OrderScope, Page, RentalOrder, User, Vehicle, VehicleStatus,
};
use crate::utils::errors::{conflict_error, not_found_error, AppError, AppResult};

#[derive(Debug, Default)]
struct FleetState {
    vehicles: BTreeMap<i64, Vehicle>,
    orders: BTreeMap<i64, RentalOrder>,
    users: BTreeMap<i64, User>,
    next_vehicle_id: i64,
    next_order_id: i64,
    next_user_id: i64,
}

impl FleetState {
    fn open_order_for(&self, vehicle_id: i64) -> Option<&RentalOrder> {
        self.orders
            .values()
            .find(|o| o.vehicle_id == vehicle_id && o.is_open())
    }
}

/// Store en memoria.
///
/// Un único mutex protege vehículos, órdenes y usuarios; cada operación
/// (incluida cada transición) se ejecuta entera bajo una sola adquisición,
/// así que las transiciones son linealizables.
#[derive(Debug, Default)]
pub struct InMemoryFleetStore {
    state: Mutex<FleetState>,
}

impl InMemoryFleetStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FleetStore for InMemoryFleetStore {
    async fn get_vehicle(&self, id: i64) -> AppResult<Option<Vehicle>> {
        let state = self.state.lock().await;
        Ok(state.vehicles.get(&id).cloned())
    }

    async fn list_vehicles(&self) -> AppResult<Vec<Vehicle>> {
        let state = self.state.lock().await;
        Ok(state.vehicles.values().cloned().collect())
    }

    async fn create_vehicle(&self, vehicle: NewVehicle) -> AppResult<Vehicle> {
        let mut state = self.state.lock().await;

        if state.vehicles.values().any(|v| v.plate == vehicle.plate) {
            return Err(conflict_error("Vehicle", "plate", &vehicle.plate));
        }

        state.next_vehicle_id += 1;
        let created = Vehicle {
            id: state.next_vehicle_id,
            name: vehicle.name,
            plate: vehicle.plate,
            status: vehicle.status,
            battery_level: vehicle.battery_level,
            updated_at: Utc::now(),
        };
        state.vehicles.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_vehicle_battery(&self, id: i64, battery_level: u8) -> AppResult<Vehicle> {
        let mut state = self.state.lock().await;
        let vehicle = state
            .vehicles
            .get_mut(&id)
            .ok_or_else(|| not_found_error("Vehicle", id))?;

        vehicle.battery_level = battery_level;
        vehicle.updated_at = Utc::now();
        Ok(vehicle.clone())
    }

    async fn swap_vehicle_status(
        &self,
        id: i64,
        from: VehicleStatus,
        to: VehicleStatus,
    ) -> AppResult<Vehicle> {
        let mut state = self.state.lock().await;
        let vehicle = state
            .vehicles
            .get_mut(&id)
            .ok_or_else(|| not_found_error("Vehicle", id))?;

        if vehicle.status != from {
            return Err(AppError::Conflict(format!(
                "Vehicle {} is {}, expected {}",
                id, vehicle.status, from
            )));
        }

        vehicle.status = to;
        vehicle.updated_at = Utc::now();
        Ok(vehicle.clone())
    }

    async fn get_order(&self, id: i64) -> AppResult<Option<RentalOrder>> {
        let state = self.state.lock().await;
        Ok(state.orders.get(&id).cloned())
    }

    async fn list_orders(&self, scope: OrderScope, page: Page) -> AppResult<Vec<RentalOrder>> {
        let state = self.state.lock().await;
        let orders = state
            .orders
            .values()
            .rev()
            .filter(|o| match scope {
                OrderScope::All => true,
                OrderScope::Renter(renter_id) => o.renter_id == renter_id,
            })
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .cloned()
            .collect();
        Ok(orders)
    }

    async fn atomic_transition(&self, transition: Transition) -> AppResult<RentalOrder> {
        let mut state = self.state.lock().await;

        match transition {
            Transition::Rent {
                vehicle_id,
                renter_id,
                started_at,
            } => {
                let vehicle = state
                    .vehicles
                    .get(&vehicle_id)
                    .ok_or_else(|| not_found_error("Vehicle", vehicle_id))?;

                if !vehicle.is_available() {
                    return Err(AppError::Conflict(format!(
                        "Vehicle {} is not available ({})",
                        vehicle_id, vehicle.status
                    )));
                }
                if state.open_order_for(vehicle_id).is_some() {
                    return Err(AppError::Conflict(format!(
                        "Vehicle {} already has an open order",
                        vehicle_id
                    )));
                }

                state.next_order_id += 1;
                let order = RentalOrder {
                    id: state.next_order_id,
                    renter_id,
                    vehicle_id,
                    started_at,
                    ended_at: None,
                    fee: None,
                };
                state.orders.insert(order.id, order.clone());

                if let Some(vehicle) = state.vehicles.get_mut(&vehicle_id) {
                    vehicle.status = VehicleStatus::Rented;
                    vehicle.updated_at = started_at;
                }

                Ok(order)
            }
            Transition::Return {
                order_id,
                ended_at,
                fee,
            } => {
                let order = state
                    .orders
                    .get(&order_id)
                    .ok_or_else(|| not_found_error("Order", order_id))?;

                if !order.is_open() {
                    return Err(AppError::Conflict(format!(
                        "Order {} already returned",
                        order_id
                    )));
                }
                if ended_at < order.started_at {
                    return Err(AppError::InvalidInput(format!(
                        "Order {} cannot end before it started",
                        order_id
                    )));
                }

                let vehicle_id = order.vehicle_id;
                match state.vehicles.get(&vehicle_id) {
                    Some(v) if v.status == VehicleStatus::Rented => {}
                    Some(v) => {
                        return Err(AppError::Internal(format!(
                            "Open order {} references vehicle {} in state {}",
                            order_id, vehicle_id, v.status
                        )));
                    }
                    None => return Err(not_found_error("Vehicle", vehicle_id)),
                }

                // Las dos escrituras ocurren bajo el mismo lock
                if let Some(vehicle) = state.vehicles.get_mut(&vehicle_id) {
                    vehicle.status = VehicleStatus::Available;
                    vehicle.updated_at = ended_at;
                }
                let order = state
                    .orders
                    .get_mut(&order_id)
                    .ok_or_else(|| not_found_error("Order", order_id))?;
                order.ended_at = Some(ended_at);
                order.fee = Some(fee);

                Ok(order.clone())
            }
        }
    }

    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let mut state = self.state.lock().await;

        if state.users.values().any(|u| u.phone == user.phone) {
            return Err(conflict_error("User", "phone", &user.phone));
        }

        state.next_user_id += 1;
        let created = User {
            id: state.next_user_id,
            phone: user.phone,
            nickname: user.nickname,
            password_hash: user.password_hash,
            role: user.role,
            deposit: user.deposit,
        };
        state.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_user_by_phone(&self, phone: &str) -> AppResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.users.values().find(|u| u.phone == phone).cloned())
    }

    async fn get_user(&self, id: i64) -> AppResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.users.get(&id).cloned())
    }
}
