//! Servicio de alquiler
//!
//! Máquina de estados Available → Rented → Available. La legalidad de cada
//! transición se comprueba aquí (capacidades, orden abierta) y la ejecución
//! se delega en `FleetStore::atomic_transition`, único punto de
//! serialización: dos alquileres del mismo vehículo o dos devoluciones de la
//! misma orden nunca pueden tener éxito a la vez.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::models::{Caller, Capability, OrderScope, Page, RentalOrder};
use crate::repositories::{FleetStore, Transition};
use crate::services::fee_calculator::FeeCalculator;
use crate::services::store_guard::{GuardedStore, StorePolicy};
use crate::utils::clock::Clock;
use crate::utils::errors::{forbidden_error, not_found_error, AppError, AppResult};

#[derive(Clone)]
pub struct RentalService {
    store: GuardedStore,
    fees: FeeCalculator,
    clock: Arc<dyn Clock>,
}

impl RentalService {
    pub fn new(
        store: Arc<dyn FleetStore>,
        fees: FeeCalculator,
        clock: Arc<dyn Clock>,
        policy: StorePolicy,
    ) -> Self {
        Self {
            store: GuardedStore::new(store, policy),
            fees,
            clock,
        }
    }

    pub fn fees(&self) -> FeeCalculator {
        self.fees
    }

    /// Alquilar un vehículo disponible
    pub async fn rent(&self, vehicle_id: i64, caller: &Caller) -> AppResult<RentalOrder> {
        caller.require(Capability::RentVehicle)?;

        let renter_id = caller.user_id;
        let started_at = self.clock.now();

        let result = self
            .store
            .call("rent", move |store| async move {
                store
                    .atomic_transition(Transition::Rent {
                        vehicle_id,
                        renter_id,
                        started_at,
                    })
                    .await
            })
            .await;

        match &result {
            Ok(order) => info!(
                "🚗 Vehículo {} alquilado por usuario {} (orden {})",
                vehicle_id, renter_id, order.id
            ),
            Err(AppError::Conflict(reason)) => debug!(
                "Alquiler rechazado para vehículo {} (usuario {}): {}",
                vehicle_id, renter_id, reason
            ),
            Err(e) => warn!("❌ Error alquilando vehículo {}: {}", vehicle_id, e),
        }

        result
    }

    /// Devolver el vehículo de una orden abierta y cobrar la tarifa
    pub async fn return_vehicle(&self, order_id: i64, caller: &Caller) -> AppResult<RentalOrder> {
        let order = self.fetch_order(order_id).await?;

        if !caller.owns_or_can(order.renter_id, Capability::ReturnAnyOrder) {
            return Err(forbidden_error(
                "return_vehicle",
                "only the renter or an administrator may return this order",
            ));
        }
        if !order.is_open() {
            return Err(AppError::Conflict(format!(
                "Order {} already returned",
                order_id
            )));
        }

        // Un reloj por detrás del inicio no puede producir un intervalo negativo
        let ended_at = self.clock.now().max(order.started_at);
        let fee = self.fees.fee(order.started_at, ended_at)?;

        let result = self
            .store
            .call("return_vehicle", move |store| async move {
                store
                    .atomic_transition(Transition::Return {
                        order_id,
                        ended_at,
                        fee,
                    })
                    .await
            })
            .await;

        match &result {
            Ok(order) => info!(
                "✅ Orden {} cerrada: vehículo {} disponible, tarifa {}",
                order.id, order.vehicle_id, fee
            ),
            Err(AppError::Conflict(reason)) => {
                debug!("Devolución rechazada para orden {}: {}", order_id, reason)
            }
            Err(e) => warn!("❌ Error devolviendo orden {}: {}", order_id, e),
        }

        result
    }

    /// Órdenes visibles para quien llama, más recientes primero
    pub async fn list_orders(&self, caller: &Caller, page: Page) -> AppResult<Vec<RentalOrder>> {
        let scope = if caller.can(Capability::ViewAllOrders) {
            OrderScope::All
        } else {
            OrderScope::Renter(caller.user_id)
        };

        self.store
            .call("list_orders", move |store| async move {
                store.list_orders(scope, page).await
            })
            .await
    }

    pub async fn get_order(&self, order_id: i64, caller: &Caller) -> AppResult<RentalOrder> {
        let order = self.fetch_order(order_id).await?;

        if !caller.owns_or_can(order.renter_id, Capability::ViewAnyOrder) {
            return Err(forbidden_error(
                "get_order",
                "the order belongs to another renter",
            ));
        }

        Ok(order)
    }

    async fn fetch_order(&self, order_id: i64) -> AppResult<RentalOrder> {
        self.store
            .call("get_order", move |store| async move {
                store.get_order(order_id).await
            })
            .await?
            .ok_or_else(|| not_found_error("Order", order_id))
    }
}
