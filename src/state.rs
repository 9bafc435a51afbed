//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum.

use std::sync::Arc;

use crate::config::environment::EnvironmentConfig;
use crate::repositories::FleetStore;
use crate::services::{
    FleetService, JwtConfig, JwtService, RentalService, SubscriptionRegistry, UserService,
};
use crate::utils::clock::Clock;

#[derive(Clone)]
pub struct AppState {
    pub config: EnvironmentConfig,
    pub store: Arc<dyn FleetStore>,
    pub rentals: RentalService,
    pub fleet: FleetService,
    pub users: UserService,
    pub jwt: JwtService,
    pub registry: SubscriptionRegistry,
}

impl AppState {
    pub fn new(
        config: EnvironmentConfig,
        store: Arc<dyn FleetStore>,
        clock: Arc<dyn Clock>,
        registry: SubscriptionRegistry,
    ) -> Self {
        let policy = config.store_policy();
        let jwt = JwtService::new(JwtConfig::from_environment(&config));

        Self {
            rentals: RentalService::new(store.clone(), config.fee_calculator(), clock, policy),
            fleet: FleetService::new(store.clone(), policy),
            users: UserService::new(store.clone(), jwt.clone(), policy),
            jwt,
            registry,
            store,
            config,
        }
    }

    /// Sustituir el coste bcrypt (tests y entornos de demostración)
    pub fn with_hash_cost(mut self, hash_cost: u32) -> Self {
        self.users = self.users.with_hash_cost(hash_cost);
        self
    }
}
