//! Broadcaster de estado de la flota
//!
//! Cada tick lee un snapshot de toda la flota y lo envía a todos los
//! observadores registrados. Los envíos se hacen en paralelo y cada uno
//! tiene su propio timeout, así un observador lento no retrasa a los demás.
//! Un observador con el canal cerrado se elimina del registro; uno que
//! vence el timeout pierde ese tick pero sigue registrado.

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::error::SendTimeoutError;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::models::{FleetSnapshot, VehicleStatusUpdate};
use crate::repositories::FleetStore;
use crate::services::store_guard::{GuardedStore, StorePolicy};
use crate::services::subscription_registry::SubscriptionRegistry;
use crate::utils::errors::AppResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastConfig {
    /// Periodo entre ticks
    pub interval: Duration,
    /// Tiempo máximo de espera por observador en cada tick
    pub send_timeout: Duration,
    /// Snapshots que caben en la cola de cada observador
    pub observer_buffer: usize,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            send_timeout: Duration::from_millis(250),
            observer_buffer: 16,
        }
    }
}

/// Resultado de un tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub vehicles: usize,
    pub delivered: usize,
    pub timed_out: usize,
    pub removed: usize,
}

#[derive(Clone)]
pub struct StatusBroadcaster {
    store: GuardedStore,
    registry: SubscriptionRegistry,
    config: BroadcastConfig,
}

impl StatusBroadcaster {
    pub fn new(
        store: Arc<dyn FleetStore>,
        registry: SubscriptionRegistry,
        config: BroadcastConfig,
    ) -> Self {
        // La lectura no se reintenta: el siguiente tick ya es el reintento
        let policy = StorePolicy {
            timeout: config.interval,
            max_retries: 0,
        };

        Self {
            store: GuardedStore::new(store, policy),
            registry,
            config,
        }
    }

    pub fn config(&self) -> BroadcastConfig {
        self.config
    }

    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    /// Estado de toda la flota leído de una sola vez
    pub async fn snapshot(&self) -> AppResult<FleetSnapshot> {
        let vehicles = self
            .store
            .call("list_vehicles", |store| async move { store.list_vehicles().await })
            .await?;

        Ok(Arc::new(
            vehicles.iter().map(VehicleStatusUpdate::from).collect(),
        ))
    }

    /// Ejecutar un tick: muestrear la flota y repartirla
    pub async fn tick(&self) -> AppResult<TickReport> {
        let connections = self.registry.connections().await;
        if connections.is_empty() {
            return Ok(TickReport::default());
        }

        let snapshot = self.snapshot().await?;
        let send_timeout = self.config.send_timeout;

        let sends = connections.into_iter().map(|(id, sender)| {
            let snapshot = Arc::clone(&snapshot);
            async move { (id, sender.send_timeout(snapshot, send_timeout).await) }
        });
        let results = join_all(sends).await;

        let mut report = TickReport {
            vehicles: snapshot.len(),
            ..TickReport::default()
        };

        for (id, result) in results {
            match result {
                Ok(()) => report.delivered += 1,
                Err(SendTimeoutError::Timeout(_)) => {
                    debug!("⏱️ Observador {} no aceptó el snapshot a tiempo", id);
                    report.timed_out += 1;
                }
                Err(SendTimeoutError::Closed(_)) => {
                    if self.registry.unregister(id).await {
                        report.removed += 1;
                    }
                }
            }
        }

        if report.removed > 0 || report.timed_out > 0 {
            debug!(
                "📡 Tick: {} vehículos, {} entregados, {} con timeout, {} eliminados",
                report.vehicles, report.delivered, report.timed_out, report.removed
            );
        }

        Ok(report)
    }

    /// Lanzar el bucle periódico en una tarea de fondo
    pub fn start(self) -> BroadcasterHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let period = self.config.interval;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!("📡 Broadcaster de estado iniciado (cada {:?})", period);

            loop {
                tokio::select! {
                    biased;
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        if let Err(e) = self.tick().await {
                            warn!("⚠️ Tick de estado omitido: {}", e);
                        }
                    }
                }
            }

            info!("📴 Broadcaster de estado detenido");
        });

        BroadcasterHandle {
            shutdown: Some(shutdown_tx),
            task,
        }
    }
}

/// Control del bucle del broadcaster
#[derive(Debug)]
pub struct BroadcasterHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl BroadcasterHandle {
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Pedir la parada y esperar a que termine el tick en curso
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Err(e) = (&mut self.task).await {
            error!("❌ El broadcaster terminó con error: {}", e);
        }
    }
}
