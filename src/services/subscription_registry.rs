//! Registro de suscripciones de observadores
//!
//! Cada observador conectado es un `mpsc::Sender` acotado identificado por
//! un UUID. El registro no conoce el transporte (WebSocket u otro): solo
//! guarda canales y los entrega al broadcaster.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::debug;
use uuid::Uuid;

use crate::models::FleetSnapshot;

pub type SubscriptionId = Uuid;

/// Extremo receptor de una suscripción recién creada
#[derive(Debug)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub receiver: mpsc::Receiver<FleetSnapshot>,
}

#[derive(Debug, Clone, Default)]
pub struct SubscriptionRegistry {
    connections: Arc<RwLock<HashMap<SubscriptionId, mpsc::Sender<FleetSnapshot>>>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registrar un canal y devolver su id, único entre las suscripciones vivas
    pub async fn register(&self, sender: mpsc::Sender<FleetSnapshot>) -> SubscriptionId {
        let mut connections = self.connections.write().await;
        loop {
            let id = Uuid::new_v4();
            if let Entry::Vacant(slot) = connections.entry(id) {
                slot.insert(sender);
                debug!("📡 Observador {} registrado ({} activos)", id, connections.len());
                return id;
            }
        }
    }

    /// Crear un canal con `buffer` snapshots de capacidad y registrarlo
    pub async fn subscribe(&self, buffer: usize) -> Subscription {
        let (sender, receiver) = mpsc::channel(buffer.max(1));
        let id = self.register(sender).await;
        Subscription { id, receiver }
    }

    /// Eliminar una suscripción. Idempotente: devuelve `false` si ya no estaba.
    pub async fn unregister(&self, id: SubscriptionId) -> bool {
        let mut connections = self.connections.write().await;
        let removed = connections.remove(&id).is_some();
        if removed {
            debug!("📴 Observador {} eliminado ({} activos)", id, connections.len());
        }
        removed
    }

    pub async fn contains(&self, id: SubscriptionId) -> bool {
        self.connections.read().await.contains_key(&id)
    }

    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.connections.read().await.is_empty()
    }

    /// Copia de los canales vivos, para enviar sin mantener el lock
    pub async fn connections(&self) -> Vec<(SubscriptionId, mpsc::Sender<FleetSnapshot>)> {
        self.connections
            .read()
            .await
            .iter()
            .map(|(id, sender)| (*id, sender.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[tokio::test]
    async fn test_register_assigns_unique_ids() {
        let registry = SubscriptionRegistry::new();
        let mut receivers = Vec::new();
        let mut ids = HashSet::new();

        for _ in 0..50 {
            let subscription = registry.subscribe(4).await;
            assert!(ids.insert(subscription.id));
            receivers.push(subscription.receiver);
        }
        assert_eq!(registry.len().await, 50);
    }

    #[tokio::test]
    async fn test_unregister_is_idempotent() {
        let registry = SubscriptionRegistry::new();
        let subscription = registry.subscribe(1).await;

        assert!(registry.contains(subscription.id).await);
        assert!(registry.unregister(subscription.id).await);
        assert!(!registry.unregister(subscription.id).await);
        assert!(!registry.unregister(Uuid::new_v4()).await);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_connections_are_a_copy() {
        let registry = SubscriptionRegistry::new();
        let subscription = registry.subscribe(1).await;

        let connections = registry.connections().await;
        registry.unregister(subscription.id).await;

        assert_eq!(connections.len(), 1);
        assert_eq!(connections[0].0, subscription.id);
        assert!(registry.is_empty().await);
    }
}
