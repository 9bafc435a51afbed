use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use scenic_rental::models::{
    NewUser, NewVehicle, OrderScope, Page, RentalOrder, User, Vehicle, VehicleStatus,
    VehicleStatusUpdate,
};
use scenic_rental::repositories::{FleetStore, InMemoryFleetStore, Transition};
use scenic_rental::services::{BroadcastConfig, StatusBroadcaster, SubscriptionRegistry};
use scenic_rental::utils::errors::{AppError, AppResult};

/// Store cuyas primeras lecturas de flota fallan
struct FlakyStore {
    inner: Arc<InMemoryFleetStore>,
    failing_reads: AtomicUsize,
}

impl FlakyStore {
    fn new(inner: Arc<InMemoryFleetStore>, failing_reads: usize) -> Self {
        Self {
            inner,
            failing_reads: AtomicUsize::new(failing_reads),
        }
    }
}

#[async_trait]
impl FleetStore for FlakyStore {
    async fn get_vehicle(&self, id: i64) -> AppResult<Option<Vehicle>> {
        self.inner.get_vehicle(id).await
    }

    async fn list_vehicles(&self) -> AppResult<Vec<Vehicle>> {
        let pending = self
            .failing_reads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if pending.is_ok() {
            return Err(AppError::Unavailable("fleet read failed".to_string()));
        }
        self.inner.list_vehicles().await
    }

    async fn create_vehicle(&self, vehicle: NewVehicle) -> AppResult<Vehicle> {
        self.inner.create_vehicle(vehicle).await
    }

    async fn update_vehicle_battery(&self, id: i64, battery_level: u8) -> AppResult<Vehicle> {
        self.inner.update_vehicle_battery(id, battery_level).await
    }

    async fn swap_vehicle_status(
        &self,
        id: i64,
        from: VehicleStatus,
        to: VehicleStatus,
    ) -> AppResult<Vehicle> {
        self.inner.swap_vehicle_status(id, from, to).await
    }

    async fn get_order(&self, id: i64) -> AppResult<Option<RentalOrder>> {
        self.inner.get_order(id).await
    }

    async fn list_orders(&self, scope: OrderScope, page: Page) -> AppResult<Vec<RentalOrder>> {
        self.inner.list_orders(scope, page).await
    }

    async fn atomic_transition(&self, transition: Transition) -> AppResult<RentalOrder> {
        self.inner.atomic_transition(transition).await
    }

    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        self.inner.create_user(user).await
    }

    async fn find_user_by_phone(&self, phone: &str) -> AppResult<Option<User>> {
        self.inner.find_user_by_phone(phone).await
    }

    async fn get_user(&self, id: i64) -> AppResult<Option<User>> {
        self.inner.get_user(id).await
    }
}

async fn mixed_fleet() -> Arc<InMemoryFleetStore> {
    let store = Arc::new(InMemoryFleetStore::new());
    let specs = [
        ("SC0001", VehicleStatus::Available, 100),
        ("SC0002", VehicleStatus::Available, 70),
        ("SC0003", VehicleStatus::Maintenance, 40),
    ];

    for (plate, status, battery_level) in specs {
        store
            .create_vehicle(NewVehicle {
                name: format!("良渚{}", plate),
                plate: plate.to_string(),
                status,
                battery_level,
            })
            .await
            .unwrap();
    }

    // El segundo vehículo pasa a Rented por la vía normal
    store
        .atomic_transition(Transition::Rent {
            vehicle_id: 2,
            renter_id: 1,
            started_at: Utc::now(),
        })
        .await
        .unwrap();

    store
}

fn config() -> BroadcastConfig {
    BroadcastConfig {
        interval: Duration::from_millis(50),
        send_timeout: Duration::from_millis(50),
        observer_buffer: 4,
    }
}

#[tokio::test]
async fn test_closed_observer_is_dropped_and_others_keep_receiving() {
    let store = mixed_fleet().await;
    let registry = SubscriptionRegistry::new();
    let broadcaster = StatusBroadcaster::new(store, registry.clone(), config());

    let mut first = registry.subscribe(4).await;
    let mut second = registry.subscribe(4).await;

    let report = broadcaster.tick().await.unwrap();
    assert_eq!(report.vehicles, 3);
    assert_eq!(report.delivered, 2);

    let a = first.receiver.recv().await.unwrap();
    let b = second.receiver.recv().await.unwrap();
    assert_eq!(a, b);

    let statuses: Vec<VehicleStatus> = a.iter().map(|u| u.status).collect();
    assert_eq!(
        statuses,
        vec![
            VehicleStatus::Available,
            VehicleStatus::Rented,
            VehicleStatus::Maintenance
        ]
    );
    assert_eq!(
        a[2],
        VehicleStatusUpdate {
            car_id: 3,
            battery: 40,
            status: VehicleStatus::Maintenance
        }
    );

    // El primer observador cierra su canal
    let closed_id = first.id;
    drop(first);

    let report = broadcaster.tick().await.unwrap();
    assert_eq!(report.removed, 1);
    assert_eq!(report.delivered, 1);
    assert!(!registry.contains(closed_id).await);
    assert!(registry.contains(second.id).await);

    let next = second.receiver.recv().await.unwrap();
    assert_eq!(next.len(), 3);
    assert_eq!(next, b);
}

#[tokio::test]
async fn test_transitions_show_up_on_a_later_tick() {
    let store = mixed_fleet().await;
    let registry = SubscriptionRegistry::new();
    let broadcaster = StatusBroadcaster::new(store.clone(), registry.clone(), config());
    let mut observer = registry.subscribe(4).await;

    broadcaster.tick().await.unwrap();
    let before = observer.receiver.recv().await.unwrap();
    assert_eq!(before[0].status, VehicleStatus::Available);

    store
        .atomic_transition(Transition::Rent {
            vehicle_id: 1,
            renter_id: 5,
            started_at: Utc::now(),
        })
        .await
        .unwrap();

    broadcaster.tick().await.unwrap();
    let after = observer.receiver.recv().await.unwrap();
    assert_eq!(after[0].status, VehicleStatus::Rented);
}

#[tokio::test]
async fn test_background_loop_delivers_until_stopped() {
    let store = mixed_fleet().await;
    let registry = SubscriptionRegistry::new();
    let mut observer = registry.subscribe(4).await;

    let handle = StatusBroadcaster::new(store, registry.clone(), config()).start();

    for _ in 0..2 {
        let snapshot = tokio::time::timeout(Duration::from_secs(2), observer.receiver.recv())
            .await
            .expect("tick within deadline")
            .expect("channel open");
        assert_eq!(snapshot.len(), 3);
    }

    handle.stop().await;

    // Tras parar no llegan más snapshots
    while observer.receiver.try_recv().is_ok() {}
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(observer.receiver.try_recv().is_err());
}

#[tokio::test]
async fn test_failed_fleet_read_skips_only_that_tick() {
    let store = Arc::new(FlakyStore::new(mixed_fleet().await, 1));
    let registry = SubscriptionRegistry::new();
    let broadcaster = StatusBroadcaster::new(store, registry.clone(), config());
    let mut observer = registry.subscribe(4).await;

    let err = broadcaster.tick().await.unwrap_err();
    assert!(matches!(err, AppError::Unavailable(_)));
    assert!(observer.receiver.try_recv().is_err());
    assert!(registry.contains(observer.id).await);

    let report = broadcaster.tick().await.unwrap();
    assert_eq!(report.delivered, 1);
    let snapshot = observer.receiver.recv().await.unwrap();
    assert_eq!(snapshot.len(), 3);
}

#[tokio::test]
async fn test_background_loop_survives_failed_reads() {
    let store = Arc::new(FlakyStore::new(mixed_fleet().await, 2));
    let registry = SubscriptionRegistry::new();
    let mut observer = registry.subscribe(4).await;

    let handle = StatusBroadcaster::new(store, registry.clone(), config()).start();

    let snapshot = tokio::time::timeout(Duration::from_secs(2), observer.receiver.recv())
        .await
        .expect("tick within deadline")
        .expect("channel open");
    assert_eq!(snapshot.len(), 3);
    assert!(handle.is_running());

    handle.stop().await;
}
