use anyhow::Result;
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use scenic_rental::config::{DatabaseConfig, EnvironmentConfig};
use scenic_rental::database::DatabaseConnection;
use scenic_rental::repositories::{seed::seed_demo_data, FleetStore, InMemoryFleetStore, PgFleetStore};
use scenic_rental::routes::create_router;
use scenic_rental::services::{StatusBroadcaster, SubscriptionRegistry};
use scenic_rental::state::AppState;
use scenic_rental::utils::clock::SystemClock;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("🚗 Scenic Rental - Alquiler de vehículos en zonas turísticas");
    info!("============================================================");

    let config = EnvironmentConfig::from_env()?;

    // Store: PostgreSQL si hay DATABASE_URL, memoria en caso contrario
    let store: Arc<dyn FleetStore> = match DatabaseConfig::from_env() {
        Some(db_config) => {
            let connection = match DatabaseConnection::connect(&db_config).await {
                Ok(conn) => conn,
                Err(e) => {
                    error!("❌ Error conectando a la base de datos: {}", e);
                    return Err(anyhow::anyhow!("Error de base de datos: {}", e));
                }
            };
            Arc::new(PgFleetStore::new(connection.pool().clone()))
        }
        None => {
            warn!("⚠️ DATABASE_URL no definida, usando store en memoria");
            Arc::new(InMemoryFleetStore::new())
        }
    };

    if let Err(e) = seed_demo_data(store.as_ref(), bcrypt::DEFAULT_COST).await {
        error!("❌ Error sembrando datos de demostración: {}", e);
        return Err(anyhow::anyhow!("Error sembrando datos: {}", e));
    }

    let registry = SubscriptionRegistry::new();
    let broadcaster = StatusBroadcaster::new(
        store.clone(),
        registry.clone(),
        config.broadcast_config(),
    )
    .start();

    let addr: SocketAddr = config.server_url().parse()?;
    let app_state = AppState::new(config, store, Arc::new(SystemClock), registry);
    let app = create_router(app_state);

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health - Health check");
    info!("   GET  /cars, /cars/:id - Consultar flota");
    info!("   POST /cars, PUT /cars/:id/status, PUT /cars/:id/battery - Mantenimiento");
    info!("   POST /rent/:car_id, POST /return/:order_id - Alquiler y devolución");
    info!("   GET  /orders, /orders/:id - Órdenes");
    info!("   POST /users/register, POST /users/token, GET /users/me - Usuarios");
    info!("   GET  /ws/status - Estado de la flota en tiempo real");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    broadcaster.stop().await;

    if let Err(e) = served {
        error!("❌ Error del servidor: {}", e);
        return Err(e.into());
    }

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo escuchar Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo escuchar SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
