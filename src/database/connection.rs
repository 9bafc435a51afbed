//! Conexión a PostgreSQL
//!
//! Crea el pool y asegura el schema. El índice único parcial sobre órdenes
//! abiertas garantiza en la propia base de datos que un vehículo no tenga
//! dos alquileres a la vez.

use anyhow::{Context, Result};
use sqlx::PgPool;
use tracing::info;

use crate::config::database::DatabaseConfig;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS vehicles (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        plate TEXT NOT NULL UNIQUE,
        status TEXT NOT NULL DEFAULT 'available'
            CHECK (status IN ('available', 'rented', 'maintenance')),
        battery SMALLINT NOT NULL DEFAULT 100 CHECK (battery BETWEEN 0 AND 100),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        phone TEXT NOT NULL UNIQUE,
        nickname TEXT,
        password_hash TEXT NOT NULL,
        role SMALLINT NOT NULL DEFAULT 0 CHECK (role IN (0, 1, 2)),
        deposit NUMERIC(12, 2) NOT NULL DEFAULT 0
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS rent_orders (
        id BIGSERIAL PRIMARY KEY,
        user_id BIGINT NOT NULL REFERENCES users(id),
        vehicle_id BIGINT NOT NULL REFERENCES vehicles(id),
        started_at TIMESTAMPTZ NOT NULL,
        ended_at TIMESTAMPTZ,
        fee NUMERIC(12, 2),
        CHECK (ended_at IS NULL OR ended_at >= started_at)
    )
    "#,
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS rent_orders_one_open_per_vehicle
        ON rent_orders (vehicle_id) WHERE ended_at IS NULL
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS rent_orders_user_id ON rent_orders (user_id)
    "#,
];

/// Conexión a la base de datos con el schema ya aplicado
#[derive(Clone)]
pub struct DatabaseConnection {
    pool: PgPool,
}

impl DatabaseConnection {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        info!("🔗 Conectando a PostgreSQL: {}", config.masked_url());

        let pool = config
            .create_pool()
            .await
            .context("Error creando el pool de PostgreSQL")?;

        let connection = Self { pool };
        connection.ensure_schema().await?;

        info!("✅ PostgreSQL conectado y schema verificado");
        Ok(connection)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Ejecutar el schema idempotente
    async fn ensure_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .context("Error aplicando el schema")?;
        }
        Ok(())
    }
}
