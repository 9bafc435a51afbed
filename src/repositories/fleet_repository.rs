use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use super::{FleetStore, Transition};
use crate::models::{
    NewUser, NewVehicle, OrderScope, Page, RentalOrder, Role, User, Vehicle, VehicleStatus,
};
use crate::utils::errors::{conflict_error, not_found_error, AppError, AppResult};

// Filas tal y como vienen de PostgreSQL
#[derive(Debug, sqlx::FromRow)]
struct VehicleRow {
    id: i64,
    name: String,
    plate: String,
    status: String,
    battery: i16,
    updated_at: DateTime<Utc>,
}

impl TryFrom<VehicleRow> for Vehicle {
    type Error = AppError;

    fn try_from(row: VehicleRow) -> Result<Self, Self::Error> {
        let battery_level = u8::try_from(row.battery).map_err(|_| {
            AppError::Internal(format!(
                "Vehicle {} has out of range battery {}",
                row.id, row.battery
            ))
        })?;

        Ok(Vehicle {
            id: row.id,
            name: row.name,
            plate: row.plate,
            status: row.status.parse()?,
            battery_level,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    user_id: i64,
    vehicle_id: i64,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    fee: Option<Decimal>,
}

impl From<OrderRow> for RentalOrder {
    fn from(row: OrderRow) -> Self {
        RentalOrder {
            id: row.id,
            renter_id: row.user_id,
            vehicle_id: row.vehicle_id,
            started_at: row.started_at,
            ended_at: row.ended_at,
            fee: row.fee,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    phone: String,
    nickname: Option<String>,
    password_hash: String,
    role: i16,
    deposit: Decimal,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = Role::from_code(row.role).ok_or_else(|| {
            AppError::Internal(format!("User {} has unknown role {}", row.id, row.role))
        })?;

        Ok(User {
            id: row.id,
            phone: row.phone,
            nickname: row.nickname,
            password_hash: row.password_hash,
            role,
            deposit: row.deposit,
        })
    }
}

const VEHICLE_COLUMNS: &str = "id, name, plate, status, battery, updated_at";
const ORDER_COLUMNS: &str = "id, user_id, vehicle_id, started_at, ended_at, fee";
const USER_COLUMNS: &str = "id, phone, nickname, password_hash, role, deposit";

/// Store sobre PostgreSQL.
///
/// Las transiciones usan una transacción con UPDATE condicional
/// (compare-and-swap sobre `status` / `ended_at IS NULL`); si el UPDATE no
/// afecta filas, la transacción se descarta y se devuelve Conflict.
#[derive(Clone)]
pub struct PgFleetStore {
    pool: PgPool,
}

impl PgFleetStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn rent(
        &self,
        vehicle_id: i64,
        renter_id: i64,
        started_at: DateTime<Utc>,
    ) -> AppResult<RentalOrder> {
        let mut tx = self.pool.begin().await?;

        let flipped: Option<(i64,)> = sqlx::query_as(
            r#"
            UPDATE vehicles
            SET status = 'rented', updated_at = $2
            WHERE id = $1 AND status = 'available'
            RETURNING id
            "#,
        )
        .bind(vehicle_id)
        .bind(started_at)
        .fetch_optional(&mut *tx)
        .await?;

        if flipped.is_none() {
            let reason = Self::explain_unavailable(&mut tx, vehicle_id).await?;
            tx.rollback().await?;
            return Err(reason);
        }

        let order: OrderRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO rent_orders (user_id, vehicle_id, started_at)
            VALUES ($1, $2, $3)
            RETURNING {}
            "#,
            ORDER_COLUMNS
        ))
        .bind(renter_id)
        .bind(vehicle_id)
        .bind(started_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match AppError::from(e) {
            // Índice único de órdenes abiertas por vehículo
            err if err.kind() == crate::utils::ErrorKind::Conflict => AppError::Conflict(
                format!("Vehicle {} already has an open order", vehicle_id),
            ),
            err => err,
        })?;

        tx.commit().await?;
        Ok(order.into())
    }

    async fn explain_unavailable(
        tx: &mut Transaction<'_, Postgres>,
        vehicle_id: i64,
    ) -> AppResult<AppError> {
        let status: Option<(String,)> =
            sqlx::query_as("SELECT status FROM vehicles WHERE id = $1")
                .bind(vehicle_id)
                .fetch_optional(&mut **tx)
                .await?;

        Ok(match status {
            None => not_found_error("Vehicle", vehicle_id),
            Some((status,)) => AppError::Conflict(format!(
                "Vehicle {} is not available ({})",
                vehicle_id, status
            )),
        })
    }

    async fn close(
        &self,
        order_id: i64,
        ended_at: DateTime<Utc>,
        fee: Decimal,
    ) -> AppResult<RentalOrder> {
        let mut tx = self.pool.begin().await?;

        let closed: Option<OrderRow> = sqlx::query_as(&format!(
            r#"
            UPDATE rent_orders
            SET ended_at = $2, fee = $3
            WHERE id = $1 AND ended_at IS NULL AND started_at <= $2
            RETURNING {}
            "#,
            ORDER_COLUMNS
        ))
        .bind(order_id)
        .bind(ended_at)
        .bind(fee)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(order) = closed else {
            let existing: Option<OrderRow> = sqlx::query_as(&format!(
                "SELECT {} FROM rent_orders WHERE id = $1",
                ORDER_COLUMNS
            ))
            .bind(order_id)
            .fetch_optional(&mut *tx)
            .await?;
            tx.rollback().await?;

            return Err(match existing {
                None => not_found_error("Order", order_id),
                Some(o) if o.ended_at.is_some() => {
                    AppError::Conflict(format!("Order {} already returned", order_id))
                }
                Some(_) => AppError::InvalidInput(format!(
                    "Order {} cannot end before it started",
                    order_id
                )),
            });
        };

        let released = sqlx::query(
            r#"
            UPDATE vehicles
            SET status = 'available', updated_at = $2
            WHERE id = $1 AND status = 'rented'
            "#,
        )
        .bind(order.vehicle_id)
        .bind(ended_at)
        .execute(&mut *tx)
        .await?;

        if released.rows_affected() != 1 {
            tx.rollback().await?;
            return Err(AppError::Internal(format!(
                "Open order {} references vehicle {} that is not rented",
                order_id, order.vehicle_id
            )));
        }

        tx.commit().await?;
        Ok(order.into())
    }
}

#[async_trait]
impl FleetStore for PgFleetStore {
    async fn get_vehicle(&self, id: i64) -> AppResult<Option<Vehicle>> {
        let row: Option<VehicleRow> = sqlx::query_as(&format!(
            "SELECT {} FROM vehicles WHERE id = $1",
            VEHICLE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Vehicle::try_from).transpose()
    }

    async fn list_vehicles(&self) -> AppResult<Vec<Vehicle>> {
        // Una sola sentencia: PostgreSQL la resuelve sobre un único snapshot
        let rows: Vec<VehicleRow> = sqlx::query_as(&format!(
            "SELECT {} FROM vehicles ORDER BY id",
            VEHICLE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Vehicle::try_from).collect()
    }

    async fn create_vehicle(&self, vehicle: NewVehicle) -> AppResult<Vehicle> {
        let row: VehicleRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO vehicles (name, plate, status, battery, updated_at)
            VALUES ($1, $2, $3, $4, now())
            RETURNING {}
            "#,
            VEHICLE_COLUMNS
        ))
        .bind(&vehicle.name)
        .bind(&vehicle.plate)
        .bind(vehicle.status.as_str())
        .bind(i16::from(vehicle.battery_level))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match AppError::from(e) {
            err if err.kind() == crate::utils::ErrorKind::Conflict => {
                conflict_error("Vehicle", "plate", &vehicle.plate)
            }
            err => err,
        })?;

        row.try_into()
    }

    async fn update_vehicle_battery(&self, id: i64, battery_level: u8) -> AppResult<Vehicle> {
        let row: Option<VehicleRow> = sqlx::query_as(&format!(
            r#"
            UPDATE vehicles SET battery = $2, updated_at = now()
            WHERE id = $1
            RETURNING {}
            "#,
            VEHICLE_COLUMNS
        ))
        .bind(id)
        .bind(i16::from(battery_level))
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| not_found_error("Vehicle", id))?.try_into()
    }

    async fn swap_vehicle_status(
        &self,
        id: i64,
        from: VehicleStatus,
        to: VehicleStatus,
    ) -> AppResult<Vehicle> {
        let row: Option<VehicleRow> = sqlx::query_as(&format!(
            r#"
            UPDATE vehicles SET status = $3, updated_at = now()
            WHERE id = $1 AND status = $2
            RETURNING {}
            "#,
            VEHICLE_COLUMNS
        ))
        .bind(id)
        .bind(from.as_str())
        .bind(to.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row.try_into(),
            None => match self.get_vehicle(id).await? {
                None => Err(not_found_error("Vehicle", id)),
                Some(current) => Err(AppError::Conflict(format!(
                    "Vehicle {} is {}, expected {}",
                    id, current.status, from
                ))),
            },
        }
    }

    async fn get_order(&self, id: i64) -> AppResult<Option<RentalOrder>> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "SELECT {} FROM rent_orders WHERE id = $1",
            ORDER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(RentalOrder::from))
    }

    async fn list_orders(&self, scope: OrderScope, page: Page) -> AppResult<Vec<RentalOrder>> {
        let renter = match scope {
            OrderScope::All => None,
            OrderScope::Renter(id) => Some(id),
        };

        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM rent_orders
            WHERE ($1::BIGINT IS NULL OR user_id = $1)
            ORDER BY id DESC
            LIMIT $2 OFFSET $3
            "#,
            ORDER_COLUMNS
        ))
        .bind(renter)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(RentalOrder::from).collect())
    }

    async fn atomic_transition(&self, transition: Transition) -> AppResult<RentalOrder> {
        match transition {
            Transition::Rent {
                vehicle_id,
                renter_id,
                started_at,
            } => self.rent(vehicle_id, renter_id, started_at).await,
            Transition::Return {
                order_id,
                ended_at,
                fee,
            } => self.close(order_id, ended_at, fee).await,
        }
    }

    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let row: UserRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO users (phone, nickname, password_hash, role, deposit)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(&user.phone)
        .bind(&user.nickname)
        .bind(&user.password_hash)
        .bind(user.role.code())
        .bind(user.deposit)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match AppError::from(e) {
            err if err.kind() == crate::utils::ErrorKind::Conflict => {
                conflict_error("User", "phone", &user.phone)
            }
            err => err,
        })?;

        row.try_into()
    }

    async fn find_user_by_phone(&self, phone: &str) -> AppResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {} FROM users WHERE phone = $1",
            USER_COLUMNS
        ))
        .bind(phone)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn get_user(&self, id: i64) -> AppResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }
}
