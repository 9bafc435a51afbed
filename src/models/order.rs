//! Modelo de RentalOrder
//!
//! Una orden con `ended_at == None` está abierta. Como mucho existe una
//! orden abierta por vehículo.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentalOrder {
    pub id: i64,
    pub renter_id: i64,
    pub vehicle_id: i64,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub fee: Option<Decimal>,
}

impl RentalOrder {
    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }
}

/// Filtro de listado de órdenes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderScope {
    /// Todas las órdenes de la flota
    All,
    /// Solo las órdenes de un arrendatario
    Renter(i64),
}

/// Paginación simple (offset/limit) como en los listados del API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: i64,
    pub limit: i64,
}

impl Page {
    pub const MAX_LIMIT: i64 = 100;

    pub fn new(offset: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            offset: offset.unwrap_or(0).max(0),
            limit: limit.unwrap_or(Self::MAX_LIMIT).clamp(1, Self::MAX_LIMIT),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}
