use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Page, RentalOrder};

// Paginación `?skip=&limit=`
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

impl From<PageQuery> for Page {
    fn from(query: PageQuery) -> Self {
        Page::new(query.skip, query.limit)
    }
}

// Response de alquiler
#[derive(Debug, Serialize, Deserialize)]
pub struct RentResponse {
    pub order_id: i64,
    pub start_at: DateTime<Utc>,
}

impl From<&RentalOrder> for RentResponse {
    fn from(order: &RentalOrder) -> Self {
        Self {
            order_id: order.id,
            start_at: order.started_at,
        }
    }
}

// Response de devolución
#[derive(Debug, Serialize, Deserialize)]
pub struct ReturnResponse {
    pub order_id: i64,
    pub end_at: DateTime<Utc>,
    pub fee: Decimal,
}

impl TryFrom<&RentalOrder> for ReturnResponse {
    type Error = crate::utils::errors::AppError;

    fn try_from(order: &RentalOrder) -> Result<Self, Self::Error> {
        match (order.ended_at, order.fee) {
            (Some(end_at), Some(fee)) => Ok(Self {
                order_id: order.id,
                end_at,
                fee,
            }),
            _ => Err(crate::utils::errors::AppError::Internal(format!(
                "Order {} was returned without end time or fee",
                order.id
            ))),
        }
    }
}

// Response de orden
#[derive(Debug, Serialize, Deserialize)]
pub struct OrderResponse {
    pub id: i64,
    pub user_id: i64,
    pub car_id: i64,
    pub start_at: DateTime<Utc>,
    pub end_at: Option<DateTime<Utc>>,
    pub fee: Option<Decimal>,
}

impl From<RentalOrder> for OrderResponse {
    fn from(order: RentalOrder) -> Self {
        Self {
            id: order.id,
            user_id: order.renter_id,
            car_id: order.vehicle_id,
            start_at: order.started_at,
            end_at: order.ended_at,
            fee: order.fee,
        }
    }
}
