use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// One ordered line: a dish and the requested quantity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    pub dish_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderRequest {
    pub kitchen_id: Uuid,
    pub user_id: Uuid,
    pub items: Vec<Item>,
    pub delivery_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderInfo {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kitchen_id: Uuid,
    pub items: Vec<Item>,
    /// Priced once at creation; never recomputed from live dish prices.
    pub total_amount: Decimal,
    pub status: String,
    pub delivery_address: String,
    #[serde(with = "time::serde::rfc3339")]
    pub delivery_time: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OrderShortInfo {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub status: String,
    pub total_amount: Decimal,
    #[serde(with = "time::serde::rfc3339")]
    pub delivery_time: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct Orders {
    pub orders: Vec<OrderShortInfo>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StatusRes {
    pub id: Uuid,
    pub status: String,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}
