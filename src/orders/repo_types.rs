use rust_decimal::Decimal;
use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::{Item, OrderInfo};

/// Full order row; only ever read with `deleted_at IS NULL`.
#[derive(Debug, FromRow)]
pub struct OrderRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kitchen_id: Uuid,
    pub items: Json<Vec<Item>>,
    pub total_amount: Decimal,
    pub status: String,
    pub delivery_address: String,
    pub delivery_time: OffsetDateTime,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<OrderRow> for OrderInfo {
    fn from(r: OrderRow) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            kitchen_id: r.kitchen_id,
            items: r.items.0,
            total_amount: r.total_amount,
            status: r.status,
            delivery_address: r.delivery_address,
            delivery_time: r.delivery_time,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Listing projection, before the username is attached.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct OrderShortRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: String,
    pub total_amount: Decimal,
    pub delivery_time: OffsetDateTime,
}

impl From<&OrderInfo> for OrderShortRow {
    fn from(o: &OrderInfo) -> Self {
        Self {
            id: o.id,
            user_id: o.user_id,
            status: o.status.clone(),
            total_amount: o.total_amount,
            delivery_time: o.delivery_time,
        }
    }
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct RevenueStats {
    pub total_orders: i64,
    pub revenue: Decimal,
}

/// How many order lines referenced a dish.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct DishOrderCount {
    pub dish_id: Uuid,
    pub orders_count: i64,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct KitchenSpend {
    pub kitchen_id: Uuid,
    pub orders_count: i64,
    pub total_spent: Decimal,
}
