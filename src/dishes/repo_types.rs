use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Dish record as stored; read only through `deleted_at IS NULL` queries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DishInfo {
    pub id: Uuid,
    pub kitchen_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub category: String,
    pub ingredients: Vec<String>,
    pub allergens: Vec<String>,
    pub nutrition_info: Option<serde_json::Value>,
    pub dietary_info: Vec<String>,
    pub available: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Listing projection of a dish.
#[derive(Debug, Clone, Serialize, PartialEq, FromRow)]
pub struct DishShortInfo {
    pub id: Uuid,
    pub kitchen_id: Uuid,
    pub price: Decimal,
    pub category: String,
    pub available: bool,
}

impl From<&DishInfo> for DishShortInfo {
    fn from(d: &DishInfo) -> Self {
        Self {
            id: d.id,
            kitchen_id: d.kitchen_id,
            price: d.price,
            category: d.category.clone(),
            available: d.available,
        }
    }
}
