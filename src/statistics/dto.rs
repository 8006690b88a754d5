use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{macros::format_description, Date};
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::filters::DateRange;

/// `?start_date=2024-01-01&end_date=2024-01-31`
#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub start_date: String,
    pub end_date: String,
}

impl DateQuery {
    pub fn range(&self) -> ServiceResult<DateRange> {
        DateRange::new(parse_date(&self.start_date)?, parse_date(&self.end_date)?)
    }
}

fn parse_date(raw: &str) -> ServiceResult<Date> {
    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .map_err(|e| ServiceError::Validation(format!("bad date {raw:?}: {e}")))
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DishStats {
    pub id: Uuid,
    pub name: String,
    pub orders_count: i64,
    /// Unit price times order count.
    pub revenue: Decimal,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct KitchenStatistics {
    pub kitchen_id: Uuid,
    pub top_dishes: Vec<DishStats>,
    pub average_rating: Decimal,
    pub review_count: i64,
    pub total_revenue: Decimal,
    pub total_orders: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct KitchenStats {
    pub id: Uuid,
    pub name: String,
    pub orders_count: i64,
    pub total_spent: Decimal,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UserStatistics {
    pub user_id: Uuid,
    pub favorite_kitchens: Vec<KitchenStats>,
    pub total_spent: Decimal,
    pub total_orders: i64,
}
