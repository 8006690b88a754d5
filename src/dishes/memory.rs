use std::{
    cmp::Reverse,
    sync::{
        atomic::{AtomicUsize, Ordering},
        RwLock,
    },
};

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::repo::{DishCatalog, RecommendationFilter};
use super::repo_types::{DishInfo, DishShortInfo};
use crate::error::{ServiceError, ServiceResult};
use crate::filters::Pagination;
use crate::lifecycle::{self, Lifecycle};

#[derive(Debug, Clone)]
struct StoredDish {
    dish: DishInfo,
    lifecycle: Lifecycle,
}

/// Dish catalog held in memory.
#[derive(Default)]
pub struct InMemoryDishCatalog {
    dishes: RwLock<Vec<StoredDish>>,
    lookups: AtomicUsize,
}

impl InMemoryDishCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, dish: DishInfo) {
        if let Ok(mut dishes) = self.dishes.write() {
            dishes.push(StoredDish {
                dish,
                lifecycle: Lifecycle::Active,
            });
        }
    }

    pub fn set_price(&self, id: Uuid, price: Decimal) {
        if let Ok(mut dishes) = self.dishes.write() {
            for stored in dishes.iter_mut().filter(|s| s.dish.id == id) {
                stored.dish.price = price;
                stored.dish.updated_at = lifecycle::now();
            }
        }
    }

    pub fn delete(&self, id: Uuid) {
        if let Ok(mut dishes) = self.dishes.write() {
            for stored in dishes.iter_mut().filter(|s| s.dish.id == id) {
                stored.lifecycle.delete(lifecycle::now());
            }
        }
    }

    /// Number of `get_dish_by_id` calls served.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    fn candidates(&self, filter: &RecommendationFilter) -> ServiceResult<Vec<DishInfo>> {
        let dishes = self.dishes.read().map_err(|e| ServiceError::poisoned("dish catalog", e))?;
        let mut found: Vec<DishInfo> = dishes
            .iter()
            .filter(|s| s.lifecycle.is_active() && filter.matches(&s.dish))
            .map(|s| s.dish.clone())
            .collect();
        found.sort_by_key(|d| (Reverse(d.created_at), d.id));
        Ok(found)
    }
}

#[async_trait]
impl DishCatalog for InMemoryDishCatalog {
    async fn get_dish_by_id(&self, id: Uuid) -> ServiceResult<DishInfo> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.dishes
            .read()
            .map_err(|e| ServiceError::poisoned("dish catalog", e))?
            .iter()
            .find(|s| s.dish.id == id && s.lifecycle.is_active())
            .map(|s| s.dish.clone())
            .ok_or_else(|| ServiceError::not_found("dish", id))
    }

    async fn recommend(
        &self,
        filter: &RecommendationFilter,
        page: Pagination,
    ) -> ServiceResult<Vec<DishShortInfo>> {
        let rows: Vec<DishShortInfo> = self
            .candidates(filter)?
            .iter()
            .map(DishShortInfo::from)
            .collect();
        Ok(page.window(&rows))
    }

    async fn count_recommendations(&self, filter: &RecommendationFilter) -> ServiceResult<i64> {
        Ok(self.candidates(filter)?.len() as i64)
    }
}
