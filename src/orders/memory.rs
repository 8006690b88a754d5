use std::{
    cmp::Reverse,
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        RwLock,
    },
};

use async_trait::async_trait;
use rust_decimal::Decimal;
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::OrderInfo;
use super::repo::{OrderScope, OrderStore};
use super::repo_types::{DishOrderCount, KitchenSpend, OrderShortRow, RevenueStats};
use crate::error::{ServiceError, ServiceResult};
use crate::filters::{DateRange, Pagination};
use crate::lifecycle::Lifecycle;

#[derive(Debug, Clone)]
struct StoredOrder {
    order: OrderInfo,
    lifecycle: Lifecycle,
}

/// Order store held in memory, same visibility rules as the Postgres one.
#[derive(Default)]
pub struct InMemoryOrderStore {
    orders: RwLock<Vec<StoredOrder>>,
    writes: AtomicUsize,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful inserts.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn live<T>(&self, f: impl FnOnce(Vec<&OrderInfo>) -> T) -> ServiceResult<T> {
        let orders = self.orders.read().map_err(|e| ServiceError::poisoned("order store", e))?;
        Ok(f(orders
            .iter()
            .filter(|s| s.lifecycle.is_active())
            .map(|s| &s.order)
            .collect()))
    }

    fn live_in_range(
        &self,
        range: DateRange,
        keep: impl Fn(&OrderInfo) -> bool,
    ) -> ServiceResult<Vec<OrderInfo>> {
        self.live(|orders| {
            orders
                .into_iter()
                .filter(|o| range.contains(o.created_at) && keep(*o))
                .cloned()
                .collect()
        })
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: &OrderInfo) -> ServiceResult<()> {
        let mut orders = self.orders.write().map_err(|e| ServiceError::poisoned("order store", e))?;
        orders.push(StoredOrder {
            order: order.clone(),
            lifecycle: Lifecycle::Active,
        });
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: &str,
        at: OffsetDateTime,
    ) -> ServiceResult<bool> {
        let mut orders = self.orders.write().map_err(|e| ServiceError::poisoned("order store", e))?;
        let Some(stored) = orders
            .iter_mut()
            .find(|s| s.order.id == id && s.lifecycle.is_active())
        else {
            return Ok(false);
        };
        stored.order.status = status.to_string();
        stored.order.updated_at = at;
        Ok(true)
    }

    async fn find(&self, id: Uuid) -> ServiceResult<Option<OrderInfo>> {
        self.live(|orders| orders.into_iter().find(|o| o.id == id).cloned())
    }

    async fn list(&self, scope: OrderScope, page: Pagination) -> ServiceResult<Vec<OrderShortRow>> {
        let mut rows: Vec<OrderInfo> = self.live(|orders| {
            orders
                .into_iter()
                .filter(|o| scope.matches(o))
                .cloned()
                .collect()
        })?;
        rows.sort_by_key(|o| (Reverse(o.created_at), o.id));
        let rows: Vec<OrderShortRow> = rows.iter().map(OrderShortRow::from).collect();
        Ok(page.window(&rows))
    }

    async fn count(&self, scope: OrderScope) -> ServiceResult<i64> {
        self.live(|orders| orders.into_iter().filter(|o| scope.matches(o)).count() as i64)
    }

    async fn soft_delete(&self, id: Uuid, at: OffsetDateTime) -> ServiceResult<()> {
        let mut orders = self.orders.write().map_err(|e| ServiceError::poisoned("order store", e))?;
        for stored in orders.iter_mut().filter(|s| s.order.id == id) {
            stored.lifecycle.delete(at);
        }
        Ok(())
    }

    async fn exists(&self, id: Uuid) -> ServiceResult<bool> {
        self.live(|orders| orders.iter().any(|o| o.id == id))
    }

    async fn revenue_for_kitchen(
        &self,
        kitchen_id: Uuid,
        range: DateRange,
    ) -> ServiceResult<RevenueStats> {
        let orders = self.live_in_range(range, |o| o.kitchen_id == kitchen_id)?;
        Ok(RevenueStats {
            total_orders: orders.len() as i64,
            revenue: orders.iter().map(|o| o.total_amount).sum(),
        })
    }

    async fn dish_order_counts(
        &self,
        kitchen_id: Uuid,
        range: DateRange,
    ) -> ServiceResult<Vec<DishOrderCount>> {
        let orders = self.live_in_range(range, |o| o.kitchen_id == kitchen_id)?;
        let mut counts: HashMap<Uuid, i64> = HashMap::new();
        for item in orders.iter().flat_map(|o| o.items.iter()) {
            *counts.entry(item.dish_id).or_default() += 1;
        }
        let mut rows: Vec<DishOrderCount> = counts
            .into_iter()
            .map(|(dish_id, orders_count)| DishOrderCount {
                dish_id,
                orders_count,
            })
            .collect();
        rows.sort_by_key(|r| (Reverse(r.orders_count), r.dish_id));
        Ok(rows)
    }

    async fn spend_by_kitchen(
        &self,
        user_id: Uuid,
        range: DateRange,
    ) -> ServiceResult<Vec<KitchenSpend>> {
        let orders = self.live_in_range(range, |o| o.user_id == user_id)?;
        let mut groups: HashMap<Uuid, (i64, Decimal)> = HashMap::new();
        for order in &orders {
            let entry = groups.entry(order.kitchen_id).or_default();
            entry.0 += 1;
            entry.1 += order.total_amount;
        }
        let mut rows: Vec<KitchenSpend> = groups
            .into_iter()
            .map(|(kitchen_id, (orders_count, total_spent))| KitchenSpend {
                kitchen_id,
                orders_count,
                total_spent,
            })
            .collect();
        rows.sort_by_key(|r| (Reverse(r.total_spent), r.kitchen_id));
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::dto::Item;
    use time::macros::{date, datetime};

    fn order(user_id: Uuid, kitchen_id: Uuid, created_at: OffsetDateTime) -> OrderInfo {
        OrderInfo {
            id: Uuid::new_v4(),
            user_id,
            kitchen_id,
            items: vec![Item {
                dish_id: Uuid::nil(),
                quantity: 1,
            }],
            total_amount: Decimal::new(1000, 2),
            status: "preparing".into(),
            delivery_address: "1 Main St".into(),
            delivery_time: created_at,
            created_at,
            updated_at: created_at,
        }
    }

    #[tokio::test]
    async fn deleted_orders_disappear_from_every_read() {
        let store = InMemoryOrderStore::new();
        let (user, kitchen) = (Uuid::new_v4(), Uuid::new_v4());
        let o = order(user, kitchen, datetime!(2024-01-10 12:00 UTC));
        store.insert(&o).await.unwrap();
        store.soft_delete(o.id, datetime!(2024-01-11 0:00 UTC)).await.unwrap();

        assert!(store.find(o.id).await.unwrap().is_none());
        assert!(!store.exists(o.id).await.unwrap());
        assert_eq!(store.count(OrderScope::User(user)).await.unwrap(), 0);
        assert!(!store.update_status(o.id, "delivering", o.created_at).await.unwrap());
        let range = DateRange::new(date!(2024 - 01 - 01), date!(2024 - 01 - 31)).unwrap();
        assert_eq!(
            store.revenue_for_kitchen(kitchen, range).await.unwrap().total_orders,
            0
        );
    }

    #[tokio::test]
    async fn listing_is_newest_first() {
        let store = InMemoryOrderStore::new();
        let (user, kitchen) = (Uuid::new_v4(), Uuid::new_v4());
        let old = order(user, kitchen, datetime!(2024-01-01 8:00 UTC));
        let new = order(user, kitchen, datetime!(2024-01-02 8:00 UTC));
        store.insert(&old).await.unwrap();
        store.insert(&new).await.unwrap();

        let rows = store
            .list(OrderScope::Kitchen(kitchen), Pagination::new(1, 10))
            .await
            .unwrap();
        assert_eq!(rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![new.id, old.id]);
    }
}
