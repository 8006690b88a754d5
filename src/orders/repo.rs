use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use super::dto::OrderInfo;
use super::repo_types::{DishOrderCount, KitchenSpend, OrderRow, OrderShortRow, RevenueStats};
use crate::error::ServiceResult;
use crate::filters::{DateRange, Pagination};

/// Which side of an order a listing is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderScope {
    User(Uuid),
    Kitchen(Uuid),
}

impl OrderScope {
    pub fn id(&self) -> Uuid {
        match self {
            Self::User(id) | Self::Kitchen(id) => *id,
        }
    }

    pub fn matches(&self, order: &OrderInfo) -> bool {
        match self {
            Self::User(id) => order.user_id == *id,
            Self::Kitchen(id) => order.kitchen_id == *id,
        }
    }

    /// WHERE clause shared by the listing and its count.
    fn predicate(&self) -> &'static str {
        match self {
            Self::User(_) => "user_id = $1 AND deleted_at IS NULL",
            Self::Kitchen(_) => "kitchen_id = $1 AND deleted_at IS NULL",
        }
    }
}

/// Persistence for orders. Soft-deleted orders are invisible to every read.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert(&self, order: &OrderInfo) -> ServiceResult<()>;
    /// Returns false when no live order has this id.
    async fn update_status(&self, id: Uuid, status: &str, at: OffsetDateTime)
        -> ServiceResult<bool>;
    async fn find(&self, id: Uuid) -> ServiceResult<Option<OrderInfo>>;
    /// Newest first, ties broken by id.
    async fn list(&self, scope: OrderScope, page: Pagination) -> ServiceResult<Vec<OrderShortRow>>;
    async fn count(&self, scope: OrderScope) -> ServiceResult<i64>;
    async fn soft_delete(&self, id: Uuid, at: OffsetDateTime) -> ServiceResult<()>;
    async fn exists(&self, id: Uuid) -> ServiceResult<bool>;

    async fn revenue_for_kitchen(
        &self,
        kitchen_id: Uuid,
        range: DateRange,
    ) -> ServiceResult<RevenueStats>;
    /// Order lines per dish, most ordered first.
    async fn dish_order_counts(
        &self,
        kitchen_id: Uuid,
        range: DateRange,
    ) -> ServiceResult<Vec<DishOrderCount>>;
    /// Per-kitchen order count and spend for one user, biggest spend first.
    async fn spend_by_kitchen(
        &self,
        user_id: Uuid,
        range: DateRange,
    ) -> ServiceResult<Vec<KitchenSpend>>;
}

#[derive(Clone)]
pub struct PgOrderStore {
    db: PgPool,
}

impl PgOrderStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn insert(&self, order: &OrderInfo) -> ServiceResult<()> {
        let items = serde_json::to_value(&order.items)?;
        sqlx::query(
            r#"
            INSERT INTO orders (
                id, user_id, kitchen_id, items, total_amount, status,
                delivery_address, delivery_time, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(order.id)
        .bind(order.user_id)
        .bind(order.kitchen_id)
        .bind(items)
        .bind(order.total_amount)
        .bind(&order.status)
        .bind(&order.delivery_address)
        .bind(order.delivery_time)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: &str,
        at: OffsetDateTime,
    ) -> ServiceResult<bool> {
        let res = sqlx::query(
            r#"
            UPDATE orders
               SET status = $1, updated_at = $2
             WHERE id = $3 AND deleted_at IS NULL
            "#,
        )
        .bind(status)
        .bind(at)
        .bind(id)
        .execute(&self.db)
        .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn find(&self, id: Uuid) -> ServiceResult<Option<OrderInfo>> {
        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, user_id, kitchen_id, items, total_amount, status,
                   delivery_address, delivery_time, created_at, updated_at
              FROM orders
             WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(OrderInfo::from))
    }

    async fn list(&self, scope: OrderScope, page: Pagination) -> ServiceResult<Vec<OrderShortRow>> {
        let sql = format!(
            "SELECT id, user_id, status, total_amount, delivery_time \
               FROM orders \
              WHERE {} \
              ORDER BY created_at DESC, id \
              LIMIT $2 OFFSET $3",
            scope.predicate()
        );
        let rows = sqlx::query_as::<_, OrderShortRow>(&sql)
            .bind(scope.id())
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.db)
            .await?;
        debug!(?scope, rows = rows.len(), "orders listed");
        Ok(rows)
    }

    async fn count(&self, scope: OrderScope) -> ServiceResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM orders WHERE {}", scope.predicate());
        let total: i64 = sqlx::query_scalar(&sql)
            .bind(scope.id())
            .fetch_one(&self.db)
            .await?;
        Ok(total)
    }

    async fn soft_delete(&self, id: Uuid, at: OffsetDateTime) -> ServiceResult<()> {
        sqlx::query(
            r#"
            UPDATE orders
               SET deleted_at = $1
             WHERE id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(at)
        .bind(id)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn exists(&self, id: Uuid) -> ServiceResult<bool> {
        let found: bool = sqlx::query_scalar(
            r#"SELECT EXISTS (SELECT 1 FROM orders WHERE id = $1 AND deleted_at IS NULL)"#,
        )
        .bind(id)
        .fetch_one(&self.db)
        .await?;
        Ok(found)
    }

    async fn revenue_for_kitchen(
        &self,
        kitchen_id: Uuid,
        range: DateRange,
    ) -> ServiceResult<RevenueStats> {
        let stats = sqlx::query_as::<_, RevenueStats>(
            r#"
            SELECT COUNT(*)                          AS total_orders,
                   COALESCE(SUM(total_amount), 0)    AS revenue
              FROM orders
             WHERE deleted_at IS NULL
               AND kitchen_id = $1
               AND created_at >= $2 AND created_at < $3
            "#,
        )
        .bind(kitchen_id)
        .bind(range.starts_at())
        .bind(range.ends_before())
        .fetch_one(&self.db)
        .await?;
        Ok(stats)
    }

    async fn dish_order_counts(
        &self,
        kitchen_id: Uuid,
        range: DateRange,
    ) -> ServiceResult<Vec<DishOrderCount>> {
        let rows = sqlx::query_as::<_, DishOrderCount>(
            r#"
            WITH dish_data AS (
                SELECT jsonb_array_elements(items) AS dish
                  FROM orders
                 WHERE deleted_at IS NULL
                   AND kitchen_id = $1
                   AND created_at >= $2 AND created_at < $3
            )
            SELECT (dish ->> 'dish_id')::uuid AS dish_id,
                   COUNT(*)                   AS orders_count
              FROM dish_data
             GROUP BY 1
             ORDER BY orders_count DESC, dish_id
            "#,
        )
        .bind(kitchen_id)
        .bind(range.starts_at())
        .bind(range.ends_before())
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn spend_by_kitchen(
        &self,
        user_id: Uuid,
        range: DateRange,
    ) -> ServiceResult<Vec<KitchenSpend>> {
        let rows = sqlx::query_as::<_, KitchenSpend>(
            r#"
            SELECT kitchen_id,
                   COUNT(*)                       AS orders_count,
                   COALESCE(SUM(total_amount), 0) AS total_spent
              FROM orders
             WHERE deleted_at IS NULL
               AND user_id = $1
               AND created_at >= $2 AND created_at < $3
             GROUP BY kitchen_id
             ORDER BY total_spent DESC, kitchen_id
            "#,
        )
        .bind(user_id)
        .bind(range.starts_at())
        .bind(range.ends_before())
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }
}
