use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::ReviewStats;
use crate::error::ServiceResult;

#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Scoped by kitchen only; no time window applies.
    async fn review_stats(&self, kitchen_id: Uuid) -> ServiceResult<ReviewStats>;
}

#[derive(Clone)]
pub struct PgReviewStore {
    db: PgPool,
}

impl PgReviewStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ReviewStore for PgReviewStore {
    async fn review_stats(&self, kitchen_id: Uuid) -> ServiceResult<ReviewStats> {
        let stats = sqlx::query_as::<_, ReviewStats>(
            r#"
            SELECT COUNT(*) AS review_count,
                   ROUND(AVG(rating)::numeric, 2) AS average_rating
              FROM reviews
             WHERE kitchen_id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(kitchen_id)
        .fetch_one(&self.db)
        .await?;
        Ok(stats)
    }
}
