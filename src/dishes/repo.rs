use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{DishInfo, DishShortInfo};
use crate::error::{ServiceError, ServiceResult};
use crate::filters::Pagination;

/// Candidate selection for recommendations: `$1` kitchen ids, `$2` search terms.
///
/// Both the page query and the count query expand this same literal.
macro_rules! recommendation_predicate {
    () => {
        "deleted_at IS NULL AND available = TRUE \
         AND (kitchen_id = ANY($1) \
              OR to_tsvector('simple', array_to_string(dietary_info, ' ')) \
                 @@ plainto_tsquery('simple', $2))"
    };
}

const RECOMMEND_SQL: &str = concat!(
    "SELECT id, kitchen_id, price, category, available FROM dishes WHERE ",
    recommendation_predicate!(),
    " ORDER BY created_at DESC, id LIMIT $3 OFFSET $4"
);

const RECOMMEND_COUNT_SQL: &str = concat!(
    "SELECT COUNT(*) FROM dishes WHERE ",
    recommendation_predicate!()
);

/// Inputs of the recommendation predicate, resolved once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendationFilter {
    pub kitchen_ids: Vec<Uuid>,
    /// Dietary preference terms joined by spaces.
    pub search: String,
}

impl RecommendationFilter {
    pub fn new(kitchen_ids: Vec<Uuid>, dietary_preferences: &[String]) -> Self {
        Self {
            kitchen_ids,
            search: dietary_preferences.join(" "),
        }
    }

    /// Kitchen membership OR a dietary text match; only live, available dishes.
    pub fn matches(&self, dish: &DishInfo) -> bool {
        dish.available && (self.kitchen_ids.contains(&dish.kitchen_id) || self.dietary_match(dish))
    }

    /// Every search token must appear among the dish's dietary tokens.
    fn dietary_match(&self, dish: &DishInfo) -> bool {
        let wanted = tokens(&self.search);
        if wanted.is_empty() {
            return false;
        }
        let have: Vec<String> = dish.dietary_info.iter().flat_map(|d| tokens(d)).collect();
        wanted.iter().all(|w| have.contains(w))
    }
}

fn tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Read access to dishes needed by ordering, statistics and recommendations.
#[async_trait]
pub trait DishCatalog: Send + Sync {
    /// NotFound for unknown or deleted dishes.
    async fn get_dish_by_id(&self, id: Uuid) -> ServiceResult<DishInfo>;
    /// Newest first, ties broken by id.
    async fn recommend(
        &self,
        filter: &RecommendationFilter,
        page: Pagination,
    ) -> ServiceResult<Vec<DishShortInfo>>;
    async fn count_recommendations(&self, filter: &RecommendationFilter) -> ServiceResult<i64>;
}

#[derive(Clone)]
pub struct PgDishCatalog {
    db: PgPool,
}

impl PgDishCatalog {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DishCatalog for PgDishCatalog {
    async fn get_dish_by_id(&self, id: Uuid) -> ServiceResult<DishInfo> {
        sqlx::query_as::<_, DishInfo>(
            r#"
            SELECT id, kitchen_id, name, description, price, category, ingredients,
                   allergens, nutrition_info, dietary_info, available, created_at, updated_at
              FROM dishes
             WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| ServiceError::not_found("dish", id))
    }

    async fn recommend(
        &self,
        filter: &RecommendationFilter,
        page: Pagination,
    ) -> ServiceResult<Vec<DishShortInfo>> {
        let rows = sqlx::query_as::<_, DishShortInfo>(RECOMMEND_SQL)
            .bind(&filter.kitchen_ids)
            .bind(&filter.search)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }

    async fn count_recommendations(&self, filter: &RecommendationFilter) -> ServiceResult<i64> {
        let total: i64 = sqlx::query_scalar(RECOMMEND_COUNT_SQL)
            .bind(&filter.kitchen_ids)
            .bind(&filter.search)
            .fetch_one(&self.db)
            .await?;
        Ok(total)
    }
}
