use std::sync::Arc;

use tracing::{debug, error, instrument};
use uuid::Uuid;

use super::dto::Recommendations;
use super::repo::{DishCatalog, RecommendationFilter};
use crate::directory::{KitchenDirectory, UserDirectory};
use crate::error::ServiceResult;
use crate::filters::Pagination;

/// Blends a user's cuisine and dietary preferences into a dish listing.
#[derive(Clone)]
pub struct RecommendationEngine {
    dishes: Arc<dyn DishCatalog>,
    kitchens: Arc<dyn KitchenDirectory>,
    users: Arc<dyn UserDirectory>,
}

impl RecommendationEngine {
    pub fn new(
        dishes: Arc<dyn DishCatalog>,
        kitchens: Arc<dyn KitchenDirectory>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            dishes,
            kitchens,
            users,
        }
    }

    #[instrument(skip(self))]
    pub async fn recommend_dishes(
        &self,
        user_id: Uuid,
        page: Pagination,
    ) -> ServiceResult<Recommendations> {
        let filter = self.filter_for(user_id).await?;

        let dishes = if page.is_empty() {
            Vec::new()
        } else {
            self.dishes.recommend(&filter, page).await.map_err(|e| {
                error!(error = %e, %user_id, "failed to recommend dishes");
                e
            })?
        };
        let total = self.count(&filter).await?;

        debug!(%user_id, returned = dishes.len(), total, "dishes recommended");
        Ok(Recommendations {
            dishes,
            total,
            page: page.page(),
            limit: page.limit(),
        })
    }

    /// Size of the full recommendation set for the same user.
    #[instrument(skip(self))]
    pub async fn get_total_recommendation(&self, user_id: Uuid) -> ServiceResult<i64> {
        let filter = self.filter_for(user_id).await?;
        self.count(&filter).await
    }

    async fn count(&self, filter: &RecommendationFilter) -> ServiceResult<i64> {
        self.dishes.count_recommendations(filter).await.map_err(|e| {
            error!(error = %e, "failed to count recommended dishes");
            e
        })
    }

    async fn filter_for(&self, user_id: Uuid) -> ServiceResult<RecommendationFilter> {
        let pref = self.users.get_user_preference(user_id).await.map_err(|e| {
            error!(error = %e, %user_id, "failed to get user preferences");
            e
        })?;
        let kitchen_ids = self
            .kitchens
            .get_kitchen_ids_by_cuisine_type(&pref.cuisine_type)
            .await
            .map_err(|e| {
                error!(error = %e, cuisine = %pref.cuisine_type, "failed to get kitchen ids");
                e
            })?;
        Ok(RecommendationFilter::new(
            kitchen_ids,
            &pref.dietary_preferences,
        ))
    }
}
