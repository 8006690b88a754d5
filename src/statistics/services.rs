use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, error, instrument};
use uuid::Uuid;

use super::dto::{DishStats, KitchenStatistics, KitchenStats, UserStatistics};
use crate::directory::{resolve_name, KitchenDirectory, UserDirectory};
use crate::dishes::DishCatalog;
use crate::error::{ServiceError, ServiceResult};
use crate::filters::DateRange;
use crate::orders::OrderStore;
use crate::reviews::ReviewStore;

/// Kitchen-side and user-side aggregates over orders in a date range.
#[derive(Clone)]
pub struct StatisticsEngine {
    orders: Arc<dyn OrderStore>,
    dishes: Arc<dyn DishCatalog>,
    reviews: Arc<dyn ReviewStore>,
    kitchens: Arc<dyn KitchenDirectory>,
    users: Arc<dyn UserDirectory>,
}

fn logged(what: &'static str) -> impl Fn(ServiceError) -> ServiceError {
    move |e| {
        error!(error = %e, "{what}");
        e
    }
}

impl StatisticsEngine {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        dishes: Arc<dyn DishCatalog>,
        reviews: Arc<dyn ReviewStore>,
        kitchens: Arc<dyn KitchenDirectory>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            orders,
            dishes,
            reviews,
            kitchens,
            users,
        }
    }

    /// Rating covers every live review of the kitchen; revenue, order totals
    /// and the dish ranking cover only orders inside `range`. The totals and
    /// the per-dish revenue come from separate queries and are not reconciled.
    #[instrument(skip(self))]
    pub async fn get_kitchen_statistics(
        &self,
        kitchen_id: Uuid,
        range: DateRange,
    ) -> ServiceResult<KitchenStatistics> {
        let reviews = self
            .reviews
            .review_stats(kitchen_id)
            .await
            .map_err(logged("failed to aggregate reviews"))?;
        let revenue = self
            .orders
            .revenue_for_kitchen(kitchen_id, range)
            .await
            .map_err(logged("failed to aggregate revenue"))?;
        let counts = self
            .orders
            .dish_order_counts(kitchen_id, range)
            .await
            .map_err(logged("failed to count dish orders"))?;

        let mut top_dishes = Vec::with_capacity(counts.len());
        for row in counts {
            let dish = self
                .dishes
                .get_dish_by_id(row.dish_id)
                .await
                .map_err(logged("failed to load ranked dish"))?;
            top_dishes.push(DishStats {
                id: dish.id,
                name: dish.name,
                orders_count: row.orders_count,
                revenue: dish.price * Decimal::from(row.orders_count),
            });
        }

        debug!(%kitchen_id, dishes = top_dishes.len(), "kitchen statistics built");
        Ok(KitchenStatistics {
            kitchen_id,
            top_dishes,
            average_rating: reviews.average_rating.unwrap_or(Decimal::ZERO),
            review_count: reviews.review_count,
            total_revenue: revenue.revenue,
            total_orders: revenue.total_orders,
        })
    }

    /// Grand totals are the sums of the per-kitchen rows.
    #[instrument(skip(self))]
    pub async fn get_user_statistics(
        &self,
        user_id: Uuid,
        range: DateRange,
    ) -> ServiceResult<UserStatistics> {
        self.users
            .validate_user_id(user_id)
            .await
            .map_err(logged("failed to validate user"))?;
        let rows = self
            .orders
            .spend_by_kitchen(user_id, range)
            .await
            .map_err(logged("failed to aggregate spend"))?;

        let kitchen_ids: Vec<Uuid> = rows.iter().map(|r| r.kitchen_id).collect();
        let names = if kitchen_ids.is_empty() {
            Default::default()
        } else {
            self.kitchens
                .get_kitchen_names(&kitchen_ids)
                .await
                .map_err(logged("failed to look up kitchen names"))?
        };

        let favorite_kitchens = rows
            .into_iter()
            .map(|r| {
                Ok(KitchenStats {
                    name: resolve_name(&names, "kitchen", r.kitchen_id)?,
                    id: r.kitchen_id,
                    orders_count: r.orders_count,
                    total_spent: r.total_spent,
                })
            })
            .collect::<ServiceResult<Vec<_>>>()?;

        let total_spent = favorite_kitchens.iter().map(|k| k.total_spent).sum();
        let total_orders = favorite_kitchens.iter().map(|k| k.orders_count).sum();
        Ok(UserStatistics {
            user_id,
            favorite_kitchens,
            total_spent,
            total_orders,
        })
    }
}
