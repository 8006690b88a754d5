use std::sync::RwLock;

use async_trait::async_trait;
use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

use super::repo::ReviewStore;
use super::repo_types::ReviewStats;
use crate::error::{ServiceError, ServiceResult};
use crate::lifecycle::{self, Lifecycle};

#[derive(Debug, Clone)]
struct StoredReview {
    id: Uuid,
    kitchen_id: Uuid,
    rating: i32,
    lifecycle: Lifecycle,
}

#[derive(Default)]
pub struct InMemoryReviewStore {
    reviews: RwLock<Vec<StoredReview>>,
}

impl InMemoryReviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, kitchen_id: Uuid, rating: i32) -> Uuid {
        let id = Uuid::new_v4();
        if let Ok(mut reviews) = self.reviews.write() {
            reviews.push(StoredReview {
                id,
                kitchen_id,
                rating,
                lifecycle: Lifecycle::Active,
            });
        }
        id
    }

    pub fn delete(&self, id: Uuid) {
        if let Ok(mut reviews) = self.reviews.write() {
            for r in reviews.iter_mut().filter(|r| r.id == id) {
                r.lifecycle.delete(lifecycle::now());
            }
        }
    }
}

#[async_trait]
impl ReviewStore for InMemoryReviewStore {
    async fn review_stats(&self, kitchen_id: Uuid) -> ServiceResult<ReviewStats> {
        let reviews = self
            .reviews
            .read()
            .map_err(|e| ServiceError::poisoned("review store", e))?;
        let ratings: Vec<Decimal> = reviews
            .iter()
            .filter(|r| r.kitchen_id == kitchen_id && r.lifecycle.is_active())
            .map(|r| Decimal::from(r.rating))
            .collect();

        let review_count = ratings.len() as i64;
        let average_rating = (review_count > 0).then(|| {
            let sum: Decimal = ratings.iter().sum();
            (sum / Decimal::from(review_count))
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        });
        Ok(ReviewStats {
            review_count,
            average_rating,
        })
    }
}
