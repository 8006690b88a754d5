use std::sync::Arc;

use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::config::AppConfig;
use crate::directory::http::{HttpKitchenDirectory, HttpUserDirectory};
use crate::directory::memory::{InMemoryKitchenDirectory, InMemoryUserDirectory};
use crate::directory::{KitchenDirectory, UserDirectory};
use crate::dishes::memory::InMemoryDishCatalog;
use crate::dishes::{DishCatalog, PgDishCatalog, RecommendationEngine};
use crate::orders::memory::InMemoryOrderStore;
use crate::orders::{OrderOrchestrator, OrderStore, PgOrderStore};
use crate::reviews::memory::InMemoryReviewStore;
use crate::reviews::{PgReviewStore, ReviewStore};
use crate::statistics::StatisticsEngine;

#[derive(Clone)]
pub struct AppState {
    pub orders: OrderOrchestrator,
    pub statistics: StatisticsEngine,
    pub recommendations: RecommendationEngine,
}

/// Every store and directory the services are wired from.
#[derive(Clone)]
pub struct Collaborators {
    pub orders: Arc<dyn OrderStore>,
    pub dishes: Arc<dyn DishCatalog>,
    pub reviews: Arc<dyn ReviewStore>,
    pub kitchens: Arc<dyn KitchenDirectory>,
    pub users: Arc<dyn UserDirectory>,
}

/// In-memory collaborators, kept concrete so tests can seed and inspect them.
#[derive(Clone, Default)]
pub struct InMemoryCollaborators {
    pub orders: Arc<InMemoryOrderStore>,
    pub dishes: Arc<InMemoryDishCatalog>,
    pub reviews: Arc<InMemoryReviewStore>,
    pub kitchens: Arc<InMemoryKitchenDirectory>,
    pub users: Arc<InMemoryUserDirectory>,
}

impl InMemoryCollaborators {
    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            orders: self.orders.clone(),
            dishes: self.dishes.clone(),
            reviews: self.reviews.clone(),
            kitchens: self.kitchens.clone(),
            users: self.users.clone(),
        }
    }
}

impl AppState {
    pub async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
        let db = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect(&config.database_url)
            .await?;
        Ok(db)
    }

    /// Postgres stores plus HTTP clients for both directories.
    pub fn live(config: &AppConfig, db: PgPool) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.directory.timeout())
            .build()?;

        let parts = Collaborators {
            orders: Arc::new(PgOrderStore::new(db.clone())),
            dishes: Arc::new(PgDishCatalog::new(db.clone())),
            reviews: Arc::new(PgReviewStore::new(db)),
            kitchens: Arc::new(HttpKitchenDirectory::new(client.clone(), &config.directory)),
            users: Arc::new(HttpUserDirectory::new(client, &config.directory)),
        };
        Ok(Self::from_parts(parts))
    }

    pub fn from_parts(parts: Collaborators) -> Self {
        let orders = OrderOrchestrator::new(
            parts.orders.clone(),
            parts.dishes.clone(),
            parts.kitchens.clone(),
            parts.users.clone(),
        );
        let statistics = StatisticsEngine::new(
            parts.orders,
            parts.dishes.clone(),
            parts.reviews,
            parts.kitchens.clone(),
            parts.users.clone(),
        );
        let recommendations = RecommendationEngine::new(parts.dishes, parts.kitchens, parts.users);
        Self {
            orders,
            statistics,
            recommendations,
        }
    }

    pub fn fake(mem: &InMemoryCollaborators) -> Self {
        Self::from_parts(mem.collaborators())
    }
}
