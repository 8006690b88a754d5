//! Dish catalog reads and the recommendation engine built on them.

pub mod dto;
pub mod handlers;
pub mod memory;
pub mod repo;
pub mod repo_types;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub use repo::{DishCatalog, PgDishCatalog};
pub use services::RecommendationEngine;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
