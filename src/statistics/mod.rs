pub mod dto;
pub mod handlers;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub use services::StatisticsEngine;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
