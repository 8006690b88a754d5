pub mod dto;
pub mod handlers;
pub mod memory;
pub mod repo;
pub mod repo_types;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub use repo::{OrderStore, PgOrderStore};
pub use services::OrderOrchestrator;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
