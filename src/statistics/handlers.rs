use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{DateQuery, KitchenStatistics, UserStatistics};
use crate::error::ServiceResult;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/kitchens/:id/statistics", get(kitchen_statistics))
        .route("/users/:id/statistics", get(user_statistics))
}

#[instrument(skip(state))]
pub async fn kitchen_statistics(
    State(state): State<AppState>,
    Path(kitchen_id): Path<Uuid>,
    Query(q): Query<DateQuery>,
) -> ServiceResult<Json<KitchenStatistics>> {
    let range = q.range()?;
    let stats = state.statistics.get_kitchen_statistics(kitchen_id, range).await?;
    Ok(Json(stats))
}

#[instrument(skip(state))]
pub async fn user_statistics(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(q): Query<DateQuery>,
) -> ServiceResult<Json<UserStatistics>> {
    let range = q.range()?;
    let stats = state.statistics.get_user_statistics(user_id, range).await?;
    Ok(Json(stats))
}
