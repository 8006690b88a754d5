use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{RecommendationTotal, Recommendations};
use crate::error::ServiceResult;
use crate::filters::Pagination;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users/:id/recommendations", get(recommend_dishes))
        .route("/users/:id/recommendations/total", get(total_recommendation))
}

#[instrument(skip(state))]
pub async fn recommend_dishes(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(page): Query<Pagination>,
) -> ServiceResult<Json<Recommendations>> {
    let res = state.recommendations.recommend_dishes(user_id, page).await?;
    Ok(Json(res))
}

#[instrument(skip(state))]
pub async fn total_recommendation(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ServiceResult<Json<RecommendationTotal>> {
    let total = state.recommendations.get_total_recommendation(user_id).await?;
    Ok(Json(RecommendationTotal { total }))
}
