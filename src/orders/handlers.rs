use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::{get, patch, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{CreateOrderRequest, OrderInfo, Orders, StatusRes, UpdateStatusRequest};
use crate::error::ServiceResult;
use crate::filters::Pagination;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/orders", post(create_order))
        .route("/orders/:id", get(get_order).delete(delete_order))
        .route("/orders/:id/status", patch(update_status))
        .route("/orders/:id/validate", get(validate_order))
        .route("/users/:id/orders", get(orders_for_user))
        .route("/kitchens/:id/orders", get(orders_for_chef))
}

/// POST /orders
#[instrument(skip(state, req))]
pub async fn create_order(
    State(state): State<AppState>,
    Json(req): Json<CreateOrderRequest>,
) -> ServiceResult<(StatusCode, HeaderMap, Json<OrderInfo>)> {
    let order = state.orders.create_order(req).await?;

    let mut headers = HeaderMap::new();
    if let Ok(location) = HeaderValue::from_str(&format!("/api/v1/orders/{}", order.id)) {
        headers.insert(header::LOCATION, location);
    }
    Ok((StatusCode::CREATED, headers, Json(order)))
}

#[instrument(skip(state))]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ServiceResult<Json<OrderInfo>> {
    Ok(Json(state.orders.get_order_by_id(id).await?))
}

/// PATCH /orders/:id/status { "status": "delivering" }
#[instrument(skip(state))]
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> ServiceResult<Json<StatusRes>> {
    Ok(Json(state.orders.update_order_status(id, &req.status).await?))
}

#[instrument(skip(state))]
pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ServiceResult<StatusCode> {
    state.orders.delete_order(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn validate_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ServiceResult<StatusCode> {
    state.orders.validate_order_id(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn orders_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(page): Query<Pagination>,
) -> ServiceResult<Json<Orders>> {
    Ok(Json(state.orders.get_orders_for_user(user_id, page).await?))
}

#[instrument(skip(state))]
pub async fn orders_for_chef(
    State(state): State<AppState>,
    Path(kitchen_id): Path<Uuid>,
    Query(page): Query<Pagination>,
) -> ServiceResult<Json<Orders>> {
    Ok(Json(state.orders.get_orders_for_chef(kitchen_id, page).await?))
}
