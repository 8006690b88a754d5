use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::state::AppState;
use crate::{dishes, orders, statistics};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest(
            "/api/v1",
            Router::new()
                .merge(orders::router())
                .merge(statistics::router())
                .merge(dishes::router())
                .route("/health", get(|| async { "ok" })),
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router, config: &AppConfig) -> anyhow::Result<()> {
    let addr = config.bind_addr();
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::filters::Pagination;
    use crate::orders::dto::{CreateOrderRequest, Item, UpdateStatusRequest};
    use crate::orders::handlers;
    use crate::state::InMemoryCollaborators;
    use axum::{
        extract::{Path, Query, State},
        http::{header, StatusCode},
        response::IntoResponse,
        Json,
    };
    use rust_decimal::Decimal;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn seeded() -> (AppState, Uuid, Uuid, Uuid) {
        let mem = InMemoryCollaborators::default();
        let (kitchen_id, user_id) = (Uuid::new_v4(), Uuid::new_v4());
        mem.kitchens.insert(kitchen_id, "Plov House", "uzbek");
        mem.users.insert(user_id, "alice", Default::default());
        let dish = crate::dishes::repo_types::DishInfo {
            id: Uuid::new_v4(),
            kitchen_id,
            name: "Plov".into(),
            description: None,
            price: Decimal::new(1200, 2),
            category: "main".into(),
            ingredients: vec!["rice".into()],
            allergens: vec![],
            nutrition_info: None,
            dietary_info: vec!["halal".into()],
            available: true,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        };
        let dish_id = dish.id;
        mem.dishes.insert(dish);
        (AppState::fake(&mem), kitchen_id, user_id, dish_id)
    }

    #[test]
    fn routes_do_not_overlap() {
        let (state, ..) = seeded();
        let _ = build_app(state);
    }

    #[tokio::test]
    async fn order_lifecycle_over_handlers() {
        let (state, kitchen_id, user_id, dish_id) = seeded();
        let req = CreateOrderRequest {
            kitchen_id,
            user_id,
            items: vec![Item {
                dish_id,
                quantity: 2,
            }],
            delivery_address: "12 Navoi St".into(),
        };
        let (status, headers, Json(order)) =
            handlers::create_order(State(state.clone()), Json(req)).await.unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(
            headers.get(header::LOCATION).unwrap(),
            format!("/api/v1/orders/{}", order.id).as_str()
        );

        let Json(res) = handlers::update_status(
            State(state.clone()),
            Path(order.id),
            Json(UpdateStatusRequest {
                status: "delivering".into(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(res.status, "delivering");

        let Json(listed) = handlers::orders_for_chef(
            State(state.clone()),
            Path(kitchen_id),
            Query(Pagination::default()),
        )
        .await
        .unwrap();
        assert_eq!(listed.total, 1);
        assert_eq!(listed.orders[0].username, "alice");

        let status = handlers::delete_order(State(state.clone()), Path(order.id))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let err = handlers::get_order(State(state), Path(order.id)).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn bad_date_query_is_a_bad_request() {
        let (state, kitchen_id, ..) = seeded();
        let q = crate::statistics::dto::DateQuery {
            start_date: "2024-02-01".into(),
            end_date: "2024-01-01".into(),
        };
        let err = crate::statistics::handlers::kitchen_statistics(
            State(state),
            Path(kitchen_id),
            Query(q),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
