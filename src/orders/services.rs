use std::sync::Arc;

use rust_decimal::Decimal;
use time::Duration;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use super::dto::{CreateOrderRequest, OrderInfo, OrderShortInfo, Orders, StatusRes};
use super::repo::{OrderScope, OrderStore};
use crate::directory::{resolve_name, KitchenDirectory, UserDirectory};
use crate::dishes::DishCatalog;
use crate::error::{ServiceError, ServiceResult};
use crate::filters::Pagination;
use crate::lifecycle;

pub const INITIAL_STATUS: &str = "preparing";
pub const DELIVERY_WINDOW: Duration = Duration::minutes(15);

/// Owns the order workflow: validation against the directories, pricing
/// against the dish catalog, and the single write that persists the order.
#[derive(Clone)]
pub struct OrderOrchestrator {
    orders: Arc<dyn OrderStore>,
    dishes: Arc<dyn DishCatalog>,
    kitchens: Arc<dyn KitchenDirectory>,
    users: Arc<dyn UserDirectory>,
}

fn log_failure(e: &ServiceError, what: &str) {
    if e.is_expected() {
        info!(error = %e, "{what}");
    } else {
        error!(error = %e, "{what}");
    }
}

impl OrderOrchestrator {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        dishes: Arc<dyn DishCatalog>,
        kitchens: Arc<dyn KitchenDirectory>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            orders,
            dishes,
            kitchens,
            users,
        }
    }

    #[instrument(skip(self, req), fields(kitchen_id = %req.kitchen_id, user_id = %req.user_id))]
    pub async fn create_order(&self, req: CreateOrderRequest) -> ServiceResult<OrderInfo> {
        if req.items.is_empty() {
            return Err(ServiceError::Validation("order has no items".into()));
        }
        if req.delivery_address.trim().is_empty() {
            return Err(ServiceError::Validation("delivery address is empty".into()));
        }

        self.kitchens
            .validate_kitchen_id(req.kitchen_id)
            .await
            .map_err(|e| rejected(e, "kitchen", req.kitchen_id))?;
        self.users
            .validate_user_id(req.user_id)
            .await
            .map_err(|e| rejected(e, "user", req.user_id))?;

        // Unit price once per line; quantity does not scale the total.
        let mut total_amount = Decimal::ZERO;
        for item in &req.items {
            let dish = self.dishes.get_dish_by_id(item.dish_id).await.map_err(|e| {
                log_failure(&e, "failed to price order item");
                e
            })?;
            total_amount += dish.price;
        }

        let now = lifecycle::now();
        let order = OrderInfo {
            id: Uuid::new_v4(),
            user_id: req.user_id,
            kitchen_id: req.kitchen_id,
            items: req.items,
            total_amount,
            status: INITIAL_STATUS.to_string(),
            delivery_address: req.delivery_address,
            delivery_time: now + DELIVERY_WINDOW,
            created_at: now,
            updated_at: now,
        };
        self.orders.insert(&order).await.map_err(|e| {
            error!(error = %e, "failed to insert order");
            e
        })?;

        info!(order_id = %order.id, total = %order.total_amount, "order created");
        Ok(order)
    }

    #[instrument(skip(self))]
    pub async fn update_order_status(&self, id: Uuid, status: &str) -> ServiceResult<StatusRes> {
        let updated_at = lifecycle::now();
        let found = self
            .orders
            .update_status(id, status, updated_at)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %id, "failed to update order status");
                e
            })?;
        if !found {
            warn!(order_id = %id, "status update on unknown order");
            return Err(ServiceError::not_found("order", id));
        }
        Ok(StatusRes {
            id,
            status: status.to_string(),
            updated_at,
        })
    }

    #[instrument(skip(self))]
    pub async fn get_order_by_id(&self, id: Uuid) -> ServiceResult<OrderInfo> {
        self.orders
            .find(id)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %id, "failed to get order");
                e
            })?
            .ok_or_else(|| ServiceError::not_found("order", id))
    }

    #[instrument(skip(self))]
    pub async fn get_orders_for_user(
        &self,
        user_id: Uuid,
        page: Pagination,
    ) -> ServiceResult<Orders> {
        self.list(OrderScope::User(user_id), page).await
    }

    #[instrument(skip(self))]
    pub async fn get_orders_for_chef(
        &self,
        kitchen_id: Uuid,
        page: Pagination,
    ) -> ServiceResult<Orders> {
        self.list(OrderScope::Kitchen(kitchen_id), page).await
    }

    /// Marks the order deleted. Repeated calls succeed.
    #[instrument(skip(self))]
    pub async fn delete_order(&self, id: Uuid) -> ServiceResult<()> {
        self.orders
            .soft_delete(id, lifecycle::now())
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %id, "failed to delete order");
                e
            })?;
        debug!(order_id = %id, "order deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn validate_order_id(&self, id: Uuid) -> ServiceResult<()> {
        let exists = self.orders.exists(id).await.map_err(|e| {
            error!(error = %e, order_id = %id, "failed to check order");
            e
        })?;
        if exists {
            Ok(())
        } else {
            Err(ServiceError::not_found("order", id))
        }
    }

    async fn list(&self, scope: OrderScope, page: Pagination) -> ServiceResult<Orders> {
        let rows = if page.is_empty() {
            Vec::new()
        } else {
            self.orders.list(scope, page).await.map_err(|e| {
                error!(error = %e, ?scope, "failed to list orders");
                e
            })?
        };
        let total = self.orders.count(scope).await.map_err(|e| {
            error!(error = %e, ?scope, "failed to count orders");
            e
        })?;

        let mut user_ids: Vec<Uuid> = rows.iter().map(|r| r.user_id).collect();
        user_ids.sort_unstable();
        user_ids.dedup();
        let names = if user_ids.is_empty() {
            Default::default()
        } else {
            self.users.get_usernames(&user_ids).await.map_err(|e| {
                error!(error = %e, "failed to look up usernames");
                e
            })?
        };

        let orders = rows
            .into_iter()
            .map(|r| {
                Ok(OrderShortInfo {
                    username: resolve_name(&names, "user", r.user_id)?,
                    id: r.id,
                    user_id: r.user_id,
                    status: r.status,
                    total_amount: r.total_amount,
                    delivery_time: r.delivery_time,
                })
            })
            .collect::<ServiceResult<Vec<_>>>()?;

        Ok(Orders {
            orders,
            total,
            page: page.page(),
            limit: page.limit(),
        })
    }
}

/// A directory refusing a referenced id turns into a Validation error;
/// transport failures pass through unchanged.
fn rejected(e: ServiceError, entity: &str, id: Uuid) -> ServiceError {
    if e.is_not_found() {
        warn!(%id, "{entity} failed validation");
        ServiceError::Validation(format!("invalid {entity} id {id}"))
    } else {
        error!(error = %e, %id, "{entity} validation call failed");
        e
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::memory::{InMemoryKitchenDirectory, InMemoryUserDirectory};
    use crate::dishes::memory::InMemoryDishCatalog;
    use crate::dishes::repo_types::DishInfo;
    use crate::orders::dto::Item;
    use crate::orders::memory::InMemoryOrderStore;
    use time::OffsetDateTime;

    struct Fixture {
        svc: OrderOrchestrator,
        store: Arc<InMemoryOrderStore>,
        catalog: Arc<InMemoryDishCatalog>,
        users: Arc<InMemoryUserDirectory>,
        kitchen_id: Uuid,
        user_id: Uuid,
        d1: Uuid,
        d2: Uuid,
    }

    fn dish(kitchen_id: Uuid, price: Decimal) -> DishInfo {
        let at = OffsetDateTime::UNIX_EPOCH;
        DishInfo {
            id: Uuid::new_v4(),
            kitchen_id,
            name: "Manti".into(),
            description: None,
            price,
            category: "main".into(),
            ingredients: vec![],
            allergens: vec![],
            nutrition_info: None,
            dietary_info: vec![],
            available: true,
            created_at: at,
            updated_at: at,
        }
    }

    fn fixture() -> Fixture {
        let (kitchen_id, user_id) = (Uuid::new_v4(), Uuid::new_v4());
        let kitchens =
            Arc::new(InMemoryKitchenDirectory::new().with_kitchen(kitchen_id, "Plov House", "uzbek"));
        let users = Arc::new(InMemoryUserDirectory::new().with_user(user_id, "alice"));
        let catalog = Arc::new(InMemoryDishCatalog::new());
        let d1 = dish(kitchen_id, Decimal::new(125, 1));
        let d2 = dish(kitchen_id, Decimal::new(70, 1));
        let (d1_id, d2_id) = (d1.id, d2.id);
        catalog.insert(d1);
        catalog.insert(d2);
        let store = Arc::new(InMemoryOrderStore::new());
        let svc = OrderOrchestrator::new(store.clone(), catalog.clone(), kitchens, users.clone());
        Fixture {
            svc,
            store,
            catalog,
            users,
            kitchen_id,
            user_id,
            d1: d1_id,
            d2: d2_id,
        }
    }

    fn request(f: &Fixture, items: Vec<Item>) -> CreateOrderRequest {
        CreateOrderRequest {
            kitchen_id: f.kitchen_id,
            user_id: f.user_id,
            items,
            delivery_address: "12 Navoi St".into(),
        }
    }

    fn item(dish_id: Uuid, quantity: i32) -> Item {
        Item { dish_id, quantity }
    }

    #[tokio::test]
    async fn create_prices_each_line_once_ignoring_quantity() {
        let f = fixture();
        let order = f
            .svc
            .create_order(request(&f, vec![item(f.d1, 3), item(f.d2, 1)]))
            .await
            .unwrap();

        assert_eq!(order.total_amount, Decimal::new(195, 1));
        assert_eq!(order.status, "preparing");
        assert_eq!(order.delivery_time - order.created_at, Duration::minutes(15));
        assert_eq!(f.store.writes(), 1);
        assert_eq!(f.svc.get_order_by_id(order.id).await.unwrap(), order);
    }

    #[tokio::test]
    async fn invalid_kitchen_is_a_validation_error_and_writes_nothing() {
        let f = fixture();
        let mut req = request(&f, vec![item(f.d1, 1)]);
        req.kitchen_id = Uuid::new_v4();
        let err = f.svc.create_order(req).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(f.store.writes(), 0);
        assert_eq!(f.catalog.lookups(), 0);
    }

    #[tokio::test]
    async fn invalid_user_is_a_validation_error() {
        let f = fixture();
        let mut req = request(&f, vec![item(f.d1, 1)]);
        req.user_id = Uuid::new_v4();
        let err = f.svc.create_order(req).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(f.store.writes(), 0);
    }

    #[tokio::test]
    async fn directory_outage_passes_through_as_upstream() {
        let f = fixture();
        f.users.set_unavailable(true);
        let err = f
            .svc
            .create_order(request(&f, vec![item(f.d1, 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Upstream { .. }));
        assert_eq!(f.store.writes(), 0);
    }

    #[tokio::test]
    async fn failed_dish_lookup_aborts_before_the_write() {
        let f = fixture();
        let unknown = Uuid::new_v4();
        let err = f
            .svc
            .create_order(request(&f, vec![item(f.d1, 1), item(unknown, 1), item(f.d2, 1)]))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(f.store.writes(), 0);
        // fail-fast: the third line is never priced
        assert_eq!(f.catalog.lookups(), 2);
    }

    #[tokio::test]
    async fn empty_items_or_address_rejected_before_any_call() {
        let f = fixture();
        let err = f.svc.create_order(request(&f, vec![])).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let mut req = request(&f, vec![item(f.d1, 1)]);
        req.delivery_address = "   ".into();
        let err = f.svc.create_order(req).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(f.users.calls(), 0);
    }

    #[tokio::test]
    async fn total_is_a_snapshot() {
        let f = fixture();
        let order = f
            .svc
            .create_order(request(&f, vec![item(f.d1, 1)]))
            .await
            .unwrap();
        f.catalog.set_price(f.d1, Decimal::new(99, 0));
        let stored = f.svc.get_order_by_id(order.id).await.unwrap();
        assert_eq!(stored.total_amount, Decimal::new(125, 1));
    }

    #[tokio::test]
    async fn prices_dishes_regardless_of_kitchen_or_availability() {
        let f = fixture();
        let mut foreign = dish(Uuid::new_v4(), Decimal::new(300, 2));
        foreign.available = false;
        let foreign_id = foreign.id;
        f.catalog.insert(foreign);

        let order = f
            .svc
            .create_order(request(&f, vec![item(f.d2, 1), item(foreign_id, 1)]))
            .await
            .unwrap();
        assert_eq!(order.total_amount, Decimal::new(1000, 2));
        assert_eq!(order.kitchen_id, f.kitchen_id);
    }

    #[tokio::test]
    async fn update_status_accepts_any_label() {
        let f = fixture();
        let order = f
            .svc
            .create_order(request(&f, vec![item(f.d1, 1)]))
            .await
            .unwrap();
        let res = f.svc.update_order_status(order.id, "delivering").await.unwrap();
        assert_eq!(res.status, "delivering");
        let res = f.svc.update_order_status(order.id, "preparing").await.unwrap();
        assert_eq!(res.status, "preparing");

        let stored = f.svc.get_order_by_id(order.id).await.unwrap();
        assert_eq!(stored.status, "preparing");
        assert_eq!(stored.updated_at, res.updated_at);

        let err = f
            .svc
            .update_order_status(Uuid::new_v4(), "delivered")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn deleted_order_is_not_found_everywhere() {
        let f = fixture();
        let order = f
            .svc
            .create_order(request(&f, vec![item(f.d1, 1)]))
            .await
            .unwrap();
        f.svc.validate_order_id(order.id).await.unwrap();
        f.svc.validate_order_id(order.id).await.unwrap();

        f.svc.delete_order(order.id).await.unwrap();
        f.svc.delete_order(order.id).await.unwrap();

        assert!(f.svc.get_order_by_id(order.id).await.unwrap_err().is_not_found());
        assert!(f.svc.validate_order_id(order.id).await.unwrap_err().is_not_found());
        assert!(f.svc.validate_order_id(order.id).await.unwrap_err().is_not_found());
        let err = f.svc.update_order_status(order.id, "delivering").await.unwrap_err();
        assert!(err.is_not_found());
        let listed = f
            .svc
            .get_orders_for_user(f.user_id, Pagination::default())
            .await
            .unwrap();
        assert_eq!(listed.total, 0);
    }

    #[tokio::test]
    async fn listing_pages_are_windows_of_the_full_result() {
        let f = fixture();
        let mut created = Vec::new();
        for _ in 0..5 {
            created.push(
                f.svc
                    .create_order(request(&f, vec![item(f.d2, 1)]))
                    .await
                    .unwrap(),
            );
        }
        let all = f
            .svc
            .get_orders_for_user(f.user_id, Pagination::new(1, 100))
            .await
            .unwrap();
        assert_eq!(all.total, 5);
        assert_eq!(all.orders.len(), 5);
        assert!(all.orders.iter().all(|o| o.username == "alice"));

        for (page, limit) in [(1, 2), (2, 2), (3, 2), (2, 3), (4, 1)] {
            let res = f
                .svc
                .get_orders_for_user(f.user_id, Pagination::new(page, limit))
                .await
                .unwrap();
            let offset = ((page - 1) * limit) as usize;
            let expected: Vec<Uuid> = all
                .orders
                .iter()
                .skip(offset)
                .take(limit as usize)
                .map(|o| o.id)
                .collect();
            assert_eq!(res.orders.iter().map(|o| o.id).collect::<Vec<_>>(), expected);
            assert_eq!(res.total, 5);
        }

        let empty = f
            .svc
            .get_orders_for_user(f.user_id, Pagination::new(1, 0))
            .await
            .unwrap();
        assert!(empty.orders.is_empty());
        assert_eq!(empty.total, 5);
    }

    #[tokio::test]
    async fn counts_are_scoped_to_the_listing() {
        let f = fixture();
        let other_user = Uuid::new_v4();
        f.users.insert(other_user, "bob", Default::default());
        f.svc
            .create_order(request(&f, vec![item(f.d1, 1)]))
            .await
            .unwrap();
        let mut req = request(&f, vec![item(f.d1, 1)]);
        req.user_id = other_user;
        f.svc.create_order(req).await.unwrap();

        let mine = f
            .svc
            .get_orders_for_user(f.user_id, Pagination::default())
            .await
            .unwrap();
        assert_eq!(mine.total, 1);

        let chef = f
            .svc
            .get_orders_for_chef(f.kitchen_id, Pagination::default())
            .await
            .unwrap();
        assert_eq!(chef.total, 2);
        let mut names: Vec<&str> = chef.orders.iter().map(|o| o.username.as_str()).collect();
        names.sort_unstable();
        assert_eq!(names, vec!["alice", "bob"]);
    }

    #[tokio::test]
    async fn usernames_are_fetched_in_one_batch() {
        let f = fixture();
        for _ in 0..4 {
            f.svc
                .create_order(request(&f, vec![item(f.d1, 1)]))
                .await
                .unwrap();
        }
        let before = f.users.calls();
        f.svc
            .get_orders_for_chef(f.kitchen_id, Pagination::default())
            .await
            .unwrap();
        assert_eq!(f.users.calls() - before, 1);

        let before = f.users.calls();
        f.svc
            .get_orders_for_chef(Uuid::new_v4(), Pagination::default())
            .await
            .unwrap();
        assert_eq!(f.users.calls(), before);
    }
}
