//! Orders Module
//!
//! [`OrderService`] drives the order lifecycle: creation with frozen line
//! snapshots and an atomic ledger decrement, delivery-status transitions
//! with an append-only history, and cancellation that restores stock.

pub mod pricing;

use chrono::Utc;
use serde::Deserialize;

use crate::db::models::{
    DeliveryStatus, Notification, NotificationKind, Order, OrderItem, PaymentInfo, PaymentMethod,
    PaymentStatus, RelatedModel, ShippingAddress, StockChangeKind,
};
use crate::db::repository::{NotificationRepository, OrderRepository, ProductRepository};
use crate::inventory::{StockChange, StockLedger};
use crate::utils::{AppError, AppResult};

/// One requested order line
#[derive(Debug, Clone, Deserialize)]
pub struct OrderLineRequest {
    pub product_id: String,
    pub quantity: i64,
    /// Charge this unit price instead of the catalog price; used by the
    /// subscription scheduler, never exposed to API clients
    #[serde(skip)]
    pub price_override: Option<f64>,
}

/// Order creation request
#[derive(Debug, Clone, Deserialize)]
pub struct OrderRequest {
    pub items: Vec<OrderLineRequest>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    /// Gateway references for online payments
    #[serde(default)]
    pub gateway_order_id: Option<String>,
    #[serde(default)]
    pub gateway_payment_id: Option<String>,
}

#[derive(Clone)]
pub struct OrderService {
    orders: OrderRepository,
    products: ProductRepository,
    notifications: NotificationRepository,
    ledger: StockLedger,
}

impl OrderService {
    pub fn new(
        orders: OrderRepository,
        products: ProductRepository,
        notifications: NotificationRepository,
        ledger: StockLedger,
    ) -> Self {
        Self {
            orders,
            products,
            notifications,
            ledger,
        }
    }

    pub fn repository(&self) -> &OrderRepository {
        &self.orders
    }

    /// Place an order
    ///
    /// Snapshots name/price/unit/seller per line, computes the price
    /// breakdown and decrements all lines atomically. A failed decrement
    /// rolls the order record back, so no half-placed order survives.
    pub async fn create(&self, buyer: &str, request: OrderRequest) -> AppResult<Order> {
        self.create_internal(buyer, request, None).await
    }

    /// Scheduler entry point: like [`create`](Self::create) but attributed
    /// to the subscription that materialized it
    pub async fn create_for_subscription(
        &self,
        buyer: &str,
        request: OrderRequest,
        subscription_id: &str,
    ) -> AppResult<Order> {
        self.create_internal(buyer, request, Some(subscription_id.to_string()))
            .await
    }

    async fn create_internal(
        &self,
        buyer: &str,
        request: OrderRequest,
        subscription: Option<String>,
    ) -> AppResult<Order> {
        if request.items.is_empty() {
            return Err(AppError::validation("Order must contain at least one item"));
        }

        let mut items = Vec::with_capacity(request.items.len());
        for line in &request.items {
            if line.quantity < 1 {
                return Err(AppError::validation("Quantity must be at least 1"));
            }
            let product = self
                .products
                .find_by_id(&line.product_id)
                .await?
                .ok_or_else(|| {
                    AppError::not_found(format!("Product {} not found", line.product_id))
                })?;
            if !product.is_purchasable(line.quantity) {
                return Err(AppError::insufficient_stock(format!(
                    "{} is not available in the requested quantity ({} in stock)",
                    product.name, product.stock
                )));
            }
            items.push(OrderItem {
                product: product.id_string(),
                name: product.name,
                price: line.price_override.unwrap_or(product.price),
                unit: product.unit,
                seller: product.seller,
                quantity: line.quantity,
            });
        }

        let prices = pricing::breakdown(&items);
        let payment_status = if request.gateway_payment_id.is_some() {
            PaymentStatus::Completed
        } else {
            PaymentStatus::Pending
        };

        let mut order = Order {
            id: None,
            buyer: buyer.to_string(),
            items,
            shipping_address: request.shipping_address,
            payment_method: request.payment_method,
            payment: PaymentInfo {
                gateway_order_id: request.gateway_order_id,
                gateway_payment_id: request.gateway_payment_id.clone(),
                signature: None,
                paid_at: request.gateway_payment_id.map(|_| Utc::now()),
            },
            payment_status,
            items_price: prices.items_price,
            tax_price: prices.tax_price,
            shipping_price: prices.shipping_price,
            total_amount: prices.total_amount,
            delivery_status: DeliveryStatus::Pending,
            status_history: Vec::new(),
            tracking: None,
            subscription: subscription.clone(),
            delivered_at: None,
            cancelled_at: None,
            cancellation_reason: None,
            created_at: Utc::now(),
        };
        order.push_status(DeliveryStatus::Pending, Some("Order created".to_string()));

        let order = self.orders.create(order).await?;
        let order_id = order.id_string();

        // Sale entries attributed to the subscription when materialized by
        // the scheduler, to the order otherwise
        let (related_to, related_model) = match &subscription {
            Some(sub) => (sub.clone(), RelatedModel::Subscription),
            None => (order_id.clone(), RelatedModel::Order),
        };
        let changes: Vec<StockChange> = order
            .items
            .iter()
            .map(|item| {
                StockChange::new(item.product.clone(), StockChangeKind::Sale, item.quantity)
                    .attributed_to(related_to.clone(), related_model)
                    .performed_by(buyer)
            })
            .collect();

        if let Err(e) = self.ledger.apply_all(changes).await {
            // Roll the order record back so no half-placed order survives
            if let Err(del) = self.orders.delete(&order_id).await {
                tracing::error!(order = %order_id, error = %del, "Order rollback failed");
            }
            return Err(e);
        }

        self.notify(
            buyer,
            NotificationKind::Order,
            "Order placed",
            format!("Order for ₹{:.2} has been placed", order.total_amount),
            &order_id,
        )
        .await;

        tracing::info!(order = %order_id, buyer = %buyer, total = order.total_amount, "Order created");
        Ok(order)
    }

    /// Move an order along the delivery lifecycle
    ///
    /// Appends a status-history entry; `delivered` stamps `delivered_at`.
    /// Cancellation goes through [`cancel`](Self::cancel), never here.
    pub async fn set_delivery_status(
        &self,
        order_id: &str,
        status: DeliveryStatus,
        note: Option<String>,
    ) -> AppResult<Order> {
        if status == DeliveryStatus::Cancelled {
            return Err(AppError::validation(
                "Cancellation must go through the cancel operation",
            ));
        }

        let mut order = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Order {order_id} not found")))?;

        if order.delivery_status.is_terminal() {
            return Err(AppError::state_conflict(format!(
                "Order is already {}",
                order.delivery_status.as_str()
            )));
        }

        let note = note.or_else(|| Some(format!("Status changed to {}", status.as_str())));
        order.push_status(status, note);
        if status == DeliveryStatus::Delivered {
            order.delivered_at = Some(Utc::now());
            // Cash on delivery settles at the door
            if order.payment_method == PaymentMethod::Cod {
                order.payment_status = PaymentStatus::Completed;
            }
        }

        let order = self.orders.update(&order).await?;
        self.notify(
            &order.buyer,
            NotificationKind::Order,
            "Order update",
            format!("Your order is now {}", status.as_str()),
            order_id,
        )
        .await;
        Ok(order)
    }

    /// Cancel an order and restore its stock
    ///
    /// Terminal orders are rejected with a state conflict, so a repeated
    /// cancel never produces a second round of ledger entries.
    pub async fn cancel(&self, order_id: &str, reason: Option<String>) -> AppResult<Order> {
        let mut order = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Order {order_id} not found")))?;

        if order.delivery_status.is_terminal() {
            return Err(AppError::state_conflict(format!(
                "Order is already {}",
                order.delivery_status.as_str()
            )));
        }

        let changes: Vec<StockChange> = order
            .items
            .iter()
            .map(|item| {
                StockChange::new(item.product.clone(), StockChangeKind::Return, item.quantity)
                    .attributed_to(order.id_string(), RelatedModel::Order)
                    .with_reason("Order cancelled")
            })
            .collect();
        self.ledger.apply_all(changes).await?;

        order.push_status(DeliveryStatus::Cancelled, reason.clone());
        order.cancelled_at = Some(Utc::now());
        order.cancellation_reason = reason;
        if order.payment_status == PaymentStatus::Completed {
            order.payment_status = PaymentStatus::Refunded;
        }

        let order = self.orders.update(&order).await?;
        self.notify(
            &order.buyer,
            NotificationKind::Order,
            "Order cancelled",
            "Your order has been cancelled and stock restored",
            order_id,
        )
        .await;

        tracing::info!(order = %order_id, "Order cancelled");
        Ok(order)
    }

    /// Best-effort notification; failures are logged, never propagated
    async fn notify(
        &self,
        user: &str,
        kind: NotificationKind,
        title: &str,
        message: impl Into<String>,
        related_to: &str,
    ) {
        let notification = Notification::new(
            user.to_string(),
            kind,
            title,
            message,
            Some(related_to.to_string()),
        );
        if let Err(e) = self.notifications.create(notification).await {
            tracing::warn!(user = %user, error = %e, "Failed to create notification");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_memory;
    use crate::db::models::{Product, ProductCreate, ProductKind};
    use crate::db::repository::{HistoryFilter, StockEntryRepository};

    struct Fixture {
        service: OrderService,
        products: ProductRepository,
        entries: StockEntryRepository,
    }

    async fn setup() -> Fixture {
        let db = connect_memory().await.unwrap();
        let products = ProductRepository::new(db.clone());
        let entries = StockEntryRepository::new(db.clone());
        let ledger = StockLedger::new(products.clone(), entries.clone());
        let service = OrderService::new(
            OrderRepository::new(db.clone()),
            products.clone(),
            NotificationRepository::new(db),
            ledger,
        );
        Fixture {
            service,
            products,
            entries,
        }
    }

    async fn seed(products: &ProductRepository, name: &str, price: f64, stock: i64) -> Product {
        let product = products
            .create(
                ProductCreate {
                    name: name.into(),
                    description: String::new(),
                    kind: ProductKind::RawMilk,
                    price,
                    unit: "liter".into(),
                    fat_percentage: None,
                    initial_stock: 0,
                    images: Vec::new(),
                    location: Default::default(),
                }
                .into_product("user:farmer1".into()),
            )
            .await
            .unwrap();
        products.set_stock(&product.id_string(), stock).await.unwrap()
    }

    fn request(lines: Vec<(String, i64)>) -> OrderRequest {
        OrderRequest {
            items: lines
                .into_iter()
                .map(|(product_id, quantity)| OrderLineRequest {
                    product_id,
                    quantity,
                    price_override: None,
                })
                .collect(),
            shipping_address: ShippingAddress {
                street: "1 Farm Rd".into(),
                city: "Pune".into(),
                state: "MH".into(),
                pincode: "411001".into(),
                phone: None,
            },
            payment_method: PaymentMethod::Cod,
            gateway_order_id: None,
            gateway_payment_id: None,
        }
    }

    #[tokio::test]
    async fn create_decrements_stock_and_prices_order() {
        let f = setup().await;
        let milk = seed(&f.products, "Milk", 60.0, 5).await;

        let order = f
            .service
            .create("user:buyer", request(vec![(milk.id_string(), 3)]))
            .await
            .unwrap();
        assert_eq!(order.items_price, 180.0);
        assert_eq!(order.tax_price, 9.0);
        assert_eq!(order.shipping_price, 40.0);
        assert_eq!(order.total_amount, 229.0);
        assert_eq!(order.delivery_status, DeliveryStatus::Pending);

        let reloaded = f
            .products
            .find_by_id(&milk.id_string())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.stock, 2);

        let history = f
            .entries
            .history(&milk.id_string(), &HistoryFilter::default())
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].previous_stock, 5);
        assert_eq!(history[0].new_stock, 2);
        assert_eq!(history[0].kind, StockChangeKind::Sale);
    }

    #[tokio::test]
    async fn oversell_rejected_and_stock_kept() {
        let f = setup().await;
        let milk = seed(&f.products, "Milk", 60.0, 5).await;

        f.service
            .create("user:buyer", request(vec![(milk.id_string(), 3)]))
            .await
            .unwrap();

        let err = f
            .service
            .create("user:buyer", request(vec![(milk.id_string(), 3)]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InsufficientStock(_)));

        let reloaded = f
            .products
            .find_by_id(&milk.id_string())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.stock, 2);
    }

    #[tokio::test]
    async fn multi_line_failure_mutates_nothing() {
        let f = setup().await;
        let milk = seed(&f.products, "Milk", 60.0, 10).await;
        let ghee = seed(&f.products, "Ghee", 900.0, 1).await;

        let err = f
            .service
            .create(
                "user:buyer",
                request(vec![(milk.id_string(), 2), (ghee.id_string(), 5)]),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InsufficientStock(_)));

        assert_eq!(
            f.products
                .find_by_id(&milk.id_string())
                .await
                .unwrap()
                .unwrap()
                .stock,
            10
        );
        // Rolled back: no order left behind
        assert!(
            f.service
                .repository()
                .list_by_buyer("user:buyer", 10)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn cancel_restores_stock_exactly() {
        let f = setup().await;
        let milk = seed(&f.products, "Milk", 60.0, 5).await;

        let order = f
            .service
            .create("user:buyer", request(vec![(milk.id_string(), 3)]))
            .await
            .unwrap();
        let cancelled = f
            .service
            .cancel(&order.id_string(), Some("changed my mind".into()))
            .await
            .unwrap();
        assert_eq!(cancelled.delivery_status, DeliveryStatus::Cancelled);
        assert!(cancelled.cancelled_at.is_some());

        let reloaded = f
            .products
            .find_by_id(&milk.id_string())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.stock, 5);

        let history = f
            .entries
            .history(&milk.id_string(), &HistoryFilter::default())
            .await
            .unwrap();
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn second_cancel_fails_without_ledger_rows() {
        let f = setup().await;
        let milk = seed(&f.products, "Milk", 60.0, 5).await;

        let order = f
            .service
            .create("user:buyer", request(vec![(milk.id_string(), 3)]))
            .await
            .unwrap();
        f.service.cancel(&order.id_string(), None).await.unwrap();

        let err = f.service.cancel(&order.id_string(), None).await.unwrap_err();
        assert!(matches!(err, AppError::StateConflict(_)));

        let history = f
            .entries
            .history(&milk.id_string(), &HistoryFilter::default())
            .await
            .unwrap();
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn delivered_is_terminal() {
        let f = setup().await;
        let milk = seed(&f.products, "Milk", 60.0, 5).await;

        let order = f
            .service
            .create("user:buyer", request(vec![(milk.id_string(), 1)]))
            .await
            .unwrap();
        let delivered = f
            .service
            .set_delivery_status(&order.id_string(), DeliveryStatus::Delivered, None)
            .await
            .unwrap();
        assert!(delivered.delivered_at.is_some());
        assert_eq!(delivered.payment_status, PaymentStatus::Completed);

        let err = f
            .service
            .cancel(&order.id_string(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::StateConflict(_)));

        let err = f
            .service
            .set_delivery_status(&order.id_string(), DeliveryStatus::InTransit, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::StateConflict(_)));
    }

    #[tokio::test]
    async fn status_history_grows_append_only() {
        let f = setup().await;
        let milk = seed(&f.products, "Milk", 60.0, 5).await;

        let order = f
            .service
            .create("user:buyer", request(vec![(milk.id_string(), 1)]))
            .await
            .unwrap();
        for status in [
            DeliveryStatus::Confirmed,
            DeliveryStatus::Dispatched,
            DeliveryStatus::InTransit,
        ] {
            f.service
                .set_delivery_status(&order.id_string(), status, None)
                .await
                .unwrap();
        }
        let reloaded = f
            .service
            .repository()
            .find_by_id(&order.id_string())
            .await
            .unwrap()
            .unwrap();
        // Creation entry plus three transitions
        assert_eq!(reloaded.status_history.len(), 4);
        assert_eq!(reloaded.delivery_status, DeliveryStatus::InTransit);
    }
}
