//! Subscription scheduler
//!
//! Fires once per day at the configured run time and materializes every due
//! active subscription into an order. Each subscription is processed inside
//! its own failure boundary: one bad row never aborts the batch, and a
//! skipped delivery always advances `next_delivery_date` so the row cannot
//! wedge the queue.

use chrono::NaiveTime;
use tokio_util::sync::CancellationToken;

use crate::db::models::{
    Notification, NotificationKind, PaymentMethod, Subscription, SubscriptionPayment,
    SubscriptionStatus,
};
use crate::db::repository::{
    NotificationRepository, ProductRepository, SubscriptionRepository, UserRepository,
};
use crate::orders::{OrderLineRequest, OrderRequest, OrderService};
use crate::services::EmailService;
use crate::utils::time;
use crate::utils::{AppError, AppResult};

/// Registered as `TaskKind::Periodic` during server startup
pub struct SubscriptionScheduler {
    subscriptions: SubscriptionRepository,
    products: ProductRepository,
    users: UserRepository,
    orders: OrderService,
    notifications: NotificationRepository,
    email: EmailService,
    run_time: NaiveTime,
    shutdown: CancellationToken,
}

/// Outcome of one processed subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Delivered,
    SkippedInsufficientStock,
}

impl SubscriptionScheduler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        subscriptions: SubscriptionRepository,
        products: ProductRepository,
        users: UserRepository,
        orders: OrderService,
        notifications: NotificationRepository,
        email: EmailService,
        run_time: NaiveTime,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            subscriptions,
            products,
            users,
            orders,
            notifications,
            email,
            run_time,
            shutdown,
        }
    }

    /// Main loop: sleep until the daily run time, then tick
    pub async fn run(self) {
        tracing::info!(run_time = %self.run_time, "Subscription scheduler started");

        loop {
            let sleep_duration = time::duration_until_next_run(self.run_time);
            tracing::info!(
                "Next subscription run in {} minutes",
                sleep_duration.as_secs() / 60
            );

            tokio::select! {
                _ = tokio::time::sleep(sleep_duration) => {}
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Subscription scheduler received shutdown signal");
                    return;
                }
            }

            self.tick().await;
        }
    }

    /// Process every due subscription once
    ///
    /// Split out from [`run`](Self::run) so a cycle can be driven directly.
    pub async fn tick(&self) -> usize {
        let today = time::today().format("%Y-%m-%d").to_string();
        let due = match self.subscriptions.due(&today).await {
            Ok(due) => due,
            Err(e) => {
                tracing::error!(error = %e, "Failed to query due subscriptions");
                return 0;
            }
        };

        tracing::info!(date = %today, due = due.len(), "Subscription tick");
        let mut delivered = 0;
        for subscription in due {
            let id = subscription.id_string();
            match self.process_one(subscription, &today).await {
                Ok(TickOutcome::Delivered) => delivered += 1,
                Ok(TickOutcome::SkippedInsufficientStock) => {
                    tracing::info!(subscription = %id, "Delivery skipped: insufficient stock");
                }
                Err(e) => {
                    tracing::error!(subscription = %id, error = %e, "Subscription processing failed");
                }
            }
        }
        delivered
    }

    async fn process_one(
        &self,
        mut subscription: Subscription,
        today: &str,
    ) -> AppResult<TickOutcome> {
        let product = self
            .products
            .find_by_id(&subscription.product)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Product {} not found", subscription.product))
            })?;

        // Out of stock: skip the day, advance exactly one day, tell the
        // subscriber. Status and delivery_count stay untouched.
        if product.stock < subscription.quantity {
            subscription.advance_next_delivery();
            self.subscriptions.update(&subscription).await?;
            self.notify(
                &subscription.subscriber,
                NotificationKind::System,
                "Delivery skipped",
                format!(
                    "Today's delivery of {} was skipped because the farmer is out of stock",
                    product.name
                ),
                &subscription.id_string(),
            )
            .await;
            return Ok(TickOutcome::SkippedInsufficientStock);
        }

        let unit_price = subscription.price_per_delivery / subscription.quantity as f64;
        let request = OrderRequest {
            items: vec![OrderLineRequest {
                product_id: subscription.product.clone(),
                quantity: subscription.quantity,
                price_override: Some(unit_price),
            }],
            shipping_address: subscription.shipping_address.clone(),
            payment_method: match subscription.payment_method {
                SubscriptionPayment::Cod => PaymentMethod::Cod,
                SubscriptionPayment::Prepaid => PaymentMethod::Online,
            },
            gateway_order_id: None,
            gateway_payment_id: None,
        };
        let order = self
            .orders
            .create_for_subscription(
                &subscription.subscriber,
                request,
                &subscription.id_string(),
            )
            .await?;

        subscription.delivery_count += 1;
        subscription.last_delivery_date = Some(today.to_string());
        subscription.advance_next_delivery();
        if subscription.past_end_date() {
            subscription.status = SubscriptionStatus::Completed;
        }
        self.subscriptions.update(&subscription).await?;

        // Receipt email is best effort; a missing user only costs the mail
        match self.users.find_by_id(&subscription.subscriber).await {
            Ok(Some(user)) => self
                .email
                .send_subscription_receipt(&user.email, &product.name, &order),
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Subscriber lookup for receipt failed"),
        }

        tracing::info!(
            subscription = %subscription.id_string(),
            order = %order.id_string(),
            "Subscription delivery materialized"
        );
        Ok(TickOutcome::Delivered)
    }

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
    use crate::db::models::{DeliveryTime, Product, ProductCreate, ProductKind, ShippingAddress};
    use crate::db::repository::OrderRepository;
    use crate::inventory::StockLedger;
    use chrono::Utc;

    struct Fixture {
        scheduler: SubscriptionScheduler,
        subscriptions: SubscriptionRepository,
        products: ProductRepository,
        orders: OrderRepository,
        notifications: NotificationRepository,
    }

    async fn setup() -> Fixture {
        let db = connect_memory().await.unwrap();
        let products = ProductRepository::new(db.clone());
        let entries = crate::db::repository::StockEntryRepository::new(db.clone());
        let orders_repo = OrderRepository::new(db.clone());
        let notifications = NotificationRepository::new(db.clone());
        let order_service = OrderService::new(
            orders_repo.clone(),
            products.clone(),
            notifications.clone(),
            StockLedger::new(products.clone(), entries),
        );
        let subscriptions = SubscriptionRepository::new(db.clone());
        let scheduler = SubscriptionScheduler::new(
            subscriptions.clone(),
            products.clone(),
            UserRepository::new(db),
            order_service,
            notifications.clone(),
            EmailService::new(None, None, "orders@market.local".into()),
            NaiveTime::from_hms_opt(2, 0, 0).unwrap(),
            CancellationToken::new(),
        );
        Fixture {
            scheduler,
            subscriptions,
            products,
            orders: orders_repo,
            notifications,
        }
    }

    async fn seed_product(products: &ProductRepository, stock: i64) -> Product {
        let product = products
            .create(
                ProductCreate {
                    name: "Milk".into(),
                    description: String::new(),
                    kind: ProductKind::RawMilk,
                    price: 60.0,
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

    async fn seed_subscription(
        repo: &SubscriptionRepository,
        product: &str,
        quantity: i64,
        next: &str,
        end: Option<&str>,
    ) -> Subscription {
        repo.create(Subscription {
            id: None,
            subscriber: "user:c".into(),
            product: product.into(),
            seller: "user:farmer1".into(),
            quantity,
            delivery_time: DeliveryTime::Morning,
            start_date: next.into(),
            end_date: end.map(|e| e.to_string()),
            status: SubscriptionStatus::Active,
            shipping_address: ShippingAddress {
                street: "1 Farm Rd".into(),
                city: "Pune".into(),
                state: "MH".into(),
                pincode: "411001".into(),
                phone: None,
            },
            price_per_delivery: 120.0,
            payment_method: SubscriptionPayment::Cod,
            next_delivery_date: next.into(),
            last_delivery_date: None,
            delivery_count: 0,
            created_at: Utc::now(),
        })
        .await
        .unwrap()
    }

    fn today() -> String {
        Utc::now().date_naive().format("%Y-%m-%d").to_string()
    }

    fn tomorrow() -> String {
        (Utc::now().date_naive() + chrono::Duration::days(1))
            .format("%Y-%m-%d")
            .to_string()
    }

    #[tokio::test]
    async fn sufficient_stock_materializes_one_order() {
        let f = setup().await;
        let product = seed_product(&f.products, 10).await;
        let sub =
            seed_subscription(&f.subscriptions, &product.id_string(), 2, &today(), None).await;

        let delivered = f.scheduler.tick().await;
        assert_eq!(delivered, 1);

        let orders = f.orders.list_by_buyer("user:c", 10).await.unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].items[0].quantity, 2);
        // Unit price derived from price_per_delivery
        assert_eq!(orders[0].items[0].price, 60.0);
        assert_eq!(
            orders[0].subscription.as_deref(),
            Some(sub.id_string().as_str())
        );

        let reloaded = f
            .subscriptions
            .find_by_id(&sub.id_string())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.delivery_count, 1);
        assert_eq!(reloaded.next_delivery_date, tomorrow());
        assert_eq!(reloaded.last_delivery_date.as_deref(), Some(today().as_str()));
        assert_eq!(reloaded.status, SubscriptionStatus::Active);

        let stock = f
            .products
            .find_by_id(&product.id_string())
            .await
            .unwrap()
            .unwrap()
            .stock;
        assert_eq!(stock, 8);
    }

    #[tokio::test]
    async fn insufficient_stock_skips_and_advances() {
        let f = setup().await;
        let product = seed_product(&f.products, 1).await;
        let sub =
            seed_subscription(&f.subscriptions, &product.id_string(), 5, &today(), None).await;

        let delivered = f.scheduler.tick().await;
        assert_eq!(delivered, 0);

        assert!(f.orders.list_by_buyer("user:c", 10).await.unwrap().is_empty());

        let reloaded = f
            .subscriptions
            .find_by_id(&sub.id_string())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.delivery_count, 0);
        assert_eq!(reloaded.next_delivery_date, tomorrow());
        assert_eq!(reloaded.status, SubscriptionStatus::Active);

        let notifications = f
            .notifications
            .list_by_user("user:c", true, 10)
            .await
            .unwrap();
        assert!(
            notifications
                .iter()
                .any(|n| n.title == "Delivery skipped")
        );
    }

    #[tokio::test]
    async fn end_date_completes_subscription() {
        let f = setup().await;
        let product = seed_product(&f.products, 10).await;
        let sub = seed_subscription(
            &f.subscriptions,
            &product.id_string(),
            1,
            &today(),
            Some(&today()),
        )
        .await;

        f.scheduler.tick().await;

        let reloaded = f
            .subscriptions
            .find_by_id(&sub.id_string())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.status, SubscriptionStatus::Completed);
    }

    #[tokio::test]
    async fn future_subscriptions_untouched() {
        let f = setup().await;
        let product = seed_product(&f.products, 10).await;
        seed_subscription(&f.subscriptions, &product.id_string(), 1, &tomorrow(), None).await;

        let delivered = f.scheduler.tick().await;
        assert_eq!(delivered, 0);
        assert!(f.orders.list_by_buyer("user:c", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn one_bad_row_never_aborts_the_batch() {
        let f = setup().await;
        let product = seed_product(&f.products, 10).await;
        // Dangling product reference
        seed_subscription(&f.subscriptions, "product:missing", 1, &today(), None).await;
        seed_subscription(&f.subscriptions, &product.id_string(), 1, &today(), None).await;

        let delivered = f.scheduler.tick().await;
        assert_eq!(delivered, 1);
    }
}
