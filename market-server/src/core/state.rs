use std::sync::Arc;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::auth::JwtService;
use crate::core::Config;
use crate::db::repository::{
    CartRepository, CertificationRepository, CowRepository, NotificationRepository,
    OrderRepository, ProductRepository, StockEntryRepository, SubscriptionRepository,
    UserRepository,
};
use crate::inventory::{InventoryAnalytics, StockLedger};
use crate::orders::OrderService;
use crate::services::{ChatService, ChatSessions, EmailService, PaymentService};
use crate::utils::AppError;

/// Shared server state
///
/// Cloned into every handler; repositories and services hold `Surreal<Db>`
/// or `Arc` internals, so a clone is a handful of pointer copies.
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub db: Surreal<Db>,
    pub jwt_service: Arc<JwtService>,

    // === Repositories ===
    pub users: UserRepository,
    pub products: ProductRepository,
    pub stock_entries: StockEntryRepository,
    pub orders: OrderRepository,
    pub carts: CartRepository,
    pub subscriptions: SubscriptionRepository,
    pub notifications: NotificationRepository,
    pub certifications: CertificationRepository,
    pub cows: CowRepository,

    // === Domain services ===
    pub ledger: StockLedger,
    pub analytics: InventoryAnalytics,
    pub order_service: OrderService,
    pub payment: PaymentService,
    pub email: EmailService,
    pub chat: ChatService,
    pub chat_sessions: ChatSessions,
}

impl ServerState {
    /// Open the on-disk database and wire up every repository and service
    pub async fn initialize(config: &Config) -> Result<Self, AppError> {
        let db_dir = config.database_dir();
        std::fs::create_dir_all(&db_dir)
            .map_err(|e| AppError::internal(format!("Failed to create {}: {e}", db_dir.display())))?;
        let db = crate::db::connect(&db_dir).await?;
        Ok(Self::with_db(config.clone(), db))
    }

    /// Build the state on top of an already-open database
    ///
    /// Tests call this with [`crate::db::connect_memory`].
    pub fn with_db(config: Config, db: Surreal<Db>) -> Self {
        let users = UserRepository::new(db.clone());
        let products = ProductRepository::new(db.clone());
        let stock_entries = StockEntryRepository::new(db.clone());
        let orders = OrderRepository::new(db.clone());
        let carts = CartRepository::new(db.clone());
        let subscriptions = SubscriptionRepository::new(db.clone());
        let notifications = NotificationRepository::new(db.clone());
        let certifications = CertificationRepository::new(db.clone());
        let cows = CowRepository::new(db.clone());

        let ledger = StockLedger::new(products.clone(), stock_entries.clone());
        let analytics = InventoryAnalytics::new(products.clone(), stock_entries.clone());
        let order_service = OrderService::new(
            orders.clone(),
            products.clone(),
            notifications.clone(),
            ledger.clone(),
        );
        let payment = PaymentService::new(
            config.payment_key_id.clone(),
            &config.payment_key_secret,
        );
        let email = EmailService::new(
            config.email_api_url.clone(),
            config.email_api_key.clone(),
            config.email_from.clone(),
        );
        let chat_sessions = ChatSessions::new();
        let chat = ChatService::new(
            chat_sessions.clone(),
            config.llm_api_url.clone(),
            config.llm_api_key.clone(),
            config.llm_model.clone(),
        );

        Self {
            jwt_service: Arc::new(JwtService::with_config(config.jwt.clone())),
            config,
            db,
            users,
            products,
            stock_entries,
            orders,
            carts,
            subscriptions,
            notifications,
            certifications,
            cows,
            ledger,
            analytics,
            order_service,
            payment,
            email,
            chat,
            chat_sessions,
        }
    }

    pub fn jwt_service(&self) -> Arc<JwtService> {
        self.jwt_service.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_memory;

    #[tokio::test]
    async fn state_clones_share_the_database() {
        let db = connect_memory().await.unwrap();
        let state = ServerState::with_db(Config::from_env(), db);
        let clone = state.clone();
        assert_eq!(state.config.http_port, clone.config.http_port);
        // Both clones see the same repository data
        let count = state.users.count().await.unwrap();
        assert_eq!(clone.users.count().await.unwrap(), count);
    }
}
