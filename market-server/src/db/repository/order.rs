//! Order Repository

use serde::Deserialize;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoError, RepoResult, record_key};
use crate::db::models::Order;

const ORDER_TABLE: &str = "order";

/// Platform revenue aggregate for the admin surface
#[derive(Debug, Clone, Deserialize)]
pub struct RevenueRow {
    pub revenue: f64,
}

#[derive(Clone)]
pub struct OrderRepository {
    base: BaseRepository,
}

impl OrderRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn create(&self, order: Order) -> RepoResult<Order> {
        let created: Option<Order> = self.base.db().create(ORDER_TABLE).content(order).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create order".to_string()))
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Order>> {
        let order: Option<Order> = self
            .base
            .db()
            .select((ORDER_TABLE, record_key(ORDER_TABLE, id)))
            .await?;
        Ok(order)
    }

    /// Replace the stored record with `order`
    pub async fn update(&self, order: &Order) -> RepoResult<Order> {
        let id = order
            .id
            .as_ref()
            .ok_or_else(|| RepoError::Validation("Order has no id".to_string()))?;
        let updated: Option<Order> = self
            .base
            .db()
            .update((ORDER_TABLE, id.key().to_string()))
            .content(order.clone())
            .await?;
        updated.ok_or_else(|| RepoError::NotFound(format!("Order {id} not found")))
    }

    /// Remove an order record (creation rollback only)
    pub async fn delete(&self, id: &str) -> RepoResult<()> {
        let _: Option<Order> = self
            .base
            .db()
            .delete((ORDER_TABLE, record_key(ORDER_TABLE, id)))
            .await?;
        Ok(())
    }

    /// Buyer's orders, newest first
    pub async fn list_by_buyer(&self, buyer: &str, limit: usize) -> RepoResult<Vec<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query("SELECT * FROM `order` WHERE buyer = $buyer ORDER BY created_at DESC LIMIT $limit")
            .bind(("buyer", buyer.to_string()))
            .bind(("limit", limit as i64))
            .await?
            .take(0)?;
        Ok(orders)
    }

    /// Orders containing at least one line sold by `seller`
    pub async fn list_by_seller(&self, seller: &str, limit: usize) -> RepoResult<Vec<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query(
                "SELECT * FROM `order` WHERE $seller IN items.seller \
                 ORDER BY created_at DESC LIMIT $limit",
            )
            .bind(("seller", seller.to_string()))
            .bind(("limit", limit as i64))
            .await?
            .take(0)?;
        Ok(orders)
    }

    /// Order lookup by gateway order id (payment verification)
    pub async fn find_by_gateway_order(&self, gateway_order_id: &str) -> RepoResult<Option<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query("SELECT * FROM `order` WHERE payment.gateway_order_id = $gid LIMIT 1")
            .bind(("gid", gateway_order_id.to_string()))
            .await?
            .take(0)?;
        Ok(orders.into_iter().next())
    }

    pub async fn count(&self) -> RepoResult<usize> {
        let counts: Vec<super::CountRow> = self
            .base
            .db()
            .query("SELECT count() FROM `order` GROUP ALL")
            .await?
            .take(0)?;
        Ok(counts.into_iter().next().map(|c| c.count).unwrap_or(0) as usize)
    }

    /// Total of `total_amount` over non-cancelled orders
    pub async fn total_revenue(&self) -> RepoResult<f64> {
        let rows: Vec<RevenueRow> = self
            .base
            .db()
            .query(
                "SELECT math::sum(total_amount) AS revenue FROM `order` \
                 WHERE delivery_status != 'cancelled' GROUP ALL",
            )
            .await?
            .take(0)?;
        Ok(rows.into_iter().next().map(|r| r.revenue).unwrap_or(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_memory;
    use crate::db::models::{
        DeliveryStatus, OrderItem, PaymentInfo, PaymentMethod, PaymentStatus, ShippingAddress,
    };
    use chrono::Utc;

    async fn repo() -> OrderRepository {
        OrderRepository::new(connect_memory().await.unwrap())
    }

    fn sample(buyer: &str, seller: &str) -> Order {
        Order {
            id: None,
            buyer: buyer.into(),
            items: vec![OrderItem {
                product: "product:m".into(),
                name: "Milk".into(),
                price: 60.0,
                unit: "liter".into(),
                seller: seller.into(),
                quantity: 2,
            }],
            shipping_address: ShippingAddress {
                street: "1 Farm Rd".into(),
                city: "Pune".into(),
                state: "MH".into(),
                pincode: "411001".into(),
                phone: None,
            },
            payment_method: PaymentMethod::Cod,
            payment: PaymentInfo::default(),
            payment_status: PaymentStatus::Pending,
            items_price: 120.0,
            tax_price: 6.0,
            shipping_price: 40.0,
            total_amount: 166.0,
            delivery_status: DeliveryStatus::Pending,
            status_history: vec![],
            tracking: None,
            subscription: None,
            delivered_at: None,
            cancelled_at: None,
            cancellation_reason: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn list_by_buyer_and_seller() {
        let repo = repo().await;
        repo.create(sample("user:b1", "user:s1")).await.unwrap();
        repo.create(sample("user:b1", "user:s2")).await.unwrap();
        repo.create(sample("user:b2", "user:s1")).await.unwrap();

        assert_eq!(repo.list_by_buyer("user:b1", 10).await.unwrap().len(), 2);
        assert_eq!(repo.list_by_seller("user:s1", 10).await.unwrap().len(), 2);
        assert_eq!(repo.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn update_round_trips_status() {
        let repo = repo().await;
        let mut order = repo.create(sample("user:b1", "user:s1")).await.unwrap();
        order.push_status(DeliveryStatus::Confirmed, None);
        let updated = repo.update(&order).await.unwrap();
        assert_eq!(updated.delivery_status, DeliveryStatus::Confirmed);
        assert_eq!(updated.status_history.len(), 1);
    }
}
