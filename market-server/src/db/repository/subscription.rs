//! Subscription Repository

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoError, RepoResult, record_key};
use crate::db::models::Subscription;

const SUBSCRIPTION_TABLE: &str = "subscription";

#[derive(Clone)]
pub struct SubscriptionRepository {
    base: BaseRepository,
}

impl SubscriptionRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn create(&self, subscription: Subscription) -> RepoResult<Subscription> {
        let created: Option<Subscription> = self
            .base
            .db()
            .create(SUBSCRIPTION_TABLE)
            .content(subscription)
            .await?;
        created.ok_or_else(|| RepoError::Database("Failed to create subscription".to_string()))
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Subscription>> {
        let subscription: Option<Subscription> = self
            .base
            .db()
            .select((SUBSCRIPTION_TABLE, record_key(SUBSCRIPTION_TABLE, id)))
            .await?;
        Ok(subscription)
    }

    /// Replace the stored record with `subscription`
    pub async fn update(&self, subscription: &Subscription) -> RepoResult<Subscription> {
        let id = subscription
            .id
            .as_ref()
            .ok_or_else(|| RepoError::Validation("Subscription has no id".to_string()))?;
        let updated: Option<Subscription> = self
            .base
            .db()
            .update((SUBSCRIPTION_TABLE, id.key().to_string()))
            .content(subscription.clone())
            .await?;
        updated.ok_or_else(|| RepoError::NotFound(format!("Subscription {id} not found")))
    }

    pub async fn list_by_subscriber(&self, subscriber: &str) -> RepoResult<Vec<Subscription>> {
        let subscriptions: Vec<Subscription> = self
            .base
            .db()
            .query(
                "SELECT * FROM subscription WHERE subscriber = $subscriber \
                 ORDER BY created_at DESC",
            )
            .bind(("subscriber", subscriber.to_string()))
            .await?
            .take(0)?;
        Ok(subscriptions)
    }

    /// Active subscriptions due on or before `date` ("YYYY-MM-DD")
    ///
    /// Date strings compare lexicographically, which matches calendar order
    /// for the fixed `YYYY-MM-DD` format.
    pub async fn due(&self, date: &str) -> RepoResult<Vec<Subscription>> {
        let subscriptions: Vec<Subscription> = self
            .base
            .db()
            .query(
                "SELECT * FROM subscription \
                 WHERE status = 'active' AND next_delivery_date <= $date \
                 ORDER BY next_delivery_date ASC",
            )
            .bind(("date", date.to_string()))
            .await?
            .take(0)?;
        Ok(subscriptions)
    }

    pub async fn count_active(&self) -> RepoResult<usize> {
        let counts: Vec<super::CountRow> = self
            .base
            .db()
            .query("SELECT count() FROM subscription WHERE status = 'active' GROUP ALL")
            .await?
            .take(0)?;
        Ok(counts.into_iter().next().map(|c| c.count).unwrap_or(0) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_memory;
    use crate::db::models::{
        DeliveryTime, ShippingAddress, SubscriptionPayment, SubscriptionStatus,
    };
    use chrono::Utc;

    async fn repo() -> SubscriptionRepository {
        SubscriptionRepository::new(connect_memory().await.unwrap())
    }

    fn sample(next: &str, status: SubscriptionStatus) -> Subscription {
        Subscription {
            id: None,
            subscriber: "user:c".into(),
            product: "product:m".into(),
            seller: "user:f".into(),
            quantity: 1,
            delivery_time: DeliveryTime::Morning,
            start_date: next.into(),
            end_date: None,
            status,
            shipping_address: ShippingAddress {
                street: "1 Farm Rd".into(),
                city: "Pune".into(),
                state: "MH".into(),
                pincode: "411001".into(),
                phone: None,
            },
            price_per_delivery: 60.0,
            payment_method: SubscriptionPayment::Cod,
            next_delivery_date: next.into(),
            last_delivery_date: None,
            delivery_count: 0,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn due_picks_only_active_and_due() {
        let repo = repo().await;
        repo.create(sample("2026-03-01", SubscriptionStatus::Active))
            .await
            .unwrap();
        repo.create(sample("2026-03-05", SubscriptionStatus::Active))
            .await
            .unwrap();
        repo.create(sample("2026-03-01", SubscriptionStatus::Paused))
            .await
            .unwrap();

        let due = repo.due("2026-03-02").await.unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].next_delivery_date, "2026-03-01");
    }
}
