//! Cart Repository
//!
//! One cart per user, created lazily on first access.

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::Cart;

const CART_TABLE: &str = "cart";

#[derive(Clone)]
pub struct CartRepository {
    base: BaseRepository,
}

impl CartRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_by_user(&self, user: &str) -> RepoResult<Option<Cart>> {
        let carts: Vec<Cart> = self
            .base
            .db()
            .query("SELECT * FROM cart WHERE user = $user LIMIT 1")
            .bind(("user", user.to_string()))
            .await?
            .take(0)?;
        Ok(carts.into_iter().next())
    }

    /// The user's cart, creating an empty one if none exists yet
    pub async fn find_or_create(&self, user: &str) -> RepoResult<Cart> {
        if let Some(cart) = self.find_by_user(user).await? {
            return Ok(cart);
        }
        let created: Option<Cart> = self
            .base
            .db()
            .create(CART_TABLE)
            .content(Cart::new(user.to_string()))
            .await?;
        created.ok_or_else(|| RepoError::Database("Failed to create cart".to_string()))
    }

    /// Replace the stored record with `cart`
    pub async fn update(&self, cart: &Cart) -> RepoResult<Cart> {
        let id = cart
            .id
            .as_ref()
            .ok_or_else(|| RepoError::Validation("Cart has no id".to_string()))?;
        let updated: Option<Cart> = self
            .base
            .db()
            .update((CART_TABLE, id.key().to_string()))
            .content(cart.clone())
            .await?;
        updated.ok_or_else(|| RepoError::NotFound(format!("Cart {id} not found")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_memory;
    use crate::db::models::CartItem;
    use chrono::Utc;

    #[tokio::test]
    async fn find_or_create_is_a_singleton_per_user() {
        let repo = CartRepository::new(connect_memory().await.unwrap());
        let first = repo.find_or_create("user:c").await.unwrap();
        let second = repo.find_or_create("user:c").await.unwrap();
        assert_eq!(
            first.id.as_ref().map(|i| i.to_string()),
            second.id.as_ref().map(|i| i.to_string())
        );
    }

    #[tokio::test]
    async fn mutations_persist() {
        let repo = CartRepository::new(connect_memory().await.unwrap());
        let mut cart = repo.find_or_create("user:c").await.unwrap();
        cart.add_item(CartItem {
            product: "product:m".into(),
            quantity: 2,
            price_snapshot: 60.0,
            unit_snapshot: "liter".into(),
            name_snapshot: "Milk".into(),
            added_at: Utc::now(),
        });
        repo.update(&cart).await.unwrap();

        let reloaded = repo.find_by_user("user:c").await.unwrap().unwrap();
        assert_eq!(reloaded.total_items, 2);
        assert!((reloaded.total_price - 120.0).abs() < 1e-9);
    }
}
