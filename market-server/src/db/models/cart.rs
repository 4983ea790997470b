use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::serde_helpers;

/// Cart line; price/unit/name are snapshots taken when the item was added
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    /// Product id (`product:key`)
    pub product: String,
    pub quantity: i64,
    pub price_snapshot: f64,
    pub unit_snapshot: String,
    pub name_snapshot: String,
    pub added_at: DateTime<Utc>,
}

/// Per-user shopping cart (one per user, created on first access)
///
/// `total_items` / `total_price` are derived from the snapshots and
/// recomputed on every mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    /// Owner user id (`user:key`)
    pub user: String,
    pub items: Vec<CartItem>,
    pub total_items: i64,
    pub total_price: f64,
    pub updated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Cart {
    pub fn new(user: String) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            user,
            items: Vec::new(),
            total_items: 0,
            total_price: 0.0,
            updated_at: now,
            created_at: now,
        }
    }

    pub fn recompute_totals(&mut self) {
        self.total_items = self.items.iter().map(|i| i.quantity).sum();
        self.total_price = self
            .items
            .iter()
            .map(|i| i.price_snapshot * i.quantity as f64)
            .sum();
        self.updated_at = Utc::now();
    }

    /// Add a line, merging quantity when the product is already present
    pub fn add_item(&mut self, item: CartItem) {
        match self.items.iter_mut().find(|i| i.product == item.product) {
            Some(existing) => {
                existing.quantity += item.quantity;
                existing.price_snapshot = item.price_snapshot;
            }
            None => self.items.push(item),
        }
        self.recompute_totals();
    }

    /// Set the quantity of an existing line; returns false if absent
    pub fn update_quantity(&mut self, product: &str, quantity: i64) -> bool {
        match self.items.iter_mut().find(|i| i.product == product) {
            Some(item) => {
                item.quantity = quantity;
                self.recompute_totals();
                true
            }
            None => false,
        }
    }

    /// Remove a line; returns false if absent
    pub fn remove_item(&mut self, product: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.product != product);
        let removed = self.items.len() != before;
        if removed {
            self.recompute_totals();
        }
        removed
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.recompute_totals();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(product: &str, quantity: i64, price: f64) -> CartItem {
        CartItem {
            product: product.into(),
            quantity,
            price_snapshot: price,
            unit_snapshot: "liter".into(),
            name_snapshot: "Milk".into(),
            added_at: Utc::now(),
        }
    }

    #[test]
    fn add_merges_existing_product() {
        let mut cart = Cart::new("user:c".into());
        cart.add_item(line("product:milk", 2, 60.0));
        cart.add_item(line("product:milk", 3, 62.0));
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 5);
        assert_eq!(cart.total_items, 5);
        assert!((cart.total_price - 310.0).abs() < 1e-9);
    }

    #[test]
    fn totals_follow_mutations() {
        let mut cart = Cart::new("user:c".into());
        cart.add_item(line("product:milk", 2, 60.0));
        cart.add_item(line("product:ghee", 1, 500.0));
        assert!((cart.total_price - 620.0).abs() < 1e-9);

        assert!(cart.update_quantity("product:milk", 1));
        assert!((cart.total_price - 560.0).abs() < 1e-9);

        assert!(cart.remove_item("product:ghee"));
        assert_eq!(cart.total_items, 1);

        cart.clear();
        assert_eq!(cart.total_items, 0);
        assert_eq!(cart.total_price, 0.0);
    }

    #[test]
    fn missing_lines_report_false() {
        let mut cart = Cart::new("user:c".into());
        assert!(!cart.update_quantity("product:none", 1));
        assert!(!cart.remove_item("product:none"));
    }
}
