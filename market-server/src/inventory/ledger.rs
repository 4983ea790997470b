//! Stock Ledger
//!
//! The only code path that mutates `product.stock`. Each mutation happens
//! under a per-product async lock and is paired with an appended
//! `stock_entry` row, so `new_stock` always equals the product's stock at
//! write time and the ledger replays to the current level.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::db::models::{Batch, RelatedModel, StockChangeKind, StockEntry};
use crate::db::repository::{ProductRepository, StockEntryRepository};
use crate::utils::{AppError, AppResult};

/// One requested stock mutation
#[derive(Debug, Clone)]
pub struct StockChange {
    /// Product id (`product:key`)
    pub product: String,
    pub kind: StockChangeKind,
    /// Magnitude; the sign applied comes from `kind`, except for
    /// adjustments which keep the caller's sign
    pub quantity: i64,
    pub reason: Option<String>,
    pub related_to: Option<String>,
    pub related_model: Option<RelatedModel>,
    pub performed_by: Option<String>,
    pub notes: Option<String>,
    pub batch: Option<Batch>,
}

impl StockChange {
    pub fn new(product: impl Into<String>, kind: StockChangeKind, quantity: i64) -> Self {
        Self {
            product: product.into(),
            kind,
            quantity,
            reason: None,
            related_to: None,
            related_model: None,
            performed_by: None,
            notes: None,
            batch: None,
        }
    }

    pub fn attributed_to(mut self, related_to: impl Into<String>, model: RelatedModel) -> Self {
        self.related_to = Some(related_to.into());
        self.related_model = Some(model);
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn performed_by(mut self, user: impl Into<String>) -> Self {
        self.performed_by = Some(user.into());
        self
    }

    pub fn with_batch(mut self, batch: Batch) -> Self {
        self.batch = Some(batch);
        self
    }
}

#[derive(Clone)]
pub struct StockLedger {
    products: ProductRepository,
    entries: StockEntryRepository,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl StockLedger {
    pub fn new(products: ProductRepository, entries: StockEntryRepository) -> Self {
        Self {
            products,
            entries,
            locks: Arc::new(DashMap::new()),
        }
    }

    fn lock_for(&self, product: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(product.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Apply a single stock change
    ///
    /// Rejects with `InsufficientStock` when the change would take the
    /// level below zero; nothing is written in that case.
    pub async fn apply(&self, change: StockChange) -> AppResult<StockEntry> {
        let lock = self.lock_for(&change.product);
        let _guard = lock.lock().await;
        self.apply_locked(change).await
    }

    /// Apply several changes all-or-nothing
    ///
    /// Used by order creation and cancellation: locks are acquired in
    /// product-id order (no deadlock between concurrent batches), every
    /// line is validated against current stock, and the first failure
    /// aborts the whole batch before anything is written.
    pub async fn apply_all(&self, changes: Vec<StockChange>) -> AppResult<Vec<StockEntry>> {
        if changes.is_empty() {
            return Ok(Vec::new());
        }

        let mut product_ids: Vec<String> = changes.iter().map(|c| c.product.clone()).collect();
        product_ids.sort();
        product_ids.dedup();

        let mut guards: Vec<OwnedMutexGuard<()>> = Vec::with_capacity(product_ids.len());
        for product in &product_ids {
            guards.push(self.lock_for(product).lock_owned().await);
        }

        // Validate every line against the running level before writing
        let mut levels: std::collections::HashMap<String, i64> = std::collections::HashMap::new();
        for product in &product_ids {
            let current = self
                .products
                .find_by_id(product)
                .await?
                .ok_or_else(|| AppError::not_found(format!("Product {product} not found")))?
                .stock;
            levels.insert(product.clone(), current);
        }
        for change in &changes {
            let level = levels
                .get_mut(&change.product)
                .ok_or_else(|| AppError::internal("Stock level missing for locked product"))?;
            let next = *level + change.kind.signed_delta(change.quantity);
            if next < 0 {
                return Err(AppError::insufficient_stock(format!(
                    "Insufficient stock for {}: {} available, {} requested",
                    change.product, *level, change.quantity
                )));
            }
            *level = next;
        }

        let mut entries = Vec::with_capacity(changes.len());
        for change in changes {
            entries.push(self.apply_locked(change).await?);
        }
        Ok(entries)
    }

    /// Ledger write under an already-held lock
    async fn apply_locked(&self, change: StockChange) -> AppResult<StockEntry> {
        if change.quantity == 0 {
            return Err(AppError::validation("Quantity must not be zero"));
        }

        let product = self
            .products
            .find_by_id(&change.product)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Product {} not found", change.product)))?;

        let delta = change.kind.signed_delta(change.quantity);
        let previous_stock = product.stock;
        let new_stock = previous_stock + delta;
        if new_stock < 0 {
            return Err(AppError::insufficient_stock(format!(
                "Insufficient stock for {}: {} available, {} requested",
                product.name,
                previous_stock,
                change.quantity.abs()
            )));
        }

        self.products.set_stock(&change.product, new_stock).await?;

        let entry = StockEntry {
            id: None,
            product: product.id_string(),
            kind: change.kind,
            quantity: change.quantity.abs(),
            signed_delta: delta,
            previous_stock,
            new_stock,
            reason: change.reason,
            related_to: change.related_to,
            related_model: change.related_model,
            performed_by: change.performed_by,
            notes: change.notes,
            batch: change.batch,
            created_at: Utc::now(),
        };
        let entry = self.entries.append(entry).await?;

        tracing::debug!(
            product = %entry.product,
            kind = ?entry.kind,
            delta = entry.signed_delta,
            new_stock = entry.new_stock,
            "Stock ledger entry appended"
        );
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_memory;
    use crate::db::models::{Product, ProductCreate, ProductKind};
    use crate::db::repository::HistoryFilter;

    async fn setup() -> (StockLedger, ProductRepository, StockEntryRepository) {
        let db = connect_memory().await.unwrap();
        let products = ProductRepository::new(db.clone());
        let entries = StockEntryRepository::new(db);
        (
            StockLedger::new(products.clone(), entries.clone()),
            products,
            entries,
        )
    }

    async fn seed_product(products: &ProductRepository, name: &str, stock: i64) -> Product {
        let product = products
            .create(
                ProductCreate {
                    name: name.into(),
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
        if stock > 0 {
            products.set_stock(&product.id_string(), stock).await.unwrap()
        } else {
            product
        }
    }

    #[tokio::test]
    async fn sale_decrements_and_records_entry() {
        let (ledger, products, _) = setup().await;
        let product = seed_product(&products, "Milk", 5).await;

        let entry = ledger
            .apply(StockChange::new(
                product.id_string(),
                StockChangeKind::Sale,
                3,
            ))
            .await
            .unwrap();
        assert_eq!(entry.previous_stock, 5);
        assert_eq!(entry.new_stock, 2);
        assert_eq!(entry.signed_delta, -3);

        let reloaded = products
            .find_by_id(&product.id_string())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.stock, 2);
    }

    #[tokio::test]
    async fn oversized_sale_rejected_without_mutation() {
        let (ledger, products, entries) = setup().await;
        let product = seed_product(&products, "Milk", 5).await;

        ledger
            .apply(StockChange::new(
                product.id_string(),
                StockChangeKind::Sale,
                3,
            ))
            .await
            .unwrap();

        let err = ledger
            .apply(StockChange::new(
                product.id_string(),
                StockChangeKind::Sale,
                3,
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InsufficientStock(_)));

        let reloaded = products
            .find_by_id(&product.id_string())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.stock, 2);

        let history = entries
            .history(&product.id_string(), &HistoryFilter::default())
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn entries_chain_previous_to_new() {
        let (ledger, products, entries) = setup().await;
        let product = seed_product(&products, "Milk", 0).await;

        for change in [
            StockChange::new(product.id_string(), StockChangeKind::Purchase, 10),
            StockChange::new(product.id_string(), StockChangeKind::Sale, 4),
            StockChange::new(product.id_string(), StockChangeKind::Damaged, 1),
            StockChange::new(product.id_string(), StockChangeKind::Return, 2),
        ] {
            ledger.apply(change).await.unwrap();
        }

        let mut history = entries
            .history(&product.id_string(), &HistoryFilter::default())
            .await
            .unwrap();
        history.reverse();
        let mut level = 0;
        for entry in &history {
            assert_eq!(entry.previous_stock, level);
            assert_eq!(entry.new_stock - entry.previous_stock, entry.signed_delta);
            level = entry.new_stock;
        }
        assert_eq!(level, 7);
    }

    #[tokio::test]
    async fn concurrent_sales_never_oversell() {
        let (ledger, products, _) = setup().await;
        let product = seed_product(&products, "Milk", 10).await;

        let mut handles = Vec::new();
        for _ in 0..20 {
            let ledger = ledger.clone();
            let id = product.id_string();
            handles.push(tokio::spawn(async move {
                ledger
                    .apply(StockChange::new(id, StockChangeKind::Sale, 1))
                    .await
                    .is_ok()
            }));
        }
        let mut succeeded = 0;
        for handle in handles {
            if handle.await.unwrap() {
                succeeded += 1;
            }
        }
        assert_eq!(succeeded, 10);

        let reloaded = products
            .find_by_id(&product.id_string())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.stock, 0);
    }

    #[tokio::test]
    async fn apply_all_is_atomic() {
        let (ledger, products, entries) = setup().await;
        let milk = seed_product(&products, "Milk", 10).await;
        let ghee = seed_product(&products, "Ghee", 1).await;

        let err = ledger
            .apply_all(vec![
                StockChange::new(milk.id_string(), StockChangeKind::Sale, 5),
                StockChange::new(ghee.id_string(), StockChangeKind::Sale, 2),
            ])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InsufficientStock(_)));

        // Neither product moved, no entries written
        assert_eq!(
            products
                .find_by_id(&milk.id_string())
                .await
                .unwrap()
                .unwrap()
                .stock,
            10
        );
        assert_eq!(
            products
                .find_by_id(&ghee.id_string())
                .await
                .unwrap()
                .unwrap()
                .stock,
            1
        );
        assert!(
            entries
                .history(&milk.id_string(), &HistoryFilter::default())
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn apply_all_handles_repeated_products() {
        let (ledger, products, _) = setup().await;
        let milk = seed_product(&products, "Milk", 5).await;

        // Two lines of the same product totalling more than stock
        let err = ledger
            .apply_all(vec![
                StockChange::new(milk.id_string(), StockChangeKind::Sale, 3),
                StockChange::new(milk.id_string(), StockChangeKind::Sale, 3),
            ])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InsufficientStock(_)));

        let ok = ledger
            .apply_all(vec![
                StockChange::new(milk.id_string(), StockChangeKind::Sale, 3),
                StockChange::new(milk.id_string(), StockChangeKind::Sale, 2),
            ])
            .await
            .unwrap();
        assert_eq!(ok.len(), 2);
        assert_eq!(ok[1].new_stock, 0);
    }
}
