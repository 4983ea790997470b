//! Inventory analytics
//!
//! Aggregations over the stock ledger: per-product totals, turnover and
//! waste, sales-velocity reorder suggestions and expiring batches.

use chrono::{Duration, Utc};
use serde::Serialize;

use crate::db::models::{StockChangeKind, StockEntry};
use crate::db::repository::{ProductRepository, StockEntryRepository};
use crate::utils::{AppError, AppResult};

/// Sales window used for velocity estimates, in days
const VELOCITY_WINDOW_DAYS: i64 = 30;
/// Suggest a reorder when cover falls below this many days
const REORDER_COVER_DAYS: f64 = 7.0;

#[derive(Debug, Clone, Serialize)]
pub struct ProductAnalytics {
    pub product: String,
    pub name: String,
    pub current_stock: i64,
    pub total_purchased: i64,
    pub total_sold: i64,
    pub total_returned: i64,
    pub total_damaged: i64,
    pub total_expired: i64,
    /// sold / purchased, 0 when nothing was purchased
    pub turnover_rate: f64,
    /// damaged + expired
    pub waste: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReorderSuggestion {
    pub product: String,
    pub name: String,
    pub current_stock: i64,
    /// Average units sold per day over the last 30 days
    pub daily_sales_velocity: f64,
    /// current_stock / velocity
    pub days_of_stock: f64,
    /// Enough for two weeks at the observed velocity
    pub suggested_quantity: i64,
}

#[derive(Clone)]
pub struct InventoryAnalytics {
    products: ProductRepository,
    entries: StockEntryRepository,
}

impl InventoryAnalytics {
    pub fn new(products: ProductRepository, entries: StockEntryRepository) -> Self {
        Self { products, entries }
    }

    /// Lifetime totals per change kind for one product
    pub async fn product_analytics(&self, product_id: &str) -> AppResult<ProductAnalytics> {
        let product = self
            .products
            .find_by_id(product_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Product {product_id} not found")))?;

        let totals = self.entries.totals_by_kind(&product.id_string()).await?;
        let total_of = |kind: StockChangeKind| {
            totals
                .iter()
                .find(|t| t.kind == kind)
                .map(|t| t.total)
                .unwrap_or(0)
        };

        let total_purchased = total_of(StockChangeKind::Purchase);
        let total_sold = total_of(StockChangeKind::Sale);
        let total_damaged = total_of(StockChangeKind::Damaged);
        let total_expired = total_of(StockChangeKind::Expired);

        Ok(ProductAnalytics {
            product: product.id_string(),
            name: product.name,
            current_stock: product.stock,
            total_purchased,
            total_sold,
            total_returned: total_of(StockChangeKind::Return),
            total_damaged,
            total_expired,
            turnover_rate: if total_purchased > 0 {
                total_sold as f64 / total_purchased as f64
            } else {
                0.0
            },
            waste: total_damaged + total_expired,
        })
    }

    /// Products of `seller` running low relative to their sales velocity
    pub async fn reorder_suggestions(&self, seller: &str) -> AppResult<Vec<ReorderSuggestion>> {
        let since = (Utc::now() - Duration::days(VELOCITY_WINDOW_DAYS)).to_rfc3339();
        let mut suggestions = Vec::new();

        for product in self.products.list_by_seller(seller).await? {
            let sold = self.entries.sold_since(&product.id_string(), &since).await?;
            if sold == 0 {
                continue;
            }
            let velocity = sold as f64 / VELOCITY_WINDOW_DAYS as f64;
            let days_of_stock = product.stock as f64 / velocity;
            if days_of_stock < REORDER_COVER_DAYS {
                suggestions.push(ReorderSuggestion {
                    product: product.id_string(),
                    name: product.name,
                    current_stock: product.stock,
                    daily_sales_velocity: velocity,
                    days_of_stock,
                    suggested_quantity: (velocity * 14.0).ceil() as i64,
                });
            }
        }

        suggestions.sort_by(|a, b| {
            a.days_of_stock
                .partial_cmp(&b.days_of_stock)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(suggestions)
    }

    /// Inbound batches of `seller` expiring within `window_days`
    pub async fn expiring_batches(
        &self,
        seller: &str,
        window_days: i64,
    ) -> AppResult<Vec<StockEntry>> {
        let cutoff = (Utc::now() + Duration::days(window_days))
            .date_naive()
            .format("%Y-%m-%d")
            .to_string();
        Ok(self.entries.expiring_batches(seller, &cutoff).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_memory;
    use crate::db::models::{ProductCreate, ProductKind};
    use crate::inventory::{StockChange, StockLedger};

    async fn setup() -> (InventoryAnalytics, StockLedger, ProductRepository) {
        let db = connect_memory().await.unwrap();
        let products = ProductRepository::new(db.clone());
        let entries = StockEntryRepository::new(db);
        (
            InventoryAnalytics::new(products.clone(), entries.clone()),
            StockLedger::new(products.clone(), entries),
            products,
        )
    }

    #[tokio::test]
    async fn analytics_totals_and_turnover() {
        let (analytics, ledger, products) = setup().await;
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
        let id = product.id_string();

        for change in [
            StockChange::new(id.clone(), StockChangeKind::Purchase, 20),
            StockChange::new(id.clone(), StockChangeKind::Sale, 8),
            StockChange::new(id.clone(), StockChangeKind::Sale, 2),
            StockChange::new(id.clone(), StockChangeKind::Damaged, 1),
            StockChange::new(id.clone(), StockChangeKind::Expired, 2),
        ] {
            ledger.apply(change).await.unwrap();
        }

        let report = analytics.product_analytics(&id).await.unwrap();
        assert_eq!(report.current_stock, 7);
        assert_eq!(report.total_purchased, 20);
        assert_eq!(report.total_sold, 10);
        assert_eq!(report.waste, 3);
        assert!((report.turnover_rate - 0.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn reorder_suggestions_flag_low_cover() {
        let (analytics, ledger, products) = setup().await;
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
        let id = product.id_string();

        // 60 sold over the window, 6 left: one day of cover
        ledger
            .apply(StockChange::new(id.clone(), StockChangeKind::Purchase, 66))
            .await
            .unwrap();
        ledger
            .apply(StockChange::new(id.clone(), StockChangeKind::Sale, 60))
            .await
            .unwrap();

        let suggestions = analytics.reorder_suggestions("user:farmer1").await.unwrap();
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].current_stock, 6);
        assert!(suggestions[0].days_of_stock < REORDER_COVER_DAYS);
        assert!(suggestions[0].suggested_quantity >= 28);
    }
}
