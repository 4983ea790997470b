//! Stock Entry Repository
//!
//! The stock ledger table is append-only: there is no update or delete here
//! on purpose.

use serde::Deserialize;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{StockChangeKind, StockEntry};

const STOCK_TABLE: &str = "stock_entry";

/// History query filters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryFilter {
    pub kind: Option<StockChangeKind>,
    /// RFC3339 lower bound on created_at
    pub from: Option<String>,
    /// RFC3339 upper bound on created_at
    pub to: Option<String>,
    pub limit: Option<usize>,
}

/// Per-kind aggregate used by inventory analytics
#[derive(Debug, Clone, Deserialize)]
pub struct KindTotal {
    pub kind: StockChangeKind,
    pub total: i64,
}

#[derive(Clone)]
pub struct StockEntryRepository {
    base: BaseRepository,
}

impl StockEntryRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn append(&self, entry: StockEntry) -> RepoResult<StockEntry> {
        let created: Option<StockEntry> =
            self.base.db().create(STOCK_TABLE).content(entry).await?;
        created.ok_or_else(|| RepoError::Database("Failed to append stock entry".to_string()))
    }

    /// Ledger rows for one product, newest first
    pub async fn history(
        &self,
        product: &str,
        filter: &HistoryFilter,
    ) -> RepoResult<Vec<StockEntry>> {
        let mut conditions = vec!["product = $product"];
        if filter.kind.is_some() {
            conditions.push("kind = $kind");
        }
        if filter.from.is_some() {
            conditions.push("created_at >= $from");
        }
        if filter.to.is_some() {
            conditions.push("created_at <= $to");
        }

        let query_str = format!(
            "SELECT * FROM stock_entry WHERE {} ORDER BY created_at DESC LIMIT $limit",
            conditions.join(" AND "),
        );

        let mut query = self
            .base
            .db()
            .query(query_str)
            .bind(("product", product.to_string()))
            .bind(("limit", filter.limit.unwrap_or(50).clamp(1, 500) as i64));
        if let Some(kind) = filter.kind {
            query = query.bind(("kind", kind));
        }
        if let Some(from) = filter.from.clone() {
            query = query.bind(("from", from));
        }
        if let Some(to) = filter.to.clone() {
            query = query.bind(("to", to));
        }

        let entries: Vec<StockEntry> = query.await?.take(0)?;
        Ok(entries)
    }

    /// Entries attributed to a record (order, subscription)
    pub async fn related_to(&self, related: &str) -> RepoResult<Vec<StockEntry>> {
        let entries: Vec<StockEntry> = self
            .base
            .db()
            .query("SELECT * FROM stock_entry WHERE related_to = $related ORDER BY created_at ASC")
            .bind(("related", related.to_string()))
            .await?
            .take(0)?;
        Ok(entries)
    }

    /// Inbound batches for a seller's products whose expiry falls on or
    /// before `cutoff_date` ("YYYY-MM-DD")
    pub async fn expiring_batches(
        &self,
        seller: &str,
        cutoff_date: &str,
    ) -> RepoResult<Vec<StockEntry>> {
        let entries: Vec<StockEntry> = self
            .base
            .db()
            .query(
                "SELECT * FROM stock_entry \
                 WHERE batch.expiry_date != NONE \
                   AND batch.expiry_date <= $cutoff \
                   AND product IN (SELECT VALUE type::string(id) FROM product WHERE seller = $seller) \
                 ORDER BY batch.expiry_date ASC",
            )
            .bind(("cutoff", cutoff_date.to_string()))
            .bind(("seller", seller.to_string()))
            .await?
            .take(0)?;
        Ok(entries)
    }

    /// Units sold for a product since `from` (RFC3339)
    pub async fn sold_since(&self, product: &str, from: &str) -> RepoResult<i64> {
        let totals: Vec<super::CountRow> = self
            .base
            .db()
            .query(
                "SELECT math::sum(quantity) AS count FROM stock_entry \
                 WHERE product = $product AND kind = 'sale' AND created_at >= $from GROUP ALL",
            )
            .bind(("product", product.to_string()))
            .bind(("from", from.to_string()))
            .await?
            .take(0)?;
        Ok(totals.into_iter().next().map(|c| c.count).unwrap_or(0))
    }

    /// Total magnitude per change kind for one product
    pub async fn totals_by_kind(&self, product: &str) -> RepoResult<Vec<KindTotal>> {
        let totals: Vec<KindTotal> = self
            .base
            .db()
            .query(
                "SELECT kind, math::sum(quantity) AS total FROM stock_entry \
                 WHERE product = $product GROUP BY kind",
            )
            .bind(("product", product.to_string()))
            .await?
            .take(0)?;
        Ok(totals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_memory;
    use chrono::Utc;

    async fn repo() -> StockEntryRepository {
        StockEntryRepository::new(connect_memory().await.unwrap())
    }

    fn entry(product: &str, kind: StockChangeKind, quantity: i64, prev: i64) -> StockEntry {
        let delta = kind.signed_delta(quantity);
        StockEntry {
            id: None,
            product: product.into(),
            kind,
            quantity: quantity.abs(),
            signed_delta: delta,
            previous_stock: prev,
            new_stock: prev + delta,
            reason: None,
            related_to: None,
            related_model: None,
            performed_by: None,
            notes: None,
            batch: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn history_filters_by_kind() {
        let repo = repo().await;
        repo.append(entry("product:m", StockChangeKind::Purchase, 10, 0))
            .await
            .unwrap();
        repo.append(entry("product:m", StockChangeKind::Sale, 3, 10))
            .await
            .unwrap();
        repo.append(entry("product:other", StockChangeKind::Sale, 1, 5))
            .await
            .unwrap();

        let all = repo
            .history("product:m", &HistoryFilter::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        let sales = repo
            .history(
                "product:m",
                &HistoryFilter {
                    kind: Some(StockChangeKind::Sale),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(sales.len(), 1);
        assert_eq!(sales[0].signed_delta, -3);
    }

    #[tokio::test]
    async fn totals_group_by_kind() {
        let repo = repo().await;
        repo.append(entry("product:m", StockChangeKind::Purchase, 10, 0))
            .await
            .unwrap();
        repo.append(entry("product:m", StockChangeKind::Sale, 3, 10))
            .await
            .unwrap();
        repo.append(entry("product:m", StockChangeKind::Sale, 2, 7))
            .await
            .unwrap();

        let totals = repo.totals_by_kind("product:m").await.unwrap();
        let sold = totals
            .iter()
            .find(|t| t.kind == StockChangeKind::Sale)
            .map(|t| t.total);
        assert_eq!(sold, Some(5));
    }
}
