//! Product Repository

use serde::Deserialize;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoError, RepoResult, record_key};
use crate::db::models::{Product, ProductKind};

const PRODUCT_TABLE: &str = "product";

/// Listing filters, all optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
    pub kind: Option<ProductKind>,
    pub city: Option<String>,
    /// Case-insensitive substring match on the name
    pub search: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub seller: Option<String>,
    /// price_asc | price_desc | rating | newest (default)
    pub sort: Option<String>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

impl ProductFilter {
    fn order_clause(&self) -> &'static str {
        match self.sort.as_deref() {
            Some("price_asc") => "ORDER BY price ASC",
            Some("price_desc") => "ORDER BY price DESC",
            Some("rating") => "ORDER BY average_rating DESC",
            _ => "ORDER BY created_at DESC",
        }
    }

    fn page_bounds(&self) -> (usize, usize) {
        let limit = self.limit.unwrap_or(20).clamp(1, 100);
        let page = self.page.unwrap_or(1).max(1);
        (limit, (page - 1) * limit)
    }
}

#[derive(Clone)]
pub struct ProductRepository {
    base: BaseRepository,
}

impl ProductRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn create(&self, product: Product) -> RepoResult<Product> {
        let created: Option<Product> = self
            .base
            .db()
            .create(PRODUCT_TABLE)
            .content(product)
            .await?;
        created.ok_or_else(|| RepoError::Database("Failed to create product".to_string()))
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Product>> {
        let product: Option<Product> = self
            .base
            .db()
            .select((PRODUCT_TABLE, record_key(PRODUCT_TABLE, id)))
            .await?;
        Ok(product)
    }

    /// Replace the stored record with `product`
    pub async fn update(&self, product: &Product) -> RepoResult<Product> {
        let id = product
            .id
            .as_ref()
            .ok_or_else(|| RepoError::Validation("Product has no id".to_string()))?;
        let updated: Option<Product> = self
            .base
            .db()
            .update((PRODUCT_TABLE, id.key().to_string()))
            .content(product.clone())
            .await?;
        updated.ok_or_else(|| RepoError::NotFound(format!("Product {id} not found")))
    }

    pub async fn delete(&self, id: &str) -> RepoResult<()> {
        let deleted: Option<Product> = self
            .base
            .db()
            .delete((PRODUCT_TABLE, record_key(PRODUCT_TABLE, id)))
            .await?;
        if deleted.is_none() {
            return Err(RepoError::NotFound(format!("Product {id} not found")));
        }
        Ok(())
    }

    /// Filtered, sorted, paginated listing of approved products
    pub async fn list(&self, filter: &ProductFilter) -> RepoResult<Vec<Product>> {
        let mut conditions = vec!["status = 'approved'"];
        if filter.kind.is_some() {
            conditions.push("kind = $kind");
        }
        if filter.city.is_some() {
            conditions.push("location.city = $city");
        }
        if filter.search.is_some() {
            conditions.push("string::lowercase(name) CONTAINS string::lowercase($search)");
        }
        if filter.min_price.is_some() {
            conditions.push("price >= $min_price");
        }
        if filter.max_price.is_some() {
            conditions.push("price <= $max_price");
        }
        if filter.seller.is_some() {
            conditions.push("seller = $seller");
        }

        let (limit, start) = filter.page_bounds();
        let query_str = format!(
            "SELECT * FROM product WHERE {} {} LIMIT $limit START $start",
            conditions.join(" AND "),
            filter.order_clause(),
        );

        let mut query = self
            .base
            .db()
            .query(query_str)
            .bind(("limit", limit as i64))
            .bind(("start", start as i64));
        if let Some(kind) = filter.kind {
            query = query.bind(("kind", kind));
        }
        if let Some(city) = filter.city.clone() {
            query = query.bind(("city", city));
        }
        if let Some(search) = filter.search.clone() {
            query = query.bind(("search", search));
        }
        if let Some(min_price) = filter.min_price {
            query = query.bind(("min_price", min_price));
        }
        if let Some(max_price) = filter.max_price {
            query = query.bind(("max_price", max_price));
        }
        if let Some(seller) = filter.seller.clone() {
            query = query.bind(("seller", seller));
        }

        let products: Vec<Product> = query.await?.take(0)?;
        Ok(products)
    }

    /// All of one seller's products regardless of moderation status
    pub async fn list_by_seller(&self, seller: &str) -> RepoResult<Vec<Product>> {
        let products: Vec<Product> = self
            .base
            .db()
            .query("SELECT * FROM product WHERE seller = $seller ORDER BY created_at DESC")
            .bind(("seller", seller.to_string()))
            .await?
            .take(0)?;
        Ok(products)
    }

    /// Best-rated approved products for the storefront
    pub async fn featured(&self, limit: usize) -> RepoResult<Vec<Product>> {
        let products: Vec<Product> = self
            .base
            .db()
            .query("SELECT * FROM product WHERE status = 'approved' AND stock > 0 ORDER BY average_rating DESC LIMIT $limit")
            .bind(("limit", limit as i64))
            .await?
            .take(0)?;
        Ok(products)
    }

    /// Write a new stock level
    ///
    /// Only the stock ledger may call this; every call is paired with an
    /// appended `stock_entry` row under the product's lock.
    pub async fn set_stock(&self, id: &str, stock: i64) -> RepoResult<Product> {
        let products: Vec<Product> = self
            .base
            .db()
            .query("UPDATE type::thing('product', $key) SET stock = $stock RETURN AFTER")
            .bind(("key", record_key(PRODUCT_TABLE, id).to_string()))
            .bind(("stock", stock))
            .await?
            .take(0)?;
        products
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Product {id} not found")))
    }

    pub async fn count(&self) -> RepoResult<usize> {
        let counts: Vec<super::CountRow> = self
            .base
            .db()
            .query("SELECT count() FROM product GROUP ALL")
            .await?
            .take(0)?;
        Ok(counts.into_iter().next().map(|c| c.count).unwrap_or(0) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_memory;
    use crate::db::models::ProductCreate;

    async fn repo() -> ProductRepository {
        ProductRepository::new(connect_memory().await.unwrap())
    }

    fn sample(name: &str, price: f64) -> Product {
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
        .into_product("user:farmer1".into())
    }

    #[tokio::test]
    async fn list_filters_by_price_and_search() {
        let repo = repo().await;
        repo.create(sample("Gir Milk", 60.0)).await.unwrap();
        repo.create(sample("Buffalo Milk", 80.0)).await.unwrap();
        repo.create(sample("Desi Ghee", 900.0)).await.unwrap();

        let cheap = repo
            .list(&ProductFilter {
                max_price: Some(100.0),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(cheap.len(), 2);

        let milk = repo
            .list(&ProductFilter {
                search: Some("milk".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(milk.len(), 2);
    }

    #[tokio::test]
    async fn set_stock_writes_level() {
        let repo = repo().await;
        let product = repo.create(sample("Gir Milk", 60.0)).await.unwrap();
        let updated = repo.set_stock(&product.id_string(), 42).await.unwrap();
        assert_eq!(updated.stock, 42);
    }

    #[tokio::test]
    async fn sort_by_price() {
        let repo = repo().await;
        repo.create(sample("B", 80.0)).await.unwrap();
        repo.create(sample("A", 60.0)).await.unwrap();
        let sorted = repo
            .list(&ProductFilter {
                sort: Some("price_asc".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(sorted[0].price, 60.0);
    }
}
