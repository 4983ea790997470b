//! Cow (livestock listing) Repository

use serde::Deserialize;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoError, RepoResult, record_key};
use crate::db::models::{Cow, CowBreed, CowStatus};

const COW_TABLE: &str = "cow";

/// Listing filters, all optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CowFilter {
    pub breed: Option<CowBreed>,
    pub status: Option<CowStatus>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub limit: Option<usize>,
}

#[derive(Clone)]
pub struct CowRepository {
    base: BaseRepository,
}

impl CowRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn create(&self, cow: Cow) -> RepoResult<Cow> {
        let created: Option<Cow> = self.base.db().create(COW_TABLE).content(cow).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create cow listing".to_string()))
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Cow>> {
        let cow: Option<Cow> = self
            .base
            .db()
            .select((COW_TABLE, record_key(COW_TABLE, id)))
            .await?;
        Ok(cow)
    }

    pub async fn update(&self, cow: &Cow) -> RepoResult<Cow> {
        let id = cow
            .id
            .as_ref()
            .ok_or_else(|| RepoError::Validation("Cow listing has no id".to_string()))?;
        let updated: Option<Cow> = self
            .base
            .db()
            .update((COW_TABLE, id.key().to_string()))
            .content(cow.clone())
            .await?;
        updated.ok_or_else(|| RepoError::NotFound(format!("Cow listing {id} not found")))
    }

    pub async fn delete(&self, id: &str) -> RepoResult<()> {
        let deleted: Option<Cow> = self
            .base
            .db()
            .delete((COW_TABLE, record_key(COW_TABLE, id)))
            .await?;
        if deleted.is_none() {
            return Err(RepoError::NotFound(format!("Cow listing {id} not found")));
        }
        Ok(())
    }

    pub async fn list(&self, filter: &CowFilter) -> RepoResult<Vec<Cow>> {
        let mut conditions = vec!["true"];
        if filter.breed.is_some() {
            conditions.push("breed = $breed");
        }
        if filter.status.is_some() {
            conditions.push("status = $status");
        }
        if filter.min_price.is_some() {
            conditions.push("price >= $min_price");
        }
        if filter.max_price.is_some() {
            conditions.push("price <= $max_price");
        }

        let query_str = format!(
            "SELECT * FROM cow WHERE {} ORDER BY created_at DESC LIMIT $limit",
            conditions.join(" AND "),
        );

        let mut query = self
            .base
            .db()
            .query(query_str)
            .bind(("limit", filter.limit.unwrap_or(20).clamp(1, 100) as i64));
        if let Some(breed) = filter.breed {
            query = query.bind(("breed", breed));
        }
        if let Some(status) = filter.status {
            query = query.bind(("status", status));
        }
        if let Some(min_price) = filter.min_price {
            query = query.bind(("min_price", min_price));
        }
        if let Some(max_price) = filter.max_price {
            query = query.bind(("max_price", max_price));
        }

        let cows: Vec<Cow> = query.await?.take(0)?;
        Ok(cows)
    }

    pub async fn count(&self) -> RepoResult<usize> {
        let counts: Vec<super::CountRow> = self
            .base
            .db()
            .query("SELECT count() FROM cow GROUP ALL")
            .await?
            .take(0)?;
        Ok(counts.into_iter().next().map(|c| c.count).unwrap_or(0) as usize)
    }
}
