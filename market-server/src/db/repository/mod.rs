//! Repository Module
//!
//! One repository per table, all built on [`BaseRepository`]. Ids follow the
//! `"table:key"` convention everywhere; repositories accept either form and
//! normalize before touching the database.

pub mod cart;
pub mod certification;
pub mod cow;
pub mod notification;
pub mod order;
pub mod product;
pub mod stock_entry;
pub mod subscription;
pub mod user;

pub use cart::CartRepository;
pub use certification::CertificationRepository;
pub use cow::{CowFilter, CowRepository};
pub use notification::NotificationRepository;
pub use order::OrderRepository;
pub use product::{ProductFilter, ProductRepository};
pub use stock_entry::{HistoryFilter, KindTotal, StockEntryRepository};
pub use subscription::SubscriptionRepository;
pub use user::UserRepository;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use thiserror::Error;

use crate::utils::AppError;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<surrealdb::Error> for RepoError {
    fn from(err: surrealdb::Error) -> Self {
        RepoError::Database(err.to_string())
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => AppError::not_found(msg),
            RepoError::Duplicate(msg) => AppError::conflict(msg),
            RepoError::Validation(msg) => AppError::validation(msg),
            RepoError::Database(msg) => AppError::database(msg),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Row shape returned by `SELECT count() FROM ... GROUP ALL`
#[derive(Debug, serde::Deserialize)]
pub(crate) struct CountRow {
    pub count: i64,
}

/// Strip the `"table:"` prefix from an id if present
pub(crate) fn record_key<'a>(table: &str, id: &'a str) -> &'a str {
    id.strip_prefix(table)
        .and_then(|rest| rest.strip_prefix(':'))
        .unwrap_or(id)
}

/// Base repository with database reference
#[derive(Clone)]
pub struct BaseRepository {
    db: Surreal<Db>,
}

impl BaseRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Surreal<Db> {
        &self.db
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_key_strips_only_matching_table() {
        assert_eq!(record_key("product", "product:abc"), "abc");
        assert_eq!(record_key("product", "abc"), "abc");
        assert_eq!(record_key("product", "order:abc"), "order:abc");
    }
}
