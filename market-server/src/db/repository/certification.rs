//! Certification Repository

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoError, RepoResult, record_key};
use crate::db::models::Certification;

const CERTIFICATION_TABLE: &str = "certification";

#[derive(Clone)]
pub struct CertificationRepository {
    base: BaseRepository,
}

impl CertificationRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn create(&self, certification: Certification) -> RepoResult<Certification> {
        let created: Option<Certification> = self
            .base
            .db()
            .create(CERTIFICATION_TABLE)
            .content(certification)
            .await?;
        created.ok_or_else(|| RepoError::Database("Failed to create certification".to_string()))
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Certification>> {
        let certification: Option<Certification> = self
            .base
            .db()
            .select((CERTIFICATION_TABLE, record_key(CERTIFICATION_TABLE, id)))
            .await?;
        Ok(certification)
    }

    /// Latest certification submitted for a product
    pub async fn find_by_product(&self, product: &str) -> RepoResult<Option<Certification>> {
        let certifications: Vec<Certification> = self
            .base
            .db()
            .query(
                "SELECT * FROM certification WHERE product = $product \
                 ORDER BY created_at DESC LIMIT 1",
            )
            .bind(("product", product.to_string()))
            .await?
            .take(0)?;
        Ok(certifications.into_iter().next())
    }

    pub async fn update(&self, certification: &Certification) -> RepoResult<Certification> {
        let id = certification
            .id
            .as_ref()
            .ok_or_else(|| RepoError::Validation("Certification has no id".to_string()))?;
        let updated: Option<Certification> = self
            .base
            .db()
            .update((CERTIFICATION_TABLE, id.key().to_string()))
            .content(certification.clone())
            .await?;
        updated.ok_or_else(|| RepoError::NotFound(format!("Certification {id} not found")))
    }
}
