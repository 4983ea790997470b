//! Database Module
//!
//! Embedded SurrealDB: RocksDB-backed on disk for the server, in-memory
//! engine for tests. Repositories in [`repository`] own all table access.

pub mod models;
pub mod repository;

use std::path::Path;

use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem, RocksDb};

use crate::utils::AppError;

const NAMESPACE: &str = "market";
const DATABASE: &str = "market";

/// Open the on-disk database under `db_dir`
pub async fn connect(db_dir: &Path) -> Result<Surreal<Db>, AppError> {
    let db = Surreal::new::<RocksDb>(db_dir)
        .await
        .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;
    db.use_ns(NAMESPACE)
        .use_db(DATABASE)
        .await
        .map_err(|e| AppError::database(format!("Failed to select namespace: {e}")))?;

    tracing::info!(path = %db_dir.display(), "Database connection established (SurrealDB/RocksDB)");
    Ok(db)
}

/// Open an in-memory database (tests)
pub async fn connect_memory() -> Result<Surreal<Db>, AppError> {
    let db = Surreal::new::<Mem>(())
        .await
        .map_err(|e| AppError::database(format!("Failed to open in-memory database: {e}")))?;
    db.use_ns(NAMESPACE)
        .use_db(DATABASE)
        .await
        .map_err(|e| AppError::database(format!("Failed to select namespace: {e}")))?;
    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn on_disk_database_opens_and_queries() {
        let dir = tempfile::tempdir().unwrap();
        let db = connect(dir.path()).await.unwrap();
        let rows: Vec<serde_json::Value> = db
            .query("CREATE probe:one SET value = 42 RETURN AFTER")
            .await
            .unwrap()
            .take(0)
            .unwrap();
        assert_eq!(rows.len(), 1);
    }
}
