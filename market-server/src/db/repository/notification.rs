//! Notification Repository

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoError, RepoResult, record_key};
use crate::db::models::Notification;

const NOTIFICATION_TABLE: &str = "notification";

#[derive(Clone)]
pub struct NotificationRepository {
    base: BaseRepository,
}

impl NotificationRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn create(&self, notification: Notification) -> RepoResult<Notification> {
        let created: Option<Notification> = self
            .base
            .db()
            .create(NOTIFICATION_TABLE)
            .content(notification)
            .await?;
        created.ok_or_else(|| RepoError::Database("Failed to create notification".to_string()))
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Notification>> {
        let notification: Option<Notification> = self
            .base
            .db()
            .select((NOTIFICATION_TABLE, record_key(NOTIFICATION_TABLE, id)))
            .await?;
        Ok(notification)
    }

    pub async fn update(&self, notification: &Notification) -> RepoResult<Notification> {
        let id = notification
            .id
            .as_ref()
            .ok_or_else(|| RepoError::Validation("Notification has no id".to_string()))?;
        let updated: Option<Notification> = self
            .base
            .db()
            .update((NOTIFICATION_TABLE, id.key().to_string()))
            .content(notification.clone())
            .await?;
        updated.ok_or_else(|| RepoError::NotFound(format!("Notification {id} not found")))
    }

    pub async fn list_by_user(
        &self,
        user: &str,
        unread_only: bool,
        limit: usize,
    ) -> RepoResult<Vec<Notification>> {
        let query_str = if unread_only {
            "SELECT * FROM notification WHERE user = $user AND is_read = false \
             ORDER BY created_at DESC LIMIT $limit"
        } else {
            "SELECT * FROM notification WHERE user = $user \
             ORDER BY created_at DESC LIMIT $limit"
        };
        let notifications: Vec<Notification> = self
            .base
            .db()
            .query(query_str)
            .bind(("user", user.to_string()))
            .bind(("limit", limit as i64))
            .await?
            .take(0)?;
        Ok(notifications)
    }

    /// Mark every unread notification of `user` as read
    pub async fn mark_all_read(&self, user: &str) -> RepoResult<()> {
        self.base
            .db()
            .query(
                "UPDATE notification SET is_read = true, read_at = $now \
                 WHERE user = $user AND is_read = false",
            )
            .bind(("user", user.to_string()))
            .bind(("now", chrono::Utc::now()))
            .await?;
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> RepoResult<()> {
        let deleted: Option<Notification> = self
            .base
            .db()
            .delete((NOTIFICATION_TABLE, record_key(NOTIFICATION_TABLE, id)))
            .await?;
        if deleted.is_none() {
            return Err(RepoError::NotFound(format!("Notification {id} not found")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_memory;
    use crate::db::models::NotificationKind;

    async fn repo() -> NotificationRepository {
        NotificationRepository::new(connect_memory().await.unwrap())
    }

    fn sample(user: &str) -> Notification {
        Notification::new(
            user.into(),
            NotificationKind::Order,
            "Order placed",
            "Your order is confirmed",
            None,
        )
    }

    #[tokio::test]
    async fn unread_filter_and_mark_all() {
        let repo = repo().await;
        repo.create(sample("user:c")).await.unwrap();
        repo.create(sample("user:c")).await.unwrap();
        repo.create(sample("user:other")).await.unwrap();

        let unread = repo.list_by_user("user:c", true, 50).await.unwrap();
        assert_eq!(unread.len(), 2);

        repo.mark_all_read("user:c").await.unwrap();
        let unread = repo.list_by_user("user:c", true, 50).await.unwrap();
        assert!(unread.is_empty());

        let all = repo.list_by_user("user:c", false, 50).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|n| n.read_at.is_some()));
    }
}
