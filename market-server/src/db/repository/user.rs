//! User Repository

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoError, RepoResult, record_key};
use crate::db::models::{KycStatus, User, UserRole};

const USER_TABLE: &str = "user";

#[derive(Clone)]
pub struct UserRepository {
    base: BaseRepository,
}

impl UserRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Create a user; emails are unique, compared lowercased
    pub async fn create(&self, mut user: User) -> RepoResult<User> {
        user.email = user.email.to_lowercase();
        if self.find_by_email(&user.email).await?.is_some() {
            return Err(RepoError::Duplicate(format!(
                "Email {} is already registered",
                user.email
            )));
        }

        let created: Option<User> = self.base.db().create(USER_TABLE).content(user).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create user".to_string()))
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<User>> {
        let user: Option<User> = self
            .base
            .db()
            .select((USER_TABLE, record_key(USER_TABLE, id)))
            .await?;
        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let users: Vec<User> = self
            .base
            .db()
            .query("SELECT * FROM user WHERE email = $email LIMIT 1")
            .bind(("email", email.to_lowercase()))
            .await?
            .take(0)?;
        Ok(users.into_iter().next())
    }

    /// Replace the stored record with `user`
    pub async fn update(&self, user: &User) -> RepoResult<User> {
        let id = user
            .id
            .as_ref()
            .ok_or_else(|| RepoError::Validation("User has no id".to_string()))?;
        let updated: Option<User> = self
            .base
            .db()
            .update((USER_TABLE, id.key().to_string()))
            .content(user.clone())
            .await?;
        updated.ok_or_else(|| RepoError::NotFound(format!("User {id} not found")))
    }

    /// Admin listing with optional role filter
    pub async fn list(&self, role: Option<UserRole>, limit: usize) -> RepoResult<Vec<User>> {
        let users: Vec<User> = match role {
            Some(role) => {
                self.base
                    .db()
                    .query("SELECT * FROM user WHERE role = $role ORDER BY created_at DESC LIMIT $limit")
                    .bind(("role", role))
                    .bind(("limit", limit as i64))
                    .await?
                    .take(0)?
            }
            None => {
                self.base
                    .db()
                    .query("SELECT * FROM user ORDER BY created_at DESC LIMIT $limit")
                    .bind(("limit", limit as i64))
                    .await?
                    .take(0)?
            }
        };
        Ok(users)
    }

    pub async fn set_active(&self, id: &str, is_active: bool) -> RepoResult<User> {
        let users: Vec<User> = self
            .base
            .db()
            .query("UPDATE type::thing('user', $key) SET is_active = $active RETURN AFTER")
            .bind(("key", record_key(USER_TABLE, id).to_string()))
            .bind(("active", is_active))
            .await?
            .take(0)?;
        users
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("User {id} not found")))
    }

    pub async fn set_kyc_status(&self, id: &str, status: KycStatus) -> RepoResult<User> {
        let users: Vec<User> = self
            .base
            .db()
            .query("UPDATE type::thing('user', $key) SET kyc_status = $status RETURN AFTER")
            .bind(("key", record_key(USER_TABLE, id).to_string()))
            .bind(("status", status))
            .await?
            .take(0)?;
        users
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("User {id} not found")))
    }

    pub async fn count(&self) -> RepoResult<usize> {
        let counts: Vec<super::CountRow> = self
            .base
            .db()
            .query("SELECT count() FROM user GROUP ALL")
            .await?
            .take(0)?;
        Ok(counts.into_iter().next().map(|c| c.count).unwrap_or(0) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_memory;

    async fn repo() -> UserRepository {
        UserRepository::new(connect_memory().await.unwrap())
    }

    fn sample(email: &str) -> User {
        User::new(
            "Asha".into(),
            email.into(),
            "hash".into(),
            UserRole::Consumer,
        )
    }

    #[tokio::test]
    async fn create_and_find_by_email_is_case_insensitive() {
        let repo = repo().await;
        let created = repo.create(sample("Asha@Example.com")).await.unwrap();
        assert_eq!(created.email, "asha@example.com");

        let found = repo.find_by_email("ASHA@example.COM").await.unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn duplicate_email_rejected() {
        let repo = repo().await;
        repo.create(sample("a@b.com")).await.unwrap();
        let err = repo.create(sample("A@B.com")).await.unwrap_err();
        assert!(matches!(err, RepoError::Duplicate(_)));
    }

    #[tokio::test]
    async fn set_active_toggles() {
        let repo = repo().await;
        let user = repo.create(sample("a@b.com")).await.unwrap();
        let updated = repo.set_active(&user.id_string(), false).await.unwrap();
        assert!(!updated.is_active);
    }
}
