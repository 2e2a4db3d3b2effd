use super::DBClient;
use crate::models::User;
use chrono::Utc;

const USER_COLUMNS: &str = "id, username, email, password, is_admin, created_at";

pub trait UserExt {
    async fn get_user_by_id(&self, user_id: i64) -> Result<Option<User>, sqlx::Error>;

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error>;

    async fn save_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, sqlx::Error>;

    async fn user_count(&self) -> Result<i64, sqlx::Error>;

    /// Create the default admin account when the username is free. Called on
    /// startup so a fresh database is immediately usable.
    async fn ensure_admin_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<Option<User>, sqlx::Error>;
}

impl UserExt for DBClient {
    async fn get_user_by_id(&self, user_id: i64) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ?1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
    }

    async fn save_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username, email, password, is_admin, created_at) \
             VALUES (?1, ?2, ?3, 1, ?4) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
    }

    async fn user_count(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
    }

    async fn ensure_admin_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        if self.get_user_by_username(username).await?.is_some() {
            return Ok(None);
        }

        let user = self.save_user(username, email, password_hash).await?;
        Ok(Some(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_in_memory;

    #[tokio::test]
    async fn seed_creates_the_admin_only_once() {
        let client = connect_in_memory().await;

        let first = client
            .ensure_admin_user("admin", "admin@example.com", "hash")
            .await
            .unwrap();
        assert!(first.is_some());

        let second = client
            .ensure_admin_user("admin", "admin@example.com", "hash")
            .await
            .unwrap();
        assert!(second.is_none());
        assert_eq!(client.user_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn lookup_by_username_and_id_agree() {
        let client = connect_in_memory().await;
        let saved = client
            .save_user("admin", "admin@example.com", "hash")
            .await
            .unwrap();

        let by_name = client
            .get_user_by_username("admin")
            .await
            .unwrap()
            .unwrap();
        let by_id = client.get_user_by_id(saved.id).await.unwrap().unwrap();
        assert_eq!(by_name.id, by_id.id);
        assert!(by_id.is_admin);
    }
}
