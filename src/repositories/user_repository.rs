use crate::models::user::User;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::SqlitePool;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("User not found")]
    NotFound,
    #[error("User already exists")]
    AlreadyExists,
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Render a timestamp in the fixed-width RFC 3339 form used throughout the
/// users table. Fixed width keeps `expires > now` comparisons valid as
/// plain string comparisons in SQL.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait UserRepository: Send + Sync {
    /// Persist a new unverified user with its verification challenge in a
    /// single insert.
    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        verification_token: &str,
        verification_expires: &str,
    ) -> RepositoryResult<User>;

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>>;

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<User>>;

    /// Match an unconsumed verification challenge that has not yet expired.
    /// Expired challenges are simply never matched; there is no sweeper.
    async fn find_by_active_verification_token(
        &self,
        token: &str,
    ) -> RepositoryResult<Option<User>>;

    /// Same lazy-expiry lookup for the password-reset challenge.
    async fn find_by_active_reset_token(&self, token: &str) -> RepositoryResult<Option<User>>;

    /// Flip the account to verified and clear both verification columns in
    /// the same update.
    async fn mark_verified(&self, id: i64) -> RepositoryResult<()>;

    async fn touch_last_login(&self, id: i64) -> RepositoryResult<String>;

    /// Attach a reset challenge: token and expiry are written together.
    async fn set_reset_challenge(
        &self,
        id: i64,
        token: &str,
        expires: &str,
    ) -> RepositoryResult<()>;

    /// Replace the password hash and clear both reset columns in the same
    /// update.
    async fn replace_password(&self, id: i64, password_hash: &str) -> RepositoryResult<()>;
}

const USER_COLUMNS: &str = "id, email, password_hash, name, is_verified, last_login, \
     verification_token, verification_expires, reset_token, reset_expires, \
     created_at, updated_at";

pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        verification_token: &str,
        verification_expires: &str,
    ) -> RepositoryResult<User> {
        let now = now_timestamp();
        let sql = format!(
            "INSERT INTO users \
             (email, password_hash, name, is_verified, last_login, \
              verification_token, verification_expires, created_at, updated_at) \
             VALUES (?, ?, ?, 0, ?, ?, ?, ?, ?) \
             RETURNING {USER_COLUMNS}"
        );

        let result = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .bind(password_hash)
            .bind(name)
            .bind(&now)
            .bind(verification_token)
            .bind(verification_expires)
            .bind(&now)
            .bind(&now)
            .fetch_one(&self.pool)
            .await;

        match result {
            Ok(user) => Ok(user),
            Err(e) => {
                if e.to_string().contains("UNIQUE") {
                    Err(RepositoryError::AlreadyExists)
                } else {
                    Err(RepositoryError::Database(e))
                }
            }
        }
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_active_verification_token(
        &self,
        token: &str,
    ) -> RepositoryResult<Option<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE verification_token = ? AND verification_expires > ?"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(token)
            .bind(now_timestamp())
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_active_reset_token(&self, token: &str) -> RepositoryResult<Option<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE reset_token = ? AND reset_expires > ?"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(token)
            .bind(now_timestamp())
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn mark_verified(&self, id: i64) -> RepositoryResult<()> {
        let result = sqlx::query(
            "UPDATE users \
             SET is_verified = 1, verification_token = NULL, \
                 verification_expires = NULL, updated_at = ? \
             WHERE id = ?",
        )
        .bind(now_timestamp())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn touch_last_login(&self, id: i64) -> RepositoryResult<String> {
        let now = now_timestamp();
        let result = sqlx::query("UPDATE users SET last_login = ?, updated_at = ? WHERE id = ?")
            .bind(&now)
            .bind(&now)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(now)
    }

    async fn set_reset_challenge(
        &self,
        id: i64,
        token: &str,
        expires: &str,
    ) -> RepositoryResult<()> {
        let result = sqlx::query(
            "UPDATE users \
             SET reset_token = ?, reset_expires = ?, updated_at = ? \
             WHERE id = ?",
        )
        .bind(token)
        .bind(expires)
        .bind(now_timestamp())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn replace_password(&self, id: i64, password_hash: &str) -> RepositoryResult<()> {
        let result = sqlx::query(
            "UPDATE users \
             SET password_hash = ?, reset_token = NULL, reset_expires = NULL, \
                 updated_at = ? \
             WHERE id = ?",
        )
        .bind(password_hash)
        .bind(now_timestamp())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_are_fixed_width_and_ordered() {
        let early = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 1).unwrap();

        let a = format_timestamp(early);
        let b = format_timestamp(late);

        assert_eq!(a.len(), b.len());
        assert!(a < b);
    }
}
