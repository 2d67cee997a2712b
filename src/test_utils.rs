pub mod test_helpers {
    use chrono::{Duration, Utc};
    use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
    use tempfile::NamedTempFile;

    use crate::repositories::user_repository::format_timestamp;

    /// Create a new in-memory SQLite database for testing
    pub async fn create_test_db() -> Result<SqlitePool, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await?;

        // Run migrations
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(pool)
    }

    /// Create a temporary file-based SQLite database for testing
    /// Useful when you need to test features that don't work with in-memory databases
    pub async fn create_test_db_file() -> Result<(SqlitePool, NamedTempFile), sqlx::Error> {
        let temp_file = NamedTempFile::new().map_err(sqlx::Error::Io)?;
        let db_path = temp_file
            .path()
            .to_str()
            .ok_or_else(|| sqlx::Error::Configuration("Invalid database path".into()))?;
        let database_url = format!("sqlite://{}", db_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(&database_url)
            .await?;

        // Run migrations
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok((pool, temp_file))
    }

    /// Insert a user directly, bypassing the signup flow. Used to seed
    /// accounts in a known state.
    pub async fn insert_test_user(
        pool: &SqlitePool,
        name: &str,
        email: &str,
        password: &str,
        verified: bool,
    ) -> Result<i64, sqlx::Error> {
        use argon2::{
            password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
            Argon2,
        };

        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let password_hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| {
                sqlx::Error::Configuration(format!("Password hashing failed: {}", e).into())
            })?
            .to_string();

        let now = format_timestamp(Utc::now());
        let result = sqlx::query(
            "INSERT INTO users \
             (email, password_hash, name, is_verified, last_login, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(email)
        .bind(password_hash)
        .bind(name)
        .bind(verified)
        .bind(&now)
        .bind(&now)
        .bind(&now)
        .execute(pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Rewind a pending verification challenge so the stored code still
    /// matches but its expiry is in the past.
    pub async fn expire_verification_challenge(
        pool: &SqlitePool,
        email: &str,
    ) -> Result<(), sqlx::Error> {
        let past = format_timestamp(Utc::now() - Duration::hours(1));
        sqlx::query("UPDATE users SET verification_expires = ? WHERE email = ?")
            .bind(past)
            .bind(email)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Same rewind for a pending reset challenge.
    pub async fn expire_reset_challenge(
        pool: &SqlitePool,
        email: &str,
    ) -> Result<(), sqlx::Error> {
        let past = format_timestamp(Utc::now() - Duration::hours(1));
        sqlx::query("UPDATE users SET reset_expires = ? WHERE email = ?")
            .bind(past)
            .bind(email)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn count_users_with_email(
        pool: &SqlitePool,
        email: &str,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE email = ?")
            .bind(email)
            .fetch_one(pool)
            .await
    }
}
