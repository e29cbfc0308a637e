use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::models::OtpRecord;

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),
}

/// Storage for issued one-time passcodes
#[async_trait]
pub trait OtpStore: Send + Sync {
    /// Store a freshly issued code
    async fn insert_otp(
        &self,
        email: &str,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Uuid, PostgresError>;

    /// Newest code matching (email, code) that has not expired at `now`
    async fn find_valid_otp(
        &self,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<OtpRecord>, PostgresError>;

    /// Consume a code
    async fn delete_otp(&self, id: Uuid) -> Result<bool, PostgresError>;

    /// Remove every code that expired before `now`
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, PostgresError>;

    async fn health_check(&self) -> Result<bool, PostgresError>;
}

/// PostgreSQL client for one-time passcodes
///
/// Codes are keyed by email and carry their own expiry. A verified code is
/// deleted, and expired rows are purged whenever a new code is issued.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(600))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
    ) -> Result<Self, PostgresError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
        )
        .await
    }
}

#[async_trait]
impl OtpStore for PostgresClient {
    async fn insert_otp(
        &self,
        email: &str,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Uuid, PostgresError> {
        let query = r#"
            INSERT INTO otps (id, email, code, expires_at, created_at)
            VALUES ($1, $2, $3, $4, NOW())
        "#;

        let id = Uuid::new_v4();
        sqlx::query(query)
            .bind(id)
            .bind(email)
            .bind(code)
            .bind(expires_at)
            .execute(&self.pool)
            .await?;

        tracing::debug!("Stored passcode {} for {} (expires {})", id, email, expires_at);

        Ok(id)
    }

    async fn find_valid_otp(
        &self,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<OtpRecord>, PostgresError> {
        let query = r#"
            SELECT id, email, code, expires_at, created_at
            FROM otps
            WHERE email = $1 AND code = $2 AND expires_at > $3
            ORDER BY created_at DESC
            LIMIT 1
        "#;

        let row = sqlx::query(query)
            .bind(email)
            .bind(code)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| OtpRecord {
            id: row.get("id"),
            email: row.get("email"),
            code: row.get("code"),
            expires_at: row.get("expires_at"),
            created_at: row.get("created_at"),
        }))
    }

    async fn delete_otp(&self, id: Uuid) -> Result<bool, PostgresError> {
        let result = sqlx::query("DELETE FROM otps WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, PostgresError> {
        let result = sqlx::query("DELETE FROM otps WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() > 0 {
            tracing::debug!("Purged {} expired passcodes", result.rows_affected());
        }

        Ok(result.rows_affected())
    }

    async fn health_check(&self) -> Result<bool, PostgresError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}
