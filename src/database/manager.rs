use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::database::models::RecordError;

/// Errors from the record and user stores
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Validation(#[from] RecordError),

    #[error("Stored row is inconsistent: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Idempotent schema statements, applied in order at startup.
const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS financial_records (
        seq BIGSERIAL UNIQUE,
        id UUID PRIMARY KEY,
        user_id UUID NOT NULL REFERENCES users (id),
        record_type TEXT NOT NULL CHECK (record_type IN ('INVOICE', 'BALANCE', 'TRANSACTION')),
        amount NUMERIC,
        payee TEXT,
        purpose TEXT,
        due_date DATE,
        balance_amount NUMERIC,
        file_name TEXT,
        uploaded_at TIMESTAMPTZ NOT NULL,
        metadata JSONB NOT NULL DEFAULT '{}'::jsonb,
        CHECK (record_type = 'BALANCE' OR amount IS NOT NULL),
        CHECK (record_type <> 'BALANCE' OR balance_amount IS NOT NULL),
        CHECK (record_type <> 'INVOICE' OR (payee IS NOT NULL AND purpose IS NOT NULL AND due_date IS NOT NULL))
    )
    "#,
    "CREATE INDEX IF NOT EXISTS financial_records_user_type_idx ON financial_records (user_id, record_type)",
    "CREATE INDEX IF NOT EXISTS financial_records_user_uploaded_idx ON financial_records (user_id, uploaded_at DESC)",
];

/// Connection pool setup and schema management for PostgreSQL
pub struct DatabaseManager;

impl DatabaseManager {
    /// Open a pool using the configured URL and limits
    pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let url = config
            .url
            .as_deref()
            .ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        info!(
            "Created database pool (max {} connections)",
            config.max_connections
        );
        Ok(pool)
    }

    /// Create tables and indexes that do not exist yet
    pub async fn migrate(pool: &PgPool) -> Result<(), DatabaseError> {
        for statement in MIGRATIONS {
            sqlx::query(statement).execute(pool).await?;
        }
        info!("Applied {} schema statements", MIGRATIONS.len());
        Ok(())
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_without_url_reports_missing_config() {
        let config = DatabaseConfig {
            url: None,
            max_connections: 1,
            connection_timeout: 1,
        };

        let result = DatabaseManager::connect(&config).await;

        assert!(matches!(result, Err(DatabaseError::ConfigMissing("DATABASE_URL"))));
    }

    #[test]
    fn migrations_are_idempotent_statements() {
        for statement in MIGRATIONS {
            assert!(
                statement.contains("IF NOT EXISTS"),
                "statement must be safe to re-run: {}",
                statement
            );
        }
    }
}
