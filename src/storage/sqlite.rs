use anyhow::{Context, Result};
use sqlx::{Row, SqlitePool};

use super::MIGRATION_001_INITIAL;
use super::scan::BufferedScan;
use super::store::{KeyValue, KeyValueStore, StoreError};

/// Ledger state persisted in a single SQLite table.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a new store with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect_url(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Connect to an existing database file.
    pub async fn connect(database_path: &str) -> Result<Self> {
        Self::connect_url(&format!("sqlite:{}", database_path)).await
    }

    /// Initialize a database file, creating it if needed (connect + migrate).
    pub async fn init(database_path: &str) -> Result<Self> {
        let store = Self::connect_url(&format!("sqlite:{}?mode=rwc", database_path)).await?;
        store.migrate().await?;
        Ok(store)
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Number of stored entries, across all keys.
    pub async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as total FROM ledger_state")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count ledger entries")?;
        Ok(row.get("total"))
    }
}

impl KeyValueStore for SqliteStore {
    type Scan = BufferedScan;

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let row = sqlx::query("SELECT value FROM ledger_state WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|row| row.get("value")))
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO ledger_state (key, value)
            VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn range_query(&self, start: &str, end: &str) -> Result<BufferedScan, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT key, value
            FROM ledger_state
            WHERE key >= ? AND key < ?
            ORDER BY key
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        let entries = rows
            .iter()
            .map(|row| KeyValue::new(row.get::<String, _>("key"), row.get::<Vec<u8>, _>("value")))
            .collect();
        Ok(BufferedScan::new(entries))
    }
}
