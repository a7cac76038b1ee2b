use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::Mutex;

use super::{millis_to_datetime, truncate_to_millis, HistoryStore, HISTORY_CAPACITY};
use crate::domain::equipment::{DatasetRecord, Summary};
use crate::domain::error::{AppError, Result};

const HISTORY_SCHEMA: &str = include_str!("../../resources/history/schema.sql");

pub struct SqliteHistoryStore {
    pool: SqlitePool,
    // Serializes insert+evict so concurrent uploads never overshoot capacity.
    write_lock: Mutex<()>,
}

impl SqliteHistoryStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to parse connection string: {e}"))
            })?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to connect history DB: {e}")))?;

        Self::with_pool(pool).await
    }

    /// Private in-memory database, mostly for tests.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| AppError::DatabaseError(format!("Failed to parse connection string: {e}")))?;

        // Every connection to `:memory:` is its own database; keep exactly one alive.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to open in-memory DB: {e}")))?;

        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self> {
        apply_schema(&pool).await?;
        Ok(Self {
            pool,
            write_lock: Mutex::new(()),
        })
    }

    /// File backing a `sqlite://` URL, if it names one.
    pub fn database_path(database_url: &str) -> Option<PathBuf> {
        if database_url.contains(":memory:") || database_url.contains("mode=memory") {
            return None;
        }
        let options = SqliteConnectOptions::from_str(database_url).ok()?;
        let path = options.get_filename();
        // sqlx names in-memory databases `file:sqlx-in-memory-N`
        if path.as_os_str().is_empty() || path.to_string_lossy().starts_with("file:sqlx-in-memory") {
            return None;
        }
        Some(path.to_path_buf())
    }
}

async fn apply_schema(pool: &SqlitePool) -> Result<()> {
    for statement in HISTORY_SCHEMA.split(';') {
        let stmt = statement.trim();
        if stmt.is_empty() {
            continue;
        }
        sqlx::query(stmt)
            .execute(pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to apply history schema: {e}")))?;
    }
    Ok(())
}

#[async_trait]
impl HistoryStore for SqliteHistoryStore {
    async fn insert_at(
        &self,
        filename: &str,
        summary: &Summary,
        uploaded_at: DateTime<Utc>,
    ) -> Result<DatasetRecord> {
        let uploaded_at = truncate_to_millis(uploaded_at);
        let summary_json = serde_json::to_string(summary)
            .map_err(|e| AppError::Internal(format!("Failed to encode summary: {e}")))?;

        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO datasets (filename, uploaded_at, summary) VALUES (?, ?, ?)",
        )
        .bind(filename)
        .bind(uploaded_at.timestamp_millis())
        .bind(&summary_json)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to insert dataset: {e}")))?;
        let id = result.last_insert_rowid();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM datasets")
            .fetch_one(&mut *tx)
            .await?;
        let excess = count - HISTORY_CAPACITY as i64;
        if excess > 0 {
            let evicted = sqlx::query(
                "DELETE FROM datasets WHERE id IN (
                    SELECT id FROM datasets ORDER BY uploaded_at ASC, id ASC LIMIT ?
                 )",
            )
            .bind(excess)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to evict datasets: {e}")))?;
            tracing::debug!(evicted = evicted.rows_affected(), "Evicted oldest datasets");
        }

        tx.commit().await?;

        Ok(DatasetRecord {
            id,
            filename: filename.to_string(),
            uploaded_at,
            summary: summary.clone(),
        })
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<DatasetRecord>> {
        let entities = sqlx::query_as::<_, DatasetEntity>(
            "SELECT id, filename, uploaded_at, summary
             FROM datasets ORDER BY uploaded_at DESC, id DESC LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to list datasets: {e}")))?;

        entities.into_iter().map(DatasetRecord::try_from).collect()
    }

    async fn count(&self) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM datasets")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }
}

#[derive(sqlx::FromRow)]
struct DatasetEntity {
    id: i64,
    filename: String,
    uploaded_at: i64,
    summary: String,
}

impl TryFrom<DatasetEntity> for DatasetRecord {
    type Error = AppError;

    fn try_from(entity: DatasetEntity) -> Result<Self> {
        let summary = serde_json::from_str(&entity.summary).map_err(|e| {
            AppError::DatabaseError(format!("Corrupt summary for dataset {}: {e}", entity.id))
        })?;
        Ok(Self {
            id: entity.id,
            filename: entity.filename,
            uploaded_at: millis_to_datetime(entity.uploaded_at)?,
            summary,
        })
    }
}
