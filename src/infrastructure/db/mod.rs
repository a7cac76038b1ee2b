pub mod history;
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use crate::domain::equipment::{DatasetRecord, Summary};
use crate::domain::error::{AppError, Result};

pub use history::SqliteHistoryStore;
pub use memory::InMemoryHistoryStore;

/// Number of uploads kept; inserting beyond this evicts the oldest.
pub const HISTORY_CAPACITY: usize = 5;

/// Bounded upload history.
///
/// Insert and eviction happen as one atomic step. Records are ordered by
/// `(uploaded_at, id)`, so uploads sharing a timestamp are evicted in
/// insertion order.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Store a summary stamped with `uploaded_at` and evict past capacity.
    async fn insert_at(
        &self,
        filename: &str,
        summary: &Summary,
        uploaded_at: DateTime<Utc>,
    ) -> Result<DatasetRecord>;

    /// Store a summary stamped with the current time.
    async fn insert(&self, filename: &str, summary: &Summary) -> Result<DatasetRecord> {
        self.insert_at(filename, summary, Utc::now()).await
    }

    /// Up to `limit` records, newest first.
    async fn list_recent(&self, limit: usize) -> Result<Vec<DatasetRecord>>;

    async fn latest(&self) -> Result<Option<DatasetRecord>> {
        Ok(self.list_recent(1).await?.into_iter().next())
    }

    async fn count(&self) -> Result<usize>;
}

/// Timestamps are stored as epoch milliseconds.
pub(crate) fn truncate_to_millis(ts: DateTime<Utc>) -> DateTime<Utc> {
    millis_to_datetime(ts.timestamp_millis()).unwrap_or(ts)
}

pub(crate) fn millis_to_datetime(millis: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| AppError::DatabaseError(format!("Invalid stored timestamp: {}", millis)))
}
