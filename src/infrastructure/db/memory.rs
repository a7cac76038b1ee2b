use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Mutex, MutexGuard};

use super::{truncate_to_millis, HistoryStore, HISTORY_CAPACITY};
use crate::domain::equipment::{DatasetRecord, Summary};
use crate::domain::error::{AppError, Result};

/// Process-local history, lost on restart.
#[derive(Default)]
pub struct InMemoryHistoryStore {
    state: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    next_id: i64,
    records: Vec<DatasetRecord>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| AppError::Internal("History store lock poisoned".to_string()))
    }
}

fn sort_key(record: &DatasetRecord) -> (DateTime<Utc>, i64) {
    (record.uploaded_at, record.id)
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn insert_at(
        &self,
        filename: &str,
        summary: &Summary,
        uploaded_at: DateTime<Utc>,
    ) -> Result<DatasetRecord> {
        let mut state = self.lock()?;
        state.next_id += 1;
        let record = DatasetRecord {
            id: state.next_id,
            filename: filename.to_string(),
            uploaded_at: truncate_to_millis(uploaded_at),
            summary: summary.clone(),
        };
        state.records.push(record.clone());

        while state.records.len() > HISTORY_CAPACITY {
            let oldest = state
                .records
                .iter()
                .enumerate()
                .min_by_key(|(_, r)| sort_key(r))
                .map(|(position, _)| position);
            match oldest {
                Some(position) => {
                    state.records.remove(position);
                }
                None => break,
            }
        }

        Ok(record)
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<DatasetRecord>> {
        let state = self.lock()?;
        let mut records = state.records.clone();
        records.sort_by_key(|r| std::cmp::Reverse(sort_key(r)));
        records.truncate(limit);
        Ok(records)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.lock()?.records.len())
    }
}
