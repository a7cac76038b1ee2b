use std::sync::{Arc, Mutex};

use tracing::{error, info};

use crate::application::use_cases::csv_ingestion::CsvIngestionUseCase;
use crate::application::use_cases::report::ReportUseCase;
use crate::domain::error::{AppError, Result};
use crate::infrastructure::config::{AppConfig, StorageBackend};
use crate::infrastructure::db::{HistoryStore, InMemoryHistoryStore, SqliteHistoryStore};
use crate::infrastructure::storage::ensure_parent_dir;
use crate::interfaces::http::{HttpState, LogEntry};

/// Open the configured history store.
pub async fn open_history_store(config: &AppConfig) -> Result<Arc<dyn HistoryStore>> {
    match config.storage {
        StorageBackend::Memory => {
            info!("Using in-memory upload history");
            Ok(Arc::new(InMemoryHistoryStore::new()))
        }
        StorageBackend::Sqlite => {
            if let Some(path) = SqliteHistoryStore::database_path(&config.database_url) {
                ensure_parent_dir(&path).map_err(|err| {
                    error!(error = %err, path = %path.display(), "Failed to create database dir");
                    AppError::from(err)
                })?;
            }

            let store = SqliteHistoryStore::connect(&config.database_url)
                .await
                .map_err(|err| {
                    error!(error = %err, database_url = %config.database_url, "Failed to open history DB");
                    err
                })?;
            info!(database_url = %config.database_url, "Opened upload history");
            Ok(Arc::new(store))
        }
    }
}

/// Wire use cases around a history store.
pub fn build_state(config: &AppConfig, history: Arc<dyn HistoryStore>) -> HttpState {
    let logs: Arc<Mutex<Vec<LogEntry>>> = Arc::new(Mutex::new(Vec::new()));

    HttpState {
        ingestion: CsvIngestionUseCase::new(history.clone()),
        reports: ReportUseCase::new(history.clone()),
        history,
        logs,
        max_upload_bytes: config.max_upload_bytes,
    }
}

pub async fn setup(config: &AppConfig) -> Result<HttpState> {
    let history = open_history_store(config).await?;
    Ok(build_state(config, history))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_backend_setup() {
        let config = AppConfig {
            storage: StorageBackend::Memory,
            ..AppConfig::default()
        };
        let state = setup(&config).await.unwrap();
        assert_eq!(state.history.count().await.unwrap(), 0);
        assert_eq!(state.max_upload_bytes, config.max_upload_bytes);
    }

    #[tokio::test]
    async fn test_sqlite_backend_creates_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("history.db");
        let config = AppConfig {
            database_url: format!("sqlite://{}", db_path.display()),
            ..AppConfig::default()
        };

        let state = setup(&config).await.unwrap();

        assert!(db_path.exists());
        assert!(state.history.latest().await.unwrap().is_none());
    }
}
