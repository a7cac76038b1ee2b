// ============================================================
// CSV INGESTION USE CASE
// ============================================================
// Parse, validate, coerce and summarize an upload, then record it

use std::sync::Arc;
use std::time::Instant;

use super::numeric_coercion::coerce_table;
use super::schema_validator::validate_columns;
use super::summary_aggregator::summarize;
use crate::domain::equipment::{DatasetRecord, Summary};
use crate::domain::error::Result;
use crate::infrastructure::csv::CsvParser;
use crate::infrastructure::db::HistoryStore;

/// CSV ingestion use case
pub struct CsvIngestionUseCase {
    parser: CsvParser,
    history: Arc<dyn HistoryStore>,
}

impl CsvIngestionUseCase {
    pub fn new(history: Arc<dyn HistoryStore>) -> Self {
        Self {
            parser: CsvParser::new(),
            history,
        }
    }

    /// Summarize raw upload bytes without storing anything
    pub fn summarize_bytes(&self, bytes: &[u8]) -> Result<Summary> {
        let table = self.parser.parse_bytes(bytes)?;
        let columns = validate_columns(&table)?;
        let coerced = coerce_table(&table, &columns);
        Ok(summarize(&coerced))
    }

    /// Summarize an upload and append it to the bounded history
    pub async fn ingest(&self, filename: &str, bytes: &[u8]) -> Result<DatasetRecord> {
        let start = Instant::now();

        let summary = self.summarize_bytes(bytes).map_err(|err| {
            tracing::warn!(filename, error = %err, "Rejected CSV upload");
            err
        })?;

        let record = self.history.insert(filename, &summary).await?;

        tracing::info!(
            filename,
            dataset_id = record.id,
            total_equipment = summary.total_equipment,
            types = summary.type_distribution.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Ingested CSV upload"
        );

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::AppError;
    use crate::infrastructure::db::InMemoryHistoryStore;

    fn use_case() -> (CsvIngestionUseCase, Arc<InMemoryHistoryStore>) {
        let store = Arc::new(InMemoryHistoryStore::new());
        (CsvIngestionUseCase::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_ingest_scenario() {
        let (use_case, store) = use_case();
        let csv = b"Flowrate,Pressure,Temperature,Type\n10,5,20,Pump\n20,7,22,Valve\n";

        let record = use_case.ingest("plant.csv", csv).await.unwrap();

        assert_eq!(record.filename, "plant.csv");
        assert_eq!(record.summary.total_equipment, 2);
        assert_eq!(record.summary.avg_flowrate, Some(15.0));
        let types: Vec<_> = record.summary.type_distribution.iter().collect();
        assert_eq!(types, [("Pump", 1), ("Valve", 1)]);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_rejected_upload_is_not_stored() {
        let (use_case, store) = use_case();
        let csv = b"Flowrate,Pressure,Temperature\n1,2,3\n";

        let err = use_case.ingest("bad.csv", csv).await.unwrap_err();

        assert!(matches!(err, AppError::SchemaValidation { .. }));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[test]
    fn test_bad_cells_do_not_block_ingestion() {
        let (use_case, _) = use_case();
        let csv = b"Type;Flowrate;Pressure;Temperature\nPump;abc;1;x\nPump;;3;y\nValve;2;;z\n";

        let summary = use_case.summarize_bytes(csv).unwrap();

        assert_eq!(summary.total_equipment, 3);
        assert_eq!(summary.avg_flowrate, Some(2.0));
        assert_eq!(summary.avg_pressure, Some(2.0));
        assert_eq!(summary.avg_temperature, None);
        assert_eq!(summary.type_distribution.get("Pump"), Some(2));
    }

    #[test]
    fn test_unreadable_upload_is_a_parse_error() {
        let (use_case, _) = use_case();
        let err = use_case.summarize_bytes(b"").unwrap_err();
        assert!(matches!(err, AppError::CsvParse(_)));
    }
}
