use std::sync::Arc;

use crate::domain::equipment::DatasetRecord;
use crate::domain::error::Result;
use crate::infrastructure::db::HistoryStore;
use crate::infrastructure::pdf::ReportRenderer;

/// PDF bytes for the newest stored upload.
pub struct RenderedReport {
    pub source: DatasetRecord,
    pub pdf: Vec<u8>,
}

pub struct ReportUseCase {
    history: Arc<dyn HistoryStore>,
    renderer: ReportRenderer,
}

impl ReportUseCase {
    pub fn new(history: Arc<dyn HistoryStore>) -> Self {
        Self {
            history,
            renderer: ReportRenderer::new(),
        }
    }

    /// `None` when nothing has been uploaded yet.
    pub async fn latest_report(&self) -> Result<Option<RenderedReport>> {
        let Some(latest) = self.history.latest().await? else {
            tracing::info!("Report requested with empty history");
            return Ok(None);
        };

        let pdf = self.renderer.render(&latest.summary)?;
        tracing::info!(dataset_id = latest.id, bytes = pdf.len(), "Rendered report");
        Ok(Some(RenderedReport {
            source: latest,
            pdf,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::equipment::{Summary, TypeDistribution};
    use crate::infrastructure::db::InMemoryHistoryStore;

    #[tokio::test]
    async fn test_empty_history_yields_no_report() {
        let use_case = ReportUseCase::new(Arc::new(InMemoryHistoryStore::new()));
        assert!(use_case.latest_report().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_report_uses_latest_upload() {
        let store = Arc::new(InMemoryHistoryStore::new());
        let summary = |total| Summary {
            total_equipment: total,
            avg_flowrate: None,
            avg_pressure: None,
            avg_temperature: None,
            type_distribution: TypeDistribution::new(),
        };
        store.insert("a.csv", &summary(1)).await.unwrap();
        store.insert("b.csv", &summary(2)).await.unwrap();

        let use_case = ReportUseCase::new(store);
        let report = use_case.latest_report().await.unwrap().unwrap();

        assert_eq!(report.source.filename, "b.csv");
        assert!(report.pdf.starts_with(b"%PDF"));
    }
}
