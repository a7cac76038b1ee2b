use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Summary;

/// A stored upload: filename, upload time and its summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRecord {
    /// Insertion sequence, strictly increasing across the store's lifetime.
    pub id: i64,
    pub filename: String,
    pub uploaded_at: DateTime<Utc>,
    pub summary: Summary,
}
