// ============================================================
// EQUIPMENT DOMAIN LAYER
// ============================================================
// Core types for uploaded equipment tables and their summaries
// No I/O, no async

mod dataset_record;
mod summary;
mod uploaded_table;

pub use dataset_record::DatasetRecord;
pub use summary::{Summary, TypeDistribution};
pub use uploaded_table::{is_missing_token, Cell, CoercedTable, UploadedTable, MISSING_VALUE_TOKENS};

/// Column names every upload must carry (exact case).
pub const FLOWRATE: &str = "Flowrate";
pub const PRESSURE: &str = "Pressure";
pub const TEMPERATURE: &str = "Temperature";
pub const TYPE: &str = "Type";

pub const REQUIRED_COLUMNS: [&str; 4] = [FLOWRATE, PRESSURE, TEMPERATURE, TYPE];
