pub mod csv_ingestion;
pub mod numeric_coercion;
pub mod report;
pub mod schema_validator;
pub mod summary_aggregator;
