pub mod use_cases;

pub use use_cases::csv_ingestion::CsvIngestionUseCase;
pub use use_cases::report::ReportUseCase;
