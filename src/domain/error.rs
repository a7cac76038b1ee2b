use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("CSV file not provided")]
    MissingFile,
    #[error("Unable to read CSV: {0}")]
    CsvParse(String),
    #[error("Invalid CSV format: missing columns {missing:?}")]
    SchemaValidation {
        missing: Vec<String>,
        available: Vec<String>,
    },
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid upload: {0}")]
    InvalidUpload(String),
    #[error("Upload exceeds the {limit} byte limit")]
    PayloadTooLarge { limit: usize },
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Config error: {0}")]
    ConfigError(String),
    #[error("Internal error: {0}")]
    Internal(String),
    #[error("IO error: {0}")]
    IoError(String),
}

impl AppError {
    /// True for failures caused by the uploaded content rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppError::MissingFile
                | AppError::CsvParse(_)
                | AppError::SchemaValidation { .. }
                | AppError::NotFound(_)
                | AppError::InvalidUpload(_)
                | AppError::PayloadTooLarge { .. }
                | AppError::ValidationError(_)
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
