use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};

use crate::domain::error::AppError;

/// JSON body returned for every failed request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing_columns: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_columns: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorPayload {
    fn message(error: &str) -> Self {
        Self {
            error: error.to_string(),
            missing_columns: None,
            available_columns: None,
            details: None,
        }
    }

    fn with_details(error: &str, details: impl Into<String>) -> Self {
        Self {
            details: Some(details.into()),
            ..Self::message(error)
        }
    }
}

impl From<&AppError> for ErrorPayload {
    fn from(err: &AppError) -> Self {
        match err {
            AppError::MissingFile => Self::message("CSV file not provided"),
            AppError::CsvParse(details) => Self::with_details("Unable to read CSV", details.clone()),
            AppError::SchemaValidation { missing, available } => Self {
                missing_columns: Some(missing.clone()),
                available_columns: Some(available.clone()),
                ..Self::message("Invalid CSV format")
            },
            AppError::NotFound(_) => Self::message("No data available"),
            AppError::InvalidUpload(details) => Self::with_details("Invalid upload", details.clone()),
            AppError::PayloadTooLarge { .. } => Self::with_details("Upload too large", err.to_string()),
            AppError::ValidationError(details) => Self::with_details("Invalid request", details.clone()),
            // Server-side causes are logged, never echoed
            _ => Self::message("Internal server error"),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingFile
            | AppError::CsvParse(_)
            | AppError::SchemaValidation { .. }
            | AppError::InvalidUpload(_)
            | AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if !self.is_client_error() {
            tracing::error!(error = %self, "Request failed");
        }
        HttpResponse::build(self.status_code()).json(ErrorPayload::from(self))
    }
}
