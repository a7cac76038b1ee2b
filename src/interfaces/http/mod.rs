mod error;

pub use error::ErrorPayload;

use crate::application::use_cases::csv_ingestion::CsvIngestionUseCase;
use crate::application::use_cases::report::ReportUseCase;
use crate::domain::equipment::{DatasetRecord, Summary};
use crate::domain::error::{AppError, Result};
use crate::infrastructure::db::{HistoryStore, HISTORY_CAPACITY};
use crate::infrastructure::pdf::REPORT_FILENAME;
use actix_cors::Cors;
use actix_multipart::Multipart;
use actix_web::http::header::ContentDisposition;
use actix_web::middleware::NormalizePath;
use actix_web::{
    dev::Server, get, mime, post, web, App, HttpMessage, HttpRequest, HttpResponse, HttpServer,
};
use chrono::{DateTime, Local, Utc};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

const MAX_LOG_ENTRIES: usize = 100;
const UPLOAD_FIELD: &str = "file";
const DEFAULT_UPLOAD_NAME: &str = "upload.csv";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub source: String,
    pub message: String,
}

pub struct HttpState {
    pub ingestion: CsvIngestionUseCase,
    pub reports: ReportUseCase,
    pub history: Arc<dyn HistoryStore>,
    pub logs: Arc<Mutex<Vec<LogEntry>>>,
    pub max_upload_bytes: usize,
}

/// One stored upload as listed by `/api/history/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub filename: String,
    pub uploaded_at: DateTime<Utc>,
    pub summary: Summary,
}

impl From<DatasetRecord> for HistoryEntry {
    fn from(record: DatasetRecord) -> Self {
        Self {
            filename: record.filename,
            uploaded_at: record.uploaded_at,
            summary: record.summary,
        }
    }
}

#[post("/upload")]
async fn upload(
    data: web::Data<HttpState>,
    req: HttpRequest,
    payload: Multipart,
) -> Result<HttpResponse> {
    let (filename, bytes) = read_upload(&req, payload, data.max_upload_bytes)
        .await
        .inspect_err(|e| add_log(&data.logs, "WARN", "Upload", &format!("Upload rejected: {}", e)))?;

    add_log(
        &data.logs,
        "INFO",
        "Upload",
        &format!("Received {} ({} bytes)", filename, bytes.len()),
    );

    match data.ingestion.ingest(&filename, &bytes).await {
        Ok(record) => {
            add_log(
                &data.logs,
                "INFO",
                "Upload",
                &format!(
                    "Stored {} with {} equipment rows",
                    record.filename, record.summary.total_equipment
                ),
            );
            Ok(HttpResponse::Created().json(record.summary))
        }
        Err(e) => {
            add_log(
                &data.logs,
                "ERROR",
                "Upload",
                &format!("Ingestion of {} failed: {}", filename, e),
            );
            Err(e)
        }
    }
}

#[get("/history")]
async fn history(data: web::Data<HttpState>) -> Result<HttpResponse> {
    let records = data.history.list_recent(HISTORY_CAPACITY).await?;
    if records.is_empty() {
        return Err(AppError::NotFound("No uploads recorded".to_string()));
    }

    let entries: Vec<HistoryEntry> = records.into_iter().map(HistoryEntry::from).collect();
    Ok(HttpResponse::Ok().json(entries))
}

#[get("/report")]
async fn report(data: web::Data<HttpState>) -> Result<HttpResponse> {
    let Some(report) = data.reports.latest_report().await? else {
        return Err(AppError::NotFound("No uploads recorded".to_string()));
    };

    add_log(
        &data.logs,
        "INFO",
        "Report",
        &format!("Rendered report for {}", report.source.filename),
    );

    Ok(HttpResponse::Ok()
        .content_type("application/pdf")
        .insert_header(ContentDisposition::attachment(REPORT_FILENAME))
        .body(report.pdf))
}

#[get("/logs")]
async fn get_logs(data: web::Data<HttpState>) -> Result<HttpResponse> {
    let logs = data
        .logs
        .lock()
        .map_err(|_| AppError::Internal("Log buffer lock poisoned".to_string()))?;
    Ok(HttpResponse::Ok().json(&*logs))
}

/// Pull the `file` field out of a multipart body, enforcing the size limit.
async fn read_upload(
    req: &HttpRequest,
    mut payload: Multipart,
    limit: usize,
) -> Result<(String, Vec<u8>)> {
    let is_multipart = req
        .mime_type()
        .ok()
        .flatten()
        .map(|mime| mime.type_() == mime::MULTIPART && mime.subtype() == mime::FORM_DATA)
        .unwrap_or(false);
    if !is_multipart {
        return Err(AppError::MissingFile);
    }

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| AppError::InvalidUpload(e.to_string()))?;

        if field.name() != Some(UPLOAD_FIELD) {
            while let Some(chunk) = field.next().await {
                chunk.map_err(|e| AppError::InvalidUpload(e.to_string()))?;
            }
            continue;
        }

        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_UPLOAD_NAME)
            .to_string();

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| AppError::InvalidUpload(e.to_string()))?;
            if bytes.len() + chunk.len() > limit {
                return Err(AppError::PayloadTooLarge { limit });
            }
            bytes.extend_from_slice(&chunk);
        }
        return Ok((filename, bytes));
    }

    Err(AppError::MissingFile)
}

pub fn add_log_entry(
    logs: &Mutex<Vec<LogEntry>>,
    level: &str,
    source: &str,
    message: &str,
) -> LogEntry {
    let entry = LogEntry {
        time: Local::now().format("%H:%M:%S").to_string(),
        level: level.to_string(),
        source: source.to_string(),
        message: message.to_string(),
    };

    match level {
        "ERROR" => tracing::error!(source, "{}", message),
        "WARN" => tracing::warn!(source, "{}", message),
        _ => tracing::info!(source, "{}", message),
    }

    // A poisoned buffer only loses the in-memory copy; tracing already has it.
    if let Ok(mut logs) = logs.lock() {
        logs.push(entry.clone());
        if logs.len() > MAX_LOG_ENTRIES {
            logs.remove(0);
        }
    }
    entry
}

pub fn add_log(logs: &Mutex<Vec<LogEntry>>, level: &str, source: &str, message: &str) {
    add_log_entry(logs, level, source, message);
}

/// Route table shared by the server and tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(upload)
            .service(history)
            .service(report)
            .service(get_logs),
    );
}

pub fn start_server(state: HttpState, host: &str, port: u16) -> std::io::Result<Server> {
    let state = web::Data::new(state);

    let server = HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(NormalizePath::trim())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((host, port))?
    .run();

    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::AppConfig;
    use crate::infrastructure::db::InMemoryHistoryStore;
    use actix_web::http::{header, StatusCode};
    use actix_web::test as actix_test;

    const BOUNDARY: &str = "chemvizboundary";
    const VALID_CSV: &str = "Flowrate,Pressure,Temperature,Type\n10,5,20,Pump\n20,7,22,Valve\n";

    fn state_with_limit(limit: usize) -> web::Data<HttpState> {
        let config = AppConfig {
            max_upload_bytes: limit,
            ..AppConfig::default()
        };
        web::Data::new(crate::infrastructure::bootstrap::build_state(
            &config,
            Arc::new(InMemoryHistoryStore::new()),
        ))
    }

    fn multipart_body(field: &str, filename: &str, content: &str) -> String {
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: text/csv\r\n\r\n{content}\r\n--{BOUNDARY}--\r\n"
        )
    }

    fn upload_request(field: &str, filename: &str, content: &str) -> actix_test::TestRequest {
        actix_test::TestRequest::post()
            .uri("/api/upload/")
            .insert_header((
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            ))
            .set_payload(multipart_body(field, filename, content))
    }

    macro_rules! app {
        ($state:expr) => {
            actix_test::init_service(
                App::new()
                    .wrap(NormalizePath::trim())
                    .app_data($state.clone())
                    .configure(configure),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_upload_returns_created_summary() {
        let state = state_with_limit(1024);
        let app = app!(state);

        let resp = actix_test::call_service(&app, upload_request("file", "plant.csv", VALID_CSV).to_request()).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let summary: Summary = actix_test::read_body_json(resp).await;
        assert_eq!(summary.total_equipment, 2);
        assert_eq!(summary.avg_flowrate, Some(15.0));
        assert_eq!(summary.type_distribution.get("Valve"), Some(1));
        assert_eq!(state.history.count().await.unwrap(), 1);
    }

    #[actix_web::test]
    async fn test_upload_without_file_field() {
        let state = state_with_limit(1024);
        let app = app!(state);

        let resp = actix_test::call_service(&app, upload_request("other", "x.csv", VALID_CSV).to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let payload: ErrorPayload = actix_test::read_body_json(resp).await;
        assert_eq!(payload.error, "CSV file not provided");

        let resp = actix_test::call_service(&app, actix_test::TestRequest::post().uri("/api/upload").to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_upload_content_type_is_case_insensitive() {
        let state = state_with_limit(1024);
        let app = app!(state);

        let req = upload_request("file", "plant.csv", VALID_CSV)
            .insert_header((
                header::CONTENT_TYPE,
                format!("Multipart/Form-Data; boundary={BOUNDARY}"),
            ))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let req = upload_request("file", "plant.csv", VALID_CSV)
            .insert_header((header::CONTENT_TYPE, "text/csv"))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_upload_missing_column() {
        let state = state_with_limit(1024);
        let app = app!(state);
        let csv = "Flowrate,Pressure,Temperature\n1,2,3\n";

        let resp = actix_test::call_service(&app, upload_request("file", "bad.csv", csv).to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let payload: ErrorPayload = actix_test::read_body_json(resp).await;
        assert_eq!(payload.error, "Invalid CSV format");
        assert_eq!(payload.missing_columns, Some(vec!["Type".to_string()]));
        assert_eq!(
            payload.available_columns,
            Some(vec!["Flowrate".to_string(), "Pressure".to_string(), "Temperature".to_string()])
        );
        assert_eq!(state.history.count().await.unwrap(), 0);
    }

    #[actix_web::test]
    async fn test_upload_over_limit() {
        let state = state_with_limit(16);
        let app = app!(state);

        let resp = actix_test::call_service(&app, upload_request("file", "big.csv", VALID_CSV).to_request()).await;
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[actix_web::test]
    async fn test_history_and_report_on_empty_store() {
        let state = state_with_limit(1024);
        let app = app!(state);

        for uri in ["/api/history/", "/api/report/"] {
            let resp = actix_test::call_service(&app, actix_test::TestRequest::get().uri(uri).to_request()).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND);
            let payload: ErrorPayload = actix_test::read_body_json(resp).await;
            assert_eq!(payload.error, "No data available");
        }
    }

    #[actix_web::test]
    async fn test_history_lists_newest_first() {
        let state = state_with_limit(1024);
        let app = app!(state);

        for name in ["first.csv", "second.csv"] {
            let resp = actix_test::call_service(&app, upload_request("file", name, VALID_CSV).to_request()).await;
            assert_eq!(resp.status(), StatusCode::CREATED);
        }

        let resp = actix_test::call_service(&app, actix_test::TestRequest::get().uri("/api/history").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let entries: Vec<HistoryEntry> = actix_test::read_body_json(resp).await;
        let names: Vec<_> = entries.iter().map(|e| e.filename.as_str()).collect();
        assert_eq!(names, ["second.csv", "first.csv"]);
    }

    #[actix_web::test]
    async fn test_report_downloads_pdf() {
        let state = state_with_limit(1024);
        let app = app!(state);
        actix_test::call_service(&app, upload_request("file", "plant.csv", VALID_CSV).to_request()).await;

        let resp = actix_test::call_service(&app, actix_test::TestRequest::get().uri("/api/report/").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get(header::CONTENT_TYPE).unwrap(), "application/pdf");
        let disposition = resp
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.contains("attachment"));
        assert!(disposition.contains(REPORT_FILENAME));

        let body = actix_test::read_body(resp).await;
        assert!(body.starts_with(b"%PDF"));
    }

    #[actix_web::test]
    async fn test_logs_capture_uploads() {
        let state = state_with_limit(1024);
        let app = app!(state);
        actix_test::call_service(&app, upload_request("file", "plant.csv", VALID_CSV).to_request()).await;

        let resp = actix_test::call_service(&app, actix_test::TestRequest::get().uri("/api/logs").to_request()).await;
        let logs: Vec<LogEntry> = actix_test::read_body_json(resp).await;
        assert!(logs.iter().any(|entry| entry.message.contains("plant.csv")));
    }

    #[test]
    fn test_log_buffer_is_bounded() {
        let logs = Mutex::new(Vec::new());
        for i in 0..(MAX_LOG_ENTRIES + 5) {
            add_log(&logs, "INFO", "Test", &format!("entry {i}"));
        }

        let logs = logs.lock().unwrap();
        assert_eq!(logs.len(), MAX_LOG_ENTRIES);
        assert_eq!(logs[0].message, "entry 5");
    }
}
