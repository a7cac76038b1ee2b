//! HTTP client for the desktop front end.
//!
//! Uploads a local CSV, lists history and fetches the PDF report. The
//! `presentation` module turns a returned summary into the rows and pie
//! slices the window draws.

pub mod presentation;

use std::path::Path;

use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use thiserror::Error;

use crate::domain::equipment::Summary;
use crate::interfaces::http::{ErrorPayload, HistoryEntry};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Failed to read upload: {0}")]
    Io(#[from] std::io::Error),
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("API error ({status}): {}", .payload.as_ref().map(|p| p.error.as_str()).unwrap_or("no details"))]
    Api {
        status: u16,
        payload: Option<ErrorPayload>,
    },
}

pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{}/", self.base_url.trim_end_matches('/'), path)
    }

    pub async fn upload_csv(&self, path: &Path) -> Result<Summary, ClientError> {
        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.csv".to_string());
        self.upload_bytes(&filename, bytes).await
    }

    pub async fn upload_bytes(&self, filename: &str, bytes: Vec<u8>) -> Result<Summary, ClientError> {
        let part = Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str("text/csv")?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await?;

        if response.status() != StatusCode::CREATED {
            return Err(api_error(response).await);
        }
        Ok(response.json().await?)
    }

    pub async fn history(&self) -> Result<Vec<HistoryEntry>, ClientError> {
        let response = self.client.get(self.endpoint("history")).send().await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(response.json().await?)
    }

    pub async fn download_report(&self) -> Result<Vec<u8>, ClientError> {
        let response = self.client.get(self.endpoint("report")).send().await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(response.bytes().await?.to_vec())
    }
}

async fn api_error(response: reqwest::Response) -> ClientError {
    let status = response.status().as_u16();
    let payload = response.json::<ErrorPayload>().await.ok();
    ClientError::Api { status, payload }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::bootstrap::build_state;
    use crate::infrastructure::config::AppConfig;
    use crate::infrastructure::db::InMemoryHistoryStore;
    use crate::interfaces::http::configure;
    use actix_web::middleware::NormalizePath;
    use actix_web::{web, App, HttpServer};
    use std::sync::Arc;

    #[test]
    fn test_endpoint_joins_paths() {
        assert_eq!(
            ApiClient::new("http://127.0.0.1:8000/").endpoint("upload"),
            "http://127.0.0.1:8000/api/upload/"
        );
    }

    #[actix_web::test]
    async fn test_client_against_running_server() {
        let state = web::Data::new(build_state(
            &AppConfig::default(),
            Arc::new(InMemoryHistoryStore::new()),
        ));
        let server = HttpServer::new(move || {
            App::new()
                .wrap(NormalizePath::trim())
                .app_data(state.clone())
                .configure(configure)
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();
        let addr = server.addrs()[0];
        let server = server.run();
        let handle = server.handle();
        actix_web::rt::spawn(server);

        let client = ApiClient::new(format!("http://{addr}"));

        match client.download_report().await {
            Err(ClientError::Api { status, payload }) => {
                assert_eq!(status, 404);
                assert_eq!(payload.unwrap().error, "No data available");
            }
            other => panic!("expected 404, got {other:?}"),
        }

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("equipment.csv");
        std::fs::write(&path, "Flowrate,Pressure,Temperature,Type\n10,5,20,Pump\n20,7,22,Valve\n").unwrap();

        let summary = client.upload_csv(&path).await.unwrap();
        assert_eq!(summary.avg_flowrate, Some(15.0));

        let history = client.history().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].filename, "equipment.csv");
        assert_eq!(history[0].summary, summary);

        let pdf = client.download_report().await.unwrap();
        assert!(pdf.starts_with(b"%PDF"));

        match client.upload_bytes("bad.csv", b"Flowrate\n1\n".to_vec()).await {
            Err(ClientError::Api { status, payload }) => {
                assert_eq!(status, 400);
                let payload = payload.unwrap();
                assert_eq!(
                    payload.missing_columns,
                    Some(vec!["Pressure".to_string(), "Temperature".to_string(), "Type".to_string()])
                );
            }
            other => panic!("expected 400, got {other:?}"),
        }

        handle.stop(true).await;
    }
}
