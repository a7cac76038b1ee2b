use tracing_subscriber::EnvFilter;

use crate::domain::error::{AppError, Result};
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::AppConfig;
use crate::interfaces::http::start_server;

pub fn run() -> std::io::Result<()> {
    let _ = dotenvy::dotenv();

    let config = AppConfig::load().map_err(std::io::Error::other)?;
    init_tracing(&config);

    actix_web::rt::System::new().block_on(async move {
        serve(config).await.map_err(|err| {
            tracing::error!(error = %err, "Server stopped with error");
            std::io::Error::other(err)
        })
    })
}

fn init_tracing(config: &AppConfig) {
    // RUST_LOG wins over the configured filter when set
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

async fn serve(config: AppConfig) -> Result<()> {
    let state = bootstrap::setup(&config).await?;
    let (host, port) = config.bind_address();

    tracing::info!(%host, port, storage = ?config.storage, "Starting chemviz API");
    start_server(state, &host, port)
        .map_err(|err| AppError::IoError(format!("Failed to bind {}:{}: {}", host, port, err)))?
        .await?;
    Ok(())
}
