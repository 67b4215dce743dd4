//! pagekit-api server binary.

use pagekit_api::{app, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let addr = std::env::var("PAGEKIT_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    let state = AppState::new();

    tracing::info!(%addr, "pagekit-api listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app(state)).await
}
