pub mod api;
pub mod dashboard;

use crate::error::{Error, Result};
use crate::models::TimeSeries;
use crate::services::AnalysisResult;
use axum::{routing::get, Router};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};

/// Everything the dashboard serves: one analysis pass plus the raw series
/// per symbol for charting. Read-only after startup; the only per-request
/// state (selected symbol, chart toggle) lives client-side.
pub struct Dataset {
    pub analysis: AnalysisResult,
    pub series: HashMap<String, TimeSeries>,
    pub started: Instant,
}

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub dataset: Arc<Dataset>,
}

/// Start the axum server on the given port
pub async fn serve(dataset: Dataset, port: u16) -> Result<()> {
    let app_state = AppState {
        dataset: Arc::new(dataset),
    };

    // Local single-user dashboard: allow any origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET])
        .allow_headers(Any);

    tracing::info!("Registering routes:");
    tracing::info!("  GET /");
    tracing::info!("  GET /api/overview");
    tracing::info!("  GET /api/sectors");
    tracing::info!("  GET /api/symbols");
    tracing::info!("  GET /api/symbols/{{ticker}}");
    tracing::info!("  GET /api/report.pdf");
    tracing::info!("  GET /health");

    let app = Router::new()
        .route("/", get(dashboard::dashboard_handler))
        .route("/api/overview", get(api::overview_handler))
        .route("/api/sectors", get(api::sectors_handler))
        .route("/api/symbols", get(api::symbols_handler))
        .route("/api/symbols/{ticker}", get(api::symbol_detail_handler))
        .route("/api/report.pdf", get(api::report_pdf_handler))
        .route("/health", get(api::health_handler))
        .layer(cors)
        .with_state(app_state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    tracing::info!(%addr, "Dashboard listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Network(format!("Failed to bind {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| Error::Network(format!("Server error: {}", e)))?;

    Ok(())
}
