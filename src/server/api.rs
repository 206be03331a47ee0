use crate::constants::{SMA_MID_WINDOW, SMA_SHORT_WINDOW};
use crate::models::indicators::calculate_sma;
use crate::server::AppState;
use crate::services::render_report;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, warn};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn not_found(message: String) -> Response {
    (StatusCode::NOT_FOUND, Json(ErrorResponse { error: message })).into_response()
}

/// GET /api/overview - market-wide aggregates
pub async fn overview_handler(State(app_state): State<AppState>) -> impl IntoResponse {
    Json(app_state.dataset.analysis.overview.clone())
}

/// GET /api/sectors - per-sector aggregates
pub async fn sectors_handler(State(app_state): State<AppState>) -> impl IntoResponse {
    Json(app_state.dataset.analysis.sectors.clone())
}

/// GET /api/symbols - every symbol snapshot, sorted by ticker
pub async fn symbols_handler(State(app_state): State<AppState>) -> impl IntoResponse {
    Json(app_state.dataset.analysis.snapshots.clone())
}

/// One chart point: raw bar plus moving-average overlays where defined
#[derive(Debug, Serialize)]
pub struct SeriesPoint {
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sma20: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sma50: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct SymbolDetailResponse {
    pub snapshot: crate::models::SymbolSnapshot,
    pub series: Vec<SeriesPoint>,
}

/// GET /api/symbols/{ticker} - snapshot plus full series for charting
pub async fn symbol_detail_handler(
    State(app_state): State<AppState>,
    Path(ticker): Path<String>,
) -> Response {
    let ticker = ticker.to_uppercase();
    let dataset = &app_state.dataset;

    let snapshot = match dataset
        .analysis
        .snapshots
        .iter()
        .find(|s| s.ticker == ticker)
    {
        Some(snapshot) => snapshot.clone(),
        None => {
            warn!("Unknown ticker requested: {}", ticker);
            return not_found(format!("Unknown ticker: {}", ticker));
        }
    };

    let bars = match dataset.series.get(&ticker) {
        Some(bars) => bars,
        None => return not_found(format!("No series for ticker: {}", ticker)),
    };

    let closes: Vec<f64> = bars.iter().map(|bar| bar.close).collect();
    let sma20 = calculate_sma(&closes, SMA_SHORT_WINDOW);
    let sma50 = calculate_sma(&closes, SMA_MID_WINDOW);

    let series = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| SeriesPoint {
            date: crate::utils::format_date(bar.date),
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
            sma20: sma20[i],
            sma50: sma50[i],
        })
        .collect();

    Json(SymbolDetailResponse { snapshot, series }).into_response()
}

/// GET /api/report.pdf - render the current dataset as a PDF download
pub async fn report_pdf_handler(State(app_state): State<AppState>) -> Response {
    match render_report(&app_state.dataset.analysis) {
        Ok(bytes) => {
            let filename = format!(
                "stock_analysis_report_{}.pdf",
                chrono::Utc::now().format("%Y%m%d_%H%M%S")
            );
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "application/pdf".to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{}\"", filename),
                    ),
                ],
                bytes,
            )
                .into_response()
        }
        Err(e) => {
            error!("PDF generation failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("PDF generation failed: {}", e),
                }),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
    pub symbol_count: usize,
    pub total_records: usize,
    pub skipped_symbols: usize,
}

/// GET /health - liveness plus dataset counts
pub async fn health_handler(State(app_state): State<AppState>) -> impl IntoResponse {
    let dataset = &app_state.dataset;
    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs: dataset.started.elapsed().as_secs(),
        symbol_count: dataset.analysis.snapshots.len(),
        total_records: dataset.series.values().map(|s| s.len()).sum(),
        skipped_symbols: dataset.analysis.skipped.len(),
    })
}
