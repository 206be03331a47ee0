use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Trading signal from the SMA20/SMA50 crossover
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    Buy,
    Sell,
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Signal::Buy => write!(f, "Buy"),
            Signal::Sell => write!(f, "Sell"),
        }
    }
}

/// Derived per-symbol record, recomputed wholesale on every analysis run.
///
/// Indicator fields are `None` when the cached series is shorter than that
/// indicator's window; the raw series itself is never modified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolSnapshot {
    pub ticker: String,
    pub name: String,
    pub sector: String,

    /// Trading day of the latest bar
    pub last_date: NaiveDate,
    pub last_close: f64,
    pub last_volume: u64,
    pub record_count: usize,

    /// Latest close-over-close change in percent (needs at least 2 bars)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_change_pct: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sma20: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sma50: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sma200: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsi14: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macd: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macd_signal: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macd_histogram: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub momentum10: Option<f64>,

    /// Buy when SMA20 > SMA50, Sell otherwise; needs both averages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal: Option<Signal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pe_ratio: Option<f64>,

    /// Symbol P/E divided by its sector's average P/E
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pe_vs_sector: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fifty_two_week_high: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fifty_two_week_low: Option<f64>,
}

/// Aggregates for one sector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectorStats {
    pub sector: String,
    pub symbol_count: usize,
    pub total_market_cap: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_pe: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_daily_change_pct: Option<f64>,
    pub total_volume: u64,
}

/// Slim row for the overview's top-gainers and most-active tables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverviewEntry {
    pub ticker: String,
    pub name: String,
    pub last_close: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_change_pct: Option<f64>,
    pub last_volume: u64,
}

/// Market-wide snapshot folded over all symbol snapshots at analysis time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketOverview {
    pub analysis_time: DateTime<Utc>,

    /// Count of symbols that produced a snapshot
    pub symbol_count: usize,

    /// Sum of reported market caps
    pub total_market_cap: f64,

    /// Mean over symbols with a positive, finite P/E
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_pe: Option<f64>,

    /// Gainers / symbols with a valid daily change, in [0, 1].
    /// `None` when no symbol has a valid daily change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_breadth: Option<f64>,

    pub top_gainers: Vec<OverviewEntry>,
    pub most_active: Vec<OverviewEntry>,

    /// Market cap by sector, descending
    pub sector_distribution: Vec<(String, f64)>,
}
