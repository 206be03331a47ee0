//! Indicator windows, CSV layout and pipeline defaults.
//!
//! ## History cache format
//!
//! One directory per symbol under the cache root, holding:
//! - `history.csv` — 7 columns, one row per trading day
//! - `fundamentals.json` — latest fundamental fields for the symbol
//!
//! Raw cached rows are never rewritten with derived values; all indicators
//! are recomputed from the raw series on every analysis pass.

/// Number of columns in a history CSV row (ticker, date, open, high, low, close, volume)
pub const CSV_HISTORY_COLUMNS: usize = 7;

/// Column indices for the history CSV format (0-indexed)
pub mod csv_column {
    pub const TICKER: usize = 0;
    pub const DATE: usize = 1;
    pub const OPEN: usize = 2;
    pub const HIGH: usize = 3;
    pub const LOW: usize = 4;
    pub const CLOSE: usize = 5;
    pub const VOLUME: usize = 6;
}

/// Header row written to every history CSV
pub const CSV_HISTORY_HEADER: &[&str] = &[
    "ticker", "date", "open", "high", "low", "close", "volume",
];

// Indicator windows (trading days)
pub const SMA_SHORT_WINDOW: usize = 20;
pub const SMA_MID_WINDOW: usize = 50;
pub const SMA_LONG_WINDOW: usize = 200;
pub const RSI_WINDOW: usize = 14;
pub const MACD_FAST_WINDOW: usize = 12;
pub const MACD_SLOW_WINDOW: usize = 26;
pub const MACD_SIGNAL_WINDOW: usize = 9;
pub const MOMENTUM_WINDOW: usize = 10;

/// Minimum number of bars for a symbol to carry a daily change
/// (and therefore to count toward market breadth)
pub const MIN_RECORDS_FOR_CHANGE: usize = 2;

// Fetch pacing
/// Maximum API requests per sliding minute
pub const RATE_LIMIT_PER_MINUTE: u32 = 60;

/// Fixed delay between symbols in the fetch loop (milliseconds)
pub const FETCH_PACING_MS: u64 = 500;

/// Bounded retry count per request before a symbol is marked failed
pub const MAX_FETCH_ATTEMPTS: u32 = 3;

/// Base backoff delay in seconds; attempt n waits base * 2^(n-1) plus jitter
pub const BACKOFF_BASE_SECS: f64 = 1.0;

/// Backoff ceiling in seconds
pub const BACKOFF_CAP_SECS: f64 = 30.0;

/// Per-request HTTP timeout in seconds
pub const HTTP_TIMEOUT_SECS: u64 = 30;

// External API
pub const CHART_API_BASE: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
pub const QUOTE_API_BASE: &str = "https://query1.finance.yahoo.com/v10/finance/quoteSummary";

/// Exchange suffix appended to bare tickers when building request URLs
/// (the symbol list stores `RELIANCE`, the feed wants `RELIANCE.NS`)
pub const EXCHANGE_SUFFIX: &str = ".NS";

/// History range requested per symbol
pub const FETCH_RANGE: &str = "1y";

/// Default dashboard port
pub const DEFAULT_PORT: u16 = 8050;

/// Rows shown in the top-gainers / most-active overview tables
pub const OVERVIEW_TOP_N: usize = 5;
