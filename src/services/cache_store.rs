//! Flat on-disk cache: one directory per symbol under the cache root.
//!
//! ```text
//! data/cache/RELIANCE/history.csv        raw OHLCV rows, ascending by date
//! data/cache/RELIANCE/fundamentals.json  latest fundamental fields
//! ```
//!
//! History writes merge fetched rows into the existing file, deduplicated by
//! date with the new fetch winning (the feed restates the live bar), so the
//! series stays append-only in effect. Nothing downstream ever mutates a
//! cached row; indicators are derived fresh on every analysis pass.

use crate::constants::{csv_column, CSV_HISTORY_COLUMNS, CSV_HISTORY_HEADER};
use crate::error::{Error, Result};
use crate::models::{Fundamentals, Ohlcv, TimeSeries};
use crate::utils::{format_date, parse_date};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

const HISTORY_FILE: &str = "history.csv";
const FUNDAMENTALS_FILE: &str = "fundamentals.json";

pub struct CacheStore {
    root: PathBuf,
}

/// Record count and date range for one cached symbol
#[derive(Debug, Clone)]
pub struct CacheEntryInfo {
    pub ticker: String,
    pub record_count: usize,
    pub first_date: String,
    pub last_date: String,
    pub last_close: f64,
    pub has_fundamentals: bool,
}

impl CacheStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn symbol_dir(&self, ticker: &str) -> PathBuf {
        self.root.join(ticker)
    }

    fn history_path(&self, ticker: &str) -> PathBuf {
        self.symbol_dir(ticker).join(HISTORY_FILE)
    }

    fn fundamentals_path(&self, ticker: &str) -> PathBuf {
        self.symbol_dir(ticker).join(FUNDAMENTALS_FILE)
    }

    pub fn has_history(&self, ticker: &str) -> bool {
        self.history_path(ticker).exists()
    }

    /// Tickers with a cached history file, sorted
    pub fn list_cached_symbols(&self) -> Result<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut tickers: Vec<String> = fs::read_dir(&self.root)
            .map_err(|e| Error::Io(format!("Failed to read cache dir {}: {}", self.root.display(), e)))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().join(HISTORY_FILE).exists())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();

        tickers.sort();
        Ok(tickers)
    }

    /// Merge fetched bars into the cached history and rewrite the file.
    /// Returns the total row count after the merge.
    pub fn write_history(&self, ticker: &str, fetched: &[Ohlcv]) -> Result<usize> {
        let dir = self.symbol_dir(ticker);
        fs::create_dir_all(&dir)
            .map_err(|e| Error::Io(format!("Failed to create {}: {}", dir.display(), e)))?;

        let existing = if self.has_history(ticker) {
            self.read_history(ticker)?
        } else {
            Vec::new()
        };

        let merged = merge_bars(existing, fetched);

        let path = self.history_path(ticker);
        let tmp_path = dir.join(format!("{}.tmp", HISTORY_FILE));
        {
            let mut writer = csv::Writer::from_path(&tmp_path)?;
            writer.write_record(CSV_HISTORY_HEADER)?;
            for bar in &merged {
                writer.write_record(&[
                    ticker.to_string(),
                    format_date(bar.date),
                    bar.open.to_string(),
                    bar.high.to_string(),
                    bar.low.to_string(),
                    bar.close.to_string(),
                    bar.volume.to_string(),
                ])?;
            }
            writer.flush().map_err(|e| Error::Io(e.to_string()))?;
        }
        fs::rename(&tmp_path, &path)
            .map_err(|e| Error::Io(format!("Failed to replace {}: {}", path.display(), e)))?;

        debug!("Wrote {} rows for {}", merged.len(), ticker);
        Ok(merged.len())
    }

    /// Read the cached history for one symbol, ascending by date.
    /// Rows that fail to parse are dropped with a warning.
    pub fn read_history(&self, ticker: &str) -> Result<TimeSeries> {
        let path = self.history_path(ticker);
        if !path.exists() {
            return Err(Error::NotFound(format!("No cached history for {}", ticker)));
        }

        let mut reader = csv::Reader::from_path(&path)?;
        let mut bars = Vec::new();

        for result in reader.records() {
            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    warn!("{}: dropping unreadable history row: {}", ticker, e);
                    continue;
                }
            };

            if record.len() < CSV_HISTORY_COLUMNS {
                warn!("{}: dropping short history row", ticker);
                continue;
            }

            let date = parse_date(record.get(csv_column::DATE).unwrap_or(""));
            let open = record.get(csv_column::OPEN).and_then(|s| s.parse().ok());
            let high = record.get(csv_column::HIGH).and_then(|s| s.parse().ok());
            let low = record.get(csv_column::LOW).and_then(|s| s.parse().ok());
            let close = record.get(csv_column::CLOSE).and_then(|s| s.parse().ok());
            let volume = record
                .get(csv_column::VOLUME)
                .and_then(|s| s.parse().ok())
                .unwrap_or(0);

            match (date, open, high, low, close) {
                (Some(date), Some(open), Some(high), Some(low), Some(close)) => {
                    bars.push(Ohlcv::new(date, open, high, low, close, volume));
                }
                _ => {
                    warn!("{}: dropping malformed history row", ticker);
                }
            }
        }

        bars.sort_by_key(|bar| bar.date);
        Ok(bars)
    }

    pub fn write_fundamentals(&self, ticker: &str, fundamentals: &Fundamentals) -> Result<()> {
        let dir = self.symbol_dir(ticker);
        fs::create_dir_all(&dir)
            .map_err(|e| Error::Io(format!("Failed to create {}: {}", dir.display(), e)))?;

        let json = serde_json::to_string_pretty(fundamentals)?;
        fs::write(self.fundamentals_path(ticker), json)
            .map_err(|e| Error::Io(format!("Failed to write fundamentals for {}: {}", ticker, e)))?;
        Ok(())
    }

    /// Missing or unreadable fundamentals degrade to `None`; only the
    /// history file is load-bearing.
    pub fn read_fundamentals(&self, ticker: &str) -> Option<Fundamentals> {
        let path = self.fundamentals_path(ticker);
        let content = fs::read_to_string(path).ok()?;
        match serde_json::from_str(&content) {
            Ok(fundamentals) => Some(fundamentals),
            Err(e) => {
                warn!("{}: unreadable fundamentals file: {}", ticker, e);
                None
            }
        }
    }

    /// Summary for the status command
    pub fn entry_info(&self, ticker: &str) -> Result<CacheEntryInfo> {
        let bars = self.read_history(ticker)?;
        let first = bars
            .first()
            .map(|b| format_date(b.date))
            .unwrap_or_else(|| "N/A".to_string());
        let last = bars
            .last()
            .map(|b| format_date(b.date))
            .unwrap_or_else(|| "N/A".to_string());

        Ok(CacheEntryInfo {
            ticker: ticker.to_string(),
            record_count: bars.len(),
            first_date: first,
            last_date: last,
            last_close: bars.last().map(|b| b.close).unwrap_or(0.0),
            has_fundamentals: self.fundamentals_path(ticker).exists(),
        })
    }
}

/// Merge fetched bars over existing ones, deduplicated by date with the
/// fetched row winning, ascending output.
pub fn merge_bars(existing: Vec<Ohlcv>, fetched: &[Ohlcv]) -> Vec<Ohlcv> {
    let mut by_date: BTreeMap<chrono::NaiveDate, Ohlcv> = BTreeMap::new();

    for bar in existing {
        by_date.insert(bar.date, bar);
    }
    for bar in fetched {
        by_date.insert(bar.date, bar.clone());
    }

    by_date.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(day: u32, close: f64) -> Ohlcv {
        let date = NaiveDate::from_ymd_opt(2024, 6, day).unwrap();
        Ohlcv::new(date, close - 1.0, close + 1.0, close - 2.0, close, 10_000)
    }

    #[test]
    fn test_merge_dedup_new_wins() {
        let existing = vec![bar(3, 100.0), bar(4, 101.0)];
        let fetched = vec![bar(4, 105.0), bar(5, 106.0)];

        let merged = merge_bars(existing, &fetched);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].close, 100.0);
        assert_eq!(merged[1].close, 105.0); // fetched row replaced the stale one
        assert_eq!(merged[2].close, 106.0);
        assert!(merged.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn test_history_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path().to_path_buf());

        let bars = vec![bar(3, 100.0), bar(4, 102.0), bar(5, 101.5)];
        let written = store.write_history("RELIANCE", &bars).unwrap();
        assert_eq!(written, 3);

        let read_back = store.read_history("RELIANCE").unwrap();
        assert_eq!(read_back, bars);
    }

    #[test]
    fn test_incremental_write_appends() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path().to_path_buf());

        store.write_history("TCS", &[bar(3, 100.0), bar(4, 101.0)]).unwrap();
        let total = store.write_history("TCS", &[bar(4, 101.0), bar(5, 103.0)]).unwrap();
        assert_eq!(total, 3);

        let bars = store.read_history("TCS").unwrap();
        assert_eq!(bars.len(), 3);
        assert_eq!(bars.last().unwrap().close, 103.0);
    }

    #[test]
    fn test_missing_history_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path().to_path_buf());

        assert!(matches!(
            store.read_history("NONE"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_fundamentals_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path().to_path_buf());

        let fundamentals = Fundamentals {
            market_cap: Some(1.5e12),
            pe_ratio: Some(22.5),
            ..Default::default()
        };
        store.write_fundamentals("INFY", &fundamentals).unwrap();

        let read_back = store.read_fundamentals("INFY").unwrap();
        assert_eq!(read_back.market_cap, Some(1.5e12));
        assert_eq!(read_back.pe_ratio, Some(22.5));
        assert_eq!(read_back.eps, None);

        assert!(store.read_fundamentals("MISSING").is_none());
    }

    #[test]
    fn test_list_cached_symbols_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path().to_path_buf());

        store.write_history("TCS", &[bar(3, 1.0)]).unwrap();
        store.write_history("INFY", &[bar(3, 1.0)]).unwrap();
        // Directory without history.csv is ignored
        fs::create_dir_all(dir.path().join("EMPTY")).unwrap();

        let listed = store.list_cached_symbols().unwrap();
        assert_eq!(listed, vec!["INFY".to_string(), "TCS".to_string()]);
    }
}
