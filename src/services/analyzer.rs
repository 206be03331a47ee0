//! Derives per-symbol indicator snapshots and the market overview from the
//! cache. Everything here is a pure function of cached raw rows: re-running
//! over an unchanged cache yields identical output, and no raw data is
//! mutated.

use crate::constants::{
    MACD_FAST_WINDOW, MACD_SIGNAL_WINDOW, MACD_SLOW_WINDOW, MIN_RECORDS_FOR_CHANGE,
    MOMENTUM_WINDOW, OVERVIEW_TOP_N, RSI_WINDOW, SMA_LONG_WINDOW, SMA_MID_WINDOW,
    SMA_SHORT_WINDOW,
};
use crate::error::{Error, Result};
use crate::models::indicators::{
    calculate_macd, calculate_momentum, calculate_rsi, calculate_sma, daily_change_pct,
};
use crate::models::{
    Fundamentals, MarketOverview, OverviewEntry, SectorStats, Signal, SymbolRecord,
    SymbolSnapshot, TimeSeries,
};
use crate::services::cache_store::CacheStore;
use chrono::Utc;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Full output of one analysis run
#[derive(Debug, Clone, serde::Serialize)]
pub struct AnalysisResult {
    pub overview: MarketOverview,
    pub sectors: Vec<SectorStats>,
    pub snapshots: Vec<SymbolSnapshot>,
    /// Symbols skipped for missing cache entries or insufficient history
    pub skipped: Vec<String>,
}

/// Load every listed symbol from the cache and analyze. Symbols without a
/// cache entry or with fewer than two bars are skipped, never fatal.
pub fn analyze_cache(store: &CacheStore, symbols: &[SymbolRecord]) -> Result<AnalysisResult> {
    let mut inputs = Vec::with_capacity(symbols.len());
    let mut skipped = Vec::new();

    for symbol in symbols {
        match store.read_history(&symbol.ticker) {
            Ok(bars) => {
                let fundamentals = store.read_fundamentals(&symbol.ticker);
                inputs.push((symbol.clone(), bars, fundamentals));
            }
            Err(Error::NotFound(_)) => {
                debug!("{}: not cached, excluded from analysis", symbol.ticker);
                skipped.push(symbol.ticker.clone());
            }
            Err(e) => return Err(e),
        }
    }

    let mut result = analyze_series(inputs);
    result.skipped.extend(skipped);
    result.skipped.sort();

    info!(
        "Analyzed {} symbols ({} skipped)",
        result.snapshots.len(),
        result.skipped.len()
    );
    Ok(result)
}

/// Analyze in-memory series. Split out from the cache walk so the math is
/// testable without touching disk.
pub fn analyze_series(
    inputs: Vec<(SymbolRecord, TimeSeries, Option<Fundamentals>)>,
) -> AnalysisResult {
    let mut snapshots = Vec::with_capacity(inputs.len());
    let mut skipped = Vec::new();

    for (symbol, bars, fundamentals) in inputs {
        if bars.len() < MIN_RECORDS_FOR_CHANGE {
            debug!(
                "{}: only {} bars cached, excluded from analysis",
                symbol.ticker,
                bars.len()
            );
            skipped.push(symbol.ticker);
            continue;
        }
        snapshots.push(build_snapshot(&symbol, &bars, fundamentals.as_ref()));
    }

    let sectors = aggregate_sectors(&snapshots);
    apply_sector_relative_pe(&mut snapshots, &sectors);
    let overview = build_overview(&snapshots, &sectors);

    snapshots.sort_by(|a, b| a.ticker.cmp(&b.ticker));

    AnalysisResult {
        overview,
        sectors,
        snapshots,
        skipped,
    }
}

fn build_snapshot(
    symbol: &SymbolRecord,
    bars: &[crate::models::Ohlcv],
    fundamentals: Option<&Fundamentals>,
) -> SymbolSnapshot {
    let closes: Vec<f64> = bars.iter().map(|bar| bar.close).collect();
    let last = &bars[bars.len() - 1];

    let sma20 = calculate_sma(&closes, SMA_SHORT_WINDOW).pop().flatten();
    let sma50 = calculate_sma(&closes, SMA_MID_WINDOW).pop().flatten();
    let sma200 = calculate_sma(&closes, SMA_LONG_WINDOW).pop().flatten();
    let rsi14 = calculate_rsi(&closes, RSI_WINDOW).pop().flatten();
    let macd_series = calculate_macd(&closes, MACD_FAST_WINDOW, MACD_SLOW_WINDOW, MACD_SIGNAL_WINDOW);
    let momentum10 = calculate_momentum(&closes, MOMENTUM_WINDOW).pop().flatten();

    let signal = match (sma20, sma50) {
        (Some(short), Some(mid)) => Some(if short > mid { Signal::Buy } else { Signal::Sell }),
        _ => None,
    };

    SymbolSnapshot {
        ticker: symbol.ticker.clone(),
        name: symbol.name.clone(),
        sector: symbol.sector.clone(),
        last_date: last.date,
        last_close: last.close,
        last_volume: last.volume,
        record_count: bars.len(),
        daily_change_pct: daily_change_pct(&closes),
        sma20,
        sma50,
        sma200,
        rsi14,
        macd: macd_series.macd.last().copied().flatten(),
        macd_signal: macd_series.signal.last().copied().flatten(),
        macd_histogram: macd_series.histogram.last().copied().flatten(),
        momentum10,
        signal,
        market_cap: fundamentals.and_then(|f| f.market_cap),
        pe_ratio: fundamentals.and_then(|f| f.pe_ratio),
        pe_vs_sector: None,
        fifty_two_week_high: fundamentals.and_then(|f| f.fifty_two_week_high),
        fifty_two_week_low: fundamentals.and_then(|f| f.fifty_two_week_low),
    }
}

fn valid_pe(snapshot: &SymbolSnapshot) -> Option<f64> {
    snapshot.pe_ratio.filter(|pe| pe.is_finite() && *pe > 0.0)
}

fn aggregate_sectors(snapshots: &[SymbolSnapshot]) -> Vec<SectorStats> {
    let mut by_sector: BTreeMap<String, Vec<&SymbolSnapshot>> = BTreeMap::new();
    for snapshot in snapshots {
        by_sector
            .entry(snapshot.sector.clone())
            .or_default()
            .push(snapshot);
    }

    by_sector
        .into_iter()
        .map(|(sector, members)| {
            let pes: Vec<f64> = members.iter().filter_map(|s| valid_pe(s)).collect();
            let changes: Vec<f64> = members.iter().filter_map(|s| s.daily_change_pct).collect();

            SectorStats {
                sector,
                symbol_count: members.len(),
                total_market_cap: members.iter().filter_map(|s| s.market_cap).sum(),
                average_pe: mean(&pes),
                average_daily_change_pct: mean(&changes),
                total_volume: members.iter().map(|s| s.last_volume).sum(),
            }
        })
        .collect()
}

fn apply_sector_relative_pe(snapshots: &mut [SymbolSnapshot], sectors: &[SectorStats]) {
    for snapshot in snapshots.iter_mut() {
        let sector_pe = sectors
            .iter()
            .find(|s| s.sector == snapshot.sector)
            .and_then(|s| s.average_pe);
        snapshot.pe_vs_sector = match (valid_pe(snapshot), sector_pe) {
            (Some(pe), Some(sector_pe)) if sector_pe > 0.0 => Some(pe / sector_pe),
            _ => None,
        };
    }
}

fn build_overview(snapshots: &[SymbolSnapshot], sectors: &[SectorStats]) -> MarketOverview {
    let changes: Vec<f64> = snapshots.iter().filter_map(|s| s.daily_change_pct).collect();
    let gainers = changes.iter().filter(|c| **c > 0.0).count();
    let market_breadth = if changes.is_empty() {
        None
    } else {
        Some(gainers as f64 / changes.len() as f64)
    };

    let pes: Vec<f64> = snapshots.iter().filter_map(valid_pe).collect();

    let mut by_change: Vec<&SymbolSnapshot> = snapshots
        .iter()
        .filter(|s| s.daily_change_pct.is_some())
        .collect();
    by_change.sort_by(|a, b| {
        b.daily_change_pct
            .partial_cmp(&a.daily_change_pct)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let top_gainers = by_change
        .iter()
        .take(OVERVIEW_TOP_N)
        .map(|s| overview_entry(s))
        .collect();

    let mut by_volume: Vec<&SymbolSnapshot> = snapshots.iter().collect();
    by_volume.sort_by(|a, b| b.last_volume.cmp(&a.last_volume));
    let most_active = by_volume
        .iter()
        .take(OVERVIEW_TOP_N)
        .map(|s| overview_entry(s))
        .collect();

    let mut sector_distribution: Vec<(String, f64)> = sectors
        .iter()
        .map(|s| (s.sector.clone(), s.total_market_cap))
        .collect();
    sector_distribution.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    MarketOverview {
        analysis_time: Utc::now(),
        symbol_count: snapshots.len(),
        total_market_cap: snapshots.iter().filter_map(|s| s.market_cap).sum(),
        average_pe: mean(&pes),
        market_breadth,
        top_gainers,
        most_active,
        sector_distribution,
    }
}

fn overview_entry(snapshot: &SymbolSnapshot) -> OverviewEntry {
    OverviewEntry {
        ticker: snapshot.ticker.clone(),
        name: snapshot.name.clone(),
        last_close: snapshot.last_close,
        daily_change_pct: snapshot.daily_change_pct,
        last_volume: snapshot.last_volume,
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Ohlcv;
    use chrono::NaiveDate;

    fn series(closes: &[f64]) -> TimeSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                Ohlcv::new(
                    start + chrono::Duration::days(i as i64),
                    close,
                    close + 1.0,
                    close - 1.0,
                    close,
                    1_000 + i as u64,
                )
            })
            .collect()
    }

    fn symbol(ticker: &str, sector: &str) -> SymbolRecord {
        SymbolRecord::new(ticker, format!("{} Ltd", ticker), sector)
    }

    fn fundamentals(pe: f64, cap: f64) -> Fundamentals {
        Fundamentals {
            pe_ratio: Some(pe),
            market_cap: Some(cap),
            ..Default::default()
        }
    }

    #[test]
    fn test_short_series_has_no_long_indicators() {
        let result = analyze_series(vec![(
            symbol("AAA", "Energy"),
            series(&[100.0, 102.0, 101.0]),
            None,
        )]);

        let snap = &result.snapshots[0];
        assert_eq!(snap.sma20, None);
        assert_eq!(snap.sma200, None);
        assert_eq!(snap.rsi14, None);
        assert_eq!(snap.signal, None);
        // Daily change still defined with 2+ bars
        let change = snap.daily_change_pct.unwrap();
        assert!((change - (101.0 - 102.0) / 102.0 * 100.0).abs() < 1e-12);
    }

    #[test]
    fn test_long_series_sma200_matches_mean() {
        let closes: Vec<f64> = (0..260).map(|i| 500.0 + (i as f64 * 0.21).sin() * 20.0).collect();
        let result = analyze_series(vec![(symbol("BBB", "Energy"), series(&closes), None)]);

        let snap = &result.snapshots[0];
        let expected: f64 = closes[closes.len() - 200..].iter().sum::<f64>() / 200.0;
        assert!((snap.sma200.unwrap() - expected).abs() < 1e-9);
        assert!(snap.rsi14.is_some());
        assert!(snap.macd.is_some());
        assert!(snap.signal.is_some());
    }

    #[test]
    fn test_single_bar_symbol_excluded_entirely() {
        let result = analyze_series(vec![
            (symbol("AAA", "Energy"), series(&[100.0, 105.0]), None),
            (symbol("ONEBAR", "Energy"), series(&[50.0]), None),
        ]);

        assert_eq!(result.snapshots.len(), 1);
        assert_eq!(result.skipped, vec!["ONEBAR".to_string()]);
        assert_eq!(result.overview.symbol_count, 1);
        assert!(result
            .overview
            .most_active
            .iter()
            .all(|e| e.ticker != "ONEBAR"));
    }

    #[test]
    fn test_market_breadth_bounds_and_value() {
        let result = analyze_series(vec![
            (symbol("UP1", "A"), series(&[100.0, 101.0]), None),
            (symbol("UP2", "A"), series(&[100.0, 110.0]), None),
            (symbol("DOWN", "B"), series(&[100.0, 95.0]), None),
        ]);

        let breadth = result.overview.market_breadth.unwrap();
        assert!((0.0..=1.0).contains(&breadth));
        assert!((breadth - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_overview_aggregates() {
        let result = analyze_series(vec![
            (
                symbol("AAA", "Energy"),
                series(&[100.0, 102.0]),
                Some(fundamentals(20.0, 1000.0)),
            ),
            (
                symbol("BBB", "Energy"),
                series(&[50.0, 49.0]),
                Some(fundamentals(10.0, 500.0)),
            ),
            (
                symbol("CCC", "Banks"),
                series(&[200.0, 210.0]),
                Some(fundamentals(-5.0, 2000.0)), // loss-maker placeholder, excluded from P/E mean
            ),
        ]);

        let overview = &result.overview;
        assert_eq!(overview.total_market_cap, 3500.0);
        assert!((overview.average_pe.unwrap() - 15.0).abs() < 1e-12);
        assert_eq!(overview.top_gainers[0].ticker, "CCC");
        assert_eq!(overview.sector_distribution[0].0, "Banks");

        // Sector-relative P/E: AAA at 20 vs Energy mean of 15
        let aaa = result.snapshots.iter().find(|s| s.ticker == "AAA").unwrap();
        assert!((aaa.pe_vs_sector.unwrap() - 20.0 / 15.0).abs() < 1e-12);
        let ccc = result.snapshots.iter().find(|s| s.ticker == "CCC").unwrap();
        assert_eq!(ccc.pe_vs_sector, None);
    }

    #[test]
    fn test_signal_from_sma_crossover() {
        // 60 rising closes: short average above mid average
        let rising: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let falling: Vec<f64> = (0..60).map(|i| 200.0 - i as f64).collect();
        let result = analyze_series(vec![
            (symbol("UP", "A"), series(&rising), None),
            (symbol("DN", "A"), series(&falling), None),
        ]);

        let up = result.snapshots.iter().find(|s| s.ticker == "UP").unwrap();
        let dn = result.snapshots.iter().find(|s| s.ticker == "DN").unwrap();
        assert_eq!(up.signal, Some(Signal::Buy));
        assert_eq!(dn.signal, Some(Signal::Sell));
    }

    #[test]
    fn test_analysis_is_idempotent() {
        let inputs = || {
            vec![
                (
                    symbol("AAA", "Energy"),
                    series(&(0..80).map(|i| 100.0 + (i as f64 * 0.4).sin() * 6.0).collect::<Vec<_>>()),
                    Some(fundamentals(18.0, 900.0)),
                ),
                (symbol("BBB", "Banks"), series(&[10.0, 11.0, 10.5]), None),
            ]
        };

        let first = analyze_series(inputs());
        let second = analyze_series(inputs());

        let strip_time = |r: &AnalysisResult| {
            let mut v = serde_json::to_value(r).unwrap();
            v["overview"]
                .as_object_mut()
                .unwrap()
                .remove("analysis_time");
            v
        };
        assert_eq!(strip_time(&first), strip_time(&second));
    }

    #[test]
    fn test_analyze_cache_skips_uncached_symbols() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path().to_path_buf());
        store.write_history("AAA", &series(&[100.0, 101.0])).unwrap();

        let listed = vec![symbol("AAA", "Energy"), symbol("GHOST", "Energy")];
        let result = analyze_cache(&store, &listed).unwrap();

        assert_eq!(result.snapshots.len(), 1);
        assert!(result.skipped.contains(&"GHOST".to_string()));
        assert_eq!(result.overview.symbol_count, 1);
    }
}
