//! Fetch orchestrator: walks the symbol list sequentially, pulls history and
//! fundamentals per symbol through the paced client, and persists cache
//! entries. Per-symbol failures are collected and reported at the end of the
//! run; only unrecoverable I/O aborts.

use crate::constants::FETCH_PACING_MS;
use crate::error::{Error, Result};
use crate::models::SymbolRecord;
use crate::services::cache_store::CacheStore;
use crate::services::yahoo::{YahooClient, YahooError};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Fetch run configuration
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Fixed delay between symbols (on top of the client's rate limiter)
    pub pacing: Duration,
    /// Hide the progress bar (tests, cron)
    pub quiet: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            pacing: Duration::from_millis(FETCH_PACING_MS),
            quiet: false,
        }
    }
}

/// Per-run bookkeeping, reported in the final summary
#[derive(Debug, Default)]
pub struct FetchStats {
    pub fetched: usize,
    pub total_rows: usize,
    /// Symbols the feed does not know or returned no data for
    pub not_found: Vec<String>,
    /// Symbols that exhausted their retries (ticker, reason)
    pub failed: Vec<(String, String)>,
    /// Symbols whose fundamentals call failed (history still cached)
    pub fundamentals_missing: usize,
}

impl FetchStats {
    pub fn attempted(&self) -> usize {
        self.fetched + self.not_found.len() + self.failed.len()
    }
}

pub struct FetchSync {
    client: YahooClient,
    store: CacheStore,
    config: FetchConfig,
    stats: FetchStats,
}

impl FetchSync {
    pub fn new(store: CacheStore, config: FetchConfig) -> Result<Self> {
        let client = YahooClient::with_defaults()
            .map_err(|e| Error::Config(format!("Failed to create API client: {}", e)))?;

        Ok(Self {
            client,
            store,
            config,
            stats: FetchStats::default(),
        })
    }

    /// Fetch every symbol in order. Returns the run stats; the run itself
    /// only errs on unrecoverable I/O.
    pub async fn fetch_all(&mut self, symbols: &[SymbolRecord]) -> Result<&FetchStats> {
        let start_time = Instant::now();

        let progress = if self.config.quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(symbols.len() as u64)
        };
        progress.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
        );

        for (i, symbol) in symbols.iter().enumerate() {
            progress.set_message(symbol.ticker.clone());

            self.fetch_one(symbol).await?;
            progress.inc(1);

            // Fixed pacing between symbols to stay under the feed's limits
            if i + 1 < symbols.len() {
                tokio::time::sleep(self.config.pacing).await;
            }
        }

        progress.finish_and_clear();
        info!(
            "Fetch run finished: {} ok, {} not found, {} failed in {:.1}s",
            self.stats.fetched,
            self.stats.not_found.len(),
            self.stats.failed.len(),
            start_time.elapsed().as_secs_f64()
        );

        Ok(&self.stats)
    }

    /// One symbol: history (load-bearing) then fundamentals (best effort).
    /// The client already retries transient errors with backoff, so any
    /// error surfacing here is final for this run.
    async fn fetch_one(&mut self, symbol: &SymbolRecord) -> Result<()> {
        let ticker = &symbol.ticker;

        let bars = match self.client.fetch_history(ticker).await {
            Ok(bars) => bars,
            Err(YahooError::NotFound(_)) | Err(YahooError::NoData(_)) => {
                warn!("{}: no data on the feed, skipping", ticker);
                self.stats.not_found.push(ticker.clone());
                return Ok(());
            }
            Err(e) => {
                warn!("{}: giving up after bounded retries: {}", ticker, e);
                self.stats.failed.push((ticker.clone(), e.to_string()));
                return Ok(());
            }
        };

        // Cache write failures abort the run
        let total_rows = self.store.write_history(ticker, &bars)?;

        match self.client.fetch_fundamentals(ticker).await {
            Ok(fundamentals) => {
                self.store.write_fundamentals(ticker, &fundamentals)?;
            }
            Err(e) => {
                warn!("{}: fundamentals unavailable: {}", ticker, e);
                self.stats.fundamentals_missing += 1;
            }
        }

        self.stats.fetched += 1;
        self.stats.total_rows += total_rows;
        Ok(())
    }

    pub fn stats(&self) -> &FetchStats {
        &self.stats
    }

    /// Final run summary printed to the console
    pub fn print_summary(&self) {
        println!("\n📊 Fetch summary");
        println!("   ✅ Fetched:        {} symbols", self.stats.fetched);
        println!("   🧾 Rows cached:    {}", self.stats.total_rows);
        if self.stats.fundamentals_missing > 0 {
            println!(
                "   ⚠️  No fundamentals: {} symbols",
                self.stats.fundamentals_missing
            );
        }
        if !self.stats.not_found.is_empty() {
            println!("   ⏭️  Not on feed:    {}", self.stats.not_found.join(", "));
        }
        if !self.stats.failed.is_empty() {
            println!("   ❌ Failed:         {} symbols", self.stats.failed.len());
            for (ticker, reason) in &self.stats.failed {
                println!("      {} - {}", ticker, reason);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pacing() {
        let config = FetchConfig::default();
        assert_eq!(config.pacing, Duration::from_millis(FETCH_PACING_MS));
        assert!(!config.quiet);
    }

    #[test]
    fn test_stats_attempted() {
        let stats = FetchStats {
            fetched: 7,
            total_rows: 1700,
            not_found: vec!["XXXX".to_string()],
            failed: vec![("YYYY".to_string(), "Rate limit exceeded".to_string())],
            fundamentals_missing: 1,
        };
        assert_eq!(stats.attempted(), 9);
    }
}
