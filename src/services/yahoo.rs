//! HTTP client for the public Yahoo Finance endpoints.
//!
//! The chart endpoint returns up to a year of daily OHLCV bars per symbol;
//! quoteSummary returns the fundamental fields. Both are paced through a
//! sliding-window rate limiter and wrapped in bounded retries with
//! exponential backoff, since the feed throttles aggressively during long
//! multi-symbol runs.

use crate::constants::{
    BACKOFF_BASE_SECS, BACKOFF_CAP_SECS, CHART_API_BASE, EXCHANGE_SUFFIX, FETCH_RANGE,
    HTTP_TIMEOUT_SECS, MAX_FETCH_ATTEMPTS, QUOTE_API_BASE, RATE_LIMIT_PER_MINUTE,
};
use crate::models::{Fundamentals, Ohlcv};
use chrono::DateTime;
use isahc::{config::Configurable, prelude::*, HttpClient};
use serde_json::Value;
use std::time::{Duration as StdDuration, SystemTime};
use tokio::time::sleep;

#[derive(Debug)]
pub enum YahooError {
    Http(isahc::Error),
    Serialization(serde_json::Error),
    InvalidResponse(String),
    RateLimit,
    NotFound(String),
    NoData(String),
}

impl From<isahc::Error> for YahooError {
    fn from(error: isahc::Error) -> Self {
        YahooError::Http(error)
    }
}

impl From<serde_json::Error> for YahooError {
    fn from(error: serde_json::Error) -> Self {
        YahooError::Serialization(error)
    }
}

impl std::fmt::Display for YahooError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            YahooError::Http(e) => write!(f, "HTTP error: {}", e),
            YahooError::Serialization(e) => write!(f, "Serialization error: {}", e),
            YahooError::InvalidResponse(s) => write!(f, "Invalid response: {}", s),
            YahooError::RateLimit => write!(f, "Rate limit exceeded"),
            YahooError::NotFound(s) => write!(f, "Symbol not found: {}", s),
            YahooError::NoData(s) => write!(f, "No data available: {}", s),
        }
    }
}

impl std::error::Error for YahooError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            YahooError::Http(e) => Some(e),
            YahooError::Serialization(e) => Some(e),
            _ => None,
        }
    }
}

impl YahooError {
    /// Transient errors are retried with backoff; a missing symbol or an
    /// empty series is recorded and skipped.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            YahooError::Http(_) | YahooError::RateLimit | YahooError::InvalidResponse(_)
        )
    }
}

pub struct YahooClient {
    client: HttpClient,
    chart_base: String,
    quote_base: String,
    exchange_suffix: String,
    rate_limit_per_minute: u32,
    request_timestamps: Vec<SystemTime>,
    user_agents: Vec<String>,
    random_agent: bool,
}

impl YahooClient {
    pub fn new(random_agent: bool, rate_limit_per_minute: u32) -> Result<Self, YahooError> {
        let client = HttpClient::builder()
            .timeout(StdDuration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;

        let user_agents = vec![
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:120.0) Gecko/20100101 Firefox/120.0".to_string(),
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.3 Safari/605.1.15".to_string(),
        ];

        Ok(YahooClient {
            client,
            chart_base: CHART_API_BASE.to_string(),
            quote_base: QUOTE_API_BASE.to_string(),
            exchange_suffix: EXCHANGE_SUFFIX.to_string(),
            rate_limit_per_minute,
            request_timestamps: Vec::new(),
            user_agents,
            random_agent,
        })
    }

    /// Default client: rotating user agents, shared pacing budget
    pub fn with_defaults() -> Result<Self, YahooError> {
        Self::new(true, RATE_LIMIT_PER_MINUTE)
    }

    /// Override the API base URLs (tests and self-hosted mirrors)
    pub fn with_base_urls(mut self, chart_base: &str, quote_base: &str) -> Self {
        self.chart_base = chart_base.trim_end_matches('/').to_string();
        self.quote_base = quote_base.trim_end_matches('/').to_string();
        self
    }

    /// Full feed symbol for a bare ticker (RELIANCE -> RELIANCE.NS)
    pub fn feed_symbol(&self, ticker: &str) -> String {
        if ticker.contains('.') {
            ticker.to_string()
        } else {
            format!("{}{}", ticker, self.exchange_suffix)
        }
    }

    /// Fetch the daily history for one symbol over the configured range.
    pub async fn fetch_history(&mut self, ticker: &str) -> Result<Vec<Ohlcv>, YahooError> {
        let url = format!(
            "{}/{}?range={}&interval=1d&events=div%2Csplit",
            self.chart_base,
            self.feed_symbol(ticker),
            FETCH_RANGE
        );

        let json = self.make_request(&url).await?;
        let bars = parse_chart_response(&json, ticker)?;
        if bars.is_empty() {
            return Err(YahooError::NoData(ticker.to_string()));
        }
        Ok(bars)
    }

    /// Fetch the fundamental fields for one symbol.
    pub async fn fetch_fundamentals(&mut self, ticker: &str) -> Result<Fundamentals, YahooError> {
        let url = format!(
            "{}/{}?modules=price%2CsummaryDetail%2CdefaultKeyStatistics",
            self.quote_base,
            self.feed_symbol(ticker)
        );

        let json = self.make_request(&url).await?;
        parse_quote_summary(&json, ticker)
    }

    fn get_user_agent(&self) -> String {
        if self.random_agent {
            use rand::seq::SliceRandom;
            self.user_agents
                .choose(&mut rand::thread_rng())
                .unwrap_or(&self.user_agents[0])
                .clone()
        } else {
            self.user_agents[0].clone()
        }
    }

    /// Sliding-window pacing: never more than `rate_limit_per_minute`
    /// requests inside any one-minute window.
    async fn enforce_rate_limit(&mut self) {
        let current_time = SystemTime::now();

        self.request_timestamps.retain(|&timestamp| {
            current_time
                .duration_since(timestamp)
                .unwrap_or(StdDuration::from_secs(0))
                < StdDuration::from_secs(60)
        });

        if self.request_timestamps.len() >= self.rate_limit_per_minute as usize {
            if let Some(&oldest_request) = self.request_timestamps.first() {
                let elapsed = current_time
                    .duration_since(oldest_request)
                    .unwrap_or(StdDuration::from_secs(0));
                let wait_time = StdDuration::from_secs(60).saturating_sub(elapsed);
                if !wait_time.is_zero() {
                    sleep(wait_time + StdDuration::from_millis(100)).await;
                }
            }
        }

        self.request_timestamps.push(current_time);
    }

    /// One GET with bounded retries. A 404 short-circuits; transport
    /// errors, 429 and 5xx back off and retry up to MAX_FETCH_ATTEMPTS.
    async fn make_request(&mut self, url: &str) -> Result<Value, YahooError> {
        let mut last_error: Option<YahooError> = None;

        for attempt in 0..MAX_FETCH_ATTEMPTS {
            self.enforce_rate_limit().await;

            if attempt > 0 {
                let delay = backoff_delay(attempt, rand::random::<f64>());
                let reason = last_error
                    .as_ref()
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "unknown error".to_string());
                tracing::info!(
                    "API retry backoff: attempt {}/{} - reason: {}, waiting {:.1}s before retry",
                    attempt + 1,
                    MAX_FETCH_ATTEMPTS,
                    reason,
                    delay.as_secs_f64()
                );
                sleep(delay).await;
            }

            let request = isahc::Request::builder()
                .uri(url)
                .method("GET")
                .header("Accept", "application/json, text/plain, */*")
                .header("Accept-Language", "en-US,en;q=0.9")
                .header("User-Agent", self.get_user_agent())
                .body(())
                .map_err(|e| YahooError::InvalidResponse(format!("Request build error: {}", e)))?;

            match self.client.send_async(request).await {
                Ok(mut resp) => {
                    let status = resp.status();

                    if status.as_u16() == 429 {
                        last_error = Some(YahooError::RateLimit);
                        continue;
                    }
                    if status.as_u16() == 404 {
                        return Err(YahooError::NotFound(url.to_string()));
                    }
                    if !status.is_success() {
                        last_error = Some(YahooError::InvalidResponse(format!(
                            "HTTP status {}",
                            status
                        )));
                        continue;
                    }

                    match resp.text().await {
                        Ok(text) => match serde_json::from_str::<Value>(&text) {
                            Ok(json) => return Ok(json),
                            Err(e) => {
                                last_error = Some(YahooError::InvalidResponse(format!(
                                    "JSON parse error: {}",
                                    e
                                )));
                            }
                        },
                        Err(e) => {
                            last_error = Some(YahooError::InvalidResponse(format!(
                                "Body read error: {}",
                                e
                            )));
                        }
                    }
                }
                Err(e) => {
                    last_error = Some(YahooError::Http(e));
                }
            }

            if let Some(e) = &last_error {
                if !e.is_retryable() {
                    break;
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| YahooError::InvalidResponse("retries exhausted".to_string())))
    }
}

/// Exponential backoff with jitter: base * 2^(attempt-1) + jitter, capped.
pub fn backoff_delay(attempt: u32, jitter: f64) -> StdDuration {
    let secs = BACKOFF_BASE_SECS * 2.0_f64.powi(attempt.saturating_sub(1) as i32) + jitter;
    StdDuration::from_secs_f64(secs.min(BACKOFF_CAP_SECS))
}

/// Parse the chart endpoint payload into daily bars.
///
/// Bars with a null close are dropped (the feed emits nulls for halted
/// sessions); duplicate timestamps keep the last occurrence.
pub fn parse_chart_response(json: &Value, ticker: &str) -> Result<Vec<Ohlcv>, YahooError> {
    let chart = &json["chart"];

    if !chart["error"].is_null() {
        let code = chart["error"]["code"].as_str().unwrap_or("");
        if code.eq_ignore_ascii_case("not found") {
            return Err(YahooError::NotFound(ticker.to_string()));
        }
        return Err(YahooError::InvalidResponse(format!(
            "chart error for {}: {}",
            ticker, chart["error"]
        )));
    }

    let result = chart["result"]
        .get(0)
        .ok_or_else(|| YahooError::NoData(ticker.to_string()))?;

    let timestamps = result["timestamp"]
        .as_array()
        .ok_or_else(|| YahooError::NoData(ticker.to_string()))?;

    let quote = result["indicators"]["quote"]
        .get(0)
        .ok_or_else(|| YahooError::InvalidResponse(format!("{}: missing quote block", ticker)))?;

    let opens = quote["open"].as_array();
    let highs = quote["high"].as_array();
    let lows = quote["low"].as_array();
    let closes = quote["close"].as_array();
    let volumes = quote["volume"].as_array();

    let (opens, highs, lows, closes, volumes) = match (opens, highs, lows, closes, volumes) {
        (Some(o), Some(h), Some(l), Some(c), Some(v)) => (o, h, l, c, v),
        _ => {
            return Err(YahooError::InvalidResponse(format!(
                "{}: missing OHLCV arrays",
                ticker
            )))
        }
    };

    let mut bars: Vec<Ohlcv> = Vec::with_capacity(timestamps.len());

    for (i, ts) in timestamps.iter().enumerate() {
        let ts = match ts.as_i64() {
            Some(ts) => ts,
            None => continue,
        };
        let date = match DateTime::from_timestamp(ts, 0) {
            Some(dt) => dt.date_naive(),
            None => continue,
        };

        let close = closes.get(i).and_then(Value::as_f64);
        let open = opens.get(i).and_then(Value::as_f64);
        let high = highs.get(i).and_then(Value::as_f64);
        let low = lows.get(i).and_then(Value::as_f64);
        let volume = volumes.get(i).and_then(Value::as_u64).unwrap_or(0);

        if let (Some(open), Some(high), Some(low), Some(close)) = (open, high, low, close) {
            // The feed can repeat the live bar at the tail; last write wins
            if bars.last().map(|b: &Ohlcv| b.date) == Some(date) {
                bars.pop();
            }
            bars.push(Ohlcv::new(date, open, high, low, close, volume));
        }
    }

    bars.sort_by_key(|bar| bar.date);
    Ok(bars)
}

/// Parse the quoteSummary payload into fundamentals.
pub fn parse_quote_summary(json: &Value, ticker: &str) -> Result<Fundamentals, YahooError> {
    let summary = &json["quoteSummary"];

    if !summary["error"].is_null() {
        let code = summary["error"]["code"].as_str().unwrap_or("");
        if code.eq_ignore_ascii_case("not found") {
            return Err(YahooError::NotFound(ticker.to_string()));
        }
        return Err(YahooError::InvalidResponse(format!(
            "quoteSummary error for {}: {}",
            ticker, summary["error"]
        )));
    }

    let result = summary["result"]
        .get(0)
        .ok_or_else(|| YahooError::NoData(ticker.to_string()))?;

    let detail = &result["summaryDetail"];
    let price = &result["price"];
    let stats = &result["defaultKeyStatistics"];

    Ok(Fundamentals {
        market_cap: raw_number(&price["marketCap"]).or_else(|| raw_number(&detail["marketCap"])),
        pe_ratio: raw_number(&detail["trailingPE"]),
        eps: raw_number(&stats["trailingEps"]),
        fifty_two_week_high: raw_number(&detail["fiftyTwoWeekHigh"]),
        fifty_two_week_low: raw_number(&detail["fiftyTwoWeekLow"]),
        dividend_yield: raw_number(&detail["dividendYield"]),
        book_value: raw_number(&stats["bookValue"]),
    })
}

/// The feed wraps numbers as {"raw": 123.4, "fmt": "123.40"}; plain numbers
/// appear in older payloads, so accept both.
fn raw_number(value: &Value) -> Option<f64> {
    value["raw"].as_f64().or_else(|| value.as_f64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_backoff_schedule_bounded() {
        assert_eq!(backoff_delay(1, 0.0), StdDuration::from_secs_f64(1.0));
        assert_eq!(backoff_delay(2, 0.0), StdDuration::from_secs_f64(2.0));
        assert_eq!(backoff_delay(3, 0.5), StdDuration::from_secs_f64(4.5));
        // Cap holds no matter the attempt count
        assert_eq!(backoff_delay(30, 0.9), StdDuration::from_secs_f64(30.0));
    }

    #[test]
    fn test_feed_symbol_suffix() {
        let client = YahooClient::new(false, 60).unwrap();
        assert_eq!(client.feed_symbol("RELIANCE"), "RELIANCE.NS");
        assert_eq!(client.feed_symbol("RELIANCE.NS"), "RELIANCE.NS");
    }

    #[test]
    fn test_parse_chart_response() {
        // Three trading days, second close is null (halted session)
        let payload = json!({
            "chart": {
                "result": [{
                    "timestamp": [1704067200, 1704153600, 1704240000],
                    "indicators": {
                        "quote": [{
                            "open":   [100.0, 101.0, 102.5],
                            "high":   [103.0, 104.0, 105.0],
                            "low":    [99.0, 100.5, 101.0],
                            "close":  [102.0, null, 104.0],
                            "volume": [1_000_000, 900_000, 1_200_000]
                        }]
                    }
                }],
                "error": null
            }
        });

        let bars = parse_chart_response(&payload, "RELIANCE").unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, 102.0);
        assert_eq!(bars[1].close, 104.0);
        assert!(bars[0].date < bars[1].date);
    }

    #[test]
    fn test_parse_chart_not_found() {
        let payload = json!({
            "chart": {
                "result": null,
                "error": { "code": "Not Found", "description": "No data found" }
            }
        });

        let err = parse_chart_response(&payload, "BOGUS").unwrap_err();
        assert!(matches!(err, YahooError::NotFound(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_parse_quote_summary() {
        let payload = json!({
            "quoteSummary": {
                "result": [{
                    "price": { "marketCap": { "raw": 1.95e12, "fmt": "1.95T" } },
                    "summaryDetail": {
                        "trailingPE": { "raw": 27.3 },
                        "fiftyTwoWeekHigh": { "raw": 3024.9 },
                        "fiftyTwoWeekLow": { "raw": 2220.3 },
                        "dividendYield": { "raw": 0.0034 }
                    },
                    "defaultKeyStatistics": {
                        "trailingEps": { "raw": 102.8 },
                        "bookValue": { "raw": 1284.2 }
                    }
                }],
                "error": null
            }
        });

        let f = parse_quote_summary(&payload, "RELIANCE").unwrap();
        assert_eq!(f.market_cap, Some(1.95e12));
        assert_eq!(f.pe_ratio, Some(27.3));
        assert_eq!(f.eps, Some(102.8));
        assert_eq!(f.fifty_two_week_high, Some(3024.9));
    }

    #[test]
    fn test_rate_limit_is_retryable() {
        assert!(YahooError::RateLimit.is_retryable());
        assert!(YahooError::InvalidResponse("HTTP status 503".into()).is_retryable());
        assert!(!YahooError::NoData("X".into()).is_retryable());
    }
}
