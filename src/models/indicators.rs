//! Technical indicator math over daily close series.
//!
//! All functions take the full close series in ascending date order and
//! return a vector of the same length. Positions before an indicator's
//! window is satisfied hold `None`; callers read the last element for the
//! latest value. Indicators are recomputed wholesale from raw closes on
//! every analysis run, never maintained incrementally.

/// Simple Moving Average over `period` trading days.
///
/// Defined from index `period - 1`; each value is the arithmetic mean of
/// the `period` closes ending at that index.
pub fn calculate_sma(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut values = vec![None; closes.len()];

    if period == 0 || closes.len() < period {
        return values;
    }

    let mut window_sum: f64 = closes[..period].iter().sum();
    values[period - 1] = Some(window_sum / period as f64);

    for i in period..closes.len() {
        window_sum += closes[i] - closes[i - period];
        values[i] = Some(window_sum / period as f64);
    }

    values
}

/// Exponential Moving Average over `period` trading days.
///
/// Seeded with the simple mean of the first `period` closes, then smoothed
/// with alpha = 2 / (period + 1). Defined from index `period - 1`.
pub fn calculate_ema(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut values = vec![None; closes.len()];

    if period == 0 || closes.len() < period {
        return values;
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let mut ema: f64 = closes[..period].iter().sum::<f64>() / period as f64;
    values[period - 1] = Some(ema);

    for i in period..closes.len() {
        ema = closes[i] * alpha + ema * (1.0 - alpha);
        values[i] = Some(ema);
    }

    values
}

/// Relative Strength Index over `period` trading days (Wilder smoothing).
///
/// RSI = 100 - 100 / (1 + RS), RS = average gain / average loss. The
/// averages are seeded with the simple mean of the first `period` deltas
/// and smoothed with alpha = 1 / period. Needs `period + 1` closes; defined
/// from index `period`. Always inside [0, 100] where defined.
pub fn calculate_rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut values = vec![None; closes.len()];

    if period == 0 || closes.len() < period + 1 {
        return values;
    }

    let gain_at = |i: usize| (closes[i] - closes[i - 1]).max(0.0);
    let loss_at = |i: usize| (closes[i - 1] - closes[i]).max(0.0);

    let mut avg_gain: f64 = (1..=period).map(gain_at).sum::<f64>() / period as f64;
    let mut avg_loss: f64 = (1..=period).map(loss_at).sum::<f64>() / period as f64;
    values[period] = Some(rsi_from_averages(avg_gain, avg_loss));

    let alpha = 1.0 / period as f64;
    for i in (period + 1)..closes.len() {
        avg_gain = gain_at(i) * alpha + avg_gain * (1.0 - alpha);
        avg_loss = loss_at(i) * alpha + avg_loss * (1.0 - alpha);
        values[i] = Some(rsi_from_averages(avg_gain, avg_loss));
    }

    values
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        // Flat or all-gain window: avoid dividing by zero
        if avg_gain == 0.0 {
            50.0
        } else {
            100.0
        }
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    }
}

/// MACD line, signal line and histogram.
#[derive(Debug, Clone, Default)]
pub struct MacdSeries {
    /// fast EMA minus slow EMA
    pub macd: Vec<Option<f64>>,
    /// EMA of the MACD line over the signal window
    pub signal: Vec<Option<f64>>,
    /// macd minus signal
    pub histogram: Vec<Option<f64>>,
}

/// Moving Average Convergence Divergence.
///
/// MACD line is defined from index `slow - 1`; the signal line needs
/// `signal` further MACD values, so it is defined from `slow + signal - 2`.
pub fn calculate_macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> MacdSeries {
    let len = closes.len();
    let mut out = MacdSeries {
        macd: vec![None; len],
        signal: vec![None; len],
        histogram: vec![None; len],
    };

    if fast == 0 || slow == 0 || signal == 0 || fast >= slow || len < slow {
        return out;
    }

    let fast_ema = calculate_ema(closes, fast);
    let slow_ema = calculate_ema(closes, slow);

    for i in 0..len {
        if let (Some(f), Some(s)) = (fast_ema[i], slow_ema[i]) {
            out.macd[i] = Some(f - s);
        }
    }

    // Signal line: EMA over the defined portion of the MACD line,
    // seeded with the simple mean of its first `signal` values.
    let first_defined = slow - 1;
    let defined = len - first_defined;
    if defined < signal {
        return out;
    }

    let alpha = 2.0 / (signal as f64 + 1.0);
    let seed_end = first_defined + signal;
    let mut sig: f64 = out.macd[first_defined..seed_end]
        .iter()
        .map(|v| v.unwrap_or(0.0))
        .sum::<f64>()
        / signal as f64;
    out.signal[seed_end - 1] = Some(sig);

    for i in seed_end..len {
        if let Some(m) = out.macd[i] {
            sig = m * alpha + sig * (1.0 - alpha);
            out.signal[i] = Some(sig);
        }
    }

    for i in 0..len {
        if let (Some(m), Some(s)) = (out.macd[i], out.signal[i]) {
            out.histogram[i] = Some(m - s);
        }
    }

    out
}

/// Momentum: percentage change of close over `period` trading days.
///
/// Defined from index `period`.
pub fn calculate_momentum(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut values = vec![None; closes.len()];

    if period == 0 || closes.len() < period + 1 {
        return values;
    }

    for i in period..closes.len() {
        let base = closes[i - period];
        if base != 0.0 {
            values[i] = Some((closes[i] / base - 1.0) * 100.0);
        }
    }

    values
}

/// Latest close-over-close change in percent, if at least two bars exist.
pub fn daily_change_pct(closes: &[f64]) -> Option<f64> {
    if closes.len() < 2 {
        return None;
    }
    let prev = closes[closes.len() - 2];
    if prev == 0.0 {
        return None;
    }
    Some((closes[closes.len() - 1] - prev) / prev * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sma_two_day() {
        // [100, 102, 101], 2-day SMA at the last point = (102+101)/2
        let values = calculate_sma(&[100.0, 102.0, 101.0], 2);
        assert_eq!(values[0], None);
        assert_eq!(values[1], Some(101.0));
        assert_eq!(values[2], Some(101.5));
    }

    #[test]
    fn test_sma_equals_mean_of_window() {
        let closes: Vec<f64> = (1..=250).map(|i| 100.0 + (i as f64 * 0.37).sin() * 5.0).collect();
        let sma = calculate_sma(&closes, 200);

        assert!(sma[198].is_none());
        let mean: f64 = closes[closes.len() - 200..].iter().sum::<f64>() / 200.0;
        let last = sma.last().unwrap().unwrap();
        assert!((last - mean).abs() < 1e-9);
    }

    #[test]
    fn test_sma_short_series_undefined() {
        let sma = calculate_sma(&[100.0, 101.0], 200);
        assert!(sma.iter().all(|v| v.is_none()));
    }

    #[test]
    fn test_ema_constant_series() {
        let closes = vec![50.0; 40];
        let ema = calculate_ema(&closes, 12);
        assert_eq!(ema[10], None);
        for v in ema.iter().skip(11) {
            assert!((v.unwrap() - 50.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_rsi_bounded() {
        let closes: Vec<f64> = (0..120)
            .map(|i| 100.0 + (i as f64 * 0.7).sin() * 8.0 + (i as f64 * 0.13).cos() * 3.0)
            .collect();
        let rsi = calculate_rsi(&closes, 14);

        assert!(rsi[13].is_none());
        assert!(rsi[14].is_some());
        for v in rsi.iter().flatten() {
            assert!(*v >= 0.0 && *v <= 100.0, "RSI out of bounds: {}", v);
        }
    }

    #[test]
    fn test_rsi_all_gains_is_100() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let rsi = calculate_rsi(&closes, 14);
        assert_eq!(rsi.last().unwrap().unwrap(), 100.0);
    }

    #[test]
    fn test_rsi_all_losses_is_0() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 - i as f64).collect();
        let rsi = calculate_rsi(&closes, 14);
        assert_eq!(rsi.last().unwrap().unwrap(), 0.0);
    }

    #[test]
    fn test_rsi_flat_series_neutral() {
        let closes = vec![75.0; 30];
        let rsi = calculate_rsi(&closes, 14);
        assert_eq!(rsi.last().unwrap().unwrap(), 50.0);
    }

    #[test]
    fn test_macd_definition_points() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64 * 0.5).sin() * 4.0).collect();
        let macd = calculate_macd(&closes, 12, 26, 9);

        assert!(macd.macd[24].is_none());
        assert!(macd.macd[25].is_some());
        // signal needs 9 defined MACD values: 25 + 9 - 1 = 33
        assert!(macd.signal[32].is_none());
        assert!(macd.signal[33].is_some());
        assert!(macd.histogram[33].is_some());

        let last = closes.len() - 1;
        let expected = macd.macd[last].unwrap() - macd.signal[last].unwrap();
        assert!((macd.histogram[last].unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_macd_tracks_ema_difference() {
        let closes: Vec<f64> = (0..80).map(|i| 200.0 + i as f64 * 1.5).collect();
        let macd = calculate_macd(&closes, 12, 26, 9);
        let fast = calculate_ema(&closes, 12);
        let slow = calculate_ema(&closes, 26);

        let last = closes.len() - 1;
        let expected = fast[last].unwrap() - slow[last].unwrap();
        assert!((macd.macd[last].unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_momentum() {
        let closes = vec![100.0, 101.0, 102.0, 103.0, 104.0, 110.0];
        let mom = calculate_momentum(&closes, 5);
        assert_eq!(mom[4], None);
        assert!((mom[5].unwrap() - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_daily_change() {
        assert_eq!(daily_change_pct(&[100.0]), None);
        let change = daily_change_pct(&[100.0, 102.0]).unwrap();
        assert!((change - 2.0).abs() < 1e-12);
        assert_eq!(daily_change_pct(&[0.0, 10.0]), None);
    }
}
