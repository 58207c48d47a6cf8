// =============================================================================
// Moving Average Convergence Divergence (MACD)
// =============================================================================
//
//   line      = EMA(closes, fast) - EMA(closes, slow)
//   signal    = EMA(line, signal_period)
//   histogram = line - signal
//
// Both EMA series are seeded from the first close and run the full length of
// `closes`, so `fast_ema` and `slow_ema` are already aligned index-for-index
// (no offset needed) once both are at least `slow` long.

use crate::indicators::ema::calculate_ema;

#[derive(Debug, Clone)]
pub struct MacdResult {
    pub line: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

/// Compute the full MACD series. Returns `None` if there isn't enough data
/// for the slow EMA plus the signal EMA.
pub fn calculate_macd(closes: &[f64], fast: usize, slow: usize, signal_period: usize) -> Option<MacdResult> {
    if fast == 0 || slow == 0 || signal_period == 0 || fast >= slow {
        return None;
    }

    let fast_ema = calculate_ema(closes, fast);
    let slow_ema = calculate_ema(closes, slow);
    if fast_ema.is_empty() || slow_ema.is_empty() {
        return None;
    }

    // Both series are seeded from closes[0] and run the full length of
    // `closes`, so they're already aligned index-for-index.
    let n = fast_ema.len().min(slow_ema.len());
    if n == 0 {
        return None;
    }

    let line: Vec<f64> = (0..n).map(|i| fast_ema[i] - slow_ema[i]).collect();

    let signal = calculate_ema(&line, signal_period);
    if signal.is_empty() {
        return Some(MacdResult { line, signal: Vec::new(), histogram: Vec::new() });
    }

    let sig_offset = line.len() - signal.len();
    let histogram: Vec<f64> = signal
        .iter()
        .enumerate()
        .map(|(i, s)| line[sig_offset + i] - s)
        .collect();

    Some(MacdResult { line, signal, histogram })
}

/// Default MACD(12, 26, 9).
pub fn calculate(closes: &[f64]) -> Option<MacdResult> {
    calculate_macd(closes, 12, 26, 9)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ascending(n: usize) -> Vec<f64> {
        (1..=n).map(|i| i as f64).collect()
    }

    #[test]
    fn macd_insufficient_data_returns_none() {
        assert!(calculate_macd(&ascending(10), 12, 26, 9).is_none());
    }

    #[test]
    fn macd_invalid_periods_returns_none() {
        assert!(calculate_macd(&ascending(100), 26, 12, 9).is_none());
        assert!(calculate_macd(&ascending(100), 0, 26, 9).is_none());
    }

    #[test]
    fn macd_uptrend_line_is_positive() {
        // A steady uptrend makes the fast EMA run above the slow EMA.
        let closes = ascending(100);
        let macd = calculate_macd(&closes, 12, 26, 9).unwrap();
        assert!(*macd.line.last().unwrap() > 0.0);
    }

    #[test]
    fn macd_histogram_equals_line_minus_signal() {
        let closes = ascending(100);
        let macd = calculate_macd(&closes, 12, 26, 9).unwrap();
        let offset = macd.line.len() - macd.signal.len();
        for (i, h) in macd.histogram.iter().enumerate() {
            let expected = macd.line[offset + i] - macd.signal[i];
            assert!((h - expected).abs() < 1e-9);
        }
    }
}
