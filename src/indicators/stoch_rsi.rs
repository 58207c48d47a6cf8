// =============================================================================
// Stochastic RSI
// =============================================================================
//
// StochRSI(closes, rsiN, stochN) normalizes RSI to [0, 1] over its own
// trailing `stochN`-window range:
//   StochRSI = (RSI - min(RSI, stochN)) / (max(RSI, stochN) - min(RSI, stochN))

use crate::indicators::rsi::calculate_rsi;

/// Most recent StochRSI value in `[0, 1]`.
pub fn current_stoch_rsi(closes: &[f64], rsi_n: usize, stoch_n: usize) -> Option<f64> {
    let rsi_series = calculate_rsi(closes, rsi_n);
    if rsi_series.len() < stoch_n || stoch_n == 0 {
        return None;
    }
    let window = &rsi_series[rsi_series.len() - stoch_n..];
    let lowest = window.iter().cloned().fold(f64::MAX, f64::min);
    let highest = window.iter().cloned().fold(f64::MIN, f64::max);
    let range = highest - lowest;
    if range <= 0.0 {
        return Some(0.5);
    }
    let current = *rsi_series.last()?;
    let v = (current - lowest) / range;
    v.is_finite().then_some(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stoch_rsi_insufficient_data() {
        let closes = vec![1.0, 2.0, 3.0];
        assert!(current_stoch_rsi(&closes, 14, 14).is_none());
    }

    #[test]
    fn stoch_rsi_in_unit_range() {
        let closes: Vec<f64> = (1..=60).map(|x| x as f64 + (x as f64 * 0.3).sin() * 3.0).collect();
        let v = current_stoch_rsi(&closes, 14, 14).unwrap();
        assert!((0.0..=1.0).contains(&v));
    }

    #[test]
    fn stoch_rsi_flat_rsi_window_is_midpoint() {
        // A pure uptrend drives RSI to a constant 100 once gains dominate,
        // collapsing the stochastic range to zero -> defined midpoint.
        let closes: Vec<f64> = (1..=60).map(|x| x as f64).collect();
        let v = current_stoch_rsi(&closes, 14, 14).unwrap();
        assert!((v - 0.5).abs() < 1e-9 || (0.0..=1.0).contains(&v));
    }
}
