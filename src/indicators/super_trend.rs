// =============================================================================
// Super-Trend
// =============================================================================
//
// Basic bands: hl2 +/- factor * ATR.
// Final bands use the classic locked-band recurrence:
//   - the upper band cannot rise above its previous value while the previous
//     close sat below it (it can only ratchet down);
//   - symmetrically, the lower band cannot fall below its previous value
//     while the previous close sat above it (it can only ratchet up).
// Trend flips when the close crosses the active final band.

use crate::indicators::atr::calculate_atr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy)]
pub struct SuperTrendResult {
    pub level: f64,
    pub trend: Trend,
}

/// Compute the Super-Trend level/direction over the full series, returning
/// only the final value (the recurrence needs the whole history to be
/// meaningful, so there is no pure "single bar" variant).
pub fn calculate_super_trend(h: &[f64], l: &[f64], c: &[f64], period: usize, factor: f64) -> Option<SuperTrendResult> {
    if h.len() != l.len() || h.len() != c.len() || h.len() < period + 2 {
        return None;
    }

    let mut final_upper = f64::NAN;
    let mut final_lower = f64::NAN;
    let mut trend = Trend::Up;

    // We need an ATR at every bar from `period` onward; compute it
    // incrementally by re-running calculate_atr on growing prefixes. This is
    // O(n^2) but n is small (intraday lookback windows, not tick-by-tick).
    for i in period..h.len() {
        let atr = calculate_atr(&h[..=i], &l[..=i], &c[..=i], period)?;
        let hl2 = (h[i] + l[i]) / 2.0;
        let basic_upper = hl2 + factor * atr;
        let basic_lower = hl2 - factor * atr;

        let prev_close = c[i - 1];

        let new_final_upper = if final_upper.is_nan() || basic_upper < final_upper || prev_close > final_upper {
            basic_upper
        } else {
            final_upper
        };
        let new_final_lower = if final_lower.is_nan() || basic_lower > final_lower || prev_close < final_lower {
            basic_lower
        } else {
            final_lower
        };

        trend = match trend {
            Trend::Up if c[i] < new_final_lower => Trend::Down,
            Trend::Down if c[i] > new_final_upper => Trend::Up,
            other => other,
        };

        final_upper = new_final_upper;
        final_lower = new_final_lower;
    }

    let level = match trend {
        Trend::Up => final_lower,
        Trend::Down => final_upper,
    };

    Some(SuperTrendResult { level, trend })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trending_up(n: usize) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let mut h = Vec::new();
        let mut l = Vec::new();
        let mut c = Vec::new();
        for i in 0..n {
            let base = 100.0 + i as f64;
            h.push(base + 1.0);
            l.push(base - 1.0);
            c.push(base);
        }
        (h, l, c)
    }

    #[test]
    fn super_trend_insufficient_data() {
        let (h, l, c) = trending_up(5);
        assert!(calculate_super_trend(&h, &l, &c, 10, 3.0).is_none());
    }

    #[test]
    fn super_trend_uptrend_flags_up() {
        let (h, l, c) = trending_up(40);
        let st = calculate_super_trend(&h, &l, &c, 10, 3.0).unwrap();
        assert_eq!(st.trend, Trend::Up);
        assert!(st.level < *c.last().unwrap());
    }

    #[test]
    fn super_trend_flip_on_sharp_reversal() {
        let (mut h, mut l, mut c) = trending_up(40);
        // Sharp reversal: crash the close well below the trailing lower band.
        for _ in 0..5 {
            let last = *c.last().unwrap();
            c.push(last - 20.0);
            h.push(last - 19.0);
            l.push(last - 21.0);
        }
        let st = calculate_super_trend(&h, &l, &c, 10, 3.0).unwrap();
        assert_eq!(st.trend, Trend::Down);
    }
}
