// =============================================================================
// Average True Range (ATR) — rolling mean
// =============================================================================
//
// ATR measures market volatility by decomposing the entire range of a bar.
//
// True Range (TR) for each bar:
//   TR = max(H - L, |H - prevClose|, |L - prevClose|)
//
// ATR is the plain rolling mean of TR over the trailing `period` bars (not
// Wilder's recursive smoothing):
//   ATR = mean(TR_{t-period+1}, ..., TR_t)
//
// Default period: 14
// =============================================================================

/// Compute the most recent ATR value from parallel high/low/close slices
/// (oldest first) as the rolling mean of True Range.
///
/// # Returns
/// `None` when:
/// - `period` is zero.
/// - the three slices have differing lengths.
/// - There are fewer than `period + 1` bars (we need `period` TR values,
///   each requiring a previous bar for the True Range calculation).
/// - Any intermediate value is non-finite.
pub fn calculate_atr(h: &[f64], l: &[f64], c: &[f64], period: usize) -> Option<f64> {
    if period == 0 || h.len() != l.len() || h.len() != c.len() || h.len() < period + 1 {
        return None;
    }

    // --- Step 1: Compute True Range for each consecutive pair ----------------
    let mut tr_values: Vec<f64> = Vec::with_capacity(h.len() - 1);
    for i in 1..h.len() {
        let high = h[i];
        let low = l[i];
        let prev_close = c[i - 1];

        let hl = high - low;
        let hc = (high - prev_close).abs();
        let lc = (low - prev_close).abs();

        tr_values.push(hl.max(hc).max(lc));
    }

    if tr_values.len() < period {
        return None;
    }

    // --- Step 2: Rolling mean over the most recent `period` TR values --------
    let window = &tr_values[tr_values.len() - period..];
    let atr = window.iter().sum::<f64>() / period as f64;

    if atr.is_finite() {
        Some(atr)
    } else {
        None
    }
}

/// Calculate ATR as a percentage of the current close.
pub fn calculate_atr_pct(h: &[f64], l: &[f64], c: &[f64], period: usize) -> Option<f64> {
    let atr = calculate_atr(h, l, c, period)?;
    let last_close = *c.last()?;
    if last_close == 0.0 {
        return None;
    }
    Some((atr / last_close) * 100.0)
}

/// Convenience function: ATR with the standard 14-period default.
pub fn calculate(h: &[f64], l: &[f64], c: &[f64]) -> Option<f64> {
    calculate_atr(h, l, c, 14)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hlc(rows: &[(f64, f64, f64)]) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        (
            rows.iter().map(|r| r.0).collect(),
            rows.iter().map(|r| r.1).collect(),
            rows.iter().map(|r| r.2).collect(),
        )
    }

    #[test]
    fn atr_insufficient_data() {
        let (h, l, c) = hlc(&[(101.0, 99.0, 100.0)]);
        assert!(calculate_atr(&h, &l, &c, 14).is_none());
    }

    #[test]
    fn atr_period_zero() {
        let (h, l, c) = hlc(&[(101.0, 99.0, 100.0), (102.0, 98.0, 100.0)]);
        assert!(calculate_atr(&h, &l, &c, 0).is_none());
    }

    #[test]
    fn atr_constant_range_converges_to_range() {
        let mut h = Vec::new();
        let mut l = Vec::new();
        let mut c = Vec::new();
        for i in 0..30 {
            let base = 100.0 + i as f64 * 0.1;
            h.push(base + 5.0);
            l.push(base - 5.0);
            c.push(base);
        }
        let atr = calculate_atr(&h, &l, &c, 14).unwrap();
        assert!((atr - 10.0).abs() < 1.0, "expected ATR near 10.0, got {atr}");
    }

    #[test]
    fn atr_true_range_uses_prev_close_on_gaps() {
        // Gap up: |115 - 95| = 20 > 115 - 108 = 7, so TR must reflect the gap.
        let h = vec![105.0, 115.0, 118.0, 120.0];
        let l = vec![95.0, 108.0, 110.0, 113.0];
        let c = vec![95.0, 112.0, 115.0, 118.0];
        let atr = calculate_atr(&h, &l, &c, 3).unwrap();
        assert!(atr > 7.0);
    }

    #[test]
    fn atr_pct_scales_by_close() {
        let mut h = Vec::new();
        let mut l = Vec::new();
        let mut c = Vec::new();
        for _ in 0..20 {
            h.push(105.0);
            l.push(95.0);
            c.push(100.0);
        }
        let pct = calculate_atr_pct(&h, &l, &c, 14).unwrap();
        assert!((pct - 10.0).abs() < 1.0);
    }
}
