// =============================================================================
// Commodity Channel Index (CCI)
// =============================================================================
//
// Typical price TP = (H+L+C)/3.
// CCI = (TP - SMA(TP, n)) / (0.015 * MAD) where MAD is the mean absolute
// deviation of TP from its SMA over the trailing `n` bars.

const CCI_CONSTANT: f64 = 0.015;

/// Most recent CCI value over the trailing `n` bars.
pub fn current_cci(h: &[f64], l: &[f64], c: &[f64], n: usize) -> Option<f64> {
    if n == 0 || h.len() != l.len() || h.len() != c.len() || h.len() < n {
        return None;
    }
    let tp: Vec<f64> = (0..h.len()).map(|i| (h[i] + l[i] + c[i]) / 3.0).collect();
    let window = &tp[tp.len() - n..];
    let sma = window.iter().sum::<f64>() / n as f64;
    let mad = window.iter().map(|x| (x - sma).abs()).sum::<f64>() / n as f64;
    if mad == 0.0 {
        return Some(0.0);
    }
    let current_tp = *tp.last()?;
    let cci = (current_tp - sma) / (CCI_CONSTANT * mad);
    cci.is_finite().then_some(cci)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cci_insufficient_data() {
        assert!(current_cci(&[1.0], &[1.0], &[1.0], 20).is_none());
    }

    #[test]
    fn cci_flat_series_is_zero() {
        let h = vec![101.0; 25];
        let l = vec![99.0; 25];
        let c = vec![100.0; 25];
        let cci = current_cci(&h, &l, &c, 20).unwrap();
        assert!(cci.abs() < 1e-9);
    }

    #[test]
    fn cci_detects_overbought_spike() {
        let mut h: Vec<f64> = (0..20).map(|_| 101.0).collect();
        let mut l: Vec<f64> = (0..20).map(|_| 99.0).collect();
        let mut c: Vec<f64> = (0..20).map(|_| 100.0).collect();
        h.push(130.0);
        l.push(128.0);
        c.push(129.0);
        let cci = current_cci(&h, &l, &c, 20).unwrap();
        assert!(cci > 100.0);
    }
}
