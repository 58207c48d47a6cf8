// =============================================================================
// Keltner Channel
// =============================================================================
//
// Mid = EMA(close, n); upper/lower = mid +/- multiplier * ATR(h, l, c, n).

use crate::indicators::atr::calculate_atr;
use crate::indicators::ema::calculate_ema;

#[derive(Debug, Clone, Copy)]
pub struct KeltnerResult {
    pub upper: f64,
    pub mid: f64,
    pub lower: f64,
}

pub fn calculate_keltner(h: &[f64], l: &[f64], c: &[f64], n: usize, multiplier: f64) -> Option<KeltnerResult> {
    let mid = *calculate_ema(c, n).last()?;
    let atr = calculate_atr(h, l, c, n)?;
    let band = multiplier * atr;
    Some(KeltnerResult {
        upper: mid + band,
        mid,
        lower: mid - band,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keltner_insufficient_data() {
        let h = vec![1.0; 3];
        let l = vec![1.0; 3];
        let c = vec![1.0; 3];
        assert!(calculate_keltner(&h, &l, &c, 20, 2.0).is_none());
    }

    #[test]
    fn keltner_upper_above_lower() {
        let n = 30;
        let c: Vec<f64> = (0..n).map(|i| 100.0 + (i as f64 * 0.3).sin() * 2.0).collect();
        let h: Vec<f64> = c.iter().map(|x| x + 1.0).collect();
        let l: Vec<f64> = c.iter().map(|x| x - 1.0).collect();
        let k = calculate_keltner(&h, &l, &c, 20, 2.0).unwrap();
        assert!(k.upper > k.mid);
        assert!(k.mid > k.lower);
    }
}
