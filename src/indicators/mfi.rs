// =============================================================================
// Money Flow Index (MFI)
// =============================================================================
//
// Volume-weighted RSI variant. Typical price TP = (H+L+C)/3; raw money flow
// RMF = TP * volume. Bars are classified positive/negative by the sign of
// TP's change from the prior bar; MFI = 100 - 100/(1 + positive_sum/negative_sum).

pub fn current_mfi(h: &[f64], l: &[f64], c: &[f64], v: &[f64], n: usize) -> Option<f64> {
    if n == 0 || h.len() != l.len() || h.len() != c.len() || h.len() != v.len() {
        return None;
    }
    if h.len() < n + 1 {
        return None;
    }

    let tp: Vec<f64> = (0..h.len()).map(|i| (h[i] + l[i] + c[i]) / 3.0).collect();
    let rmf: Vec<f64> = (0..tp.len()).map(|i| tp[i] * v[i]).collect();

    let start = tp.len() - n;
    let mut positive = 0.0;
    let mut negative = 0.0;
    for i in start..tp.len() {
        if i == 0 {
            continue;
        }
        if tp[i] > tp[i - 1] {
            positive += rmf[i];
        } else if tp[i] < tp[i - 1] {
            negative += rmf[i];
        }
    }

    if negative == 0.0 {
        return Some(100.0);
    }
    let money_ratio = positive / negative;
    let mfi = 100.0 - 100.0 / (1.0 + money_ratio);
    mfi.is_finite().then_some(mfi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mfi_insufficient_data() {
        assert!(current_mfi(&[1.0], &[1.0], &[1.0], &[1.0], 14).is_none());
    }

    #[test]
    fn mfi_all_positive_flow_is_100() {
        let n = 15;
        let c: Vec<f64> = (0..n).map(|i| 100.0 + i as f64).collect();
        let h: Vec<f64> = c.iter().map(|x| x + 1.0).collect();
        let l: Vec<f64> = c.iter().map(|x| x - 1.0).collect();
        let v: Vec<f64> = vec![1000.0; n];
        let mfi = current_mfi(&h, &l, &c, &v, 14).unwrap();
        assert_eq!(mfi, 100.0);
    }

    #[test]
    fn mfi_in_bounds() {
        let n = 20;
        let c: Vec<f64> = (0..n).map(|i| 100.0 + (i as f64 * 0.5).sin() * 3.0).collect();
        let h: Vec<f64> = c.iter().map(|x| x + 1.0).collect();
        let l: Vec<f64> = c.iter().map(|x| x - 1.0).collect();
        let v: Vec<f64> = vec![500.0; n];
        let mfi = current_mfi(&h, &l, &c, &v, 14).unwrap();
        assert!((0.0..=100.0).contains(&mfi));
    }
}
