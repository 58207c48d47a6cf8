// =============================================================================
// Ultimate Oscillator
// =============================================================================
//
// Weighted 4:2:1 blend of three average-true-range-normalized buying-pressure
// ratios over short/medium/long periods (classically 7/14/28).
//
// BP = close - min(low, prev_close)
// TR = max(high, prev_close) - min(low, prev_close)
// Avg_n = sum(BP, n) / sum(TR, n)
// UO = 100 * (4*Avg_short + 2*Avg_medium + Avg_long) / 7

pub fn current_ultimate_oscillator(
    h: &[f64],
    l: &[f64],
    c: &[f64],
    short: usize,
    medium: usize,
    long: usize,
) -> Option<f64> {
    if h.len() != l.len() || h.len() != c.len() {
        return None;
    }
    if h.len() < long + 1 || short == 0 || medium == 0 || long == 0 {
        return None;
    }

    let n = h.len();
    let mut bp = vec![0.0; n];
    let mut tr = vec![0.0; n];
    for i in 1..n {
        let prev_close = c[i - 1];
        bp[i] = c[i] - l[i].min(prev_close);
        tr[i] = h[i].max(prev_close) - l[i].min(prev_close);
    }

    let avg = |period: usize| -> Option<f64> {
        let bp_sum: f64 = bp[n - period..].iter().sum();
        let tr_sum: f64 = tr[n - period..].iter().sum();
        if tr_sum == 0.0 {
            None
        } else {
            Some(bp_sum / tr_sum)
        }
    };

    let a1 = avg(short)?;
    let a2 = avg(medium)?;
    let a3 = avg(long)?;

    let uo = 100.0 * (4.0 * a1 + 2.0 * a2 + a3) / 7.0;
    uo.is_finite().then_some(uo)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ultimate_insufficient_data() {
        let h = vec![1.0; 10];
        let l = vec![1.0; 10];
        let c = vec![1.0; 10];
        assert!(current_ultimate_oscillator(&h, &l, &c, 7, 14, 28).is_none());
    }

    #[test]
    fn ultimate_strong_uptrend_above_midpoint() {
        let n = 40;
        let c: Vec<f64> = (0..n).map(|i| 100.0 + i as f64).collect();
        let h: Vec<f64> = c.iter().map(|x| x + 1.0).collect();
        let l: Vec<f64> = c.iter().map(|x| x - 1.0).collect();
        let uo = current_ultimate_oscillator(&h, &l, &c, 7, 14, 28).unwrap();
        assert!(uo > 50.0);
    }

    #[test]
    fn ultimate_in_bounds() {
        let n = 40;
        let c: Vec<f64> = (0..n).map(|i| 100.0 + (i as f64 * 0.4).sin() * 5.0).collect();
        let h: Vec<f64> = c.iter().map(|x| x + 1.0).collect();
        let l: Vec<f64> = c.iter().map(|x| x - 1.0).collect();
        let uo = current_ultimate_oscillator(&h, &l, &c, 7, 14, 28).unwrap();
        assert!((0.0..=100.0).contains(&uo));
    }
}
