// =============================================================================
// Aroon
// =============================================================================
//
// Aroon-Up = 100 * (n - bars since highest high in window) / n
// Aroon-Down = 100 * (n - bars since lowest low in window) / n
// Both measured over a trailing window of `n + 1` bars (the window includes
// the current bar).

#[derive(Debug, Clone, Copy)]
pub struct AroonResult {
    pub up: f64,
    pub down: f64,
}

pub fn current_aroon(h: &[f64], l: &[f64], n: usize) -> Option<AroonResult> {
    if n == 0 || h.len() != l.len() || h.len() < n + 1 {
        return None;
    }
    let h_window = &h[h.len() - (n + 1)..];
    let l_window = &l[l.len() - (n + 1)..];

    let highest_idx = h_window
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
        .map(|(i, _)| i)?;
    let lowest_idx = l_window
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.partial_cmp(b.1).unwrap())
        .map(|(i, _)| i)?;

    let bars_since_high = n - highest_idx;
    let bars_since_low = n - lowest_idx;

    let up = 100.0 * (n - bars_since_high) as f64 / n as f64;
    let down = 100.0 * (n - bars_since_low) as f64 / n as f64;

    Some(AroonResult { up, down })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aroon_insufficient_data() {
        assert!(current_aroon(&[1.0, 2.0], &[1.0, 2.0], 14).is_none());
    }

    #[test]
    fn aroon_high_at_last_bar_is_100() {
        let h: Vec<f64> = (0..=14).map(|i| i as f64).collect();
        let l: Vec<f64> = (0..=14).map(|i| i as f64 - 1.0).collect();
        let a = current_aroon(&h, &l, 14).unwrap();
        assert_eq!(a.up, 100.0);
    }

    #[test]
    fn aroon_high_at_first_bar_is_zero() {
        let mut h: Vec<f64> = (0..=14).map(|i| 14.0 - i as f64).collect();
        h[0] = 100.0;
        let l: Vec<f64> = vec![1.0; 15];
        let a = current_aroon(&h, &l, 14).unwrap();
        assert_eq!(a.up, 0.0);
    }
}
