// =============================================================================
// Z-Score
// =============================================================================
//
// Z-Score(xs, n) = (x - mean_n) / (stddev_n + eps), a measure of how many
// standard deviations the latest value sits from the trailing-n mean.

const EPS: f64 = 1e-9;

/// Most recent z-score over the trailing `n` values (population stddev).
pub fn current_zscore(xs: &[f64], n: usize) -> Option<f64> {
    if n < 2 || xs.len() < n {
        return None;
    }
    let window = &xs[xs.len() - n..];
    let mean = window.iter().sum::<f64>() / n as f64;
    let variance = window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;
    let stddev = variance.sqrt();
    let x = *xs.last()?;
    let z = (x - mean) / (stddev + EPS);
    z.is_finite().then_some(z)
}

/// Full z-score series aligned to `xs`'s index (first `n-1` entries `NaN`).
pub fn calculate_zscore(xs: &[f64], n: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; xs.len()];
    if n < 2 {
        return out;
    }
    for i in (n - 1)..xs.len() {
        if let Some(z) = current_zscore(&xs[..=i], n) {
            out[i] = z;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zscore_of_mean_is_zero() {
        let xs = vec![10.0; 20];
        let z = current_zscore(&xs, 20).unwrap();
        assert!(z.abs() < 1e-6);
    }

    #[test]
    fn zscore_detects_outlier() {
        let mut xs = vec![100.0; 19];
        xs.push(150.0);
        let z = current_zscore(&xs, 20).unwrap();
        assert!(z > 2.0);
    }

    #[test]
    fn zscore_insufficient_data_returns_none() {
        assert!(current_zscore(&[1.0, 2.0], 5).is_none());
    }

    #[test]
    fn zscore_series_aligned_to_input() {
        let xs: Vec<f64> = (1..=10).map(|x| x as f64).collect();
        let series = calculate_zscore(&xs, 5);
        assert_eq!(series.len(), xs.len());
        assert!(series[3].is_nan());
        assert!(series[4].is_finite());
    }
}
