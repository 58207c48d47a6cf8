// =============================================================================
// Linear Regression Features
// =============================================================================
//
// Ordinary least squares fit of `y` against the bar index `0..n`, over the
// trailing `n` values. Exposes slope, intercept, a one-step-ahead forecast,
// and the standard error of the residuals.

#[derive(Debug, Clone, Copy)]
pub struct LinRegFeatures {
    pub slope: f64,
    pub intercept: f64,
    pub forecast: f64,
    pub std_error: f64,
}

pub fn calculate_linreg(ys: &[f64], n: usize) -> Option<LinRegFeatures> {
    if n < 2 || ys.len() < n {
        return None;
    }
    let window = &ys[ys.len() - n..];

    let xs: Vec<f64> = (0..n).map(|i| i as f64).collect();
    let x_mean = xs.iter().sum::<f64>() / n as f64;
    let y_mean = window.iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    for i in 0..n {
        let dx = xs[i] - x_mean;
        cov += dx * (window[i] - y_mean);
        var_x += dx * dx;
    }
    if var_x == 0.0 {
        return None;
    }

    let slope = cov / var_x;
    let intercept = y_mean - slope * x_mean;

    let mut sse = 0.0;
    for i in 0..n {
        let predicted = intercept + slope * xs[i];
        let residual = window[i] - predicted;
        sse += residual * residual;
    }
    let std_error = if n > 2 { (sse / (n - 2) as f64).sqrt() } else { 0.0 };

    let forecast = intercept + slope * n as f64;

    if ![slope, intercept, forecast, std_error].iter().all(|v| v.is_finite()) {
        return None;
    }

    Some(LinRegFeatures { slope, intercept, forecast, std_error })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linreg_insufficient_data() {
        assert!(calculate_linreg(&[1.0], 5).is_none());
    }

    #[test]
    fn linreg_perfect_line() {
        let ys: Vec<f64> = (0..20).map(|i| 2.0 * i as f64 + 3.0).collect();
        let f = calculate_linreg(&ys, 20).unwrap();
        assert!((f.slope - 2.0).abs() < 1e-9);
        assert!((f.intercept - 3.0).abs() < 1e-9);
        assert!(f.std_error.abs() < 1e-9);
    }

    #[test]
    fn linreg_flat_series_zero_slope() {
        let ys = vec![50.0; 20];
        let f = calculate_linreg(&ys, 20).unwrap();
        assert!(f.slope.abs() < 1e-9);
        assert!((f.forecast - 50.0).abs() < 1e-9);
    }
}
