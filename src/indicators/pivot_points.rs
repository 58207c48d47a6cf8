// =============================================================================
// Classic Pivot Points
// =============================================================================
//
// Computed from the prior period's high/low/close:
//   P  = (H + L + C) / 3
//   R1 = 2P - L        S1 = 2P - H
//   R2 = P + (H - L)   S2 = P - (H - L)

#[derive(Debug, Clone, Copy)]
pub struct PivotLevels {
    pub pivot: f64,
    pub r1: f64,
    pub r2: f64,
    pub s1: f64,
    pub s2: f64,
}

pub fn calculate_pivot_points(prev_high: f64, prev_low: f64, prev_close: f64) -> Option<PivotLevels> {
    if !prev_high.is_finite() || !prev_low.is_finite() || !prev_close.is_finite() {
        return None;
    }
    if prev_high < prev_low {
        return None;
    }
    let pivot = (prev_high + prev_low + prev_close) / 3.0;
    let range = prev_high - prev_low;
    Some(PivotLevels {
        pivot,
        r1: 2.0 * pivot - prev_low,
        s1: 2.0 * pivot - prev_high,
        r2: pivot + range,
        s2: pivot - range,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pivot_points_basic() {
        let levels = calculate_pivot_points(110.0, 100.0, 105.0).unwrap();
        assert!((levels.pivot - 105.0).abs() < 1e-9);
        assert!((levels.r1 - 110.0).abs() < 1e-9);
        assert!((levels.s1 - 100.0).abs() < 1e-9);
        assert!((levels.r2 - 115.0).abs() < 1e-9);
        assert!((levels.s2 - 95.0).abs() < 1e-9);
    }

    #[test]
    fn pivot_points_rejects_inverted_range() {
        assert!(calculate_pivot_points(90.0, 100.0, 95.0).is_none());
    }

    #[test]
    fn pivot_points_rejects_non_finite() {
        assert!(calculate_pivot_points(f64::NAN, 100.0, 95.0).is_none());
    }
}
