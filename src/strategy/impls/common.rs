// Shared helpers used across the single-indicator strategy state machines.

use chrono::{DateTime, Utc};

use crate::types::{Action, Bar, BarSeries, Signal, SignalType};

/// Ratio of the most recent bar's volume to the trailing average volume.
/// Returns `1.0` (neutral) when there isn't enough history to judge.
pub fn volume_ratio(bars: &BarSeries, lookback: usize) -> f64 {
    let volumes = bars.volumes();
    if volumes.len() < lookback + 1 || lookback == 0 {
        return 1.0;
    }
    let window = &volumes[volumes.len() - lookback - 1..volumes.len() - 1];
    let avg = window.iter().sum::<f64>() / lookback as f64;
    if avg <= 0.0 {
        return 1.0;
    }
    volumes[volumes.len() - 1] / avg
}

/// Deterministic confidence function: linear distance of `value` past
/// `threshold`, normalized by `scale` and clamped to `[min_conf, 1.0]`.
pub fn distance_confidence(value: f64, threshold: f64, scale: f64, min_conf: f64) -> f64 {
    if scale <= 0.0 {
        return min_conf;
    }
    let raw = (value - threshold).abs() / scale;
    raw.clamp(min_conf, 1.0)
}

pub fn last_bar(bars: &BarSeries) -> Option<&Bar> {
    bars.last()
}

#[allow(clippy::too_many_arguments)]
pub fn entry_signal(
    symbol: &str,
    strategy_id: &str,
    signal_type: SignalType,
    action: Action,
    price: f64,
    qty_hint: u64,
    confidence: f64,
    reason: impl Into<String>,
    now: DateTime<Utc>,
) -> Option<Signal> {
    Signal::new(symbol, strategy_id, signal_type, action, price, qty_hint.max(1), confidence, reason, false, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn bar(ts: i64, close: f64, volume: u64) -> Bar {
        Bar {
            timestamp: Utc.timestamp_opt(ts, 0).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume,
        }
    }

    #[test]
    fn volume_ratio_above_one_on_spike() {
        let mut bars = Vec::new();
        for i in 0..10 {
            bars.push(bar(i * 60, 100.0, 100));
        }
        bars.push(bar(600, 100.0, 500));
        let series = BarSeries::new(bars).unwrap();
        assert!(volume_ratio(&series, 10) > 1.0);
    }

    #[test]
    fn distance_confidence_clamped() {
        assert_eq!(distance_confidence(100.0, 100.0, 10.0, 0.2), 0.2);
        assert_eq!(distance_confidence(130.0, 100.0, 10.0, 0.2), 1.0);
    }
}
