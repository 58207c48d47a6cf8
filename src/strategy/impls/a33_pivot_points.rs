// A33 — Classic pivot points. The prior bar's H/L/C fixes today's pivot
// levels; enter long on an R1 breakout, short on an S1 breakdown, each
// gated by a minimum breakout strength so a one-tick poke through the level
// doesn't fire.

use chrono::{DateTime, Utc};

use crate::indicators::pivot_points::calculate_pivot_points;
use crate::strategy::base::Strategy;
use crate::strategy::impls::common::entry_signal;
use crate::types::{Action, BarSeries, IndicatorSet, Signal, SignalType};

const BREAKOUT_THRESHOLD: f64 = 0.001;

pub struct PivotPointsBreakout;

impl Strategy for PivotPointsBreakout {
    fn id(&self) -> &str {
        "a33_pivot_points"
    }

    fn generate_signals(&self, symbol: &str, bars: &BarSeries, _indicators: &IndicatorSet, now: DateTime<Utc>) -> Vec<Signal> {
        let closes = bars.closes();
        let highs = bars.highs();
        let lows = bars.lows();
        if closes.len() < 3 {
            return Vec::new();
        }
        let n = closes.len();
        let Some(levels) = calculate_pivot_points(highs[n - 2], lows[n - 2], closes[n - 2]) else { return Vec::new() };
        let Some(prev_levels) = calculate_pivot_points(highs[n - 3], lows[n - 3], closes[n - 3]) else { return Vec::new() };
        let price = closes[n - 1];
        let prev_price = closes[n - 2];

        if prev_price <= prev_levels.r1 && price > levels.r1 {
            let strength = (price - levels.r1) / levels.r1;
            if strength >= BREAKOUT_THRESHOLD {
                let confidence = (0.6 + (strength * 100.0).min(0.3)).min(0.9);
                return entry_signal(
                    symbol, self.id(), SignalType::Named("A33_PIVOT_R1_BREAKOUT".into()), Action::Buy, price, 1,
                    confidence, format!("price broke above R1 ({:.2}), strength {strength:.4}", levels.r1), now,
                )
                .into_iter()
                .collect();
            }
        }
        if prev_price >= prev_levels.s1 && price < levels.s1 {
            let strength = (levels.s1 - price) / levels.s1;
            if strength >= BREAKOUT_THRESHOLD {
                let confidence = (0.6 + (strength * 100.0).min(0.3)).min(0.9);
                return entry_signal(
                    symbol, self.id(), SignalType::Named("A33_PIVOT_S1_BREAKDOWN".into()), Action::Sell, price, 1,
                    confidence, format!("price broke below S1 ({:.2}), strength {strength:.4}", levels.s1), now,
                )
                .into_iter()
                .collect();
            }
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Bar;
    use chrono::TimeZone;

    fn bar(ts: i64, high: f64, low: f64, close: f64) -> Bar {
        Bar { timestamp: Utc.timestamp_opt(ts, 0).unwrap(), open: close, high, low, close, volume: 1_000 }
    }

    #[test]
    fn no_signal_on_insufficient_history() {
        let bars = BarSeries::new(vec![bar(0, 10.0, 9.0, 9.5), bar(60, 10.0, 9.0, 9.5)]).unwrap();
        let indicators = IndicatorSet::default();
        let strat = PivotPointsBreakout;
        assert!(strat.generate_signals("TEST", &bars, &indicators, Utc::now()).is_empty());
    }
}
