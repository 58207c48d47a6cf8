// A1 — Momentum reversal: two sub-detectors keyed by wall-clock bucket.
// Morning: RSI in [50, 67] with price deviation from MA20 >= 0.3%.
// Midday/afternoon: RSI overbought near a 20-bar high, or RSI oversold near
// a 20-bar low. Both require a mild volume-ratio confirmation.

use chrono::{DateTime, Timelike, Utc};

use crate::indicators::rsi::current_rsi;
use crate::indicators::sma::current_sma;
use crate::strategy::base::Strategy;
use crate::strategy::impls::common::{entry_signal, volume_ratio};
use crate::types::{Action, BarSeries, IndicatorSet, Signal, SignalType};

enum TimeBucket {
    Morning,
    MiddayAfternoon,
}

fn time_bucket(now: DateTime<Utc>) -> TimeBucket {
    if now.hour() < 11 {
        TimeBucket::Morning
    } else {
        TimeBucket::MiddayAfternoon
    }
}

pub struct MomentumReversal;

impl Strategy for MomentumReversal {
    fn id(&self) -> &str {
        "a1_momentum_reversal"
    }

    fn generate_signals(&self, symbol: &str, bars: &BarSeries, _indicators: &IndicatorSet, now: DateTime<Utc>) -> Vec<Signal> {
        let closes = bars.closes();
        if closes.len() < 21 {
            return Vec::new();
        }
        let price = *closes.last().unwrap();
        let vr = volume_ratio(bars, 10);
        if vr < 1.1 {
            return Vec::new();
        }

        let Some((rsi, _)) = current_rsi(&closes, 14) else { return Vec::new() };

        match time_bucket(now) {
            TimeBucket::Morning => {
                let Some(ma20) = current_sma(&closes, 20) else { return Vec::new() };
                let deviation = (price - ma20) / ma20;
                if (50.0..=67.0).contains(&rsi) && deviation.abs() >= 0.003 {
                    let action = if deviation > 0.0 { Action::Buy } else { Action::Sell };
                    return entry_signal(
                        symbol, self.id(), SignalType::MomentumEntry, action, price, 1,
                        (deviation.abs() / 0.01).clamp(0.3, 1.0), "morning momentum deviation", now,
                    )
                    .into_iter()
                    .collect();
                }
                Vec::new()
            }
            TimeBucket::MiddayAfternoon => {
                let window = &closes[closes.len() - 20..];
                let highest = window.iter().cloned().fold(f64::MIN, f64::max);
                let lowest = window.iter().cloned().fold(f64::MAX, f64::min);
                let near_high = highest > 0.0 && (highest - price) / highest < 0.005;
                let near_low = lowest > 0.0 && (price - lowest) / lowest < 0.005;

                if rsi > 70.0 && near_high {
                    return entry_signal(
                        symbol, self.id(), SignalType::ReversalEntry, Action::Sell, price, 1,
                        ((rsi - 70.0) / 30.0).clamp(0.3, 1.0), "overbought near 20-bar high", now,
                    )
                    .into_iter()
                    .collect();
                }
                if rsi < 30.0 && near_low {
                    return entry_signal(
                        symbol, self.id(), SignalType::ReversalEntry, Action::Buy, price, 1,
                        ((30.0 - rsi) / 30.0).clamp(0.3, 1.0), "oversold near 20-bar low", now,
                    )
                    .into_iter()
                    .collect();
                }
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn no_signal_with_insufficient_bars() {
        let strat = MomentumReversal;
        let bars = BarSeries::empty();
        let indicators = IndicatorSet::default();
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        assert!(strat.generate_signals("AAPL", &bars, &indicators, now).is_empty());
    }
}
