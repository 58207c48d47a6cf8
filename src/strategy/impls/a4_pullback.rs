// A4 — Pullback entries. Detect an uptrend (close > MA50 and MA20 > MA50)
// with strength >= 0.0065; locate the recent swing high/low over a lookback
// window; enter long when price sits inside the Fibonacci-retracement band
// between the swing extremes, with volume confirmation. Symmetric for
// downtrends.

use chrono::{DateTime, Utc};

use crate::indicators::sma::current_sma;
use crate::strategy::base::Strategy;
use crate::strategy::impls::common::{entry_signal, volume_ratio};
use crate::types::{Action, BarSeries, IndicatorSet, Position, Signal, SignalType};

const PULLBACK_LOOKBACK: usize = 30;
const FIB_LOW: f64 = 0.382;
const FIB_HIGH: f64 = 0.618;

pub struct Pullback;

impl Strategy for Pullback {
    fn id(&self) -> &str {
        "a4_pullback"
    }

    fn generate_signals(&self, symbol: &str, bars: &BarSeries, _indicators: &IndicatorSet, now: DateTime<Utc>) -> Vec<Signal> {
        let closes = bars.closes();
        if closes.len() < PULLBACK_LOOKBACK + 50 {
            return Vec::new();
        }
        let price = *closes.last().unwrap();
        let Some(ma20) = current_sma(&closes, 20) else { return Vec::new() };
        let Some(ma50) = current_sma(&closes, 50) else { return Vec::new() };
        let vr = volume_ratio(bars, 10);
        if vr < 1.05 {
            return Vec::new();
        }

        let window = &closes[closes.len() - PULLBACK_LOOKBACK..];
        let swing_high = window.iter().cloned().fold(f64::MIN, f64::max);
        let swing_low = window.iter().cloned().fold(f64::MAX, f64::min);
        let range = swing_high - swing_low;
        if range <= 0.0 {
            return Vec::new();
        }
        let strength = (ma20 - ma50).abs() / ma50;

        let uptrend = price > ma50 && ma20 > ma50 && strength >= 0.0065;
        let downtrend = price < ma50 && ma20 < ma50 && strength >= 0.0065;

        if uptrend {
            let band_low = swing_high - range * FIB_HIGH;
            let band_high = swing_high - range * FIB_LOW;
            if (band_low..=band_high).contains(&price) {
                return entry_signal(
                    symbol, self.id(), SignalType::Named("A4_PULLBACK_LONG".into()), Action::Buy, price, 1,
                    strength.clamp(0.3, 1.0), "uptrend pullback into Fibonacci band", now,
                )
                .into_iter()
                .collect();
            }
        }
        if downtrend {
            let band_low = swing_low + range * FIB_LOW;
            let band_high = swing_low + range * FIB_HIGH;
            if (band_low..=band_high).contains(&price) {
                return entry_signal(
                    symbol, self.id(), SignalType::Named("A4_PULLBACK_SHORT".into()), Action::Sell, price, 1,
                    strength.clamp(0.3, 1.0), "downtrend pullback into Fibonacci band", now,
                )
                .into_iter()
                .collect();
            }
        }
        Vec::new()
    }

    fn check_exit_conditions(&self, symbol: &str, position: &Position, price: f64, now: DateTime<Utc>, bars: Option<&BarSeries>) -> Option<Signal> {
        let bars = bars?;
        let closes = bars.closes();
        if closes.len() < 50 {
            return None;
        }
        let ma20 = current_sma(&closes, 20)?;
        let ma50 = current_sma(&closes, 50)?;
        let vr = volume_ratio(bars, 10);

        let trend_cross = if position.is_long() { ma20 < ma50 } else { ma20 > ma50 };
        let support_break = if position.is_long() { price < ma50 * 0.995 } else { price > ma50 * 1.005 };
        let volume_drop_exit = vr > 1.5 && position.price_change_pct(price) < 0.0;

        if trend_cross || support_break || volume_drop_exit {
            let action = if position.is_long() { Action::Sell } else { Action::Buy };
            return entry_signal(
                symbol, self.id(), SignalType::TrailingStop, action, price,
                position.size.unsigned_abs(), 0.6, "pullback exit", now,
            );
        }
        None
    }
}
