// A22 — Super-Trend flip. Enter long when the trend flips from Down to Up,
// short on the symmetric flip; the position itself rides the trend, so exit
// is simply the opposite flip.

use chrono::{DateTime, Utc};

use crate::indicators::super_trend::{calculate_super_trend, Trend};
use crate::strategy::base::Strategy;
use crate::strategy::impls::common::entry_signal;
use crate::types::{Action, BarSeries, IndicatorSet, Position, Signal, SignalType};

const ATR_PERIOD: usize = 14;
const FACTOR: f64 = 3.0;

pub struct SuperTrendFlip;

impl Strategy for SuperTrendFlip {
    fn id(&self) -> &str {
        "a22_super_trend"
    }

    fn generate_signals(&self, symbol: &str, bars: &BarSeries, _indicators: &IndicatorSet, now: DateTime<Utc>) -> Vec<Signal> {
        let highs = bars.highs();
        let lows = bars.lows();
        let closes = bars.closes();
        if closes.len() < ATR_PERIOD + 11 {
            return Vec::new();
        }
        let Some(current) = calculate_super_trend(&highs, &lows, &closes, ATR_PERIOD, FACTOR) else { return Vec::new() };
        let Some(prev) = calculate_super_trend(
            &highs[..highs.len() - 1],
            &lows[..lows.len() - 1],
            &closes[..closes.len() - 1],
            ATR_PERIOD,
            FACTOR,
        ) else {
            return Vec::new();
        };
        let price = *closes.last().unwrap();

        if prev.trend == Trend::Down && current.trend == Trend::Up {
            return entry_signal(
                symbol, self.id(), SignalType::Named("A22_SUPERTREND_FLIP_UP".into()), Action::Buy, price, 1,
                0.6, "Super-Trend flipped bullish", now,
            )
            .into_iter()
            .collect();
        }
        if prev.trend == Trend::Up && current.trend == Trend::Down {
            return entry_signal(
                symbol, self.id(), SignalType::Named("A22_SUPERTREND_FLIP_DOWN".into()), Action::Sell, price, 1,
                0.6, "Super-Trend flipped bearish", now,
            )
            .into_iter()
            .collect();
        }
        Vec::new()
    }

    fn check_exit_conditions(&self, symbol: &str, position: &Position, price: f64, now: DateTime<Utc>, bars: Option<&BarSeries>) -> Option<Signal> {
        let bars = bars?;
        let highs = bars.highs();
        let lows = bars.lows();
        let closes = bars.closes();
        if closes.len() < ATR_PERIOD + 11 {
            return None;
        }
        let current = calculate_super_trend(&highs, &lows, &closes, ATR_PERIOD, FACTOR)?;
        let opposite = if position.is_long() { current.trend == Trend::Down } else { current.trend == Trend::Up };
        if opposite {
            let action = if position.is_long() { Action::Sell } else { Action::Buy };
            return entry_signal(
                symbol, self.id(), SignalType::Named("A22_SUPERTREND_EXIT".into()), action, price,
                position.size.unsigned_abs(), 0.6, "Super-Trend flipped against position", now,
            );
        }
        None
    }
}
