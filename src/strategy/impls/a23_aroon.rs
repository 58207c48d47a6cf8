// A23 — Aroon oscillator. Enter long when Aroon-Up crosses above 70 while
// Aroon-Down sits below 30 (strong emerging uptrend); symmetric short entry.
// Exit when the oscillator loses its directional edge (the two lines cross).

use chrono::{DateTime, Utc};

use crate::indicators::aroon::current_aroon;
use crate::strategy::base::Strategy;
use crate::strategy::impls::common::entry_signal;
use crate::types::{Action, BarSeries, IndicatorSet, Position, Signal, SignalType};

const AROON_PERIOD: usize = 25;
const STRONG_LEVEL: f64 = 70.0;
const WEAK_LEVEL: f64 = 30.0;

pub struct AroonOscillator;

impl Strategy for AroonOscillator {
    fn id(&self) -> &str {
        "a23_aroon_oscillator"
    }

    fn generate_signals(&self, symbol: &str, bars: &BarSeries, _indicators: &IndicatorSet, now: DateTime<Utc>) -> Vec<Signal> {
        let highs = bars.highs();
        let lows = bars.lows();
        let closes = bars.closes();
        if closes.len() < AROON_PERIOD + 11 {
            return Vec::new();
        }
        let Some(aroon) = current_aroon(&highs, &lows, AROON_PERIOD) else { return Vec::new() };
        let price = *closes.last().unwrap();

        if aroon.up >= STRONG_LEVEL && aroon.down <= WEAK_LEVEL {
            return entry_signal(
                symbol, self.id(), SignalType::Named("A23_AROON_UPTREND".into()), Action::Buy, price, 1,
                ((aroon.up - STRONG_LEVEL) / 30.0).clamp(0.3, 1.0), format!("Aroon-Up {:.0} / Aroon-Down {:.0}", aroon.up, aroon.down), now,
            )
            .into_iter()
            .collect();
        }
        if aroon.down >= STRONG_LEVEL && aroon.up <= WEAK_LEVEL {
            return entry_signal(
                symbol, self.id(), SignalType::Named("A23_AROON_DOWNTREND".into()), Action::Sell, price, 1,
                ((aroon.down - STRONG_LEVEL) / 30.0).clamp(0.3, 1.0), format!("Aroon-Down {:.0} / Aroon-Up {:.0}", aroon.down, aroon.up), now,
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
        if closes.len() < AROON_PERIOD + 11 {
            return None;
        }
        let aroon = current_aroon(&highs, &lows, AROON_PERIOD)?;
        let lost_edge = if position.is_long() { aroon.up <= aroon.down } else { aroon.down <= aroon.up };
        if lost_edge {
            let action = if position.is_long() { Action::Sell } else { Action::Buy };
            return entry_signal(
                symbol, self.id(), SignalType::Named("A23_AROON_EXIT".into()), action, price,
                position.size.unsigned_abs(), 0.5, "Aroon lines crossed", now,
            );
        }
        None
    }
}
