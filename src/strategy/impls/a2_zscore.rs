// A2 — Z-score mean reversion. Enter long when z <= -2.0 with corroborating
// low RSI and a short-trend that isn't falling further; enter short
// symmetrically. Exits on |z| <= 0.5, short/long MA cross, or a
// volume-plus-adverse-move combination.

use chrono::{DateTime, Utc};

use crate::indicators::rsi::current_rsi;
use crate::indicators::sma::current_sma;
use crate::indicators::zscore::current_zscore;
use crate::strategy::base::Strategy;
use crate::strategy::impls::common::{entry_signal, volume_ratio};
use crate::types::{Action, BarSeries, IndicatorSet, Position, Signal, SignalType};

pub struct ZScoreReversion;

impl Strategy for ZScoreReversion {
    fn id(&self) -> &str {
        "a2_zscore"
    }

    fn generate_signals(&self, symbol: &str, bars: &BarSeries, _indicators: &IndicatorSet, now: DateTime<Utc>) -> Vec<Signal> {
        let closes = bars.closes();
        if closes.len() < 21 {
            return Vec::new();
        }
        let price = *closes.last().unwrap();
        let Some(z) = current_zscore(&closes, 20) else { return Vec::new() };
        let Some((rsi, _)) = current_rsi(&closes, 14) else { return Vec::new() };
        let Some(ma5) = current_sma(&closes, 5) else { return Vec::new() };
        let Some(ma20) = current_sma(&closes, 20) else { return Vec::new() };

        if z <= -2.0 && rsi < 40.0 && ma5 >= ma20 * 0.995 {
            return entry_signal(
                symbol, self.id(), SignalType::ZscoreOversold, Action::Buy, price, 1,
                (z.abs() / 4.0).clamp(0.3, 1.0), "z-score oversold with low RSI", now,
            )
            .into_iter()
            .collect();
        }
        if z >= 2.0 && rsi > 60.0 && ma5 <= ma20 * 1.005 {
            return entry_signal(
                symbol, self.id(), SignalType::ZscoreOverbought, Action::Sell, price, 1,
                (z.abs() / 4.0).clamp(0.3, 1.0), "z-score overbought with high RSI", now,
            )
            .into_iter()
            .collect();
        }
        Vec::new()
    }

    fn check_exit_conditions(&self, symbol: &str, position: &Position, price: f64, now: DateTime<Utc>, bars: Option<&BarSeries>) -> Option<Signal> {
        let bars = bars?;
        let closes = bars.closes();
        if closes.len() < 21 {
            return None;
        }
        let z = current_zscore(&closes, 20)?;
        let ma5 = current_sma(&closes, 5)?;
        let ma20 = current_sma(&closes, 20)?;
        let vr = volume_ratio(bars, 10);

        let mean_reverted = z.abs() <= 0.5;
        let cross_against = if position.is_long() { ma5 < ma20 } else { ma5 > ma20 };
        let adverse_with_volume = vr > 1.5 && position.price_change_pct(price) < -0.01;

        if mean_reverted || cross_against || adverse_with_volume {
            let action = if position.is_long() { Action::Sell } else { Action::Buy };
            return entry_signal(
                symbol, self.id(), SignalType::MaDeathCross, action, price,
                position.size.unsigned_abs(), 0.6, "z-score exit condition", now,
            );
        }
        None
    }
}
