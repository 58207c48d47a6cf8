// A3 — Dual MA + volume: EMA(9)/EMA(21) golden/death cross with a required
// volume-surge confirmation. Multi-tier sell: MA death-cross, close below
// slow MA, volume-expansion-with-drop, RSI-extreme.

use chrono::{DateTime, Utc};

use crate::indicators::ema::calculate_ema;
use crate::indicators::rsi::current_rsi;
use crate::strategy::base::Strategy;
use crate::strategy::impls::common::{entry_signal, volume_ratio};
use crate::types::{Action, BarSeries, IndicatorSet, Position, Signal, SignalType};

const VOLUME_SURGE_RATIO: f64 = 1.5;

pub struct DualMaVolume;

impl Strategy for DualMaVolume {
    fn id(&self) -> &str {
        "a3_dual_ma_volume"
    }

    fn generate_signals(&self, symbol: &str, bars: &BarSeries, _indicators: &IndicatorSet, now: DateTime<Utc>) -> Vec<Signal> {
        let closes = bars.closes();
        if closes.len() < 22 {
            return Vec::new();
        }
        let price = *closes.last().unwrap();
        let ema9 = calculate_ema(&closes, 9);
        let ema21 = calculate_ema(&closes, 21);
        if ema9.len() < 2 || ema21.len() < 2 {
            return Vec::new();
        }
        let vr = volume_ratio(bars, 10);
        if vr < VOLUME_SURGE_RATIO {
            return Vec::new();
        }

        let (fast_prev, fast_now) = (ema9[ema9.len() - 2], *ema9.last().unwrap());
        let (slow_prev, slow_now) = (ema21[ema21.len() - 2], *ema21.last().unwrap());

        if fast_prev <= slow_prev && fast_now > slow_now {
            return entry_signal(
                symbol, self.id(), SignalType::MaGoldenCross, Action::Buy, price, 1,
                (vr / VOLUME_SURGE_RATIO).clamp(0.4, 1.0), "EMA9/21 golden cross with volume surge", now,
            )
            .into_iter()
            .collect();
        }
        if fast_prev >= slow_prev && fast_now < slow_now {
            return entry_signal(
                symbol, self.id(), SignalType::MaDeathCross, Action::Sell, price, 1,
                (vr / VOLUME_SURGE_RATIO).clamp(0.4, 1.0), "EMA9/21 death cross with volume surge", now,
            )
            .into_iter()
            .collect();
        }
        Vec::new()
    }

    fn check_exit_conditions(&self, symbol: &str, position: &Position, price: f64, now: DateTime<Utc>, bars: Option<&BarSeries>) -> Option<Signal> {
        let bars = bars?;
        let closes = bars.closes();
        if closes.len() < 22 {
            return None;
        }
        let ema21 = calculate_ema(&closes, 21);
        let slow_now = *ema21.last()?;
        let vr = volume_ratio(bars, 10);
        let rsi = current_rsi(&closes, 14).map(|(r, _)| r).unwrap_or(50.0);

        let below_slow = position.is_long() && price < slow_now;
        let volume_drop = vr > VOLUME_SURGE_RATIO && position.price_change_pct(price) < 0.0;
        let rsi_extreme = if position.is_long() { rsi > 80.0 } else { rsi < 20.0 };

        if below_slow || volume_drop || rsi_extreme {
            let action = if position.is_long() { Action::Sell } else { Action::Buy };
            return entry_signal(
                symbol, self.id(), SignalType::MaDeathCross, action, price,
                position.size.unsigned_abs(), 0.6, "dual-MA exit tier", now,
            );
        }
        None
    }
}
