// A7 — CTA trend: Donchian(20) entry breakout confirmed by the direction of
// the MA50/MA200 alignment, with Donchian(60) as the longer-horizon
// breakout context. Exit on a 10-bar Donchian reversal, loss of either
// trend MA, or an MA50/MA200 cross.

use chrono::{DateTime, Utc};

use crate::indicators::donchian::calculate_donchian;
use crate::indicators::sma::current_sma;
use crate::strategy::base::Strategy;
use crate::strategy::impls::common::entry_signal;
use crate::types::{Action, BarSeries, IndicatorSet, Position, Signal, SignalType};

pub struct CtaTrend;

impl Strategy for CtaTrend {
    fn id(&self) -> &str {
        "a7_cta_trend"
    }

    fn generate_signals(&self, symbol: &str, bars: &BarSeries, _indicators: &IndicatorSet, now: DateTime<Utc>) -> Vec<Signal> {
        let closes = bars.closes();
        let highs = bars.highs();
        let lows = bars.lows();
        if closes.len() < 200 {
            return Vec::new();
        }
        let price = *closes.last().unwrap();
        let Some(ma50) = current_sma(&closes, 50) else { return Vec::new() };
        let Some(ma200) = current_sma(&closes, 200) else { return Vec::new() };
        let Some(entry_channel) = calculate_donchian(&highs, &lows, 20) else { return Vec::new() };
        let Some(context_channel) = calculate_donchian(&highs, &lows, 60) else { return Vec::new() };

        let bullish_regime = ma50 > ma200;
        let bearish_regime = ma50 < ma200;

        if bullish_regime && price >= entry_channel.upper && price >= context_channel.upper * 0.99 {
            return entry_signal(
                symbol, self.id(), SignalType::Named("A7_CTA_BREAKOUT_LONG".into()), Action::Buy, price, 1,
                0.7, "Donchian breakout with bullish MA alignment", now,
            )
            .into_iter()
            .collect();
        }
        if bearish_regime && price <= entry_channel.lower && price <= context_channel.lower * 1.01 {
            return entry_signal(
                symbol, self.id(), SignalType::Named("A7_CTA_BREAKOUT_SHORT".into()), Action::Sell, price, 1,
                0.7, "Donchian breakdown with bearish MA alignment", now,
            )
            .into_iter()
            .collect();
        }
        Vec::new()
    }

    fn check_exit_conditions(&self, symbol: &str, position: &Position, price: f64, now: DateTime<Utc>, bars: Option<&BarSeries>) -> Option<Signal> {
        let bars = bars?;
        let closes = bars.closes();
        let highs = bars.highs();
        let lows = bars.lows();
        if closes.len() < 200 {
            return None;
        }
        let ma50 = current_sma(&closes, 50)?;
        let ma200 = current_sma(&closes, 200)?;
        let reversal_channel = calculate_donchian(&highs, &lows, 10)?;

        let ma_cross = if position.is_long() { ma50 < ma200 } else { ma50 > ma200 };
        let reversal = if position.is_long() { price <= reversal_channel.lower } else { price >= reversal_channel.upper };
        let trend_loss = if position.is_long() { price < ma50 } else { price > ma50 };

        if ma_cross || reversal || trend_loss {
            let action = if position.is_long() { Action::Sell } else { Action::Buy };
            return entry_signal(
                symbol, self.id(), SignalType::Named("A7_CTA_EXIT".into()), action, price,
                position.size.unsigned_abs(), 0.6, "CTA trend exit", now,
            );
        }
        None
    }
}
