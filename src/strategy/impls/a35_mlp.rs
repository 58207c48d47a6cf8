// A35 — MLP regressor. Feeds a six-feature snapshot (short/long return,
// RSI, MACD histogram, volume ratio, ATR%) through a frozen feed-forward
// net predicting an expected forward return, and trades when the magnitude
// clears a threshold. The per-symbol frozen weight seed keeps predictions
// deterministic and reproducible across restarts.

use chrono::{DateTime, Utc};

use crate::indicators::atr::calculate_atr_pct;
use crate::indicators::macd::calculate_macd;
use crate::indicators::mlp::MlpRegressor;
use crate::indicators::rsi::calculate_rsi;
use crate::strategy::base::Strategy;
use crate::strategy::impls::common::{entry_signal, volume_ratio};
use crate::types::{Action, BarSeries, IndicatorSet, Signal, SignalType};

const PREDICTION_THRESHOLD: f64 = 0.015;

fn features(bars: &BarSeries) -> Option<[f64; 6]> {
    let closes = bars.closes();
    let highs = bars.highs();
    let lows = bars.lows();
    if closes.len() < 40 {
        return None;
    }
    let n = closes.len();
    let short_return = (closes[n - 1] - closes[n - 5]) / closes[n - 5];
    let long_return = (closes[n - 1] - closes[n - 20]) / closes[n - 20];
    let rsi = *calculate_rsi(&closes, 14).last()?;
    let macd = calculate_macd(&closes, 12, 26, 9)?;
    let histogram = *macd.histogram.last()?;
    let vol_ratio = volume_ratio(bars, 20);
    let atr_pct = calculate_atr_pct(&highs, &lows, &closes, 14).unwrap_or(0.0);

    let row = [short_return, long_return, (rsi - 50.0) / 50.0, histogram, vol_ratio - 1.0, atr_pct];
    row.iter().all(|v| v.is_finite()).then_some(row)
}

fn seed_for(symbol: &str) -> u64 {
    symbol.bytes().fold(0xcbf29ce484222325u64, |acc, b| (acc ^ b as u64).wrapping_mul(0x100000001b3))
}

pub struct MlpForecast;

impl Strategy for MlpForecast {
    fn id(&self) -> &str {
        "a35_mlp_neural_network"
    }

    fn generate_signals(&self, symbol: &str, bars: &BarSeries, _indicators: &IndicatorSet, now: DateTime<Utc>) -> Vec<Signal> {
        let Some(row) = features(bars) else { return Vec::new() };
        let model = MlpRegressor::with_frozen_weights(seed_for(symbol));
        let Some(predicted_return) = model.predict(&row) else { return Vec::new() };
        let price = *bars.closes().last().unwrap();

        if predicted_return > PREDICTION_THRESHOLD {
            return entry_signal(
                symbol, self.id(), SignalType::Named("A35_MLP_PREDICT_UP".into()), Action::Buy, price, 1,
                (predicted_return * 10.0).clamp(0.3, 0.9), format!("MLP predicted return {:.3}", predicted_return), now,
            )
            .into_iter()
            .collect();
        }
        if predicted_return < -PREDICTION_THRESHOLD {
            return entry_signal(
                symbol, self.id(), SignalType::Named("A35_MLP_PREDICT_DOWN".into()), Action::Sell, price, 1,
                (predicted_return.abs() * 10.0).clamp(0.3, 0.9), format!("MLP predicted return {:.3}", predicted_return), now,
            )
            .into_iter()
            .collect();
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_for_is_deterministic_per_symbol() {
        assert_eq!(seed_for("AAPL"), seed_for("AAPL"));
        assert_ne!(seed_for("AAPL"), seed_for("MSFT"));
    }
}
