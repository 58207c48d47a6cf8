// A5 — Multifactor AI: composite score over liquidity, fundamental-proxy,
// sentiment-proxy, and momentum factors. Enter long when score >=
// buy_threshold and both liquidity and momentum clear 0.65. Exit long when
// score <= exit_threshold. Weights normalize to 1.0 on construction.

use chrono::{DateTime, Utc};

use crate::indicators::roc::calculate_roc;
use crate::strategy::base::Strategy;
use crate::strategy::impls::common::{entry_signal, volume_ratio};
use crate::types::{Action, BarSeries, IndicatorSet, Position, Signal, SignalType};

const BUY_THRESHOLD: f64 = 0.65;
const EXIT_THRESHOLD: f64 = 0.35;

pub struct Multifactor {
    weights: [f64; 4], // liquidity, fundamental_proxy, sentiment_proxy, momentum
}

impl Default for Multifactor {
    fn default() -> Self {
        let raw = [0.30, 0.20, 0.20, 0.30];
        let sum: f64 = raw.iter().sum();
        Self { weights: raw.map(|w| w / sum) }
    }
}

fn liquidity_factor(bars: &BarSeries) -> f64 {
    (volume_ratio(bars, 20) / 2.0).clamp(0.0, 1.0)
}

fn fundamental_proxy(bars: &BarSeries) -> f64 {
    // No fundamentals feed in this engine; proxy with long-horizon price
    // stability (lower realized volatility -> higher score).
    let closes = bars.closes();
    if closes.len() < 60 {
        return 0.5;
    }
    let window = &closes[closes.len() - 60..];
    let mean = window.iter().sum::<f64>() / window.len() as f64;
    let variance = window.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / window.len() as f64;
    let cv = if mean > 0.0 { variance.sqrt() / mean } else { 1.0 };
    (1.0 - cv * 10.0).clamp(0.0, 1.0)
}

fn sentiment_proxy(bars: &BarSeries) -> f64 {
    let closes = bars.closes();
    if closes.len() < 10 {
        return 0.5;
    }
    let up_bars = closes.windows(2).rev().take(9).filter(|w| w[1] > w[0]).count();
    up_bars as f64 / 9.0
}

fn momentum_factor(bars: &BarSeries) -> f64 {
    let closes = bars.closes();
    let roc = calculate_roc(&closes, 14).last().copied().unwrap_or(0.0);
    (0.5 + roc / 20.0).clamp(0.0, 1.0)
}

impl Strategy for Multifactor {
    fn id(&self) -> &str {
        "a5_multifactor"
    }

    fn generate_signals(&self, symbol: &str, bars: &BarSeries, _indicators: &IndicatorSet, now: DateTime<Utc>) -> Vec<Signal> {
        let closes = bars.closes();
        if closes.len() < 60 {
            return Vec::new();
        }
        let price = *closes.last().unwrap();

        let liquidity = liquidity_factor(bars);
        let fundamental = fundamental_proxy(bars);
        let sentiment = sentiment_proxy(bars);
        let momentum = momentum_factor(bars);

        let score = self.weights[0] * liquidity + self.weights[1] * fundamental + self.weights[2] * sentiment + self.weights[3] * momentum;

        if score >= BUY_THRESHOLD && liquidity >= 0.65 && momentum >= 0.65 {
            return entry_signal(
                symbol, self.id(), SignalType::Named("A5_MULTIFACTOR_LONG".into()), Action::Buy, price, 1,
                score.clamp(0.3, 1.0), format!("composite score {score:.3}"), now,
            )
            .into_iter()
            .collect();
        }
        Vec::new()
    }

    fn check_exit_conditions(&self, symbol: &str, position: &Position, price: f64, now: DateTime<Utc>, bars: Option<&BarSeries>) -> Option<Signal> {
        let bars = bars?;
        if !position.is_long() {
            return None;
        }
        let liquidity = liquidity_factor(bars);
        let fundamental = fundamental_proxy(bars);
        let sentiment = sentiment_proxy(bars);
        let momentum = momentum_factor(bars);
        let score = self.weights[0] * liquidity + self.weights[1] * fundamental + self.weights[2] * sentiment + self.weights[3] * momentum;

        if score <= EXIT_THRESHOLD {
            return entry_signal(
                symbol, self.id(), SignalType::Named("A5_MULTIFACTOR_EXIT".into()), Action::Sell, price,
                position.size.unsigned_abs(), 0.6, format!("composite score fell to {score:.3}"), now,
            );
        }
        None
    }
}
